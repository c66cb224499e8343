//! Order persistence for the placement service.
//!
//! The [`OrderStore`] trait abstracts over the backing store; the PostgreSQL
//! implementation persists an order header and its line items as a single
//! transaction, and the in-memory implementation mirrors its semantics for
//! tests.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;

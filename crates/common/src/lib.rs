//! Shared types for the order placement service.
//!
//! Identifiers and the money representation are defined here so that the
//! domain, the remote clients, and the store all agree on them without
//! depending on each other.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CustomerId, OrderId, ProductId};

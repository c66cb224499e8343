//! Order placement saga.
//!
//! A single placement request fans out into concurrent remote reads (the
//! customer plus one product per distinct line), joins, checks stock, builds
//! the order with name/price snapshots, persists it atomically, and only
//! then fans out the remote stock decrements. The decrement phase runs after
//! the local commit and is therefore not atomic with it: its outcome is
//! recorded as the order's fulfillment status, and a failure raises a
//! consistency alarm instead of rolling back the client-visible order.

pub mod coordinator;
pub mod error;
pub mod request;

pub use coordinator::{OrderReceipt, PlacementCoordinator};
pub use error::PlacementError;
pub use request::{OrderLine, PlacementRequest};

//! Domain layer for the order placement service.
//!
//! An [`Order`] is created exclusively through the placement workflow and is
//! immutable once persisted, except for its [`FulfillmentStatus`]. Line items
//! carry name and price *snapshots* captured at order time, so later catalog
//! changes never retroactively alter historical orders.

pub mod error;
pub mod fulfillment;
pub mod order;

pub use error::OrderError;
pub use fulfillment::FulfillmentStatus;
pub use order::{Order, OrderItem};

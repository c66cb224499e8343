//! Remote service clients for the order placement workflow.
//!
//! The customer and product services live behind HTTP; this crate provides
//! typed clients that translate transport failures into the three domain
//! error kinds the saga understands (not found, insufficient stock,
//! unavailable). No retries happen at this layer; resilience policy belongs
//! to the caller, optionally through the [`CircuitBreaker`].

pub mod breaker;
pub mod customer;
pub mod error;
pub mod product;

pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker};
pub use customer::{Customer, CustomerClient, HttpCustomerClient, InMemoryCustomerClient};
pub use error::ClientError;
pub use product::{HttpProductClient, InMemoryProductClient, Product, ProductClient};

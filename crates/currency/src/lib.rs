//! Currency conversion backed by an external rate API.
//!
//! A single outbound call fetches the full rate table for a base currency;
//! individual target rates are looked up in the table and cached per target
//! currency. The fetch is wrapped in a retry policy (exponential backoff,
//! transient failures only); cache entries expire after a configurable TTL.

pub mod cache;
pub mod error;
pub mod source;

pub use cache::{RateCache, RetryPolicy};
pub use error::RateError;
pub use source::{HttpRateSource, RateSource, RateTable, StaticRateSource};

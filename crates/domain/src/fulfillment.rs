//! Fulfillment state machine for persisted orders.

use serde::{Deserialize, Serialize};

/// The remote stock-decrement outcome for a persisted order.
///
/// The local write and the remote stock decrement are not atomic, so every
/// order records where it stands in that window:
///
/// ```text
/// Pending ──┬──► StockConfirmed
///           └──► StockFailed
/// ```
///
/// `StockFailed` is terminal from the service's point of view: the order
/// exists locally but remote stock was never reduced, and an operator (or a
/// future recovery process) must compensate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentStatus {
    /// Order persisted; stock decrement not yet attempted or still running.
    #[default]
    Pending,

    /// Every remote stock decrement succeeded (terminal state).
    StockConfirmed,

    /// At least one remote stock decrement failed; compensation is needed
    /// (terminal state).
    StockFailed,
}

impl FulfillmentStatus {
    /// Returns true if the status may transition to `next`.
    pub fn can_transition_to(&self, next: FulfillmentStatus) -> bool {
        matches!(
            (self, next),
            (
                FulfillmentStatus::Pending,
                FulfillmentStatus::StockConfirmed | FulfillmentStatus::StockFailed,
            )
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::StockConfirmed | FulfillmentStatus::StockFailed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "Pending",
            FulfillmentStatus::StockConfirmed => "StockConfirmed",
            FulfillmentStatus::StockFailed => "StockFailed",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(FulfillmentStatus::Pending),
            "StockConfirmed" => Ok(FulfillmentStatus::StockConfirmed),
            "StockFailed" => Ok(FulfillmentStatus::StockFailed),
            other => Err(format!("unknown fulfillment status: {other}")),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Unfilled or partially filled, resting or matching.
    Active,
    /// Fully filled; terminal.
    Matched,
    /// Cancelled by the user or by market-order residual cleanup; terminal.
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Matched | OrderStatus::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Active)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Active => write!(f, "ACTIVE"),
            OrderStatus::Matched => write!(f, "MATCHED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    /// Rests in the book at a fixed rate until matched or cancelled.
    Limit,
    /// Takes whatever liquidity is available; never rests.
    Market,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "LIMIT"),
            OrderKind::Market => write!(f, "MARKET"),
        }
    }
}

impl TryFrom<&str> for OrderKind {
    type Error = &'static str;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_uppercase().as_str() {
            "LIMIT" => Ok(OrderKind::Limit),
            "MARKET" => Ok(OrderKind::Market),
            _ => Err("Invalid order kind: must be LIMIT or MARKET"),
        }
    }
}

mod order_kind;
mod order_status;
mod side;

pub use order_kind::OrderKind;
pub use order_status::OrderStatus;
pub use side::Side;

/// Opaque order identifier, assigned by the repository on create.
pub type OrderId = String;

/// Wall-clock timestamp stamped by the repository.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

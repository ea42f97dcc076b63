pub mod entities;
pub mod value_objects;

pub use entities::{Order, Trade};
pub use value_objects::{OrderId, OrderKind, OrderStatus, Side, Timestamp};

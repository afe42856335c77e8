//! Persistence models.

pub mod order;

pub use order::{NewOrder, Order, OrderItem};

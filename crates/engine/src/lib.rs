//! Order lifecycle orchestration.
//!
//! [`OrderEngine`] owns the lifecycle operations: creating an order (one
//! atomic transaction covering the order row, its line items, the first
//! history entry, promo usage, customer statistics, and inventory),
//! transitioning it through the fulfillment state machine, cancelling it
//! with full reversal of the creation side effects, and querying.

mod config;
mod engine;
mod error;
mod request;

pub use config::EngineConfig;
pub use engine::OrderEngine;
pub use error::{EngineError, Result};
pub use request::{CreateOrderRequest, FulfillmentDetails, OrderItemRequest};

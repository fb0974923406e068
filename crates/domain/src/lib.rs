//! Pure domain layer for the order lifecycle engine.
//!
//! This crate has no I/O: it provides the money type, the order aggregate
//! and its status state machine, catalog/configuration types, the pricing
//! calculator, and order number formatting. Everything here is deterministic
//! and exercised heavily by unit tests.

pub mod catalog;
pub mod money;
pub mod order;
pub mod order_number;
pub mod pricing;
pub mod status;

pub use catalog::{Customer, DeliveryAddress, DeliveryZone, Discount, MenuItem, PromoCode, Restaurant};
pub use money::Money;
pub use order::{Customization, Order, OrderItem, StatusHistoryEntry};
pub use pricing::{Quote, quote};
pub use status::{Actor, FulfillmentType, OrderStatus, PaymentMethod, PaymentStatus};

//! Shared identifier types used across the order lifecycle engine.

mod types;

pub use types::{AddressId, CustomerId, MenuItemId, OrderId, PromoCodeId, RestaurantId};

//! Catalog and configuration types the engine reads during order creation.

use chrono::{DateTime, Utc};
use common::{AddressId, CustomerId, MenuItemId, PromoCodeId, RestaurantId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Inventory-relevant fields of a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub price: Money,

    /// When true, `stock_quantity` is decremented on order and restored on
    /// cancellation.
    pub track_inventory: bool,

    /// Meaningful only when `track_inventory` is set.
    pub stock_quantity: Option<i64>,
}

/// Customer record with the maintained aggregate counters.
///
/// `total_orders` and `total_spent` are incrementally maintained caches,
/// not a source of truth; they move in lockstep with order creation and
/// cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub total_orders: i64,
    pub total_spent: Money,
}

/// Restaurant-level pricing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,

    /// Fractional tax rate, e.g. 0.0825.
    pub tax_rate: f64,

    /// Flat per-order service fee.
    pub service_fee: Money,
}

/// A delivery zone: the zip codes a restaurant delivers to and the flat fee
/// charged for that zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub zip_codes: Vec<String>,
    pub delivery_fee: Money,
}

impl DeliveryZone {
    /// Returns true if the zone covers the given zip code.
    pub fn covers(&self, zip_code: &str) -> bool {
        self.zip_codes.iter().any(|z| z == zip_code)
    }
}

/// A customer delivery address. The zip code drives zone matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub street: String,
    pub city: String,
    pub zip_code: String,
}

/// The discount a promo code grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Discount {
    /// Percentage of the subtotal, optionally capped.
    Percentage {
        percent: u32,
        max_discount: Option<Money>,
    },
    /// Fixed amount, capped at the subtotal.
    Fixed { amount: Money },
}

/// A promotion code with its validity constraints and usage counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub code: String,
    pub discount: Discount,
    pub min_order_value: Money,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub usage_limit: Option<u32>,

    /// Monotonic count of orders that applied this code, incremented
    /// exactly once per such order.
    pub usage_count: u32,
}

impl PromoCode {
    /// Returns true if the code passes all validity checks for the given
    /// subtotal at the given instant.
    pub fn is_valid_for(&self, subtotal: Money, now: DateTime<Utc>) -> bool {
        if now < self.valid_from || now > self.valid_until {
            return false;
        }
        if let Some(limit) = self.usage_limit
            && self.usage_count >= limit
        {
            return false;
        }
        subtotal >= self.min_order_value
    }

    /// Computes the discount for a subtotal.
    ///
    /// An invalid code (outside the validity window, over its usage limit,
    /// or under the minimum order value) yields a silent zero discount
    /// rather than an error: the order still succeeds without it. This is
    /// deliberate behavior, not an omission.
    pub fn discount_for(&self, subtotal: Money, now: DateTime<Utc>) -> Money {
        if !self.is_valid_for(subtotal, now) {
            return Money::zero();
        }

        match &self.discount {
            Discount::Percentage {
                percent,
                max_discount,
            } => {
                let raw = subtotal.percent(*percent);
                match max_discount {
                    Some(cap) => raw.min(*cap),
                    None => raw,
                }
            }
            // A fixed discount can never exceed the order value.
            Discount::Fixed { amount } => (*amount).min(subtotal),
        }
    }
}

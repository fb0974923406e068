//! The order aggregate and its owned records.

use chrono::{DateTime, Utc};
use common::{AddressId, CustomerId, MenuItemId, OrderId, PromoCodeId, RestaurantId};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::{Actor, FulfillmentType, OrderStatus, PaymentMethod, PaymentStatus};

/// A customization selected on a line item, with its price delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub name: String,
    pub price_delta: Money,
}

impl Customization {
    pub fn new(name: impl Into<String>, price_delta: Money) -> Self {
        Self {
            name: name.into(),
            price_delta,
        }
    }
}

/// An order line item: an immutable snapshot of the menu item at the moment
/// the order was placed, independent of later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The menu item this snapshot was taken from.
    pub menu_item_id: MenuItemId,

    /// Item name at time of order.
    pub name: String,

    /// Unit price at time of order, excluding customizations.
    pub unit_price: Money,

    /// Quantity ordered (positive).
    pub quantity: u32,

    /// Selected customizations with their price deltas.
    pub customizations: Vec<Customization>,

    /// Per-item special instructions.
    pub special_instructions: Option<String>,
}

impl OrderItem {
    /// Creates a plain line item without customizations.
    pub fn new(
        menu_item_id: MenuItemId,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            menu_item_id,
            name: name.into(),
            unit_price,
            quantity,
            customizations: Vec::new(),
            special_instructions: None,
        }
    }

    /// Adds a customization to the line item.
    pub fn with_customization(mut self, name: impl Into<String>, price_delta: Money) -> Self {
        self.customizations.push(Customization::new(name, price_delta));
        self
    }

    /// Effective unit price including customization deltas.
    pub fn effective_unit_price(&self) -> Money {
        self.unit_price + self.customizations.iter().map(|c| c.price_delta).sum()
    }

    /// Line total: (unit price + customization deltas) x quantity.
    pub fn line_total(&self) -> Money {
        self.effective_unit_price().times(self.quantity)
    }
}

/// One entry of the append-only status audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub actor: Actor,
    pub changed_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn new(
        status: OrderStatus,
        note: Option<String>,
        actor: Actor,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            note,
            actor,
            changed_at,
        }
    }
}

/// The central order aggregate.
///
/// Orders are created once, mutated only through status transitions and
/// cancellation, and never deleted: cancellation is a status, not a row
/// removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Human-readable identifier `ORD-YYYYMMDD-NNN`, unique and immutable.
    pub order_number: String,

    pub restaurant_id: RestaurantId,
    pub customer_id: CustomerId,

    pub fulfillment: FulfillmentType,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,

    pub subtotal: Money,
    pub tax_amount: Money,
    pub service_fee: Money,
    pub delivery_fee: Money,
    pub tip_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,

    /// Table number for dine-in orders.
    pub table_number: Option<String>,

    /// Requested pickup time for pickup orders.
    pub pickup_time: Option<DateTime<Utc>>,

    /// Delivery address reference for delivery orders.
    pub delivery_address_id: Option<AddressId>,

    /// Set at creation for delivery orders.
    pub estimated_delivery_time: Option<DateTime<Utc>>,

    /// Set when the order reaches `Delivered`.
    pub actual_delivery_time: Option<DateTime<Utc>>,

    pub promo_code_id: Option<PromoCodeId>,
    pub special_instructions: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Verifies the monetary invariant: the total equals the component sum,
    /// clamped at zero.
    pub fn totals_are_consistent(&self) -> bool {
        let computed = (self.subtotal + self.tax_amount + self.service_fee + self.delivery_fee
            + self.tip_amount
            - self.discount_amount)
            .clamp_non_negative();
        self.total_amount == computed && !self.total_amount.is_negative()
    }
}

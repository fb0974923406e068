//! Inbound request shapes for the lifecycle operations.

use chrono::{DateTime, Utc};
use common::{AddressId, CustomerId, MenuItemId, PromoCodeId, RestaurantId};
use domain::{Customization, FulfillmentType, Money, OrderItem, PaymentMethod};
use serde::{Deserialize, Serialize};

/// Fulfillment choice plus its type-specific fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentDetails {
    DineIn {
        table_number: String,
    },
    Pickup {
        #[serde(default)]
        pickup_time: Option<DateTime<Utc>>,
    },
    Delivery {
        address_id: AddressId,
    },
}

impl FulfillmentDetails {
    pub fn fulfillment_type(&self) -> FulfillmentType {
        match self {
            FulfillmentDetails::DineIn { .. } => FulfillmentType::DineIn,
            FulfillmentDetails::Pickup { .. } => FulfillmentType::Pickup,
            FulfillmentDetails::Delivery { .. } => FulfillmentType::Delivery,
        }
    }
}

/// One requested line item. Name and unit price are the caller-supplied
/// snapshot of the menu item at order time; the engine verifies the menu
/// item exists but prices the order from this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Vec<Customization>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl OrderItemRequest {
    /// Converts the request into the immutable line item snapshot.
    pub(crate) fn into_order_item(self) -> OrderItem {
        OrderItem {
            menu_item_id: self.menu_item_id,
            name: self.name,
            unit_price: self.unit_price,
            quantity: self.quantity,
            customizations: self.customizations,
            special_instructions: self.special_instructions,
        }
    }
}

/// An order creation request as supplied by the calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: RestaurantId,
    pub customer_id: CustomerId,
    pub fulfillment: FulfillmentDetails,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub tip_amount: Money,
    #[serde(default)]
    pub promo_code_id: Option<PromoCodeId>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfillment_type_mapping() {
        let dine_in = FulfillmentDetails::DineIn {
            table_number: "7".to_string(),
        };
        assert_eq!(dine_in.fulfillment_type(), FulfillmentType::DineIn);

        let pickup = FulfillmentDetails::Pickup { pickup_time: None };
        assert_eq!(pickup.fulfillment_type(), FulfillmentType::Pickup);

        let delivery = FulfillmentDetails::Delivery {
            address_id: AddressId::new(),
        };
        assert_eq!(delivery.fulfillment_type(), FulfillmentType::Delivery);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let json = serde_json::json!({
            "restaurant_id": "7d7c69cf-8b52-4d7a-a91f-53f97b8e2a29",
            "customer_id": "a3f0b1a9-4d21-46c2-8f6e-9a5b1c2d3e4f",
            "fulfillment": { "type": "PICKUP" },
            "payment_method": "CARD",
            "items": [{
                "menu_item_id": "4b825dc6-42c8-4f9e-9df1-6f1a2b3c4d5e",
                "name": "Burger",
                "unit_price": 1000,
                "quantity": 2
            }]
        });

        let request: CreateOrderRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.tip_amount, Money::zero());
        assert!(request.promo_code_id.is_none());
        assert!(request.items[0].customizations.is_empty());
    }
}

//! The order lifecycle manager.

use chrono::{Duration, Utc};
use common::OrderId;
use domain::{
    Actor, Money, Order, OrderItem, OrderStatus, PaymentStatus, StatusHistoryEntry,
};
use order_store::{OrderDetails, OrderPage, OrderQuery, OrderStore, OrderTx, StatusUpdate};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::request::{CreateOrderRequest, FulfillmentDetails};

/// Orchestrates the order lifecycle against a transactional store.
///
/// Every mutating operation runs inside one store transaction: all of its
/// writes commit together or none do. The engine holds no locks of its
/// own; concurrent operations on the same order, menu item, promo code,
/// or customer are serialized by the store's row locking and atomic
/// relative counter adjustments.
pub struct OrderEngine<S: OrderStore> {
    store: S,
    config: EngineConfig,
}

impl<S: OrderStore> OrderEngine<S> {
    /// Creates a new engine over the given store.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Creates an order.
    ///
    /// One atomic transaction covers the order row, its line item
    /// snapshots, the initial `PENDING` history entry, the promo usage
    /// increment, the customer statistics increment, and the inventory
    /// decrements. A referenced entity that does not exist aborts the
    /// whole transaction; nothing partially commits.
    #[tracing::instrument(
        skip(self, request),
        fields(restaurant_id = %request.restaurant_id, customer_id = %request.customer_id)
    )]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderDetails> {
        let create_start = std::time::Instant::now();

        if request.items.is_empty() {
            return Err(EngineError::Validation(
                "order must contain at least one line item".to_string(),
            ));
        }
        if let Some(item) = request.items.iter().find(|i| i.quantity == 0) {
            return Err(EngineError::Validation(format!(
                "zero quantity for line item {:?}",
                item.name
            )));
        }
        if request.tip_amount.is_negative() {
            return Err(EngineError::Validation(
                "tip amount cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let fulfillment = request.fulfillment.fulfillment_type();

        let mut tx = self.store.begin().await?;

        let restaurant = tx
            .find_restaurant(request.restaurant_id)
            .await?
            .ok_or_else(|| EngineError::not_found("restaurant", request.restaurant_id))?;
        tx.find_customer(request.customer_id)
            .await?
            .ok_or_else(|| EngineError::not_found("customer", request.customer_id))?;

        // Verify every referenced menu item inside the transaction and
        // remember which ones carry tracked stock.
        let mut stock_decrements = Vec::new();
        for item in &request.items {
            let menu_item = tx
                .find_menu_item(item.menu_item_id)
                .await?
                .ok_or_else(|| EngineError::not_found("menu item", item.menu_item_id))?;
            if menu_item.restaurant_id != request.restaurant_id {
                return Err(EngineError::Validation(format!(
                    "menu item {} belongs to a different restaurant",
                    menu_item.id
                )));
            }
            if menu_item.track_inventory {
                stock_decrements.push((menu_item.id, item.quantity as i64));
            }
        }

        let mut table_number = None;
        let mut pickup_time = None;
        let mut delivery_address_id = None;
        let mut estimated_delivery_time = None;
        let mut delivery_fee = Money::zero();

        match &request.fulfillment {
            FulfillmentDetails::DineIn { table_number: table } => {
                table_number = Some(table.clone());
            }
            FulfillmentDetails::Pickup {
                pickup_time: requested,
            } => {
                pickup_time = *requested;
            }
            FulfillmentDetails::Delivery { address_id } => {
                let address = tx
                    .find_address(*address_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("delivery address", *address_id))?;
                if address.customer_id != request.customer_id {
                    return Err(EngineError::Validation(
                        "delivery address belongs to a different customer".to_string(),
                    ));
                }
                let zone = tx
                    .find_matching_zone(request.restaurant_id, &address.zip_code)
                    .await?
                    .ok_or_else(|| {
                        EngineError::Validation(format!(
                            "no delivery zone covers zip code {}",
                            address.zip_code
                        ))
                    })?;
                delivery_fee = zone.delivery_fee;
                delivery_address_id = Some(*address_id);
                estimated_delivery_time =
                    Some(now + Duration::minutes(self.config.estimated_delivery_minutes));
            }
        }

        let promo = match request.promo_code_id {
            Some(promo_id) => Some(
                tx.find_promo_code(promo_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("promo code", promo_id))?,
            ),
            None => None,
        };

        let items: Vec<OrderItem> = request
            .items
            .into_iter()
            .map(|item| item.into_order_item())
            .collect();

        let quote = domain::quote(
            &items,
            restaurant.tax_rate,
            restaurant.service_fee,
            delivery_fee,
            request.tip_amount,
            promo.as_ref(),
            now,
        );

        // An invalid promo prices to a silent zero discount; it also does
        // not count as applied, so its usage stays untouched and the order
        // carries no promo reference.
        let applied_promo = promo.filter(|p| p.is_valid_for(quote.subtotal, now));

        let sequence = tx
            .next_order_sequence(request.restaurant_id, now.date_naive())
            .await?;
        let order_number = domain::order_number::format(now.date_naive(), sequence);

        let order = Order {
            id: OrderId::new(),
            order_number,
            restaurant_id: request.restaurant_id,
            customer_id: request.customer_id,
            fulfillment,
            status: OrderStatus::Pending,
            payment_method: request.payment_method,
            payment_status: PaymentStatus::Pending,
            subtotal: quote.subtotal,
            tax_amount: quote.tax_amount,
            service_fee: quote.service_fee,
            delivery_fee: quote.delivery_fee,
            tip_amount: quote.tip_amount,
            discount_amount: quote.discount_amount,
            total_amount: quote.total_amount,
            table_number,
            pickup_time,
            delivery_address_id,
            estimated_delivery_time,
            actual_delivery_time: None,
            promo_code_id: applied_promo.as_ref().map(|p| p.id),
            special_instructions: request.special_instructions,
            created_at: now,
            updated_at: now,
        };

        tx.insert_order(&order).await?;
        tx.insert_order_items(order.id, &items).await?;
        tx.append_status_history(
            order.id,
            &StatusHistoryEntry::new(OrderStatus::Pending, None, Actor::System, now),
        )
        .await?;

        if let Some(promo) = &applied_promo {
            tx.increment_promo_usage(promo.id).await?;
        }
        tx.adjust_customer_stats(request.customer_id, 1, quote.total_amount)
            .await?;
        for (menu_item_id, quantity) in stock_decrements {
            tx.adjust_stock(menu_item_id, -quantity).await?;
        }

        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds")
            .record(create_start.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_cents = order.total_amount.cents(),
            "order created"
        );

        self.hydrate(order.id).await
    }

    /// Moves an order to a new status.
    ///
    /// Pure status plus audit update: one transaction writes the status
    /// (and `actual_delivery_time` when the new status is `DELIVERED`)
    /// and appends one history entry. Pricing and inventory are never
    /// touched here.
    #[tracing::instrument(skip(self, note, actor))]
    pub async fn transition_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        note: Option<String>,
        actor: Actor,
    ) -> Result<OrderDetails> {
        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let order = tx
            .find_order(order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("order", order_id))?;

        if !order.status.can_transition_to(new_status, order.fulfillment) {
            tracing::warn!(%order_id, from = %order.status, to = %new_status, "transition rejected");
            return Err(EngineError::InvalidTransition {
                from: order.status,
                to: new_status,
            });
        }

        tx.update_order_status(
            order_id,
            &StatusUpdate {
                status: new_status,
                payment_status: None,
                actual_delivery_time: (new_status == OrderStatus::Delivered).then_some(now),
                updated_at: now,
            },
        )
        .await?;
        tx.append_status_history(order_id, &StatusHistoryEntry::new(new_status, note, actor, now))
            .await?;
        tx.commit().await?;

        metrics::counter!("order_transitions_total", "to" => new_status.as_str()).increment(1);
        tracing::info!(%order_id, from = %order.status, to = %new_status, "order transitioned");

        self.hydrate(order_id).await
    }

    /// Cancels an order, reversing the creation side effects.
    ///
    /// Only `PENDING` and `ACCEPTED` orders are cancellable. One
    /// transaction sets the status to `CANCELLED`, flips a completed
    /// payment to `REFUNDED` (this only marks the ledger; the gateway
    /// refund is an external collaborator), restores inventory for every
    /// line item, decrements the customer's counters by the order total,
    /// and appends a `CANCELLED` history entry carrying the reason.
    #[tracing::instrument(skip(self, reason, actor))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        reason: impl Into<String>,
        actor: Actor,
    ) -> Result<OrderDetails> {
        let reason = reason.into();
        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let order = tx
            .find_order(order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("order", order_id))?;

        if !order.status.is_cancellable() {
            tracing::warn!(%order_id, status = %order.status, "cancellation rejected");
            return Err(EngineError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        tx.update_order_status(
            order_id,
            &StatusUpdate {
                status: OrderStatus::Cancelled,
                payment_status: (order.payment_status == PaymentStatus::Completed)
                    .then_some(PaymentStatus::Refunded),
                actual_delivery_time: None,
                updated_at: now,
            },
        )
        .await?;
        tx.append_status_history(
            order_id,
            &StatusHistoryEntry::new(OrderStatus::Cancelled, Some(reason), actor, now),
        )
        .await?;

        let items = tx.order_items(order_id).await?;
        for item in &items {
            if let Some(menu_item) = tx.find_menu_item(item.menu_item_id).await?
                && menu_item.track_inventory
            {
                tx.adjust_stock(menu_item.id, item.quantity as i64).await?;
            }
        }
        tx.adjust_customer_stats(order.customer_id, -1, -order.total_amount)
            .await?;

        tx.commit().await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");

        self.hydrate(order_id).await
    }

    /// Returns an order hydrated with its items, history, customer, promo
    /// code, and delivery address.
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails> {
        self.hydrate(order_id).await
    }

    /// Returns a page of orders matching the query, newest first.
    pub async fn query_orders(&self, query: &OrderQuery) -> Result<OrderPage> {
        Ok(self.store.query_orders(query).await?)
    }

    async fn hydrate(&self, order_id: OrderId) -> Result<OrderDetails> {
        self.store
            .load_order(order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("order", order_id))
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{AddressId, CustomerId, MenuItemId, OrderId, PromoCodeId, RestaurantId};
use domain::{
    Customer, DeliveryAddress, DeliveryZone, FulfillmentType, MenuItem, Money, Order, OrderItem,
    OrderStatus, PaymentStatus, PromoCode, Restaurant, StatusHistoryEntry,
};

use crate::Result;

/// The write set of a status transition or cancellation.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// An order hydrated with its owned records and referenced aggregates.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<StatusHistoryEntry>,
    pub customer: Customer,
    pub promo_code: Option<PromoCode>,
    pub delivery_address: Option<DeliveryAddress>,
}

/// Filters and pagination for the order list query.
#[derive(Debug, Clone)]
pub struct OrderQuery {
    pub restaurant_id: Option<RestaurantId>,
    /// Empty means any status.
    pub statuses: Vec<OrderStatus>,
    pub fulfillment: Option<FulfillmentType>,
    pub customer_id: Option<CustomerId>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// Matches the order number or the customer name/email,
    /// case-insensitively.
    pub search: Option<String>,
    /// 1-based page index.
    pub page: u32,
    pub page_size: u32,
}

impl OrderQuery {
    /// Creates an unfiltered query for the first page of 20 orders.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restaurant(mut self, id: RestaurantId) -> Self {
        self.restaurant_id = Some(id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        self.statuses.extend(statuses);
        self
    }

    pub fn fulfillment(mut self, fulfillment: FulfillmentType) -> Self {
        self.fulfillment = Some(fulfillment);
        self
    }

    pub fn customer(mut self, id: CustomerId) -> Self {
        self.customer_id = Some(id);
        self
    }

    pub fn created_from(mut self, from: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self
    }

    pub fn created_to(mut self, to: DateTime<Utc>) -> Self {
        self.created_to = Some(to);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Row offset for the configured page.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.page_size as u64
    }
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            restaurant_id: None,
            statuses: Vec::new(),
            fulfillment: None,
            customer_id: None,
            created_from: None,
            created_to: None,
            search: None,
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of query results, newest first.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Total matching rows across all pages.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl OrderPage {
    /// Number of pages at the current page size.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.page_size.max(1) as u64)
    }
}

/// The transactional store boundary consumed by the lifecycle engine.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Opens a transaction. Every write made through the returned
    /// [`OrderTx`] commits atomically on [`OrderTx::commit`]; dropping the
    /// transaction without committing rolls everything back.
    async fn begin(&self) -> Result<Box<dyn OrderTx>>;

    /// Loads an order hydrated with its items, history, customer, promo
    /// code, and delivery address. Returns `None` if the order doesn't
    /// exist. Read-only; uses the store's default isolation.
    async fn load_order(&self, id: OrderId) -> Result<Option<OrderDetails>>;

    /// Returns a page of orders matching the query, sorted newest first,
    /// with a total count for pagination metadata.
    async fn query_orders(&self, query: &OrderQuery) -> Result<OrderPage>;
}

/// A single atomic transaction against the order store.
///
/// Reads performed through the transaction see the isolation level of the
/// backing store (at least read-committed) and, for the order row, take a
/// write lock so concurrent transitions on the same order serialize.
/// Counter writes are expressed as relative adjustments so they stay
/// correct under concurrent transactions touching the same row.
#[async_trait]
pub trait OrderTx: Send {
    /// Finds an order and locks its row for the rest of the transaction.
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>>;

    /// Returns the line items of an order, in insertion order.
    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>>;

    async fn find_restaurant(&mut self, id: RestaurantId) -> Result<Option<Restaurant>>;

    async fn find_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>>;

    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>>;

    async fn find_promo_code(&mut self, id: PromoCodeId) -> Result<Option<PromoCode>>;

    async fn find_address(&mut self, id: AddressId) -> Result<Option<DeliveryAddress>>;

    /// Finds the delivery zone of a restaurant covering the given zip code.
    async fn find_matching_zone(
        &mut self,
        restaurant_id: RestaurantId,
        zip_code: &str,
    ) -> Result<Option<DeliveryZone>>;

    /// Atomically increments and returns the order sequence for the given
    /// restaurant and calendar day. The first call on a day returns 1.
    /// Because this runs inside the same transaction that inserts the
    /// order, two concurrent creations can never mint the same number.
    async fn next_order_sequence(
        &mut self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
    ) -> Result<u32>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    async fn insert_order_items(&mut self, order_id: OrderId, items: &[OrderItem]) -> Result<()>;

    async fn append_status_history(
        &mut self,
        order_id: OrderId,
        entry: &StatusHistoryEntry,
    ) -> Result<()>;

    async fn update_order_status(&mut self, order_id: OrderId, update: &StatusUpdate)
    -> Result<()>;

    /// Adjusts a menu item's stock by a relative delta, floor-clamped at
    /// zero. A decrement below zero leaves the stock at zero and does not
    /// fail.
    async fn adjust_stock(&mut self, id: MenuItemId, delta: i64) -> Result<()>;

    /// Adjusts a customer's order count and lifetime spend by relative
    /// deltas.
    async fn adjust_customer_stats(
        &mut self,
        id: CustomerId,
        order_delta: i64,
        spend_delta: Money,
    ) -> Result<()>;

    /// Increments a promo code's usage counter by one.
    async fn increment_promo_usage(&mut self, id: PromoCodeId) -> Result<()>;

    /// Commits the transaction. Not calling this rolls back every write.
    async fn commit(self: Box<Self>) -> Result<()>;
}

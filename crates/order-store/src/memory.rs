use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{AddressId, CustomerId, MenuItemId, OrderId, PromoCodeId, RestaurantId};
use domain::{
    Customer, DeliveryAddress, DeliveryZone, MenuItem, Money, Order, OrderItem, PromoCode,
    Restaurant, StatusHistoryEntry,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::store::{OrderDetails, OrderPage, OrderQuery, OrderStore, OrderTx, StatusUpdate};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
struct StoreState {
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderId, Vec<OrderItem>>,
    status_history: HashMap<OrderId, Vec<StatusHistoryEntry>>,
    restaurants: HashMap<RestaurantId, Restaurant>,
    menu_items: HashMap<MenuItemId, MenuItem>,
    customers: HashMap<CustomerId, Customer>,
    promo_codes: HashMap<PromoCodeId, PromoCode>,
    addresses: HashMap<AddressId, DeliveryAddress>,
    zones: Vec<DeliveryZone>,
    order_sequences: HashMap<(RestaurantId, NaiveDate), u32>,
    fail_on_adjust_stock: bool,
}

/// In-memory order store for tests.
///
/// Transactions take the store lock for their whole lifetime and mutate a
/// working copy of the state; commit swaps the copy back in, drop discards
/// it. That gives the same atomicity and serialization guarantees the
/// engine relies on from the SQL implementation, at the cost of fully
/// serialized transactions — fine for tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store so the next transaction's stock adjustment
    /// fails, for exercising rollback behavior.
    pub async fn set_fail_on_adjust_stock(&self, fail: bool) {
        self.state.lock().await.fail_on_adjust_stock = fail;
    }

    pub async fn seed_restaurant(&self, restaurant: Restaurant) {
        let mut state = self.state.lock().await;
        state.restaurants.insert(restaurant.id, restaurant);
    }

    pub async fn seed_customer(&self, customer: Customer) {
        let mut state = self.state.lock().await;
        state.customers.insert(customer.id, customer);
    }

    pub async fn seed_menu_item(&self, item: MenuItem) {
        let mut state = self.state.lock().await;
        state.menu_items.insert(item.id, item);
    }

    pub async fn seed_promo_code(&self, promo: PromoCode) {
        let mut state = self.state.lock().await;
        state.promo_codes.insert(promo.id, promo);
    }

    pub async fn seed_address(&self, address: DeliveryAddress) {
        let mut state = self.state.lock().await;
        state.addresses.insert(address.id, address);
    }

    pub async fn seed_zone(&self, zone: DeliveryZone) {
        self.state.lock().await.zones.push(zone);
    }

    /// Snapshot of a customer row, for assertions.
    pub async fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.state.lock().await.customers.get(&id).cloned()
    }

    /// Snapshot of a menu item row, for assertions.
    pub async fn menu_item(&self, id: MenuItemId) -> Option<MenuItem> {
        self.state.lock().await.menu_items.get(&id).cloned()
    }

    /// Snapshot of a promo code row, for assertions.
    pub async fn promo_code(&self, id: PromoCodeId) -> Option<PromoCode> {
        self.state.lock().await.promo_codes.get(&id).cloned()
    }

    /// Total number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Number of persisted history entries for an order.
    pub async fn history_len(&self, id: OrderId) -> usize {
        self.state
            .lock()
            .await
            .status_history
            .get(&id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn OrderTx>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }

    async fn load_order(&self, id: OrderId) -> Result<Option<OrderDetails>> {
        let state = self.state.lock().await;
        let Some(order) = state.orders.get(&id).cloned() else {
            return Ok(None);
        };

        let customer = state
            .customers
            .get(&order.customer_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::Backend(format!("customer row missing for order {id}"))
            })?;
        let promo_code = order
            .promo_code_id
            .and_then(|pid| state.promo_codes.get(&pid).cloned());
        let delivery_address = order
            .delivery_address_id
            .and_then(|aid| state.addresses.get(&aid).cloned());

        Ok(Some(OrderDetails {
            items: state.order_items.get(&id).cloned().unwrap_or_default(),
            history: state.status_history.get(&id).cloned().unwrap_or_default(),
            customer,
            promo_code,
            delivery_address,
            order,
        }))
    }

    async fn query_orders(&self, query: &OrderQuery) -> Result<OrderPage> {
        let state = self.state.lock().await;
        let search = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<&Order> = state
            .orders
            .values()
            .filter(|o| {
                if let Some(rid) = query.restaurant_id
                    && o.restaurant_id != rid
                {
                    return false;
                }
                if !query.statuses.is_empty() && !query.statuses.contains(&o.status) {
                    return false;
                }
                if let Some(f) = query.fulfillment
                    && o.fulfillment != f
                {
                    return false;
                }
                if let Some(cid) = query.customer_id
                    && o.customer_id != cid
                {
                    return false;
                }
                if let Some(from) = query.created_from
                    && o.created_at < from
                {
                    return false;
                }
                if let Some(to) = query.created_to
                    && o.created_at > to
                {
                    return false;
                }
                if let Some(ref term) = search {
                    let customer = state.customers.get(&o.customer_id);
                    let matches_customer = customer.is_some_and(|c| {
                        c.name.to_lowercase().contains(term)
                            || c.email.to_lowercase().contains(term)
                    });
                    if !o.order_number.to_lowercase().contains(term) && !matches_customer {
                        return false;
                    }
                }
                true
            })
            .collect();

        // Newest first; order number breaks creation-time ties.
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_number.cmp(&a.order_number))
        });

        let total = matches.len() as u64;
        let orders = matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .cloned()
            .collect();

        Ok(OrderPage {
            orders,
            total,
            page: query.page.max(1),
            page_size: query.page_size,
        })
    }
}

#[async_trait]
impl OrderTx for InMemoryTx {
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self.working.order_items.get(&id).cloned().unwrap_or_default())
    }

    async fn find_restaurant(&mut self, id: RestaurantId) -> Result<Option<Restaurant>> {
        Ok(self.working.restaurants.get(&id).cloned())
    }

    async fn find_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        Ok(self.working.menu_items.get(&id).cloned())
    }

    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.working.customers.get(&id).cloned())
    }

    async fn find_promo_code(&mut self, id: PromoCodeId) -> Result<Option<PromoCode>> {
        Ok(self.working.promo_codes.get(&id).cloned())
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<DeliveryAddress>> {
        Ok(self.working.addresses.get(&id).cloned())
    }

    async fn find_matching_zone(
        &mut self,
        restaurant_id: RestaurantId,
        zip_code: &str,
    ) -> Result<Option<DeliveryZone>> {
        Ok(self
            .working
            .zones
            .iter()
            .find(|z| z.restaurant_id == restaurant_id && z.covers(zip_code))
            .cloned())
    }

    async fn next_order_sequence(
        &mut self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
    ) -> Result<u32> {
        let counter = self
            .working
            .order_sequences
            .entry((restaurant_id, date))
            .or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.working.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_order_items(&mut self, order_id: OrderId, items: &[OrderItem]) -> Result<()> {
        self.working.order_items.insert(order_id, items.to_vec());
        Ok(())
    }

    async fn append_status_history(
        &mut self,
        order_id: OrderId,
        entry: &StatusHistoryEntry,
    ) -> Result<()> {
        self.working
            .status_history
            .entry(order_id)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn update_order_status(
        &mut self,
        order_id: OrderId,
        update: &StatusUpdate,
    ) -> Result<()> {
        let order = self.working.orders.get_mut(&order_id).ok_or_else(|| {
            StoreError::Backend(format!("update of nonexistent order {order_id}"))
        })?;
        order.status = update.status;
        if let Some(payment_status) = update.payment_status {
            order.payment_status = payment_status;
        }
        if let Some(delivered_at) = update.actual_delivery_time {
            order.actual_delivery_time = Some(delivered_at);
        }
        order.updated_at = update.updated_at;
        Ok(())
    }

    async fn adjust_stock(&mut self, id: MenuItemId, delta: i64) -> Result<()> {
        if self.working.fail_on_adjust_stock {
            return Err(StoreError::Backend(
                "injected stock adjustment failure".to_string(),
            ));
        }
        if let Some(item) = self.working.menu_items.get_mut(&id) {
            let current = item.stock_quantity.unwrap_or(0);
            item.stock_quantity = Some((current + delta).max(0));
        }
        Ok(())
    }

    async fn adjust_customer_stats(
        &mut self,
        id: CustomerId,
        order_delta: i64,
        spend_delta: Money,
    ) -> Result<()> {
        if let Some(customer) = self.working.customers.get_mut(&id) {
            customer.total_orders += order_delta;
            customer.total_spent += spend_delta;
        }
        Ok(())
    }

    async fn increment_promo_usage(&mut self, id: PromoCodeId) -> Result<()> {
        if let Some(promo) = self.working.promo_codes.get_mut(&id) {
            promo.usage_count += 1;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

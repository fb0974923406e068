use async_trait::async_trait;
use chrono::NaiveDate;
use common::{AddressId, CustomerId, MenuItemId, OrderId, PromoCodeId, RestaurantId};
use domain::{
    Actor, Customer, Customization, DeliveryAddress, DeliveryZone, FulfillmentType, MenuItem,
    Money, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, PromoCode, Restaurant,
    StatusHistoryEntry,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::store::{OrderDetails, OrderPage, OrderQuery, OrderStore, OrderTx, StatusUpdate};
use crate::{Result, StoreError};

const ORDER_COLUMNS: &str = "id, order_number, restaurant_id, customer_id, fulfillment, status, \
     payment_method, payment_status, subtotal, tax_amount, service_fee, delivery_fee, \
     tip_amount, discount_amount, total_amount, table_number, pickup_time, delivery_address_id, \
     estimated_delivery_time, actual_delivery_time, promo_code_id, special_instructions, \
     created_at, updated_at";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Inserts a restaurant row, used to provision catalog data.
    pub async fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<()> {
        sqlx::query(
            "INSERT INTO restaurants (id, name, tax_rate, service_fee) VALUES ($1, $2, $3, $4)",
        )
        .bind(restaurant.id.as_uuid())
        .bind(&restaurant.name)
        .bind(restaurant.tax_rate)
        .bind(restaurant.service_fee.cents())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a customer row.
    pub async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, total_orders, total_spent) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.total_orders)
        .bind(customer.total_spent.cents())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a menu item row.
    pub async fn insert_menu_item(&self, item: &MenuItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO menu_items (id, restaurant_id, name, price, track_inventory, stock_quantity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.id.as_uuid())
        .bind(item.restaurant_id.as_uuid())
        .bind(&item.name)
        .bind(item.price.cents())
        .bind(item.track_inventory)
        .bind(item.stock_quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a promo code row.
    pub async fn insert_promo_code(&self, promo: &PromoCode) -> Result<()> {
        let discount = serde_json::to_value(&promo.discount)?;
        sqlx::query(
            "INSERT INTO promo_codes \
             (id, code, discount, min_order_value, valid_from, valid_until, usage_limit, usage_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(promo.id.as_uuid())
        .bind(&promo.code)
        .bind(discount)
        .bind(promo.min_order_value.cents())
        .bind(promo.valid_from)
        .bind(promo.valid_until)
        .bind(promo.usage_limit.map(|l| l as i32))
        .bind(promo.usage_count as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a delivery address row.
    pub async fn insert_address(&self, address: &DeliveryAddress) -> Result<()> {
        sqlx::query(
            "INSERT INTO delivery_addresses (id, customer_id, street, city, zip_code) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(address.id.as_uuid())
        .bind(address.customer_id.as_uuid())
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.zip_code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a delivery zone row.
    pub async fn insert_zone(&self, zone: &DeliveryZone) -> Result<()> {
        sqlx::query(
            "INSERT INTO delivery_zones (restaurant_id, name, zip_codes, delivery_fee) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(zone.restaurant_id.as_uuid())
        .bind(&zone.name)
        .bind(&zone.zip_codes)
        .bind(zone.delivery_fee.cents())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

fn bad_enum(column: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("unknown {column} value {value:?}"))
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    let fulfillment: String = row.try_get("fulfillment")?;
    let status: String = row.try_get("status")?;
    let payment_method: String = row.try_get("payment_method")?;
    let payment_status: String = row.try_get("payment_status")?;

    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_number: row.try_get("order_number")?,
        restaurant_id: RestaurantId::from_uuid(row.try_get::<Uuid, _>("restaurant_id")?),
        customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        fulfillment: FulfillmentType::parse(&fulfillment)
            .ok_or_else(|| bad_enum("fulfillment", &fulfillment))?,
        status: OrderStatus::parse(&status).ok_or_else(|| bad_enum("status", &status))?,
        payment_method: PaymentMethod::parse(&payment_method)
            .ok_or_else(|| bad_enum("payment_method", &payment_method))?,
        payment_status: PaymentStatus::parse(&payment_status)
            .ok_or_else(|| bad_enum("payment_status", &payment_status))?,
        subtotal: Money::from_cents(row.try_get("subtotal")?),
        tax_amount: Money::from_cents(row.try_get("tax_amount")?),
        service_fee: Money::from_cents(row.try_get("service_fee")?),
        delivery_fee: Money::from_cents(row.try_get("delivery_fee")?),
        tip_amount: Money::from_cents(row.try_get("tip_amount")?),
        discount_amount: Money::from_cents(row.try_get("discount_amount")?),
        total_amount: Money::from_cents(row.try_get("total_amount")?),
        table_number: row.try_get("table_number")?,
        pickup_time: row.try_get("pickup_time")?,
        delivery_address_id: row
            .try_get::<Option<Uuid>, _>("delivery_address_id")?
            .map(AddressId::from_uuid),
        estimated_delivery_time: row.try_get("estimated_delivery_time")?,
        actual_delivery_time: row.try_get("actual_delivery_time")?,
        promo_code_id: row
            .try_get::<Option<Uuid>, _>("promo_code_id")?
            .map(PromoCodeId::from_uuid),
        special_instructions: row.try_get("special_instructions")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_item(row: &PgRow) -> Result<OrderItem> {
    let customizations: serde_json::Value = row.try_get("customizations")?;
    let customizations: Vec<Customization> = serde_json::from_value(customizations)?;

    Ok(OrderItem {
        menu_item_id: MenuItemId::from_uuid(row.try_get::<Uuid, _>("menu_item_id")?),
        name: row.try_get("name")?,
        unit_price: Money::from_cents(row.try_get("unit_price")?),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        customizations,
        special_instructions: row.try_get("special_instructions")?,
    })
}

fn row_to_history(row: &PgRow) -> Result<StatusHistoryEntry> {
    let status: String = row.try_get("status")?;
    let actor: String = row.try_get("actor")?;

    Ok(StatusHistoryEntry {
        status: OrderStatus::parse(&status).ok_or_else(|| bad_enum("status", &status))?,
        note: row.try_get("note")?,
        actor: Actor::parse(&actor),
        changed_at: row.try_get("changed_at")?,
    })
}

fn row_to_customer(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        total_orders: row.try_get("total_orders")?,
        total_spent: Money::from_cents(row.try_get("total_spent")?),
    })
}

fn row_to_restaurant(row: &PgRow) -> Result<Restaurant> {
    Ok(Restaurant {
        id: RestaurantId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        tax_rate: row.try_get("tax_rate")?,
        service_fee: Money::from_cents(row.try_get("service_fee")?),
    })
}

fn row_to_menu_item(row: &PgRow) -> Result<MenuItem> {
    Ok(MenuItem {
        id: MenuItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        restaurant_id: RestaurantId::from_uuid(row.try_get::<Uuid, _>("restaurant_id")?),
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price")?),
        track_inventory: row.try_get("track_inventory")?,
        stock_quantity: row.try_get("stock_quantity")?,
    })
}

fn row_to_promo(row: &PgRow) -> Result<PromoCode> {
    let discount: serde_json::Value = row.try_get("discount")?;

    Ok(PromoCode {
        id: PromoCodeId::from_uuid(row.try_get::<Uuid, _>("id")?),
        code: row.try_get("code")?,
        discount: serde_json::from_value(discount)?,
        min_order_value: Money::from_cents(row.try_get("min_order_value")?),
        valid_from: row.try_get("valid_from")?,
        valid_until: row.try_get("valid_until")?,
        usage_limit: row.try_get::<Option<i32>, _>("usage_limit")?.map(|l| l as u32),
        usage_count: row.try_get::<i32, _>("usage_count")? as u32,
    })
}

fn row_to_address(row: &PgRow) -> Result<DeliveryAddress> {
    Ok(DeliveryAddress {
        id: AddressId::from_uuid(row.try_get::<Uuid, _>("id")?),
        customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
        street: row.try_get("street")?,
        city: row.try_get("city")?,
        zip_code: row.try_get("zip_code")?,
    })
}

fn row_to_zone(row: &PgRow) -> Result<DeliveryZone> {
    Ok(DeliveryZone {
        restaurant_id: RestaurantId::from_uuid(row.try_get::<Uuid, _>("restaurant_id")?),
        name: row.try_get("name")?,
        zip_codes: row.try_get("zip_codes")?,
        delivery_fee: Money::from_cents(row.try_get("delivery_fee")?),
    })
}

/// Appends the query's filter conditions to `sql`, numbering bind
/// parameters from 1, and returns the number of parameters used. The
/// caller must bind values in the same order.
fn push_query_filters(sql: &mut String, query: &OrderQuery) -> usize {
    let mut param_count = 0;

    if query.restaurant_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.restaurant_id = ${param_count}"));
    }
    if !query.statuses.is_empty() {
        param_count += 1;
        sql.push_str(&format!(" AND o.status = ANY(${param_count})"));
    }
    if query.fulfillment.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.fulfillment = ${param_count}"));
    }
    if query.customer_id.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.customer_id = ${param_count}"));
    }
    if query.created_from.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.created_at >= ${param_count}"));
    }
    if query.created_to.is_some() {
        param_count += 1;
        sql.push_str(&format!(" AND o.created_at <= ${param_count}"));
    }
    if query.search.is_some() {
        param_count += 1;
        sql.push_str(&format!(
            " AND (o.order_number ILIKE ${param_count} OR c.name ILIKE ${param_count} \
             OR c.email ILIKE ${param_count})"
        ));
    }

    param_count
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn OrderTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTx { tx }))
    }

    #[tracing::instrument(skip_all, fields(order_id = %id))]
    async fn load_order(&self, id: OrderId) -> Result<Option<OrderDetails>> {
        let order_row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        let Some(order_row) = order_row else {
            return Ok(None);
        };
        let order = row_to_order(&order_row)?;

        let item_rows = sqlx::query(
            "SELECT menu_item_id, name, unit_price, quantity, customizations, special_instructions \
             FROM order_items WHERE order_id = $1 ORDER BY position ASC",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let items = item_rows.iter().map(row_to_item).collect::<Result<_>>()?;

        let history_rows = sqlx::query(
            "SELECT status, note, actor, changed_at FROM order_status_history \
             WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let history = history_rows.iter().map(row_to_history).collect::<Result<_>>()?;

        let customer_row = sqlx::query(
            "SELECT id, name, email, total_orders, total_spent FROM customers WHERE id = $1",
        )
        .bind(order.customer_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        let customer = row_to_customer(&customer_row)?;

        let promo_code = match order.promo_code_id {
            Some(promo_id) => sqlx::query(
                "SELECT id, code, discount, min_order_value, valid_from, valid_until, \
                 usage_limit, usage_count FROM promo_codes WHERE id = $1",
            )
            .bind(promo_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row_to_promo(&row))
            .transpose()?,
            None => None,
        };

        let delivery_address = match order.delivery_address_id {
            Some(address_id) => sqlx::query(
                "SELECT id, customer_id, street, city, zip_code \
                 FROM delivery_addresses WHERE id = $1",
            )
            .bind(address_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row_to_address(&row))
            .transpose()?,
            None => None,
        };

        Ok(Some(OrderDetails {
            order,
            items,
            history,
            customer,
            promo_code,
            delivery_address,
        }))
    }

    #[tracing::instrument(skip_all, fields(page = query.page, page_size = query.page_size))]
    async fn query_orders(&self, query: &OrderQuery) -> Result<OrderPage> {
        let statuses: Vec<String> = query
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        let search_pattern = query.search.as_ref().map(|term| format!("%{term}%"));

        let mut count_sql = String::from(
            "SELECT COUNT(*) FROM orders o JOIN customers c ON c.id = o.customer_id WHERE 1=1",
        );
        push_query_filters(&mut count_sql, query);

        let count_query = {
            let mut q = sqlx::query_scalar::<_, i64>(&count_sql);
            if let Some(id) = query.restaurant_id {
                q = q.bind(id.as_uuid());
            }
            if !statuses.is_empty() {
                q = q.bind(&statuses);
            }
            if let Some(fulfillment) = query.fulfillment {
                q = q.bind(fulfillment.as_str());
            }
            if let Some(id) = query.customer_id {
                q = q.bind(id.as_uuid());
            }
            if let Some(from) = query.created_from {
                q = q.bind(from);
            }
            if let Some(to) = query.created_to {
                q = q.bind(to);
            }
            if let Some(ref pattern) = search_pattern {
                q = q.bind(pattern);
            }
            q
        };
        let total = count_query.fetch_one(&self.pool).await?;

        let mut page_sql = format!(
            "SELECT {} FROM orders o JOIN customers c ON c.id = o.customer_id WHERE 1=1",
            ORDER_COLUMNS
                .split(", ")
                .map(|col| format!("o.{col}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let param_count = push_query_filters(&mut page_sql, query);
        page_sql.push_str(&format!(
            " ORDER BY o.created_at DESC, o.order_number DESC LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        ));

        let rows_query = sqlx::query(&page_sql);
        let rows_query = {
            // Same filter binds as the count query, then limit and offset.
            let mut q = rows_query;
            if let Some(id) = query.restaurant_id {
                q = q.bind(id.as_uuid());
            }
            if !statuses.is_empty() {
                q = q.bind(&statuses);
            }
            if let Some(fulfillment) = query.fulfillment {
                q = q.bind(fulfillment.as_str());
            }
            if let Some(id) = query.customer_id {
                q = q.bind(id.as_uuid());
            }
            if let Some(from) = query.created_from {
                q = q.bind(from);
            }
            if let Some(to) = query.created_to {
                q = q.bind(to);
            }
            if let Some(ref pattern) = search_pattern {
                q = q.bind(pattern);
            }
            q.bind(query.page_size as i64).bind(query.offset() as i64)
        };

        let rows = rows_query.fetch_all(&self.pool).await?;
        let orders = rows.iter().map(row_to_order).collect::<Result<_>>()?;

        Ok(OrderPage {
            orders,
            total: total as u64,
            page: query.page.max(1),
            page_size: query.page_size,
        })
    }
}

#[async_trait]
impl OrderTx for PostgresTx {
    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row_to_order(&row)).transpose()
    }

    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT menu_item_id, name, unit_price, quantity, customizations, special_instructions \
             FROM order_items WHERE order_id = $1 ORDER BY position ASC",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn find_restaurant(&mut self, id: RestaurantId) -> Result<Option<Restaurant>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, name, tax_rate, service_fee FROM restaurants WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await?;

        row.map(|row| row_to_restaurant(&row)).transpose()
    }

    async fn find_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT id, restaurant_id, name, price, track_inventory, stock_quantity \
             FROM menu_items WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row_to_menu_item(&row)).transpose()
    }

    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT id, name, email, total_orders, total_spent FROM customers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row_to_customer(&row)).transpose()
    }

    async fn find_promo_code(&mut self, id: PromoCodeId) -> Result<Option<PromoCode>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT id, code, discount, min_order_value, valid_from, valid_until, \
             usage_limit, usage_count FROM promo_codes WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row_to_promo(&row)).transpose()
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<DeliveryAddress>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT id, customer_id, street, city, zip_code FROM delivery_addresses WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row_to_address(&row)).transpose()
    }

    async fn find_matching_zone(
        &mut self,
        restaurant_id: RestaurantId,
        zip_code: &str,
    ) -> Result<Option<DeliveryZone>> {
        let row: Option<PgRow> = sqlx::query(
            "SELECT restaurant_id, name, zip_codes, delivery_fee FROM delivery_zones \
             WHERE restaurant_id = $1 AND $2 = ANY(zip_codes) ORDER BY id ASC LIMIT 1",
        )
        .bind(restaurant_id.as_uuid())
        .bind(zip_code)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| row_to_zone(&row)).transpose()
    }

    async fn next_order_sequence(
        &mut self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
    ) -> Result<u32> {
        // Increment-and-read in one statement: the upsert takes a row lock,
        // so two concurrent creations can never observe the same value.
        let last_value: i32 = sqlx::query_scalar(
            "INSERT INTO order_sequences (restaurant_id, order_date, last_value) \
             VALUES ($1, $2, 1) \
             ON CONFLICT (restaurant_id, order_date) \
             DO UPDATE SET last_value = order_sequences.last_value + 1 \
             RETURNING last_value",
        )
        .bind(restaurant_id.as_uuid())
        .bind(date)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(last_value as u32)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24)"
        ))
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.restaurant_id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.fulfillment.as_str())
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.subtotal.cents())
        .bind(order.tax_amount.cents())
        .bind(order.service_fee.cents())
        .bind(order.delivery_fee.cents())
        .bind(order.tip_amount.cents())
        .bind(order.discount_amount.cents())
        .bind(order.total_amount.cents())
        .bind(&order.table_number)
        .bind(order.pickup_time)
        .bind(order.delivery_address_id.map(|a| a.as_uuid()))
        .bind(order.estimated_delivery_time)
        .bind(order.actual_delivery_time)
        .bind(order.promo_code_id.map(|p| p.as_uuid()))
        .bind(&order.special_instructions)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_order_items(&mut self, order_id: OrderId, items: &[OrderItem]) -> Result<()> {
        for (position, item) in items.iter().enumerate() {
            let customizations = serde_json::to_value(&item.customizations)?;
            sqlx::query(
                "INSERT INTO order_items \
                 (order_id, position, menu_item_id, name, unit_price, quantity, \
                 customizations, special_instructions) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(order_id.as_uuid())
            .bind(position as i32)
            .bind(item.menu_item_id.as_uuid())
            .bind(&item.name)
            .bind(item.unit_price.cents())
            .bind(item.quantity as i32)
            .bind(customizations)
            .bind(&item.special_instructions)
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    async fn append_status_history(
        &mut self,
        order_id: OrderId,
        entry: &StatusHistoryEntry,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO order_status_history (order_id, status, note, actor, changed_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id.as_uuid())
        .bind(entry.status.as_str())
        .bind(&entry.note)
        .bind(entry.actor.as_str())
        .bind(entry.changed_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_order_status(
        &mut self,
        order_id: OrderId,
        update: &StatusUpdate,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET \
             status = $2, \
             payment_status = COALESCE($3, payment_status), \
             actual_delivery_time = COALESCE($4, actual_delivery_time), \
             updated_at = $5 \
             WHERE id = $1",
        )
        .bind(order_id.as_uuid())
        .bind(update.status.as_str())
        .bind(update.payment_status.map(|s| s.as_str()))
        .bind(update.actual_delivery_time)
        .bind(update.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn adjust_stock(&mut self, id: MenuItemId, delta: i64) -> Result<()> {
        // Floor-clamped at zero: an oversold decrement leaves zero stock
        // rather than failing the order.
        sqlx::query(
            "UPDATE menu_items \
             SET stock_quantity = GREATEST(0, COALESCE(stock_quantity, 0) + $2) \
             WHERE id = $1 AND track_inventory",
        )
        .bind(id.as_uuid())
        .bind(delta)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn adjust_customer_stats(
        &mut self,
        id: CustomerId,
        order_delta: i64,
        spend_delta: Money,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE customers SET total_orders = total_orders + $2, \
             total_spent = total_spent + $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(order_delta)
        .bind(spend_delta.cents())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn increment_promo_usage(&mut self, id: PromoCodeId) -> Result<()> {
        sqlx::query("UPDATE promo_codes SET usage_count = usage_count + 1 WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

//! Postgres order store: pool setup, migrations, and row mapping.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{OrderStore, StoreError};
use crate::types::order::{
    DeliveryType, GeoPoint, Order, OrderItem, OrderStatus, PaymentStatus,
};

/// Create a pool from `DATABASE_URL` and run migrations.
pub async fn create_pool_and_migrate(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    restaurant_id: Uuid,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    status: String,
    payment_status: String,
    transaction_id: Option<String>,
    delivery_location: Option<Json<GeoPoint>>,
    delivery_address: Option<String>,
    delivery_type: String,
    special_instructions: Option<String>,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, user_id, restaurant_id, items, total_amount, status, \
     payment_status, transaction_id, delivery_location, delivery_address, delivery_type, \
     special_instructions, payment_method, created_at";

fn row_to_order(row: OrderRow) -> Result<Order, StoreError> {
    let status = OrderStatus::from_str(&row.status)
        .ok_or_else(|| StoreError::Backend(format!("invalid status '{}' for order {}", row.status, row.id)))?;
    let payment_status = PaymentStatus::from_str(&row.payment_status).ok_or_else(|| {
        StoreError::Backend(format!(
            "invalid payment status '{}' for order {}",
            row.payment_status, row.id
        ))
    })?;
    let delivery_type = DeliveryType::from_str(&row.delivery_type).ok_or_else(|| {
        StoreError::Backend(format!(
            "invalid delivery type '{}' for order {}",
            row.delivery_type, row.id
        ))
    })?;
    Ok(Order {
        id: row.id,
        user_id: row.user_id,
        restaurant_id: row.restaurant_id,
        items: row.items.0,
        total_amount: row.total_amount,
        status,
        payment_status,
        transaction_id: row.transaction_id,
        delivery_location: row.delivery_location.map(|loc| loc.0),
        delivery_address: row.delivery_address,
        delivery_type,
        special_instructions: row.special_instructions,
        payment_method: row.payment_method,
        created_at: row.created_at,
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, restaurant_id, items, total_amount, status, \
             payment_status, transaction_id, delivery_location, delivery_address, delivery_type, \
             special_instructions, payment_method, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.restaurant_id)
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(&order.transaction_id)
        .bind(order.delivery_location.as_ref().map(Json))
        .bind(&order.delivery_address)
        .bind(order.delivery_type.as_str())
        .bind(&order.special_instructions)
        .bind(&order.payment_method)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_order).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_order).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE orders SET status = $1 WHERE id = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_order).transpose()
    }
}

//! Order lifecycle controller: validated creation and transition-checked
//! status updates, with the "order ready" event emitted on entry to ready.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::events::{EventPublisher, PublishError};
use crate::store::{OrderStore, StoreError};
use crate::types::order::{
    DeliveryType, GeoPoint, Order, OrderItem, OrderStatus, PaymentStatus,
};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("order not found")]
    NotFound,
    #[error("invalid status '{0}'")]
    InvalidStatus(String),
    #[error("cannot transition from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    /// The status change is committed; only the event emission failed.
    #[error("order {} is ready but the event was not published: {source}", order.id)]
    NotificationFailed { order: Box<Order>, source: PublishError },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create-order payload. A caller-supplied status field is ignored; every
/// order starts pending.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderRequest {
    pub restaurant_id: Option<Uuid>,
    pub items: Vec<ItemPayload>,
    pub total_amount: Option<Decimal>,
    pub delivery_location: Option<GeoPoint>,
    pub delivery_address: Option<String>,
    pub delivery_type: Option<DeliveryType>,
    pub special_instructions: Option<String>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
}

/// Line-item payload, kept loose so validation can itemize per-field errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ItemPayload {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Decimal>,
}

pub struct OrderLifecycle {
    store: Arc<dyn OrderStore>,
    publisher: Arc<dyn EventPublisher>,
    /// When set, any status in the enumerated set is accepted regardless of
    /// the current one (manual override mode).
    allow_status_override: bool,
}

impl OrderLifecycle {
    pub fn new(
        store: Arc<dyn OrderStore>,
        publisher: Arc<dyn EventPublisher>,
        allow_status_override: bool,
    ) -> Self {
        Self { store, publisher, allow_status_override }
    }

    pub async fn create_order(
        &self,
        user_id: Uuid,
        req: CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        let mut errors = Vec::new();
        if req.restaurant_id.is_none() {
            errors.push("restaurantId is required".to_string());
        }
        if req.items.is_empty() {
            errors.push("items must contain at least one item".to_string());
        }
        for (i, item) in req.items.iter().enumerate() {
            if item.name.as_deref().is_none_or(str::is_empty) {
                errors.push(format!("items[{i}].name is required"));
            }
            if item.quantity.is_none_or(|q| !(1..=i64::from(u32::MAX)).contains(&q)) {
                errors.push(format!("items[{i}].quantity must be a positive integer"));
            }
            if item.price.is_none_or(|p| p < Decimal::ZERO) {
                errors.push(format!("items[{i}].price must be a non-negative number"));
            }
        }
        match req.total_amount {
            None => errors.push("totalAmount is required".to_string()),
            Some(total) if total < Decimal::ZERO => {
                errors.push("totalAmount must be non-negative".to_string())
            }
            Some(_) => {}
        }
        if let Some(location) = &req.delivery_location {
            errors.extend(location.validation_errors());
        }
        let (restaurant_id, total_amount) =
            match (req.restaurant_id, req.total_amount, errors.is_empty()) {
                (Some(restaurant_id), Some(total_amount), true) => (restaurant_id, total_amount),
                _ => return Err(OrderError::Validation(errors)),
            };
        let items = req
            .items
            .into_iter()
            .filter_map(|item| {
                Some(OrderItem {
                    name: item.name?,
                    quantity: u32::try_from(item.quantity?).ok()?,
                    price: item.price?,
                })
            })
            .collect();

        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            restaurant_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            transaction_id: req.transaction_id,
            delivery_location: req.delivery_location,
            delivery_address: req.delivery_address,
            delivery_type: req.delivery_type.unwrap_or_default(),
            special_instructions: req.special_instructions,
            payment_method: req.payment_method,
            created_at: Utc::now(),
        };
        self.store.insert(&order).await?;
        tracing::info!(order_id = %order.id, restaurant_id = %order.restaurant_id, "order created");
        Ok(order)
    }

    /// Validate and apply a status transition. The bearer token is passed
    /// through to the event payload unmodified, not re-validated here.
    pub async fn update_status(
        &self,
        order_id: Uuid,
        requested: &str,
        bearer: &str,
    ) -> Result<Order, OrderError> {
        let status = OrderStatus::from_str(requested)
            .ok_or_else(|| OrderError::InvalidStatus(requested.to_string()))?;

        let current = self.store.get(order_id).await?.ok_or(OrderError::NotFound)?;
        if !self.allow_status_override && !current.status.can_transition_to(status) {
            return Err(OrderError::InvalidTransition { from: current.status, to: status });
        }

        // Blind conditional update: no version token, concurrent writers race
        // and the last write wins.
        let updated = self
            .store
            .update_status(order_id, status)
            .await?
            .ok_or(OrderError::NotFound)?;
        tracing::info!(%order_id, status = %status, "order status updated");

        if status == OrderStatus::Ready {
            if let Err(source) = self.publisher.publish_order_ready(&updated, bearer).await {
                tracing::warn!(
                    %order_id,
                    error = %source,
                    "order is ready but event publication failed; status stays committed"
                );
                return Err(OrderError::NotificationFailed { order: Box::new(updated), source });
            }
        }
        Ok(updated)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.store.get(order_id).await?.ok_or(OrderError::NotFound)
    }

    pub async fn orders_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_user(user_id).await?)
    }

    pub async fn orders_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_by_restaurant(restaurant_id).await?)
    }
}

//! HTTP surface: router, shared state, and request handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::sse::stream_order_status;
use crate::delivery::DeliveryLookup;
use crate::enrichment::EnrichmentClient;
use crate::lifecycle::{CreateOrderRequest, OrderError, OrderLifecycle};
use crate::metrics::{self, Pagination};
use crate::store::OrderStore;
use crate::types::order::{Order, OrderStatus};

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<OrderLifecycle>,
    pub store: Arc<dyn OrderStore>,
    pub delivery: Arc<dyn DeliveryLookup>,
    pub enrichment: Arc<EnrichmentClient>,
    pub jwt_secret: Vec<u8>,
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/orders", post(create_order))
        .route("/api/orders/{order_id}", get(get_order))
        .route("/api/orders/user/{user_id}", get(get_orders_by_user))
        .route("/api/orders/restaurant/{restaurant_id}", get(get_orders_by_restaurant))
        .route("/api/orders/restaurant/{restaurant_id}/metrics", get(restaurant_metrics))
        .route("/api/orders/{order_id}/status/{status}", put(update_order_status))
        .route("/api/orders/{order_id}/stream", get(stream_order_status))
        .with_state(state)
}

async fn health() -> &'static str {
    "healthy"
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            OrderError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, json!({ "errors": errors }))
            }
            err @ OrderError::InvalidStatus(_) => {
                (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
            }
            OrderError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "order not found" })),
            err @ OrderError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
            }
            // The transition is committed; return the updated order so the
            // caller can see the state it now holds.
            OrderError::NotificationFailed { order, source } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": format!("order status updated but notification failed: {source}"),
                    "order": order,
                }),
            ),
            OrderError::Store(e) => {
                tracing::error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal storage error" }))
            }
        };
        (status, Json(body)).into_response()
    }
}

async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, OrderError> {
    let order = state.lifecycle.create_order(auth.user_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Order created successfully", "order": order })),
    ))
}

async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderError> {
    let order = state.lifecycle.get_order(order_id).await?;
    let enriched = state.enrichment.enrich(order, &auth.token).await;
    Ok(Json(json!({ "order": enriched })))
}

async fn get_orders_by_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderError> {
    let orders = state.lifecycle.orders_by_user(user_id).await?;
    let enriched = state.enrichment.enrich_all(orders, &auth.token).await;
    Ok(Json(json!({ "orders": enriched })))
}

async fn get_orders_by_restaurant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderError> {
    let orders = state.lifecycle.orders_by_restaurant(restaurant_id).await?;
    let enriched = state.enrichment.enrich_all(orders, &auth.token).await;
    Ok(Json(json!({ "orders": enriched })))
}

async fn update_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((order_id, status)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, OrderError> {
    let order = state
        .lifecycle
        .update_status(order_id, &status, &auth.token)
        .await?;
    Ok(Json(json!({ "message": "Order status updated", "order": order })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MetricsQuery {
    status: Option<String>,
    page: u32,
    limit: u32,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl Default for MetricsQuery {
    fn default() -> Self {
        Self { status: None, page: 1, limit: 50, start_date: None, end_date: None }
    }
}

async fn restaurant_metrics(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(restaurant_id): Path<Uuid>,
    Query(query): Query<MetricsQuery>,
) -> Result<impl IntoResponse, OrderError> {
    let status_filter = match &query.status {
        Some(s) => {
            Some(OrderStatus::from_str(s).ok_or_else(|| OrderError::InvalidStatus(s.clone()))?)
        }
        None => None,
    };

    let in_window: Vec<Order> = state
        .lifecycle
        .orders_by_restaurant(restaurant_id)
        .await?
        .into_iter()
        .filter(|o| {
            query.start_date.is_none_or(|start| o.created_at >= start)
                && query.end_date.is_none_or(|end| o.created_at <= end)
        })
        .collect();

    // Metrics cover the whole window; the status filter only narrows the
    // order listing.
    let metrics = metrics::aggregate(&in_window);

    let listed: Vec<Order> = in_window
        .into_iter()
        .filter(|o| status_filter.is_none_or(|s| o.status == s))
        .collect();
    let total_orders = listed.len() as u64;
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 200);
    let page_orders: Vec<Order> = listed
        .into_iter()
        .skip((page as usize - 1) * limit as usize)
        .take(limit as usize)
        .collect();
    let orders = state.enrichment.enrich_all(page_orders, &auth.token).await;

    Ok(Json(json!({
        "metrics": metrics,
        "orders": orders,
        "pagination": Pagination { page, limit, total_orders },
    })))
}

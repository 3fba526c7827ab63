//! "Order ready" event emission to the message broker.
//!
//! At-least-once: the transition is committed before publication, so a failed
//! publish surfaces to the caller while the status stays changed. Consumers
//! dedupe on order id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::types::order::{DeliveryType, GeoPoint, Order, OrderItem};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("broker transport error: {0}")]
    Transport(String),
    #[error("broker rejected event with status {0}")]
    Rejected(u16),
}

/// Outbound channel for the single "order ready" event type. Built once at
/// startup and injected into the lifecycle controller; must be safe for
/// concurrent use by multiple in-flight transitions.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_order_ready(&self, order: &Order, bearer: &str) -> Result<(), PublishError>;
}

/// Normalized payload handed to the broker. Carries the caller's bearer
/// token so the dispatch consumer can authorize its own follow-up calls.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderReadyEvent<'a> {
    order_id: Uuid,
    user_id: Uuid,
    restaurant_id: Uuid,
    items: &'a [OrderItem],
    total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery_address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery_location: Option<&'a GeoPoint>,
    delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    special_instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_method: Option<&'a str>,
    created_at: DateTime<Utc>,
    token: &'a str,
}

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);
// Bounded exponential backoff between attempts; after the last delay the
// publish fails fast and the caller decides whether to retry out of band.
const RETRY_DELAYS: [Duration; 2] = [Duration::from_millis(250), Duration::from_millis(500)];

/// Publishes to an HTTP topic endpoint (`{broker_url}/topics/{topic}`) over a
/// shared client whose connection pool is reused by every publish.
pub struct HttpBrokerPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBrokerPublisher {
    pub fn new(broker_url: &str, topic: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/topics/{}", broker_url.trim_end_matches('/'), topic),
        }
    }
}

#[async_trait]
impl EventPublisher for HttpBrokerPublisher {
    async fn publish_order_ready(&self, order: &Order, bearer: &str) -> Result<(), PublishError> {
        let event = OrderReadyEvent {
            order_id: order.id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            items: &order.items,
            total_amount: order.total_amount,
            delivery_address: order.delivery_address.as_deref(),
            delivery_location: order.delivery_location.as_ref(),
            delivery_type: order.delivery_type,
            special_instructions: order.special_instructions.as_deref(),
            payment_method: order.payment_method.as_deref(),
            created_at: order.created_at,
            token: bearer,
        };

        let mut attempt = 0;
        loop {
            let result = self
                .client
                .post(&self.endpoint)
                .timeout(PUBLISH_TIMEOUT)
                .json(&event)
                .send()
                .await;

            let error = match result {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(order_id = %order.id, "order-ready event published");
                    return Ok(());
                }
                // 5xx is treated as transient, anything else 4xx is final.
                Ok(resp) if resp.status().is_server_error() => {
                    PublishError::Rejected(resp.status().as_u16())
                }
                Ok(resp) => return Err(PublishError::Rejected(resp.status().as_u16())),
                Err(e) => PublishError::Transport(e.to_string()),
            };

            if attempt < RETRY_DELAYS.len() {
                tracing::warn!(
                    order_id = %order.id,
                    attempt = attempt + 1,
                    error = %error,
                    "broker send failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAYS[attempt]).await;
                attempt += 1;
            } else {
                return Err(error);
            }
        }
    }
}

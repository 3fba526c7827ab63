//! Delivery-status lookup for completed orders.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

const LOOKUP_TIMEOUT: Duration = Duration::from_millis(2500);

/// Collaborator answering "where is this order's delivery?". Returns `None`
/// when it cannot answer in time; the streaming layer substitutes a default.
#[async_trait]
pub trait DeliveryLookup: Send + Sync {
    async fn delivery_status(&self, order_id: Uuid, bearer: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct DeliveryStatusResponse {
    status: Option<String>,
}

pub struct HttpDeliveryLookup {
    client: reqwest::Client,
    base: String,
}

impl HttpDeliveryLookup {
    pub fn new(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DeliveryLookup for HttpDeliveryLookup {
    async fn delivery_status(&self, order_id: Uuid, bearer: &str) -> Option<String> {
        let url = format!("{}/api/deliveries/order/{}/status", self.base, order_id);
        let resp = self
            .client
            .get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            tracing::debug!(%order_id, status = resp.status().as_u16(), "delivery lookup non-2xx");
            return None;
        }
        resp.json::<DeliveryStatusResponse>().await.ok()?.status
    }
}

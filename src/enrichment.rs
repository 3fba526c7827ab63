//! Order enrichment: user and restaurant summaries from peer services.
//!
//! Peer failures never fail the caller. Each lookup independently falls back
//! to an `Unknown Customer` / `Unknown Restaurant` placeholder on timeout,
//! non-2xx, or transport error.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::types::order::Order;

const LOOKUP_TIMEOUT: Duration = Duration::from_millis(2500);

pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
pub const UNKNOWN_RESTAURANT: &str = "Unknown Restaurant";

/// Human-readable summary of a user or restaurant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySummary {
    pub id: Uuid,
    pub name: String,
}

/// Order decorated with peer summaries. The id references stay on the inner
/// order; `user` and `restaurant` carry the resolved names.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub user: PartySummary,
    pub restaurant: PartySummary,
}

#[derive(Debug, Deserialize)]
struct PeerProfile {
    name: Option<String>,
}

pub struct EnrichmentClient {
    client: reqwest::Client,
    user_base: String,
    restaurant_base: String,
}

impl EnrichmentClient {
    pub fn new(user_base: &str, restaurant_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_base: user_base.trim_end_matches('/').to_string(),
            restaurant_base: restaurant_base.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_name(&self, url: String, bearer: &str) -> Option<String> {
        let resp = self
            .client
            .get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json::<PeerProfile>().await.ok()?.name
    }

    pub async fn user_summary(&self, id: Uuid, bearer: &str) -> PartySummary {
        let url = format!("{}/api/auth/{}", self.user_base, id);
        match self.fetch_name(url, bearer).await {
            Some(name) => PartySummary { id, name },
            None => {
                tracing::debug!(user_id = %id, "user lookup failed, substituting placeholder");
                PartySummary { id, name: UNKNOWN_CUSTOMER.to_string() }
            }
        }
    }

    pub async fn restaurant_summary(&self, id: Uuid, bearer: &str) -> PartySummary {
        let url = format!("{}/api/restaurants/{}", self.restaurant_base, id);
        match self.fetch_name(url, bearer).await {
            Some(name) => PartySummary { id, name },
            None => {
                tracing::debug!(restaurant_id = %id, "restaurant lookup failed, substituting placeholder");
                PartySummary { id, name: UNKNOWN_RESTAURANT.to_string() }
            }
        }
    }

    /// Both lookups run concurrently; neither can fail the enrichment.
    pub async fn enrich(&self, order: Order, bearer: &str) -> EnrichedOrder {
        let (user, restaurant) = tokio::join!(
            self.user_summary(order.user_id, bearer),
            self.restaurant_summary(order.restaurant_id, bearer),
        );
        EnrichedOrder { order, user, restaurant }
    }

    /// Enrich a list; lookups for different orders run concurrently and the
    /// output order matches the input order.
    pub async fn enrich_all(&self, orders: Vec<Order>, bearer: &str) -> Vec<EnrichedOrder> {
        futures::future::join_all(orders.into_iter().map(|o| self.enrich(o, bearer))).await
    }
}

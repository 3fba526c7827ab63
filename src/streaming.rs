//! Per-connection status streaming.
//!
//! Timer-driven polling: one frame immediately on open, then one per poll
//! interval until the consumer drops the stream. Dropping the stream cancels
//! the interval with it, so no timer outlives a disconnected client. A failed
//! tick produces an error-shaped frame and the loop keeps polling; only the
//! consumer ends the stream.

use futures::Stream;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::delivery::DeliveryLookup;
use crate::store::OrderStore;
use crate::types::order::OrderStatus;

/// Cadence of status frames on an open connection.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Cadence of keep-alive comments, to defeat idle-connection timeouts in
/// intermediate proxies.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Substituted when the delivery collaborator cannot answer in time.
pub const DEFAULT_DELIVERY_STATUS: &str = "pending";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusFrame {
    #[serde(rename_all = "camelCase")]
    Status {
        order_status: OrderStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        delivery_status: Option<String>,
    },
    Error { error: String },
}

/// One status frame per tick for `order_id`, first tick immediate.
pub fn status_frames(
    store: Arc<dyn OrderStore>,
    delivery: Arc<dyn DeliveryLookup>,
    order_id: Uuid,
    bearer: String,
    period: Duration,
) -> impl Stream<Item = StatusFrame> {
    async_stream::stream! {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            yield next_frame(&*store, &*delivery, order_id, &bearer).await;
        }
    }
}

async fn next_frame(
    store: &dyn OrderStore,
    delivery: &dyn DeliveryLookup,
    order_id: Uuid,
    bearer: &str,
) -> StatusFrame {
    match store.get(order_id).await {
        Ok(Some(order)) => {
            // Delivery status only matters once the restaurant side is done;
            // a slow or failing collaborator degrades to the default.
            let delivery_status = if order.status == OrderStatus::Completed {
                Some(
                    delivery
                        .delivery_status(order_id, bearer)
                        .await
                        .unwrap_or_else(|| DEFAULT_DELIVERY_STATUS.to_string()),
                )
            } else {
                None
            };
            StatusFrame::Status { order_status: order.status, delivery_status }
        }
        Ok(None) => StatusFrame::Error { error: format!("order {order_id} not found") },
        Err(e) => {
            tracing::warn!(%order_id, error = %e, "status fetch failed, emitting error frame");
            StatusFrame::Error { error: e.to_string() }
        }
    }
}

//! SSE endpoint for live order status.
//!
//! The frame stream is owned by the response; when the client disconnects
//! axum drops it, which cancels the poll timer with it.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::routes::AppState;
use crate::streaming::{self, status_frames};

pub async fn stream_order_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let frames = status_frames(
        state.store.clone(),
        state.delivery.clone(),
        order_id,
        auth.token,
        streaming::POLL_INTERVAL,
    );
    let events = frames.map(|frame| {
        let event = match serde_json::to_string(&frame) {
            Ok(data) => Event::default().data(data),
            Err(e) => Event::default().data(format!("{{\"error\":\"serialization failed: {e}\"}}")),
        };
        Ok(event)
    });
    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(streaming::KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

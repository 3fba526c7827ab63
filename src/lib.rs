//! Order-lifecycle coordinator for a food-delivery platform: owns order
//! records, advances their status through a fixed workflow, enriches them
//! with peer-service data, and propagates changes to the dispatch broker and
//! to live status-streaming clients.

pub mod api;
pub mod delivery;
pub mod enrichment;
pub mod events;
pub mod lifecycle;
pub mod metrics;
pub mod store;
pub mod streaming;
pub mod types;

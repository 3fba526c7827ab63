//! Order storage: trait plus Postgres and in-memory backends.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::types::order::{Order, OrderStatus};

mod memory;
mod postgres;

pub use memory::MemoryOrderStore;
pub use postgres::{PgOrderStore, create_pool_and_migrate, run_migrations};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable keyed storage for orders. The backend provides its own internal
/// concurrency safety; status updates are blind conditional writes (succeed
/// only if the order still exists, last write wins).
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Orders for a user, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Orders for a restaurant, newest first.
    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>, StoreError>;

    /// Conditional status update: returns the updated order, or `None` if no
    /// order exists for `id`.
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;
}

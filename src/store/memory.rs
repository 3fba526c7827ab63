//! In-memory order store: tests and local runs without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{OrderStore, StoreError};
use crate::types::order::{Order, OrderStatus};

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let guard = self.orders.read().await;
        Ok(newest_first(
            guard.values().filter(|o| o.user_id == user_id).cloned().collect(),
        ))
    }

    async fn list_by_restaurant(&self, restaurant_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let guard = self.orders.read().await;
        Ok(newest_first(
            guard
                .values()
                .filter(|o| o.restaurant_id == restaurant_id)
                .cloned()
                .collect(),
        ))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut guard = self.orders.write().await;
        Ok(guard.get_mut(&id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }
}

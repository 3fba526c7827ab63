//! Lifecycle controller tests: forced-pending creation, itemized validation,
//! the transition table, and the ready-event side effect.

use async_trait::async_trait;
use order_service::events::{EventPublisher, PublishError};
use order_service::lifecycle::{CreateOrderRequest, ItemPayload, OrderError, OrderLifecycle};
use order_service::store::{MemoryOrderStore, OrderStore};
use order_service::types::order::{DeliveryType, GeoPoint, Order, OrderStatus, PaymentStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

struct RecordingPublisher {
    published: Mutex<Vec<Uuid>>,
    fail: AtomicBool,
}

impl RecordingPublisher {
    fn new() -> Arc<Self> {
        Arc::new(Self { published: Mutex::new(Vec::new()), fail: AtomicBool::new(false) })
    }

    fn published(&self) -> Vec<Uuid> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_order_ready(&self, order: &Order, _bearer: &str) -> Result<(), PublishError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PublishError::Transport("broker down".to_string()));
        }
        self.published.lock().unwrap().push(order.id);
        Ok(())
    }
}

fn controller(
    allow_override: bool,
) -> (Arc<MemoryOrderStore>, Arc<RecordingPublisher>, OrderLifecycle) {
    let store = Arc::new(MemoryOrderStore::new());
    let publisher = RecordingPublisher::new();
    let lifecycle = OrderLifecycle::new(store.clone(), publisher.clone(), allow_override);
    (store, publisher, lifecycle)
}

fn valid_request() -> CreateOrderRequest {
    CreateOrderRequest {
        restaurant_id: Some(Uuid::new_v4()),
        items: vec![ItemPayload {
            name: Some("Burger".to_string()),
            quantity: Some(2),
            price: Some("5.5".parse().unwrap()),
        }],
        total_amount: Some("11.0".parse().unwrap()),
        delivery_location: Some(GeoPoint { kind: "Point".to_string(), coordinates: vec![79.86, 6.93] }),
        ..Default::default()
    }
}

async fn order_in_status(
    lifecycle: &OrderLifecycle,
    target: OrderStatus,
) -> Order {
    let order = lifecycle.create_order(Uuid::new_v4(), valid_request()).await.unwrap();
    let path: &[OrderStatus] = match target {
        OrderStatus::Pending => &[],
        OrderStatus::Accepted => &[OrderStatus::Accepted],
        OrderStatus::Preparing => &[OrderStatus::Accepted, OrderStatus::Preparing],
        _ => &[OrderStatus::Accepted, OrderStatus::Preparing, OrderStatus::Ready],
    };
    let mut current = order;
    for step in path {
        current = lifecycle
            .update_status(current.id, step.as_str(), "token")
            .await
            .unwrap();
    }
    current
}

#[tokio::test]
async fn created_order_is_pending_with_defaults() {
    let (store, _publisher, lifecycle) = controller(false);
    let order = lifecycle.create_order(Uuid::new_v4(), valid_request()).await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.delivery_type, DeliveryType::Delivery);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total_amount, "11.0".parse().unwrap());

    let stored = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored, order);
}

#[tokio::test]
async fn create_rejects_missing_required_fields() {
    let (_store, _publisher, lifecycle) = controller(false);
    let err = lifecycle
        .create_order(Uuid::new_v4(), CreateOrderRequest::default())
        .await
        .unwrap_err();
    let OrderError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.iter().any(|e| e.contains("restaurantId")));
    assert!(errors.iter().any(|e| e.contains("at least one item")));
    assert!(errors.iter().any(|e| e.contains("totalAmount")));
}

#[tokio::test]
async fn create_itemizes_item_and_location_errors() {
    let (_store, _publisher, lifecycle) = controller(false);
    let req = CreateOrderRequest {
        restaurant_id: Some(Uuid::new_v4()),
        items: vec![
            ItemPayload { name: None, quantity: Some(0), price: Some("-1".parse().unwrap()) },
            ItemPayload {
                name: Some("Fries".to_string()),
                quantity: Some(1),
                price: Some("2.0".parse().unwrap()),
            },
        ],
        total_amount: Some("2.0".parse().unwrap()),
        delivery_location: Some(GeoPoint { kind: "Polygon".to_string(), coordinates: vec![1.0] }),
        ..Default::default()
    };
    let err = lifecycle.create_order(Uuid::new_v4(), req).await.unwrap_err();
    let OrderError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.iter().any(|e| e.contains("items[0].name")));
    assert!(errors.iter().any(|e| e.contains("items[0].quantity")));
    assert!(errors.iter().any(|e| e.contains("items[0].price")));
    assert!(errors.iter().any(|e| e.contains("deliveryLocation.type")));
    assert!(errors.iter().any(|e| e.contains("deliveryLocation.coordinates")));
    assert!(!errors.iter().any(|e| e.contains("items[1]")));
}

#[tokio::test]
async fn update_with_unrecognized_status_fails_and_leaves_order_unchanged() {
    let (store, publisher, lifecycle) = controller(false);
    let order = lifecycle.create_order(Uuid::new_v4(), valid_request()).await.unwrap();

    let err = lifecycle.update_status(order.id, "shipped", "token").await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidStatus(_)));

    let stored = store.get(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn update_unknown_order_is_not_found() {
    let (_store, _publisher, lifecycle) = controller(false);
    let err = lifecycle
        .update_status(Uuid::new_v4(), "accepted", "token")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound));
}

#[tokio::test]
async fn happy_path_reaches_completed_and_publishes_once() {
    let (store, publisher, lifecycle) = controller(false);
    let ready = order_in_status(&lifecycle, OrderStatus::Ready).await;
    assert_eq!(ready.status, OrderStatus::Ready);
    assert_eq!(publisher.published(), vec![ready.id]);

    let done = lifecycle.update_status(ready.id, "completed", "token").await.unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
    // Completion does not publish again.
    assert_eq!(publisher.published(), vec![ready.id]);
    assert_eq!(store.get(ready.id).await.unwrap().unwrap().status, OrderStatus::Completed);
}

#[tokio::test]
async fn disallowed_jump_is_rejected_without_side_effects() {
    let (store, publisher, lifecycle) = controller(false);
    let order = lifecycle.create_order(Uuid::new_v4(), valid_request()).await.unwrap();

    let err = lifecycle.update_status(order.id, "ready", "token").await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition { from: OrderStatus::Pending, to: OrderStatus::Ready }
    ));
    assert_eq!(store.get(order.id).await.unwrap().unwrap().status, OrderStatus::Pending);
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn ready_order_cannot_be_cancelled() {
    let (_store, _publisher, lifecycle) = controller(false);
    let ready = order_in_status(&lifecycle, OrderStatus::Ready).await;
    let err = lifecycle.update_status(ready.id, "cancelled", "token").await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn publish_failure_surfaces_but_status_stays_committed() {
    let (store, publisher, lifecycle) = controller(false);
    let preparing = order_in_status(&lifecycle, OrderStatus::Preparing).await;
    publisher.fail.store(true, Ordering::SeqCst);

    let err = lifecycle.update_status(preparing.id, "ready", "token").await.unwrap_err();
    let OrderError::NotificationFailed { order, .. } = err else {
        panic!("expected notification failure");
    };
    assert_eq!(order.status, OrderStatus::Ready);
    // The transition is not rolled back.
    assert_eq!(store.get(preparing.id).await.unwrap().unwrap().status, OrderStatus::Ready);
}

#[tokio::test]
async fn override_mode_accepts_any_status_in_the_set() {
    let (store, publisher, lifecycle) = controller(true);
    let order = lifecycle.create_order(Uuid::new_v4(), valid_request()).await.unwrap();

    // Straight to ready, then back to pending: both allowed under override.
    lifecycle.update_status(order.id, "ready", "token").await.unwrap();
    lifecycle.update_status(order.id, "pending", "token").await.unwrap();
    lifecycle.update_status(order.id, "ready", "token").await.unwrap();
    assert_eq!(store.get(order.id).await.unwrap().unwrap().status, OrderStatus::Ready);

    // Re-entering ready emits a duplicate event; consumers dedupe on order id.
    assert_eq!(publisher.published(), vec![order.id, order.id]);

    let err = lifecycle.update_status(order.id, "shipped", "token").await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidStatus(_)));
}

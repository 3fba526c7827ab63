use std::env;
use std::sync::Arc;

use order_service::api::routes::{AppState, app_router};
use order_service::delivery::HttpDeliveryLookup;
use order_service::enrichment::EnrichmentClient;
use order_service::events::HttpBrokerPublisher;
use order_service::lifecycle::OrderLifecycle;
use order_service::store::{MemoryOrderStore, OrderStore, PgOrderStore, create_pool_and_migrate};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store: Arc<dyn OrderStore> = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = create_pool_and_migrate(&database_url)
                .await
                .expect("database connection and migrations");
            tracing::info!("connected to Postgres");
            Arc::new(PgOrderStore::new(pool))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory order store");
            Arc::new(MemoryOrderStore::new())
        }
    };

    // The broker connection is owned here and injected into the controller;
    // every in-flight transition shares the same client.
    let publisher = Arc::new(HttpBrokerPublisher::new(
        &env_or("BROKER_URL", "http://localhost:8082"),
        &env_or("ORDER_READY_TOPIC", "order-ready"),
    ));
    let allow_status_override = env_or("ALLOW_STATUS_OVERRIDE", "false") == "true";
    let lifecycle = Arc::new(OrderLifecycle::new(
        store.clone(),
        publisher,
        allow_status_override,
    ));

    let state = AppState {
        lifecycle,
        store,
        delivery: Arc::new(HttpDeliveryLookup::new(&env_or(
            "DELIVERY_SERVICE_URL",
            "http://localhost:5003",
        ))),
        enrichment: Arc::new(EnrichmentClient::new(
            &env_or("USER_SERVICE_URL", "http://localhost:5000"),
            &env_or("RESTAURANT_SERVICE_URL", "http://localhost:5001"),
        )),
        jwt_secret: env_or("JWT_SECRET", "dev-secret").into_bytes(),
    };

    let port = env_or("PORT", "7000");
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("bind listener");
    tracing::info!(%addr, "order service listening");
    axum::serve(listener, app_router(state)).await.expect("server");
}

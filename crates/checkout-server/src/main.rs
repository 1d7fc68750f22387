//! checkout-flow HTTP Server
//!
//! Axum-based server exposing the setup, capture and order stages as a
//! JSON API and serving the WASM frontend from `static/`.

mod handlers;
mod state;

use std::{sync::Arc, time::Duration};

use axum::{routing::{get, post}, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_core::{CheckoutFlow, CommerceProvider, FlowConfig, MemorySessionStore, TokenizationProvider};
use checkout_payments::{
    CommerceClient, MockCommerce, MockTokenizer, TokenizationClient, TokenizationConfig,
};

use crate::handlers::{
    add_payment_method, capture_card, confirm_verification, create_session, get_order,
    health_check, list_payment_methods, select_payment_method, submit_order,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before anything reads it
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let use_mocks = std::env::var("CHECKOUT_MOCK_PROVIDERS")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    let tokenization = TokenizationConfig::from_env();
    let environment = tokenization.environment.as_str();

    // Initialize providers
    let (commerce, tokenizer): (Arc<dyn CommerceProvider>, Arc<dyn TokenizationProvider>) = if use_mocks {
        tracing::warn!("⚠ Using in-memory mock providers - no real payments");
        (Arc::new(MockCommerce::new()), Arc::new(MockTokenizer::new()))
    } else {
        let commerce = CommerceClient::from_env()?;
        let tokenizer = TokenizationClient::from_config(tokenization)?;
        tracing::info!("✓ Commerce and tokenization providers configured");
        (Arc::new(commerce), Arc::new(tokenizer))
    };

    let mut config = FlowConfig::default();
    if let Ok(entity_id) = std::env::var("CHECKOUT_ENTITY_ID") {
        config.entity_id = entity_id;
    }
    tracing::info!(entity_id = %config.entity_id, environment, "Checkout flow configured");

    // Build application state
    let state = AppState {
        flow: Arc::new(CheckoutFlow::new(commerce, tokenizer, config)),
        sessions: Arc::new(MemorySessionStore::new()),
        environment,
    };

    let session_ttl = session_ttl()?;
    state.spawn_session_sweeper(session_ttl);
    tracing::info!(ttl_mins = session_ttl.as_secs() / 60, "Idle sessions expire");

    let app = router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 checkout server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                      - Health check");
    tracing::info!("  POST /api/session                 - Start checkout, fetch credentials");
    tracing::info!("  POST /api/checkout/card           - Tokenize and capture a card");
    tracing::info!("  POST /api/checkout/verify         - Confirm a pending intent");
    tracing::info!("  GET  /api/payment-methods         - List saved payment methods");
    tracing::info!("  POST /api/payment-methods         - Add a payment method");
    tracing::info!("  POST /api/payment-methods/select  - Use a saved payment method");
    tracing::info!("  GET  /api/order                   - Order page state");
    tracing::info!("  POST /api/order                   - Create and pay an order");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Idle lifetime of a checkout session, `CHECKOUT_SESSION_TTL_MINS` (default 30)
fn session_ttl() -> anyhow::Result<Duration> {
    let minutes = match std::env::var("CHECKOUT_SESSION_TTL_MINS") {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| anyhow::anyhow!("CHECKOUT_SESSION_TTL_MINS must be a positive number of minutes"))?,
        Err(_) => 30,
    };
    Ok(Duration::from_secs(minutes * 60))
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))

        // Stage 1
        .route("/api/session", post(create_session))

        // Stage 2
        .route("/api/checkout/card", post(capture_card))
        .route("/api/checkout/verify", post(confirm_verification))
        .route("/api/payment-methods", get(list_payment_methods).post(add_payment_method))
        .route("/api/payment-methods/select", post(select_payment_method))

        // Stage 3
        .route("/api/order", get(get_order).post(submit_order))

        // Static files (WASM frontend)
        .fallback_service(ServeDir::new("static"))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

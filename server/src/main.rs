//! FlowSchool HTTP server.
//!
//! Wires the PostgreSQL store, the Razorpay gateway and the router together,
//! runs migrations on startup and serves until interrupted.

mod config;

use crate::config::Config;
use flowschool_core::config::PaymentConfig;
use flowschool_core::gateway::{PaymentGateway, RazorpayGateway};
use flowschool_postgres::PostgresStore;
use flowschool_web::{build_router, AppState};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flowschool=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting FlowSchool server");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .connect(&config.postgres.url)
        .await?;
    info!("Database connected");

    let store = Arc::new(PostgresStore::new(pool));
    store.migrate().await?;
    info!("Migrations applied");

    let gateway: Arc<dyn PaymentGateway> = Arc::new(RazorpayGateway::new(
        config.razorpay.key_id.clone(),
        config.razorpay.key_secret.clone(),
    ));
    let payment = PaymentConfig::new(config.razorpay.key_id, config.razorpay.key_secret)
        .with_amount_minor(config.razorpay.amount_minor)
        .with_currency(config.razorpay.currency);

    let app = build_router(AppState::new(store, gateway, payment));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

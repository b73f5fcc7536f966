use auth_kit::JwtKeys;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use rent_payments_rs::config::{Config, StoreType};
use rent_payments_rs::directory::{Directory, MemoryDirectory, PgDirectory};
use rent_payments_rs::ledger::{MemoryLedger, PaymentLedger, PgLedger};
use rent_payments_rs::processor::StripeClient;
use rent_payments_rs::{db, payments_router, telemetry, AppState, PaymentProcessor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let cfg = Config::from_env()?;
    tracing::info!(store_type = ?cfg.store_type, "config loaded");

    let (ledger, directory): (Arc<dyn PaymentLedger>, Arc<dyn Directory>) = match cfg.store_type
    {
        StoreType::Postgres => {
            let url = cfg.database_url.as_deref().ok_or("DATABASE_URL must be set")?;
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("db connected + migrations applied");
            (
                Arc::new(PgLedger::new(pool.clone())),
                Arc::new(PgDirectory::new(pool)),
            )
        }
        StoreType::InMemory => {
            tracing::warn!("using in-memory ledger; records are lost on restart");
            (Arc::new(MemoryLedger::new()), Arc::new(MemoryDirectory::new()))
        }
    };

    let processor: Arc<dyn PaymentProcessor> = Arc::new(StripeClient::new(cfg.stripe.clone())?);
    let jwt = JwtKeys::from_secret(cfg.jwt_secret.as_bytes());

    let state = AppState::new(ledger, directory, processor, cfg.payments.clone(), jwt)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = payments_router(state).layer(cors);

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "rent payments service listening");
    axum::serve(listener, app).await?;

    Ok(())
}

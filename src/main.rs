use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use payment_callbacks::adapters::{
    callback_router, CallbackAppState, InMemoryIdempotencyLedger, InMemoryOrderBook,
    PostgresIdempotencyLedger, TracingAnomalyReporter,
};
use payment_callbacks::application::{OrderDispatcher, ProcessCallbackHandler};
use payment_callbacks::config::{AppConfig, DatabaseConfig, LedgerConfig};
use payment_callbacks::domain::foundation::Timestamp;
use payment_callbacks::domain::payment::{CallbackVerifier, MissingTokenPolicy, Provider};
use payment_callbacks::ports::IdempotencyLedger;
use payment_callbacks::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.server);
    config.validate()?;

    let keys = config.verification_keys();
    if keys.xendit_webhook_token.is_none()
        && keys.xendit_missing_token_policy == MissingTokenPolicy::AcceptUnverified
    {
        tracing::warn!("Xendit webhooks will be accepted without signature verification");
    }

    let ledger = build_ledger(&config.database, config.ledger.claim_ttl()).await?;
    spawn_ledger_cleanup(ledger.clone(), config.ledger.clone());

    let dispatcher = Arc::new(OrderDispatcher::new(
        Arc::new(InMemoryOrderBook::new()),
        config.dispatch.policy(),
    ));

    let mut processor = ProcessCallbackHandler::new(
        Arc::new(CallbackVerifier::new(keys)),
        ledger,
        dispatcher,
        Arc::new(TracingAnomalyReporter::new()),
    );
    if let Some(allowlist) = config.duitku.source_allowlist() {
        tracing::info!(
            trust_forwarded_for = config.duitku.trust_forwarded_for,
            "Duitku source allow-list enabled"
        );
        processor = processor.with_source_allowlist(Provider::Duitku, allowlist);
    }

    let state = CallbackAppState::new(Arc::new(processor), config.duitku.merchant_code.clone());
    let app = callback_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Callback server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn build_ledger(
    database: &DatabaseConfig,
    claim_ttl: Duration,
) -> Result<Arc<dyn IdempotencyLedger>, Box<dyn std::error::Error>> {
    let url = match database.url() {
        Some(url) => url,
        None => {
            tracing::warn!("No database configured, idempotency ledger is process-local");
            return Ok(Arc::new(InMemoryIdempotencyLedger::new().with_claim_ttl(claim_ttl)));
        }
    };

    let pool = PgPoolOptions::new()
        .min_connections(database.min_connections)
        .max_connections(database.max_connections)
        .acquire_timeout(database.acquire_timeout())
        .idle_timeout(database.idle_timeout())
        .max_lifetime(database.max_lifetime())
        .connect(url)
        .await?;

    if database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    tracing::info!("Using PostgreSQL idempotency ledger");
    Ok(Arc::new(PostgresIdempotencyLedger::new(pool).with_claim_ttl(claim_ttl)))
}

fn spawn_ledger_cleanup(ledger: Arc<dyn IdempotencyLedger>, config: LedgerConfig) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.cleanup_interval());
        loop {
            interval.tick().await;
            let cutoff = Timestamp::now().minus_days(i64::from(config.retention_days));
            match ledger.delete_before(cutoff).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "Expired idempotency records removed"),
                Err(err) => tracing::error!(error = %err, "Idempotency ledger cleanup failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

use clap::Parser;
use lms_webhooks::config::Config;
use lms_webhooks::domain::ports::{CheckoutSessionsRef, Repository};
use lms_webhooks::infrastructure::checkout::StripeCheckoutClient;
use lms_webhooks::infrastructure::in_memory::InMemoryStore;
use lms_webhooks::infrastructure::seed::Seed;
use lms_webhooks::interfaces::http::signature::{StripeSignature, SvixSignature};
use lms_webhooks::interfaces::http::{AppState, router};
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lms_webhooks=info,tower_http=info")),
        )
        .init();

    let config = Config::parse();

    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &config.db_path {
        // Use persistent storage (RocksDB)
        let store = lms_webhooks::infrastructure::rocksdb::RocksDBStore::open(db_path)
            .into_diagnostic()?;
        info!(path = %db_path.display(), "Using RocksDB storage");
        return serve(config, store).await;
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if config.db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }

    serve(config, InMemoryStore::new()).await
}

async fn serve<S: Repository>(config: Config, store: S) -> Result<()> {
    if let Some(seed) = &config.seed {
        Seed::from_path(seed)
            .into_diagnostic()?
            .apply(&store)
            .await
            .into_diagnostic()?;
    }

    let sessions: CheckoutSessionsRef = Arc::new(
        StripeCheckoutClient::new(
            config.stripe_api_base.clone(),
            config.stripe_secret_key.clone(),
            Duration::from_secs(config.stripe_timeout_secs),
        )
        .into_diagnostic()?,
    );
    let state = Arc::new(AppState::new(
        store,
        sessions,
        StripeSignature::new(
            config.stripe_webhook_secret.clone(),
            config.signature_tolerance_secs,
        ),
        SvixSignature::new(&config.clerk_webhook_secret, config.signature_tolerance_secs)
            .into_diagnostic()?,
    ));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await.into_diagnostic()?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

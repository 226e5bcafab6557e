//! Firehose router - selects, normalizes and enriches platform telemetry
//!
//! Reads newline-delimited JSON envelopes from stdin, forwards the selected
//! kinds as flat records to the configured log sink and serves an
//! operational HTTP API alongside.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::mpsc;

use firehose_router::{
    api::{ApiState, HealthState, HealthStatus, ROUTER_COMPONENT, SOURCE_COMPONENT},
    cache::{AppDirectory, EmptyAppDirectory, FileAppDirectory, InMemoryAppCache},
    config::Config,
    error::Result,
    logging,
    routing::{EventRouter, EventSelector},
    sink::create_sink,
    source::read_envelopes,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Validate configuration
    config.validate()?;

    // Initialize logging/tracing
    logging::init_tracing(&config.server)?;

    config.log_config();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting firehose router");

    let selector = EventSelector::default();
    tracing::info!(
        authorized = %selector.list_authorized_kinds(),
        "Authorized event kinds"
    );
    let selection = selector.select(&config.routing.events);
    tracing::info!(selected = ?selection.names(), "Forwarding event kinds");

    // App metadata cache, optionally backed by a directory file
    let (directory, known_apps) = match config.directory.file_path() {
        Some(path) => {
            let directory = FileAppDirectory::new(path);
            let apps = directory.load_all().await?;
            tracing::info!(path, apps = apps.len(), "Loaded app directory");
            (Arc::new(directory) as Arc<dyn AppDirectory>, apps)
        },
        None => (Arc::new(EmptyAppDirectory) as Arc<dyn AppDirectory>, HashMap::new()),
    };
    let cache = Arc::new(InMemoryAppCache::new(directory, config.directory.retry_policy()));
    cache.preload(known_apps).await;

    let sink = create_sink(config.sink.format()?);
    let router = EventRouter::new(selection.clone(), cache, sink);
    let health = Arc::new(HealthState::new());

    // Envelope source
    let (sender, receiver) = mpsc::channel(config.routing.envelope_buffer_size);
    let source_health = health.clone();
    let source = tokio::spawn(async move {
        source_health
            .update_component(SOURCE_COMPONENT, HealthStatus::Healthy, None)
            .await;

        match read_envelopes(BufReader::new(tokio::io::stdin()), sender).await {
            Ok(forwarded) => {
                tracing::info!(forwarded, "Envelope stream ended");
                source_health
                    .update_component(
                        SOURCE_COMPONENT,
                        HealthStatus::Degraded,
                        Some("End of input".to_string()),
                    )
                    .await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Envelope source failed");
                source_health
                    .update_component(SOURCE_COMPONENT, HealthStatus::Unhealthy, Some(e.to_string()))
                    .await;
            },
        }
    });

    // Operational API
    let server = if config.features.health_api {
        let address = config.server.address();
        let timeout = config.server.request_timeout();
        let state = ApiState::new(health.clone(), router.stats(), selection);
        Some(tokio::spawn(async move {
            if let Err(e) = firehose_router::create_server(&address, timeout, state).await {
                tracing::error!(error = %e, "Operational API stopped");
            }
        }))
    } else {
        None
    };

    health
        .update_component(ROUTER_COMPONENT, HealthStatus::Healthy, None)
        .await;

    tokio::select! {
        _ = router.run(receiver) => {
            tracing::info!("Envelope stream drained");
        },
        _ = firehose_router::shutdown_signal() => {},
    }

    source.abort();
    if let Some(server) = server {
        server.abort();
    }

    let stats = router.stats().snapshot();
    tracing::info!(
        received = stats.received,
        dropped = stats.dropped,
        emitted = stats.emitted,
        annotated = stats.annotated,
        "Firehose router shutdown complete"
    );
    Ok(())
}

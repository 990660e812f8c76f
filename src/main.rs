//! Thinking reactions service
//!
//! Marks chat messages with a "thinking" reaction while an LLM request is in
//! flight and swaps it for a "done" reaction once the reply is delivered.

mod api;
mod config;
mod controller;
mod gateway;
mod state_machine;

use api::{create_router, AppState};
use config::{ReactionConfig, ServiceConfig};
use controller::{LifecycleController, MessageStore};
use gateway::{LoggingGateway, OneBotGateway, ReactionGateway};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thinking_reactions=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let service = ServiceConfig::from_env();

    let reactions = match &service.options_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading reaction options");
            ReactionConfig::from_file(path)?
        }
        None => ReactionConfig::default(),
    };
    tracing::info!(
        enabled = reactions.enabled,
        thinking = ?reactions.thinking_reaction_ids,
        done = ?reactions.done_reaction_ids,
        remove_thinking_on_done = reactions.remove_thinking_on_done,
        "Reaction options"
    );

    let gateway: Option<Arc<dyn ReactionGateway>> = match &service.onebot {
        Some(onebot) => {
            let client = OneBotGateway::new(onebot)?;
            tracing::info!(endpoint = %client.endpoint(), "Reaction gateway configured");
            let gateway: Arc<dyn ReactionGateway> = Arc::new(LoggingGateway::new(client));
            Some(gateway)
        }
        None => {
            tracing::warn!("ONEBOT_URL not set, reactions will be tracked but never sent");
            None
        }
    };

    let store = MessageStore::new(service.store_capacity, service.state_ttl);
    let controller = Arc::new(LifecycleController::new(reactions, gateway, store));

    // Expired entries are also dropped lazily on access; the sweep bounds memory
    // for messages that never see another notification
    let sweeper = Arc::clone(&controller);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweeper.store().purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired message state");
            }
        }
    });

    let app = create_router(AppState::new(controller))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], service.port));
    tracing::info!("Thinking reactions service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

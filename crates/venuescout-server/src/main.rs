mod api;
mod middleware;
mod script_loader;
mod session;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use venuescout_aggregator::{Aggregator, Constraints, SearchArea};
use venuescout_core::{load_categories, AppConfig, CategoryTable, VenueSource};
use venuescout_places::PlacesClient;

use crate::{
    api::{build_app, AppState},
    script_loader::ScriptLoader,
    session::{RunSession, VenueAggregator},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(venuescout_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let categories = match &config.categories_path {
        Some(path) => load_categories(path)?,
        None => CategoryTable::builtin(),
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;

    let state = AppState {
        aggregator: build_aggregator(&config)?,
        categories: Arc::new(categories),
        session: Arc::new(RunSession::new()),
        scripts: Arc::new(ScriptLoader::new(http.clone())),
        http,
        config: Arc::clone(&config),
    };
    let app = build_app(state);

    tracing::info!(bind_addr = %config.bind_addr, env = %config.env, "venuescout server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Builds the aggregation engine when an API key is configured. Without one
/// the server still starts; run endpoints answer `configuration_missing`.
fn build_aggregator(config: &AppConfig) -> anyhow::Result<Option<Arc<VenueAggregator>>> {
    if config.require_api_key().is_err() {
        tracing::warn!("GOOGLE_MAPS_API_KEY not set; venue searches are disabled");
        return Ok(None);
    }

    let client = PlacesClient::from_app_config(config)?;
    let source: Arc<dyn VenueSource> = Arc::new(client);
    Ok(Some(Arc::new(Aggregator::new(
        source,
        Constraints::from_app_config(config),
        SearchArea::from_app_config(config),
    ))))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

use crate::api::{ApiServer, AppState};
use crate::auth::SqliteSessionResolver;
use crate::config::Config;
use crate::db::{Database, SessionRepository};
use crate::ingestion::{self, IngestionDispatcher, IngestionWorkflow};
use crate::transcription::build_client;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Load the config file (default location unless `path` is given) and apply
/// environment overrides on top.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides()?;
    Ok(config)
}

pub fn open_database(config: &Config) -> Result<Database> {
    let path = config.database_path()?;
    info!("Using database at {:?}", path);
    Database::open(&path)
}

pub async fn run_service(config_path: Option<&Path>) -> Result<()> {
    info!("Starting GitIntel service");

    let config = load_config(config_path)?;
    config.validate()?;

    let db = open_database(&config)?;

    if config.ingestion.fail_interrupted_on_startup {
        ingestion::fail_interrupted(&db).await?;
    }

    let now = chrono::Utc::now().timestamp();
    let pruned = db
        .call(move |conn| SessionRepository::delete_expired(conn, now))
        .await?;
    if pruned > 0 {
        info!("Pruned {} expired session(s)", pruned);
    }

    let client = build_client(&config.transcription)?;
    let dispatcher = IngestionDispatcher::new(IngestionWorkflow::new(db.clone(), client));

    let state = AppState {
        db: db.clone(),
        sessions: Arc::new(SqliteSessionResolver::new(db)),
        dispatcher: dispatcher.clone(),
    };

    info!("GitIntel is ready!");

    let result = ApiServer::new(config.bind_address(), state)
        .start(shutdown_signal())
        .await;
    if let Err(e) = &result {
        error!("API server failed: {:#}", e);
    }

    dispatcher.shutdown().await;
    info!("GitIntel stopped");

    result
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for Ctrl-C, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

pub mod api;
pub mod config;
pub mod db;
pub mod identity; // Identity provider seam: local accounts or hosted GoTrue
pub mod models;
pub mod portal; // Role-gated views and their fetch/mutate flows
pub mod store; // Typed data access: SQLite or hosted PostgREST
pub mod supabase;

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;
use crate::config::{Backend, ConfigError, PortalConfig};
use crate::db::DatabaseError;
use crate::identity::{IdentityProvider, LocalIdentity, SupabaseAuth};
use crate::portal::Portal;
use crate::store::{PortalStore, SqliteStore, SupabaseStore};
use crate::supabase::{SupabaseClient, SupabaseError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Backend client error: {0}")]
    Backend(#[from] SupabaseError),
    #[error("{0}")]
    Server(String),
}

/// Wire the identity provider and store selected by `backend`.
pub fn build_context(config: &PortalConfig) -> Result<ApiContext, StartupError> {
    let identity: Arc<dyn IdentityProvider>;
    let store: Arc<dyn PortalStore>;
    let backend = match &config.backend {
        Backend::Local { db_path } => {
            let conn = Arc::new(Mutex::new(db::open_database(db_path)?));
            tracing::info!(path = %db_path.display(), "Using local backend");
            identity = Arc::new(LocalIdentity::new(conn.clone(), config.session_ttl_secs));
            store = Arc::new(SqliteStore::new(conn));
            "local"
        }
        Backend::Supabase { url, anon_key } => {
            let client = SupabaseClient::new(url, anon_key)?;
            tracing::info!(url = %url, "Using hosted backend");
            identity = Arc::new(SupabaseAuth::new(client.clone()));
            store = Arc::new(SupabaseStore::new(client));
            "supabase"
        }
    };
    Ok(ApiContext::new(Portal::new(identity, store), backend))
}

/// Run the portal until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = PortalConfig::from_env()?;
    let ctx = build_context(&config)?;
    let server = api::start_portal_server(ctx, config.bind)
        .await
        .map_err(StartupError::Server)?;

    tracing::info!(addr = %server.addr, "Listening");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown().await;
    Ok(())
}

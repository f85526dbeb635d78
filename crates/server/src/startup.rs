use std::{env, net::SocketAddr, path::Path, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::subscriptions::ServerState;
use service::{
    file::subscription_store::FileSubscriptionStore,
    memory::subscription_store::SeededSubscriptionStore,
    runtime,
    subscriptions::SubscriptionStore,
};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr() -> anyhow::Result<SocketAddr> {
    let (host, port) = match configs::load_default() {
        Ok(cfg) => {
            let s = cfg.server;
            (s.host, s.port)
        }
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8081);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Storage section from config.toml when present, environment overrides on top.
fn load_storage_config() -> configs::StorageConfig {
    let mut storage = match configs::load_default() {
        Ok(cfg) => cfg.storage,
        Err(_) => configs::StorageConfig::default(),
    };
    storage.normalize_from_env();
    storage
}

/// Construct the store selected by configuration: seeded in-memory when the
/// deployment filesystem is read-only, file-backed otherwise. A corrupt data
/// file aborts startup here.
async fn build_store(storage: &configs::StorageConfig) -> anyhow::Result<Arc<dyn SubscriptionStore>> {
    if storage.read_only {
        info!("read-only storage: serving seeded in-memory subscriptions");
        return Ok(SeededSubscriptionStore::new());
    }

    if let Some(parent) = Path::new(&storage.data_file).parent() {
        if !parent.as_os_str().is_empty() {
            runtime::ensure_env(&parent.to_string_lossy()).await?;
        }
    }
    let store = FileSubscriptionStore::new(storage.data_file.as_str()).await?;
    Ok(store)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let storage = load_storage_config();
    let store = build_store(&storage).await?;
    let state = ServerState { store };

    // Build router
    let cors = build_cors();
    let app: Router = routes::build_router(cors, state);

    // Bind and serve
    let addr = load_bind_addr()?;
    info!(%addr, "starting subscription server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

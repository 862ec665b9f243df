use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use timetable_server::config::{EngineConfig, ServerConfig};
use timetable_server::service::{Dispatcher, TimetableService};
use timetable_server::store::MemoryStore;
use timetable_server::web::{AppState, ROLE_HEADER, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = ServerConfig::from_env().context("reading server configuration")?;

    let store = match &server.data_path {
        Some(path) => {
            let store = MemoryStore::open(path)
                .with_context(|| format!("loading timetable data from {}", path.display()))?;
            info!(path = %path.display(), "loaded timetable data");
            store
        }
        None => {
            info!("no TIMETABLE_DATA set, starting with an empty in-memory layout");
            MemoryStore::new()
        }
    };

    let service = TimetableService::new(Arc::new(store), EngineConfig::default()).with_seed(server.seed);
    let dispatcher = Dispatcher::spawn(service);
    let app = create_router(AppState::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .with_context(|| format!("binding {}", server.addr))?;
    info!(addr = %server.addr, role_header = ROLE_HEADER, "timetable server listening");

    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}

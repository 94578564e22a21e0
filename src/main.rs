use std::sync::Arc;

use imghost::config::{self, AppState, Config};
use imghost::logger;
use imghost::server::{self, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;

    logger::init(&cfg)?;

    // Connections stay on the LocalSet below whatever the worker count
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Fails startup if the storage directory cannot be created
    let state = Arc::new(AppState::new(cfg).map_err(|e| {
        logger::log_error(&format!("Cannot prepare storage directory: {e}"));
        e
    })?);

    let server = Server::bind(Arc::clone(&state))?;
    logger::log_server_start(&server.local_addr()?, &state.config);

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local.run_until(server.run_until(server::shutdown_signal())).await;
    Ok(())
}

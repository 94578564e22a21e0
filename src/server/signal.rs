// Signal handling module
//
// - SIGTERM: graceful shutdown
// - SIGINT:  graceful shutdown (Ctrl+C)
// Other platforms only get Ctrl+C.

use crate::logger;

/// Resolves once the process is asked to stop
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to register SIGTERM handler ({e}), only Ctrl+C stops the server"
            ));
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => logger::log_info("[SIGNAL] SIGTERM received"),
        () = ctrl_c() => logger::log_info("[SIGNAL] SIGINT received"),
    }
}

/// Resolves once the process is asked to stop
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
    logger::log_info("[SIGNAL] Ctrl+C received");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
        std::future::pending::<()>().await;
    }
}

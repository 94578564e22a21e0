// Server loop module
// Accepts connections until the shutdown future completes

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop
///
/// Returns once `shutdown` resolves. The listener is dropped at that point;
/// connections already accepted keep running on their own tasks.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                logger::log_shutdown();
                logger::log_debug(&format!(
                    "{} connection(s) still active",
                    active_connections.load(Ordering::SeqCst)
                ));
                break;
            }
        }
    }

    drop(listener);
}

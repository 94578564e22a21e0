// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `performance.max_connections`.
///
/// The counter is incremented before the check so two racing accepts
/// cannot both slip under the limit.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
}

/// Serve one connection on a local task.
///
/// A client hanging up mid-upload surfaces as a body error inside the
/// upload handler, which removes the partial file; the connection task
/// then ends here without affecting others.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);
        let request_timeout = state.config.performance.request_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        if request_timeout == 0 {
            if let Err(err) = conn.await {
                logger::log_connection_error(&err);
            }
        } else {
            match tokio::time::timeout(Duration::from_secs(request_timeout), conn).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => logger::log_connection_error(&err),
                Err(_) => logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {request_timeout} seconds"
                )),
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

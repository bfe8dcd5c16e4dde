//! Discovery endpoint probed by sibling gate instances
//!
//! Deliberately answers every method and path: the probe contract is
//! "any success status means this pod is up", and keeping the route
//! table trivial means a probe can never 404 its way into a false
//! unready verdict.

use axum::http::StatusCode;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Discovery handler
///
/// Always returns 200 OK - if this responds, the pod is up.
async fn discovery() -> StatusCode {
    StatusCode::OK
}

fn build_router() -> Router {
    Router::new().fallback(discovery)
}

/// Bind the discovery listener
///
/// Kept separate from [`serve_discovery`] so an unusable port fails
/// startup instead of surfacing later from a background task.
pub async fn bind_discovery(port: u16) -> Result<TcpListener, std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - the socket is actually reachable now
    info!(port = %port, "Discovery server listening");
    Ok(listener)
}

/// Serve discovery requests until the process exits
pub async fn serve_discovery(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router())
        .await
        .map_err(std::io::Error::other)
}

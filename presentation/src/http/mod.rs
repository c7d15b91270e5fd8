//! HTTP surface
//!
//! Serves the chat endpoint as Server-Sent Events plus read-only views of
//! traces, stats and stored conversations.

mod error;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve until `shutdown` is cancelled.
///
/// Cancelling also cancels every in-flight chat run (their tokens are
/// children of the state's token), so open streams end promptly.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

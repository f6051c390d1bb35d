//! Helpers shared by unit tests.

use axum::Router;
use tokio::net::TcpListener;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

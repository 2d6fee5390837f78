//! Check-cycle engine.
//!
//! This module is responsible for:
//! - Probing a target URL once and classifying the result
//! - Recording outcomes against the target's counters under a row lock
//! - Fanning a cycle out over every target and joining on the results
//! - Gating externally triggered cycles behind a shared secret

pub mod cycle;
pub mod outcome;
pub mod probe;
pub mod recorder;
pub mod trigger;

pub use cycle::{CycleOrchestrator, CycleSummary};
pub use outcome::Outcome;
pub use probe::{DEFAULT_PROBE_TIMEOUT, HttpProbe, Probe};
pub use recorder::{OutcomeRecorder, RecordStatus};
pub use trigger::{TriggerDecision, TriggerGate};

#[cfg(test)]
pub(crate) mod test_support {
    use std::net::SocketAddr;
    use std::time::Duration;

    use axum::{Router, http::StatusCode, response::Redirect, routing::get};
    use tokio::net::TcpListener;

    /// Serves `/ok`, `/moved` (redirects to `/ok`), `/missing` (404),
    /// `/broken` (500) and `/slow` (answers after two seconds).
    pub async fn spawn_test_server() -> SocketAddr {
        let app = Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/moved", get(|| async { Redirect::temporary("/ok") }))
            .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
            .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    /// A loopback address nothing is listening on.
    pub async fn unused_local_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }
}

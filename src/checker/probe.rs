//! Single-shot HTTP reachability probe.

use std::error::Error as StdError;
use std::io;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::outcome::Outcome;

/// Default per-request timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_REDIRECTS: usize = 10;

/// Performs one reachability check against a URL.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> Outcome;
}

/// GET-based probe with a fixed timeout and redirect following.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            // Reachability is measured from this host, not through a proxy.
            .no_proxy()
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> Outcome {
        let start_time = Instant::now();
        let result = self.client.get(url).send().await;

        match result {
            Ok(response) => {
                let response_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    Outcome::HttpFailure { status_code: status.as_u16(), response_time_ms }
                } else {
                    Outcome::Up { status_code: status.as_u16(), response_time_ms }
                }
            }
            Err(e) => Outcome::TransportFailure { error_kind: transport_error_kind(&e).to_string() },
        }
    }
}

/// Category name for a request that produced no HTTP response.
pub fn transport_error_kind(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        return "timeout";
    }
    if err.is_redirect() {
        return "redirect";
    }
    if err.is_builder() {
        return "invalid-request";
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return "connection-refused",
                io::ErrorKind::TimedOut => return "timeout",
                _ => {}
            }
        }
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return "dns";
        }
        if text.contains("certificate") || text.contains("tls") {
            return "tls";
        }
        source = cause.source();
    }

    if err.is_connect() {
        "connect"
    } else if err.is_body() || err.is_decode() {
        "body"
    } else if err.is_request() {
        "request"
    } else {
        "unknown"
    }
}

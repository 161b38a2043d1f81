//! Bounded-timeout liveness probing for MinIO service instances.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

/// Path MinIO serves its liveness check on.
const LIVENESS_PATH: &str = "/minio/health/live";

/// Issues bounded-timeout liveness checks against MinIO service endpoints.
///
/// A probe can never stall an operation for longer than the configured
/// timeout, and it never fails upward: an unreachable instance is simply
/// reported as not live.
#[derive(Clone)]
pub struct HealthProber {
    client: Client,
}

impl HealthProber {
    /// Creates a new prober whose requests all carry the given timeout.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed, which
    /// only happens when TLS initialization fails.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build probe HTTP client");

        Self { client }
    }

    /// Checks whether the MinIO instance at `ip:port` reports itself live.
    ///
    /// Returns `true` only when the liveness endpoint answers with HTTP 200
    /// inside the timeout. Transport errors, timeouts, and non-200 answers
    /// all read as not live.
    pub async fn probe(&self, ip: &str, port: u16) -> bool {
        let url = format!("http://{ip}:{port}{LIVENESS_PATH}");

        match self.client.get(&url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!("health check failed for {ip}:{port}: {e}");
                false
            }
        }
    }
}

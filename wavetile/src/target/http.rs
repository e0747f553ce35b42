//! HTTP tile target backed by reqwest.

use std::time::Duration;

use bytes::Bytes;

use super::{BoxFuture, LoadError, TileTarget};

/// Connect timeout for tile servers.
///
/// The overall load deadline is enforced by the throttler, this only bounds
/// the TCP/TLS handshake.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// User agent sent with every tile request.
pub const USER_AGENT: &str = concat!("wavetile/", env!("CARGO_PKG_VERSION"));

/// Loads tiles over HTTP(S).
///
/// Cloning is cheap: clones share the underlying connection pool, so one
/// clone can be handed to the throttler per tile.
#[derive(Debug, Clone)]
pub struct HttpTileTarget {
    client: reqwest::Client,
}

impl HttpTileTarget {
    /// Creates a new target with default configuration.
    pub fn new() -> Result<Self, LoadError> {
        Self::with_connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    /// Creates a new target with a custom connect timeout.
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LoadError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl TileTarget for HttpTileTarget {
    type Output = Bytes;

    fn begin_load(self, locator: String) -> BoxFuture<'static, Result<Bytes, LoadError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(&locator)
                .send()
                .await
                .map_err(|e| LoadError::Transport(e.to_string()))?;

            // Check HTTP status
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status {
                    status: status.as_u16(),
                    url: locator,
                });
            }

            response
                .bytes()
                .await
                .map_err(|e| LoadError::Body(e.to_string()))
        })
    }
}

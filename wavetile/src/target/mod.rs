//! Tile targets: the handles through which a tile load is actually started.
//!
//! The throttler never performs I/O itself. It is handed a [`TileTarget`] per
//! request and, once the request is admitted, calls
//! [`begin_load`](TileTarget::begin_load) and awaits the returned future.
//! This keeps the scheduling core independent of the fetch primitive, and
//! lets tests drive loads with scripted targets.

mod http;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use http::HttpTileTarget;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors reported by a target while loading a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request could not be sent or the connection failed.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be read or decoded.
    #[error("Failed to read response: {0}")]
    Body(String),

    /// The target could not be set up.
    #[error("Failed to create client: {0}")]
    Client(String),
}

/// A handle that can start one tile load.
///
/// Implementations consume themselves: a target is used for exactly one
/// load. The returned future resolves when the load succeeds or fails;
/// dropping it must abandon the load (this is how timeouts detach).
pub trait TileTarget: Send + 'static {
    /// Value produced by a successful load.
    type Output: Send + 'static;

    /// Start loading the resource at `locator`.
    fn begin_load(self, locator: String) -> BoxFuture<'static, Result<Self::Output, LoadError>>;
}

//! Tile request throttling.
//!
//! The [`RequestThrottler`] is the admission controller for tile loads. It
//! keeps map tile servers (and the local connection pool) from being flooded
//! when a forecast layer is activated or animated.
//!
//! # Design
//!
//! Two limits apply to active requests at all times:
//! - **Global**: at most `max_concurrent` loads in flight
//! - **Per domain**: at most `max_per_domain` loads in flight per origin host
//!
//! ```text
//!  submit ──► capacity? ──yes──► wait min_delay ──► begin_load ──► timeout race
//!               │                                                     │
//!               no                                      success / error / timeout
//!               ▼                                                     │
//!        pending queue  ◄──── drain: first eligible entry ◄── release slot
//!   (priority asc, FIFO)         (one per completion)
//! ```
//!
//! A request whose domain is saturated is skipped during draining, so a
//! lower-priority request for an idle server can overtake it.
//!
//! # Example
//!
//! ```ignore
//! use wavetile::target::HttpTileTarget;
//! use wavetile::throttle::{RequestThrottler, ThrottleConfig};
//!
//! let throttler = RequestThrottler::new(ThrottleConfig::default());
//! let target = HttpTileTarget::new()?;
//!
//! let completion = throttler.submit(target, url, "thredds.example.org", 0);
//! let bytes = completion.await?;
//! ```

mod config;
mod error;
mod queue;
mod snapshot;
mod throttler;

pub use config::{
    ThrottleConfig, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_PER_DOMAIN, DEFAULT_MIN_DELAY_MS,
    DEFAULT_TILE_TIMEOUT_MS,
};
pub use error::ThrottleError;
pub use snapshot::{DomainSnapshot, ThrottleSnapshot};
pub use throttler::{RequestThrottler, TileCompletion};

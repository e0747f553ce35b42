//! Application bootstrap.
//!
//! This module provides the `WaveTileApp` type which wires the configured
//! components together in the right order and hands out shared handles.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        WaveTileApp                            │
//! │                                                               │
//! │  1. ThrottleConfig ───► RequestThrottler<HttpTileTarget>      │
//! │  2. BurstConfig ──────► Arc<BurstStager>                      │
//! │  3. both ─────────────► TileLoader (shared by every layer)    │
//! │  4. [wms] section ────► WmsLayer (optional default layer)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use wavetile::app::WaveTileApp;
//! use wavetile::config::ConfigFile;
//!
//! let app = WaveTileApp::from_config(&ConfigFile::default()).unwrap();
//! assert!(app.layer().is_none());
//! assert!(app.loader().stager().is_staging());
//! ```

mod bootstrap;
mod error;

pub use bootstrap::{build_layer, WaveTileApp};
pub use error::AppError;

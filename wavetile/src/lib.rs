//! WaveTile - Throttled tile loading for animated marine forecast maps
//!
//! This library keeps WMS/THREDDS forecast overlays from flooding their
//! servers. Map views fire a burst of tile requests whenever a layer is added
//! or the forecast time step changes; WaveTile staggers the start of each
//! burst and caps how many loads run at once, globally and per server.
//!
//! # High-Level API
//!
//! The [`layer`] module composes the pieces the way a map layer uses them:
//!
//! ```ignore
//! use wavetile::app::WaveTileApp;
//! use wavetile::config::ConfigFile;
//! use wavetile::coord::Viewport;
//! use wavetile::layer::TileRequest;
//!
//! let app = WaveTileApp::from_config(&ConfigFile::load()?)?;
//! let layer = app.layer().expect("configured layer");
//! let viewport = Viewport::new(-17.7, 168.3, 7, 2)?;
//!
//! app.loader().begin_episode();
//! let requests = TileRequest::for_viewport(layer, &viewport, None)?;
//! let outcomes = app.loader().load_all(requests, |_| app.target().clone()).await;
//! ```

pub mod app;
pub mod burst;
pub mod config;
pub mod coord;
pub mod layer;
pub mod logging;
pub mod target;
pub mod telemetry;
pub mod throttle;
pub mod wms;

/// Version of the WaveTile library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

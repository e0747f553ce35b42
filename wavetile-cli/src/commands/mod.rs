//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`fetch`] - Throttled viewport download for forecast time steps

pub mod config;
pub mod fetch;

//! Configuration file handling for `~/.wavetile/config.ini`.
//!
//! Settings structs live in [`settings`], parsing in `parser`, and
//! serialization in `writer`. Missing keys fall back to the component
//! defaults, so an empty or absent file is a valid configuration.
//!
//! # Example
//!
//! ```
//! use wavetile::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let throttle = config.throttle_config();
//! assert_eq!(throttle.max_concurrent, 3);
//! ```

mod file;
mod parser;
pub mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{BurstSettings, ConfigFile, LoggingSettings, ThrottleSettings, WmsSettings};

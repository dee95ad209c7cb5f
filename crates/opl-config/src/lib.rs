//! # OPL Configuration Library
//!
//! Type-safe configuration for the OPL query tooling, loaded from a single TOML
//! file (`~/.config/opl/config.toml` by default).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opl_config::ConfigLoader;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load_sync(None)?;
//! println!("endpoint: {:?}", config.sparql.endpoint);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod components;
mod loader;

pub use components::*;
pub use loader::*;

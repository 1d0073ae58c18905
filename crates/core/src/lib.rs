//! Core utilities for signguard
//!
//! Shared functionality used by the Android signing library and the CLI:
//!
//! - **Error handling**: errors with codes, context and recovery suggestions
//! - **Configuration**: TOML-based configuration with validation
//! - **Validation**: fluent field checks that report every problem at once
//! - **Process execution**: running external tools with captured or streamed output
//!
//! # Example
//!
//! ```rust,no_run
//! use signguard_core::config::Config;
//!
//! let cwd = std::env::current_dir()?;
//! let config = Config::load(None, &cwd)?;
//! let paths = config.resolve(None, &cwd)?;
//! println!("credentials expected at {}", paths.properties_file.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ResolvedPaths};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::validation::{ValidationResult, Validator};
}

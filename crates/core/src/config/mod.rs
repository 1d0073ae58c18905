//! Configuration loading and schema definitions
//!
//! An optional `.signguard.toml` tells the tool where the Android project,
//! the credentials file and the Gradle wrapper live, which tasks count as
//! release tasks, and what to tell users when signing is missing.

mod loader;
mod schema;

pub use loader::{CONFIG_CANDIDATES, Config, ResolvedPaths};
pub use schema::*;

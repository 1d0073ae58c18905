//! Android release-signing tools for signguard
//!
//! This crate provides:
//! - A `key.properties` codec
//! - Signing credentials with redacted secrets
//! - Build intent detection from requested Gradle tasks
//! - The release-signing validator that blocks unsigned release packaging
//! - Gradle wrapper integration with injected release signing

#![warn(missing_docs)]

pub mod credentials;
pub mod error;
pub mod gradle;
pub mod intent;
pub mod properties;
pub mod validator;

pub use credentials::{Secret, SigningCredentials};
pub use error::{ConfigurationError, MissingCredentialsError, Result, SigningError};
pub use intent::{BuildIntent, ReleaseTasks};
pub use validator::{ReleaseSigningValidator, SigningConfig, SigningPlan};

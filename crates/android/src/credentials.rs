//! Release signing credentials
//!
//! [`SigningCredentials`] is built in one piece from a properties document or
//! not at all. Passwords are held in [`Secret`], which never prints its value
//! and wipes it on drop.

use crate::error::ConfigurationError;
use crate::properties::Properties;
use serde::Serialize;
use signguard_core::validation::Validator;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Property keys of the credentials file
pub mod keys {
    /// Signing key alias
    pub const KEY_ALIAS: &str = "keyAlias";
    /// Signing key password
    pub const KEY_PASSWORD: &str = "keyPassword";
    /// Keystore path
    pub const STORE_FILE: &str = "storeFile";
    /// Keystore password
    pub const STORE_PASSWORD: &str = "storePassword";

    /// Every key a credentials file must define
    pub const REQUIRED: [&str; 4] = [KEY_ALIAS, KEY_PASSWORD, STORE_FILE, STORE_PASSWORD];
}

/// Environment variables CI pipelines export the credentials through
pub mod env_vars {
    /// Signing key alias
    pub const KEY_ALIAS: &str = "ANDROID_KEY_ALIAS";
    /// Signing key password
    pub const KEY_PASSWORD: &str = "ANDROID_KEY_PASSWORD";
    /// Keystore path
    pub const STORE_FILE: &str = "ANDROID_STORE_FILE";
    /// Keystore password
    pub const STORE_PASSWORD: &str = "ANDROID_STORE_PASSWORD";
}

/// Gradle project properties the Android Gradle plugin reads injected signing from
pub mod injected {
    /// Keystore path
    pub const STORE_FILE: &str = "android.injected.signing.store.file";
    /// Keystore password
    pub const STORE_PASSWORD: &str = "android.injected.signing.store.password";
    /// Signing key alias
    pub const KEY_ALIAS: &str = "android.injected.signing.key.alias";
    /// Signing key password
    pub const KEY_PASSWORD: &str = "android.injected.signing.key.password";
}

const REDACTED: &str = "********";

/// A sensitive string
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Wrap a value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read the value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The four values needed to sign a release artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningCredentials {
    /// Alias of the signing key inside the keystore
    pub key_alias: String,
    /// Password of the signing key
    pub key_password: Secret,
    /// Keystore path exactly as written in the credentials file
    pub store_file: PathBuf,
    /// Password of the keystore
    pub store_password: Secret,
}

impl SigningCredentials {
    /// Build credentials from their parts
    pub fn new(
        key_alias: impl Into<String>,
        key_password: impl Into<Secret>,
        store_file: impl Into<PathBuf>,
        store_password: impl Into<Secret>,
    ) -> Self {
        Self {
            key_alias: key_alias.into(),
            key_password: key_password.into(),
            store_file: store_file.into(),
            store_password: store_password.into(),
        }
    }

    /// Extract credentials from a parsed credentials file.
    ///
    /// All four keys must be present and non-blank. Every problem is reported
    /// in a single error so the file can be fixed in one pass.
    pub fn from_properties(props: &Properties, source: &Path) -> Result<Self, ConfigurationError> {
        let result = keys::REQUIRED
            .iter()
            .fold(Validator::new(), |v, key| v.present(key, props.get(key)))
            .validate();

        if !result.is_valid() {
            let problems: Vec<String> = result
                .errors()
                .iter()
                .map(|e| match props.line_of(&e.field) {
                    Some(line) => format!("{} is empty (line {})", e.field, line),
                    None => format!("{} is missing", e.field),
                })
                .collect();
            let first_line = result
                .errors()
                .iter()
                .find_map(|e| props.line_of(&e.field));
            return Err(ConfigurationError::new(
                source,
                first_line,
                format!("incomplete signing credentials: {}", problems.join(", ")),
            ));
        }

        for key in props.keys().filter(|k| !keys::REQUIRED.contains(k)) {
            debug!(key, "ignoring unknown credentials key");
        }

        // Presence of all four was checked above.
        let value = |key: &str| props.get(key).unwrap_or_default().to_string();
        Ok(Self::new(
            value(keys::KEY_ALIAS),
            value(keys::KEY_PASSWORD),
            value(keys::STORE_FILE),
            value(keys::STORE_PASSWORD),
        ))
    }

    /// Read credentials from environment-style lookups, e.g. CI secrets
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let names = [
            (keys::KEY_ALIAS, env_vars::KEY_ALIAS),
            (keys::KEY_PASSWORD, env_vars::KEY_PASSWORD),
            (keys::STORE_FILE, env_vars::STORE_FILE),
            (keys::STORE_PASSWORD, env_vars::STORE_PASSWORD),
        ];
        let mut props = Properties::new();
        let mut missing = Vec::new();
        for (key, var) in names {
            match lookup(var).filter(|v| !v.trim().is_empty()) {
                Some(v) => props.insert(key, v),
                None => missing.push(var),
            }
        }
        if !missing.is_empty() {
            return Err(ConfigurationError::new(
                "<environment>",
                None,
                format!("environment variables not set: {}", missing.join(", ")),
            ));
        }
        Self::from_properties(&props, Path::new("<environment>"))
    }

    /// Render as credentials file text
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert(keys::KEY_ALIAS, self.key_alias.as_str());
        props.insert(keys::KEY_PASSWORD, self.key_password.expose());
        props.insert(keys::STORE_FILE, self.store_file.to_string_lossy());
        props.insert(keys::STORE_PASSWORD, self.store_password.expose());
        props
    }

    /// Keystore location, a relative `storeFile` being taken from `base`
    pub fn resolved_store_file(&self, base: &Path) -> PathBuf {
        if self.store_file.is_absolute() {
            self.store_file.clone()
        } else {
            base.join(&self.store_file)
        }
    }

    /// Gradle project properties that hand these credentials to the Android Gradle plugin
    pub fn gradle_injected_properties(&self, base: &Path) -> Vec<(String, String)> {
        vec![
            (
                injected::STORE_FILE.to_string(),
                self.resolved_store_file(base).to_string_lossy().into_owned(),
            ),
            (
                injected::STORE_PASSWORD.to_string(),
                self.store_password.expose().to_string(),
            ),
            (injected::KEY_ALIAS.to_string(), self.key_alias.clone()),
            (
                injected::KEY_PASSWORD.to_string(),
                self.key_password.expose().to_string(),
            ),
        ]
    }

    /// Printable view with passwords masked
    pub fn redacted(&self, base: &Path) -> RedactedCredentials {
        RedactedCredentials {
            key_alias: self.key_alias.clone(),
            key_password: REDACTED,
            store_file: self.store_file.clone(),
            resolved_store_file: self.resolved_store_file(base),
            store_password: REDACTED,
        }
    }
}

/// Credentials safe to print or serialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactedCredentials {
    /// Signing key alias
    pub key_alias: String,
    /// Always masked
    pub key_password: &'static str,
    /// Keystore path as written
    pub store_file: PathBuf,
    /// Keystore path after resolution
    pub resolved_store_file: PathBuf,
    /// Always masked
    pub store_password: &'static str,
}

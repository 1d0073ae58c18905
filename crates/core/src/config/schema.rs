//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConfigSchema {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub signing: SigningSection,

    #[serde(default)]
    pub remediation: RemediationConfig,

    #[serde(default)]
    pub gradle: GradleConfig,
}

/// Where the Android project lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Android root project directory, relative to the config file
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}

/// Release signing inputs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SigningSection {
    /// Credentials properties file, relative to the project root
    #[serde(default = "default_properties_file")]
    pub properties_file: String,

    /// Directory a relative `storeFile` is resolved against, relative to the project root
    #[serde(default = "default_store_base_dir")]
    pub store_base_dir: String,

    /// Task names that require release signing. Matched exactly.
    #[serde(default = "default_release_tasks")]
    pub release_tasks: Vec<String>,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            properties_file: default_properties_file(),
            store_base_dir: default_store_base_dir(),
            release_tasks: default_release_tasks(),
        }
    }
}

fn default_properties_file() -> String {
    "app/key.properties".to_string()
}

fn default_store_base_dir() -> String {
    "app".to_string()
}

/// Task names guarded out of the box
pub fn default_release_tasks() -> Vec<String> {
    vec!["assembleRelease".to_string(), "bundleRelease".to_string()]
}

/// Pointers printed when release signing is missing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemediationConfig {
    /// Script that creates a local keystore
    #[serde(default = "default_local_script")]
    pub local_script: String,

    /// Where CI gets its signing secrets from
    #[serde(default = "default_ci_reference")]
    pub ci_reference: String,

    /// Detailed signing documentation
    #[serde(default = "default_docs")]
    pub docs: String,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            local_script: default_local_script(),
            ci_reference: default_ci_reference(),
            docs: default_docs(),
        }
    }
}

fn default_local_script() -> String {
    "scripts/generate-keystore.ps1".to_string()
}

fn default_ci_reference() -> String {
    "GitHub Secrets".to_string()
}

fn default_docs() -> String {
    "docs/ANDROID_SIGNING.md".to_string()
}

/// Gradle wrapper settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GradleConfig {
    /// Wrapper script, relative to the project root. Platform default when unset.
    #[serde(default)]
    pub wrapper: Option<String>,
}

impl GradleConfig {
    /// Wrapper script name to use on this platform
    pub fn wrapper_name(&self) -> &str {
        match &self.wrapper {
            Some(w) => w,
            None if cfg!(windows) => "gradlew.bat",
            None => "gradlew",
        }
    }
}

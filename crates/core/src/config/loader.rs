//! Configuration file loading and path resolution

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result, ResultExt};
use crate::validation::Validator;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names searched for, in order, when no explicit path is given
pub const CONFIG_CANDIDATES: [&str; 3] = [
    ".signguard.toml",
    "signguard.toml",
    ".config/signguard.toml",
];

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

/// Absolute locations derived from a [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Android root project directory
    pub project_root: PathBuf,
    /// Credentials properties file
    pub properties_file: PathBuf,
    /// Base directory for a relative `storeFile`
    pub store_base_dir: PathBuf,
    /// Gradle wrapper script
    pub gradle_wrapper: PathBuf,
}

impl Config {
    /// Load configuration from an explicit path, or search `dir` for one.
    ///
    /// Falls back to defaults when no file is found. An explicit path that
    /// does not exist is an error.
    pub fn load(path: Option<&Path>, dir: &Path) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(dir),
        };

        let schema = match &config_path {
            Some(p) => load_config_file(p)?,
            None => {
                debug!(dir = %dir.display(), "no config file found, using defaults");
                ConfigSchema::default()
            }
        };

        let config = Self {
            schema,
            path: config_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Defaults only (no file)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Check the loaded values
    pub fn validate(&self) -> Result<()> {
        let s = &self.schema;
        Validator::new()
            .required("project.root", &s.project.root)
            .required("signing.properties_file", &s.signing.properties_file)
            .required("signing.store_base_dir", &s.signing.store_base_dir)
            .non_empty_list("signing.release_tasks", &s.signing.release_tasks)
            .required("remediation.local_script", &s.remediation.local_script)
            .required("remediation.ci_reference", &s.remediation.ci_reference)
            .required("remediation.docs", &s.remediation.docs)
            .validate()
            .to_result(ErrorCode::ConfigValidationError)
            .map_err(|e| match &self.path {
                Some(p) => e.with_context(format!("In {}", p.display())),
                None => e,
            })
    }

    /// Resolve configured paths.
    ///
    /// `project_dir` overrides `[project] root`. Otherwise the root is taken
    /// relative to the config file's directory, or to `cwd` without one.
    pub fn resolve(&self, project_dir: Option<&Path>, cwd: &Path) -> Result<ResolvedPaths> {
        let root = match project_dir {
            Some(dir) => cwd.join(dir),
            None => {
                let base = self
                    .path
                    .as_deref()
                    .and_then(config_base_dir)
                    .map(|b| cwd.join(b))
                    .unwrap_or_else(|| cwd.to_path_buf());
                base.join(&self.schema.project.root)
            }
        };
        let project_root = std::path::absolute(&root).map_err(|e| {
            Error::new(
                ErrorCode::InvalidPath,
                format!("Cannot resolve project root {}", root.display()),
            )
            .with_source(e)
        })?;

        Ok(ResolvedPaths {
            properties_file: project_root.join(&self.schema.signing.properties_file),
            store_base_dir: project_root.join(&self.schema.signing.store_base_dir),
            gradle_wrapper: project_root.join(self.schema.gradle.wrapper_name()),
            project_root,
        })
    }
}

/// Directory that relative paths in a config file are anchored to
fn config_base_dir(path: &Path) -> Option<&Path> {
    let parent = path.parent()?;
    // `.config/signguard.toml` belongs to the directory above `.config`
    if parent.file_name().is_some_and(|n| n == ".config") {
        parent.parent()
    } else {
        Some(parent)
    }
}

/// Find configuration file in standard locations
fn find_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|p| p.is_file())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    debug!(path = %path.display(), "loading config file");
    let content = std::fs::read_to_string(path)
        .context(format!("Reading config file {}", path.display()))?;
    toml::from_str(&content).context(format!("In {}", path.display()))
}

//! Release-signing validator
//!
//! Decides, once per build invocation and before any packaging work, whether
//! release packaging may proceed:
//!
//! - no release task requested: nothing to enforce
//! - release task requested and credentials file present: sign with it
//! - release task requested and credentials file absent: fail with a banner
//!
//! There is no fallback. A missing credentials file never turns into a
//! debug-signed release.
//!
//! # Example
//!
//! ```rust,no_run
//! use signguard_android::validator::{ReleaseSigningValidator, SigningConfig};
//!
//! let validator = ReleaseSigningValidator::new("android/app/key.properties")
//!     .with_store_base_dir("android/app");
//! let tasks = vec!["bundleRelease".to_string()];
//!
//! let plan = validator.prepare(&tasks)?;
//! if let Some(creds) = plan.release_signing() {
//!     println!("signing with key {}", creds.key_alias);
//! }
//! # Ok::<(), signguard_android::SigningError>(())
//! ```

use crate::credentials::SigningCredentials;
use crate::error::{ConfigurationError, MissingCredentialsError, Result, SigningError};
use crate::intent::{BuildIntent, ReleaseTasks};
use crate::properties::Properties;
use serde::Serialize;
use signguard_core::config::{ConfigSchema, RemediationConfig, ResolvedPaths};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where to send a user whose release signing is missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remediation {
    /// Script that creates a local keystore and credentials file
    pub local_script: String,
    /// Where CI gets its signing secrets from
    pub ci_reference: String,
    /// Detailed instructions
    pub docs: String,
}

impl Default for Remediation {
    fn default() -> Self {
        RemediationConfig::default().into()
    }
}

impl From<RemediationConfig> for Remediation {
    fn from(config: RemediationConfig) -> Self {
        Self {
            local_script: config.local_script,
            ci_reference: config.ci_reference,
            docs: config.docs,
        }
    }
}

/// Outcome of resolving the signing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningConfig {
    /// The credentials file exists and is complete
    Present(SigningCredentials),
    /// There is no credentials file. Never replaced by a default.
    Absent,
}

impl SigningConfig {
    /// Credentials, if present
    pub fn credentials(&self) -> Option<&SigningCredentials> {
        match self {
            Self::Present(creds) => Some(creds),
            Self::Absent => None,
        }
    }
}

/// What a build invocation may do with signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningPlan {
    /// Whether a release is being packaged
    pub intent: BuildIntent,
    /// Resolved signing configuration
    pub signing: SigningConfig,
}

impl SigningPlan {
    /// Credentials to sign the release with. `None` unless a release task was requested.
    pub fn release_signing(&self) -> Option<&SigningCredentials> {
        if self.intent.is_release() {
            self.signing.credentials()
        } else {
            None
        }
    }
}

/// Checks release signing preconditions from explicit inputs only
#[derive(Debug, Clone)]
pub struct ReleaseSigningValidator {
    properties_path: PathBuf,
    store_base_dir: PathBuf,
    release_tasks: ReleaseTasks,
    remediation: Remediation,
}

impl ReleaseSigningValidator {
    /// Validator for the credentials file at `properties_path`.
    ///
    /// A relative `storeFile` resolves against the file's directory until
    /// [`with_store_base_dir`](Self::with_store_base_dir) says otherwise.
    pub fn new(properties_path: impl Into<PathBuf>) -> Self {
        let properties_path = properties_path.into();
        let store_base_dir = properties_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            properties_path,
            store_base_dir,
            release_tasks: ReleaseTasks::default(),
            remediation: Remediation::default(),
        }
    }

    /// Validator wired from loaded configuration
    pub fn from_config(paths: &ResolvedPaths, schema: &ConfigSchema) -> Self {
        Self::new(&paths.properties_file)
            .with_store_base_dir(&paths.store_base_dir)
            .with_release_tasks(ReleaseTasks::from_names(
                schema.signing.release_tasks.iter().cloned(),
            ))
            .with_remediation(schema.remediation.clone().into())
    }

    /// Set the directory a relative `storeFile` resolves against
    pub fn with_store_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_base_dir = dir.into();
        self
    }

    /// Set the task names that require release signing
    pub fn with_release_tasks(mut self, tasks: ReleaseTasks) -> Self {
        self.release_tasks = tasks;
        self
    }

    /// Set the remediation pointers shown when signing is missing
    pub fn with_remediation(mut self, remediation: Remediation) -> Self {
        self.remediation = remediation;
        self
    }

    /// Configured credentials file path
    pub fn properties_path(&self) -> &Path {
        &self.properties_path
    }

    /// Directory a relative `storeFile` resolves against
    pub fn store_base_dir(&self) -> &Path {
        &self.store_base_dir
    }

    /// Configured release task names
    pub fn release_tasks(&self) -> &ReleaseTasks {
        &self.release_tasks
    }

    /// Absolute form of the credentials file path, for messages
    pub fn expected_path(&self) -> PathBuf {
        std::path::absolute(&self.properties_path).unwrap_or_else(|_| self.properties_path.clone())
    }

    /// Whether the credentials file exists
    pub fn credentials_file_exists(&self) -> bool {
        self.properties_path.exists()
    }

    /// Read and parse the credentials file.
    ///
    /// Fails with [`SigningError::Configuration`] when the file is malformed or
    /// lacks any of the four keys. A partial result is never returned.
    pub fn load_credentials(&self) -> Result<SigningCredentials> {
        let path = &self.properties_path;
        let bytes = std::fs::read(path).map_err(|source| SigningError::Io {
            path: path.clone(),
            source,
        })?;

        let props = Properties::parse_bytes(&bytes)
            .map_err(|e| ConfigurationError::new(path, Some(e.line), e.message))?;
        let creds = SigningCredentials::from_properties(&props, path)?;

        debug!(path = %path.display(), key_alias = %creds.key_alias, "loaded signing credentials");
        Ok(creds)
    }

    /// Credentials when the file exists, [`SigningConfig::Absent`] otherwise
    pub fn resolve_signing_config(&self) -> Result<SigningConfig> {
        if self.credentials_file_exists() {
            self.load_credentials().map(SigningConfig::Present)
        } else {
            debug!(path = %self.properties_path.display(), "no signing credentials file");
            Ok(SigningConfig::Absent)
        }
    }

    /// Fail when a release task is requested without a credentials file.
    ///
    /// A no-op for non-release requests or when the file exists.
    pub fn validate_before_release(&self, requested: &[String]) -> Result<()> {
        let matched = self.release_tasks.matching(requested);
        if matched.is_empty() {
            debug!(?requested, "no release task requested, signing not enforced");
            return Ok(());
        }
        if self.credentials_file_exists() {
            return Ok(());
        }

        let expected_path = self.expected_path();
        warn!(
            path = %expected_path.display(),
            tasks = ?matched,
            "release requested without signing credentials"
        );
        Err(MissingCredentialsError {
            expected_path,
            release_tasks: matched.into_iter().map(String::from).collect(),
            remediation: self.remediation.clone(),
        }
        .into())
    }

    /// Validate, then resolve signing for this invocation.
    ///
    /// A present but malformed credentials file fails here even for
    /// non-release requests.
    pub fn prepare(&self, requested: &[String]) -> Result<SigningPlan> {
        self.validate_before_release(requested)?;
        let intent = BuildIntent::from_tasks(requested, &self.release_tasks);
        let signing = self.resolve_signing_config()?;

        if intent.is_release() {
            info!(key_alias = ?signing.credentials().map(|c| &c.key_alias), "release signing ready");
        }
        Ok(SigningPlan { intent, signing })
    }

    /// Check that the keystore the credentials point at is a readable file
    pub fn verify_keystore(&self, creds: &SigningCredentials) -> Result<PathBuf> {
        let keystore = creds.resolved_store_file(&self.store_base_dir);
        if keystore.is_file() {
            Ok(keystore)
        } else {
            Err(ConfigurationError::keystore(
                &self.properties_path,
                format!("keystore not found at {}", keystore.display()),
            )
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Secret;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    const COMPLETE: &str = "keyAlias=a\nkeyPassword=b\nstoreFile=/k.jks\nstorePassword=d\n";

    fn tasks(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn setup(contents: Option<&str>) -> (TempDir, ReleaseSigningValidator) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app").join("key.properties");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        if let Some(text) = contents {
            fs::write(&path, text).unwrap();
        }
        let validator = ReleaseSigningValidator::new(path);
        (dir, validator)
    }

    #[test]
    fn test_release_without_file_fails_with_path() {
        let (_dir, validator) = setup(None);
        let err = validator
            .validate_before_release(&tasks(&["assembleRelease"]))
            .unwrap_err();
        match err {
            SigningError::MissingCredentials(missing) => {
                assert!(missing.expected_path.is_absolute());
                assert_eq!(missing.expected_path, validator.expected_path());
                assert_eq!(missing.release_tasks, vec!["assembleRelease"]);
                assert!(missing
                    .to_string()
                    .contains(&validator.expected_path().display().to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prepare_never_returns_config_for_missing_release() {
        let (_dir, validator) = setup(None);
        assert!(matches!(
            validator.prepare(&tasks(&["bundleRelease"])),
            Err(SigningError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_debug_without_file_proceeds_unsigned() {
        let (_dir, validator) = setup(None);
        assert!(validator.validate_before_release(&tasks(&["assembleDebug"])).is_ok());
        let plan = validator.prepare(&tasks(&["assembleDebug"])).unwrap();
        assert_eq!(plan.intent, BuildIntent::NonRelease);
        assert_eq!(plan.signing, SigningConfig::Absent);
        assert!(plan.release_signing().is_none());
    }

    #[test]
    fn test_bundle_release_with_file_returns_credentials() {
        let (_dir, validator) = setup(Some(COMPLETE));
        let plan = validator.prepare(&tasks(&["bundleRelease"])).unwrap();
        let creds = plan.release_signing().unwrap();
        assert_eq!(creds, &SigningCredentials::new("a", "b", "/k.jks", "d"));
        assert_eq!(creds.key_password, Secret::new("b"));
    }

    #[test]
    fn test_non_release_with_file_is_noop() {
        let (_dir, validator) = setup(Some(COMPLETE));
        assert!(validator.validate_before_release(&tasks(&["lint", "test"])).is_ok());
        let plan = validator.prepare(&tasks(&["lint"])).unwrap();
        assert!(plan.signing.credentials().is_some());
        assert!(plan.release_signing().is_none());
    }

    #[test]
    fn test_resolve_absent_and_present() {
        let (_dir, validator) = setup(None);
        assert!(!validator.credentials_file_exists());
        assert_eq!(validator.resolve_signing_config().unwrap(), SigningConfig::Absent);

        let (_dir, validator) = setup(Some(COMPLETE));
        assert!(validator.credentials_file_exists());
        assert!(matches!(
            validator.resolve_signing_config().unwrap(),
            SigningConfig::Present(_)
        ));
    }

    #[test]
    fn test_incomplete_file_fails_at_load() {
        let (_dir, validator) = setup(Some("keyAlias=a\nkeyPassword=b\nstorePassword=d\n"));
        match validator.load_credentials().unwrap_err() {
            SigningError::Configuration(e) => {
                assert!(e.message.contains("storeFile"));
                assert_eq!(e.path, validator.properties_path());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(validator.prepare(&tasks(&["assembleRelease"])).is_err());
        assert!(validator.prepare(&tasks(&["assembleDebug"])).is_err());
    }

    #[test]
    fn test_malformed_file_reports_line() {
        let (_dir, validator) = setup(Some("keyAlias=a\nthis is not a property\n"));
        match validator.load_credentials().unwrap_err() {
            SigningError::Configuration(e) => assert_eq!(e.line, Some(2)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_directory_in_place_of_file_is_io_error() {
        let (dir, _) = setup(None);
        let path = dir.path().join("app").join("key.properties");
        fs::create_dir_all(&path).unwrap();
        let validator = ReleaseSigningValidator::new(&path);
        assert!(validator.credentials_file_exists());
        assert!(matches!(validator.load_credentials(), Err(SigningError::Io { .. })));
    }

    #[test]
    fn test_custom_release_tasks_and_remediation() {
        let (_dir, validator) = setup(None);
        let validator = validator
            .with_release_tasks(ReleaseTasks::from_names([":app:bundleRelease"]))
            .with_remediation(Remediation {
                local_script: "tools/make-keystore.sh".to_string(),
                ci_reference: "Vault secret/android".to_string(),
                docs: "SIGNING.md".to_string(),
            });
        assert!(validator.validate_before_release(&tasks(&["bundleRelease"])).is_ok());

        let err = validator
            .validate_before_release(&tasks(&[":app:bundleRelease"]))
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("tools/make-keystore.sh"));
        assert!(text.contains("Vault secret/android"));
        assert!(text.contains("SIGNING.md"));
    }

    #[test]
    fn test_verify_keystore_relative_to_store_base_dir() {
        let (dir, validator) = setup(Some(
            "keyAlias=a\nkeyPassword=b\nstoreFile=upload.jks\nstorePassword=d\n",
        ));
        let validator = validator.with_store_base_dir(dir.path().join("app"));
        let creds = validator.load_credentials().unwrap();

        let err = validator.verify_keystore(&creds).unwrap_err();
        assert!(err.to_string().contains("keystore not found"));

        fs::write(dir.path().join("app").join("upload.jks"), b"jks").unwrap();
        assert_eq!(
            validator.verify_keystore(&creds).unwrap(),
            dir.path().join("app").join("upload.jks")
        );
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut schema = ConfigSchema::default();
        schema.signing.release_tasks = vec!["publishRelease".to_string()];
        schema.remediation.docs = "README.md".to_string();
        let config = signguard_core::config::Config {
            schema: schema.clone(),
            path: None,
        };
        let paths = config.resolve(None, dir.path()).unwrap();

        let validator = ReleaseSigningValidator::from_config(&paths, &schema);
        assert_eq!(validator.properties_path(), paths.properties_file);
        assert_eq!(validator.store_base_dir(), paths.store_base_dir);
        let err = validator
            .validate_before_release(&tasks(&["publishRelease"]))
            .unwrap_err();
        assert!(err.to_string().contains("See README.md"));
    }

    fn secret_text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9!#=:/\\\\][ -~äé€😀]{0,20}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_disjoint_requests_pass_with_or_without_file(
            names in prop::collection::vec("[a-zA-Z:]{1,24}", 0..8),
            with_file in any::<bool>(),
        ) {
            let requested: Vec<String> = names
                .into_iter()
                .filter(|n| !ReleaseTasks::default().contains(n))
                .collect();
            let (_dir, validator) = setup(with_file.then_some(COMPLETE));
            prop_assert!(validator.validate_before_release(&requested).is_ok());
        }

        #[test]
        fn prop_release_request_without_file_is_missing_credentials(
            names in prop::collection::vec("[a-zA-Z:]{1,24}", 0..8),
            pick in prop::sample::select(vec!["assembleRelease", "bundleRelease"]),
            at in 0usize..8,
        ) {
            let mut requested = names;
            let at = at.min(requested.len());
            requested.insert(at, pick.to_string());

            let (_dir, validator) = setup(None);
            let missing_credentials = matches!(
                validator.validate_before_release(&requested),
                Err(SigningError::MissingCredentials(_))
            );
            prop_assert!(missing_credentials);
            prop_assert!(validator.prepare(&requested).is_err());
        }

        #[test]
        fn prop_written_credentials_load_unchanged(
            alias in secret_text(),
            key_password in secret_text(),
            store_file in secret_text(),
            store_password in secret_text(),
        ) {
            let written = SigningCredentials::new(alias, key_password, store_file, store_password);
            let text = written.to_properties().to_string();
            let (_dir, validator) = setup(Some(text.as_str()));
            let loaded = validator.load_credentials().unwrap();
            prop_assert_eq!(loaded, written);
        }
    }
}

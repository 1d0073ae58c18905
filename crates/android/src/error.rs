//! Error types for release signing.

use crate::validator::Remediation;
use signguard_core::error::{exit_codes, ErrorCode};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for signing operations.
pub type Result<T> = std::result::Result<T, SigningError>;

/// Errors that can occur while resolving release signing.
#[derive(Debug, Error)]
pub enum SigningError {
    /// A release task was requested but the credentials file is absent
    #[error(transparent)]
    MissingCredentials(#[from] MissingCredentialsError),

    /// The credentials file exists but is malformed or incomplete
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The credentials file exists but could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Gradle could not be started or the build failed
    #[error(transparent)]
    Build(#[from] signguard_core::Error),
}

impl SigningError {
    /// Error code for reports
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCredentials(_) => ErrorCode::SigningNotConfigured,
            Self::Configuration(e) if e.keystore => ErrorCode::KeystoreNotFound,
            Self::Configuration(_) => ErrorCode::ConfigValidationError,
            Self::Io { .. } => ErrorCode::IoError,
            Self::Build(e) => e.code,
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredentials(_) => exit_codes::SIGNING_NOT_CONFIGURED,
            Self::Configuration(_) => exit_codes::CONFIG_ERROR,
            Self::Io { .. } | Self::Build(_) => exit_codes::FAILURE,
        }
    }

    /// Convert into the structured core error used for reports
    pub fn into_report_error(self) -> signguard_core::Error {
        let code = self.code();
        match self {
            Self::MissingCredentials(e) => signguard_core::Error::new(
                code,
                "Release signing keystore not configured",
            )
            .with_context(format!("Expected file: {}", e.expected_path.display()))
            .with_suggestion(format!(
                "Run {} locally, check {} in CI, see {}",
                e.remediation.local_script, e.remediation.ci_reference, e.remediation.docs
            )),
            Self::Configuration(e) => {
                let suggestion = if e.keystore {
                    format!(
                        "Create the keystore or point storeFile in {} at an existing one",
                        e.path.display()
                    )
                } else {
                    format!(
                        "Fix {} so it defines keyAlias, keyPassword, storeFile and storePassword",
                        e.path.display()
                    )
                };
                signguard_core::Error::new(code, e.to_string()).with_suggestion(suggestion)
            }
            Self::Io { path, source } => signguard_core::Error::new(
                code,
                format!("Failed to read {}", path.display()),
            )
            .with_source(source),
            Self::Build(e) => e,
        }
    }
}

/// Release packaging was requested without a credentials file.
///
/// `Display` renders the full framed banner shown to the user.
#[derive(Debug, Clone)]
pub struct MissingCredentialsError {
    /// Absolute path that was checked
    pub expected_path: PathBuf,
    /// Requested tasks that triggered the check
    pub release_tasks: Vec<String>,
    /// Where to point the user
    pub remediation: Remediation,
}

const RULE_WIDTH: usize = 67;

impl fmt::Display for MissingCredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "═".repeat(RULE_WIDTH);
        let file_name = self
            .expected_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "key.properties".to_string());

        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  ERROR: Release signing keystore not configured!")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  Release builds MUST be signed with the release keystore.")?;
        writeln!(f, "  Debug signing fallback is NOT allowed for release builds.")?;
        writeln!(f)?;
        writeln!(f, "  Requested: {}", self.release_tasks.join(", "))?;
        writeln!(f, "  Expected file: {}", self.expected_path.display())?;
        writeln!(f)?;
        writeln!(f, "  To fix:")?;
        writeln!(
            f,
            "  • Local build: Run {} and create {}",
            self.remediation.local_script, file_name
        )?;
        writeln!(
            f,
            "  • CI/CD: Ensure {} are configured correctly",
            self.remediation.ci_reference
        )?;
        writeln!(f)?;
        writeln!(f, "  See {} for detailed instructions.", self.remediation.docs)?;
        write!(f, "{rule}")
    }
}

impl std::error::Error for MissingCredentialsError {}

/// The credentials file is present but cannot be turned into credentials.
#[derive(Debug, Clone, Error)]
#[error("Invalid signing configuration in {}{}: {message}", .path.display(), line_hint(.line))]
pub struct ConfigurationError {
    /// File that failed
    pub path: PathBuf,
    /// 1-based line of the problem, when known
    pub line: Option<usize>,
    /// What is wrong
    pub message: String,
    /// Whether the problem is the keystore the file points at
    pub keystore: bool,
}

impl ConfigurationError {
    /// Problem with the file contents
    pub fn new(path: impl Into<PathBuf>, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line,
            message: message.into(),
            keystore: false,
        }
    }

    /// The referenced keystore is unusable
    pub fn keystore(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            keystore: true,
            ..Self::new(path, None, message)
        }
    }
}

fn line_hint(line: &Option<usize>) -> String {
    line.map(|l| format!(":{l}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing() -> MissingCredentialsError {
        MissingCredentialsError {
            expected_path: PathBuf::from("/work/android/app/key.properties"),
            release_tasks: vec!["bundleRelease".to_string()],
            remediation: Remediation::default(),
        }
    }

    #[test]
    fn test_banner_contents() {
        let text = missing().to_string();
        assert!(text.starts_with('\n'));
        assert!(text.contains("Release signing keystore not configured"));
        assert!(text.contains("Expected file: /work/android/app/key.properties"));
        assert!(text.contains("scripts/generate-keystore.ps1"));
        assert!(text.contains("create key.properties"));
        assert!(text.contains("GitHub Secrets"));
        assert!(text.contains("docs/ANDROID_SIGNING.md"));
        assert!(text.contains("Requested: bundleRelease"));
        assert_eq!(text.matches(&"═".repeat(RULE_WIDTH)).count(), 3);
    }

    #[test]
    fn test_codes_and_exit_codes() {
        let err = SigningError::from(missing());
        assert_eq!(err.code(), ErrorCode::SigningNotConfigured);
        assert_eq!(err.exit_code(), exit_codes::SIGNING_NOT_CONFIGURED);

        let err = SigningError::from(ConfigurationError::new("/k.properties", Some(3), "bad"));
        assert_eq!(err.code(), ErrorCode::ConfigValidationError);
        assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);

        let err = SigningError::from(ConfigurationError::keystore("/k.jks", "missing"));
        assert_eq!(err.code(), ErrorCode::KeystoreNotFound);
    }

    #[test]
    fn test_configuration_display_has_location() {
        let err = ConfigurationError::new("/p/key.properties", Some(4), "Missing '=' separator");
        assert_eq!(
            err.to_string(),
            "Invalid signing configuration in /p/key.properties:4: Missing '=' separator"
        );
        let err = ConfigurationError::new("/p/key.properties", None, "Missing keys");
        assert!(err.to_string().contains("key.properties: Missing keys"));
    }

    #[test]
    fn test_report_error_never_contains_banner_rules() {
        let report = SigningError::from(missing()).into_report_error().to_report();
        assert_eq!(report.code_str, "E7001");
        assert!(report.context.unwrap().contains("/work/android/app/key.properties"));
        assert!(!report.message.contains('═'));
    }

    #[test]
    fn test_report_suggestion_matches_problem() {
        let report = SigningError::from(ConfigurationError::keystore(
            "/p/key.properties",
            "keystore not found at /p/upload.jks",
        ))
        .into_report_error()
        .to_report();
        let suggestion = report.suggestion.unwrap();
        assert!(suggestion.contains("point storeFile"));
        assert!(!suggestion.contains("keyAlias"));

        let report = SigningError::from(ConfigurationError::new(
            "/p/key.properties",
            None,
            "keyAlias is missing",
        ))
        .into_report_error()
        .to_report();
        assert!(report.suggestion.unwrap().contains("keyAlias, keyPassword"));
    }
}

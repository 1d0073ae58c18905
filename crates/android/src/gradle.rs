//! Gradle build system integration
//!
//! Runs tasks through the project's Gradle wrapper. [`GradleProject::run_guarded`]
//! checks release signing first and hands release credentials to the Android
//! Gradle plugin as injected signing properties (`-P` project properties).
//!
//! Those arguments are part of the wrapper's command line, which other local
//! users can read (`ps`, `/proc/<pid>/cmdline`) while the build runs. On shared
//! machines, let the build script read `key.properties` itself and use
//! `signguard check` as the guard instead of `signguard build`.

use crate::error::Result;
use crate::intent::BuildIntent;
use crate::validator::ReleaseSigningValidator;
use signguard_core::config::ResolvedPaths;
use signguard_core::error::{Error, ErrorCode};
use signguard_core::process::run_command_streaming_in_dir;
use std::path::{Path, PathBuf};
use tracing::info;

/// An Android project driven through its Gradle wrapper
#[derive(Debug, Clone)]
pub struct GradleProject {
    dir: PathBuf,
    wrapper: PathBuf,
}

/// Result of a guarded Gradle run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedBuild {
    /// Intent derived from the requested tasks
    pub intent: BuildIntent,
    /// Whether release credentials were passed to Gradle
    pub signed: bool,
}

impl GradleProject {
    /// Project at `dir` using `wrapper`
    pub fn new(dir: impl Into<PathBuf>, wrapper: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            wrapper: wrapper.into(),
        }
    }

    /// Project wired from loaded configuration
    pub fn from_paths(paths: &ResolvedPaths) -> Self {
        Self::new(&paths.project_root, &paths.gradle_wrapper)
    }

    /// Project directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wrapper script path
    pub fn wrapper(&self) -> &Path {
        &self.wrapper
    }

    /// Whether the wrapper script exists
    pub fn wrapper_exists(&self) -> bool {
        self.wrapper.is_file()
    }

    /// Run tasks, streaming Gradle's output. `properties` become `-Pkey=value`
    /// arguments ahead of the tasks.
    pub fn run(&self, tasks: &[String], properties: &[(String, String)]) -> Result<()> {
        if !self.wrapper_exists() {
            return Err(Error::new(
                ErrorCode::GradleError,
                format!("Gradle wrapper not found: {}", self.wrapper.display()),
            )
            .with_suggestion("Run from the Android project root or set [gradle] wrapper in .signguard.toml")
            .into());
        }

        let args: Vec<String> = properties
            .iter()
            .map(|(k, v)| format!("-P{k}={v}"))
            .chain(tasks.iter().cloned())
            .collect();

        let program = self.wrapper.to_string_lossy();
        let code = run_command_streaming_in_dir(&program, &args, &self.dir)?;
        if code == 0 {
            Ok(())
        } else {
            Err(Error::new(
                ErrorCode::CommandFailed,
                format!("Gradle exited with code {code}"),
            )
            .with_context(format!("Tasks: {}", tasks.join(" ")))
            .into())
        }
    }

    /// Check release signing, then run the tasks.
    ///
    /// Nothing is executed when the check fails. Release passwords travel as
    /// `-P` arguments and are visible in the process list for the length of
    /// the build; they are never logged.
    pub fn run_guarded(
        &self,
        validator: &ReleaseSigningValidator,
        tasks: &[String],
    ) -> Result<GuardedBuild> {
        let plan = validator.prepare(tasks)?;

        let properties = match plan.release_signing() {
            Some(creds) => creds.gradle_injected_properties(validator.store_base_dir()),
            None => Vec::new(),
        };
        let signed = !properties.is_empty();

        info!(tasks = ?tasks, signed, "running gradle");
        self.run(tasks, &properties)?;

        Ok(GuardedBuild {
            intent: plan.intent,
            signed,
        })
    }
}

//! Build intent: does this invocation package a release?

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Task names that require release signing.
///
/// Matching is exact and case-sensitive: `:app:assembleRelease` only matches
/// when it is itself in the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTasks(BTreeSet<String>);

impl Default for ReleaseTasks {
    fn default() -> Self {
        Self::from_names(["assembleRelease", "bundleRelease"])
    }
}

impl ReleaseTasks {
    /// Build the set from task names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Whether `task` is a release task
    pub fn contains(&self, task: &str) -> bool {
        self.0.contains(task)
    }

    /// Requested tasks that are release tasks, in request order
    pub fn matching<'a>(&self, requested: &'a [String]) -> Vec<&'a str> {
        requested
            .iter()
            .map(String::as_str)
            .filter(|t| self.contains(t))
            .collect()
    }

    /// Names in the set
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Whether the requested tasks package a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildIntent {
    /// At least one release task was requested
    Release {
        /// The release tasks among the request
        tasks: Vec<String>,
    },
    /// No release task was requested
    NonRelease,
}

impl BuildIntent {
    /// Derive the intent from the requested task names
    pub fn from_tasks(requested: &[String], release: &ReleaseTasks) -> Self {
        let tasks: Vec<String> = release
            .matching(requested)
            .into_iter()
            .map(String::from)
            .collect();
        if tasks.is_empty() {
            Self::NonRelease
        } else {
            Self::Release { tasks }
        }
    }

    /// Whether release signing is required
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release { .. })
    }
}

/// Build variant requested from the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildVariant {
    /// Debug-signed development build
    Debug,
    /// Release-signed distributable build
    Release,
}

impl FromStr for BuildVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(format!("unknown configuration '{other}', expected debug or release")),
        }
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => f.write_str("debug"),
            Self::Release => f.write_str("release"),
        }
    }
}

/// Gradle task that packages `variant` as an APK or, with `bundle`, an AAB
pub fn task_for(variant: BuildVariant, bundle: bool) -> String {
    let verb = if bundle { "bundle" } else { "assemble" };
    let suffix = match variant {
        BuildVariant::Debug => "Debug",
        BuildVariant::Release => "Release",
    };
    format!("{verb}{suffix}")
}

//! Process execution utilities
//!
//! Runs external tools (the Gradle wrapper) with:
//! - Output streamed to the terminal
//! - Directory context
//! - Argument values kept out of logs

use crate::error::{Error, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Run a command in a directory, streaming output to the terminal.
///
/// Arguments may carry secrets, so only their count is logged.
pub fn run_command_streaming_in_dir(program: &str, args: &[String], dir: &Path) -> Result<i32> {
    debug!(program, arg_count = args.len(), dir = %dir.display(), "streaming command");

    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| Error::process(format!("Failed to execute {}: {}", program, e)).with_source(e))?;

    Ok(status.code().unwrap_or(-1))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

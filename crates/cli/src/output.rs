//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output. Colors are applied only when
//! the target stream supports them and `owo_colors::set_override` allows it.

use owo_colors::{OwoColorize, Stream};
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Status message helpers
pub struct Status;

impl Status {
    /// Suppress success and info messages. Errors and warnings still print.
    pub fn set_quiet(quiet: bool) {
        QUIET.store(quiet, Ordering::Relaxed);
    }

    fn quiet() -> bool {
        QUIET.load(Ordering::Relaxed)
    }

    /// Print a success message
    pub fn success(message: &str) {
        if !Self::quiet() {
            println!("{} {}", "✓".if_supports_color(Stream::Stdout, |t| t.green()), message);
        }
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".if_supports_color(Stream::Stderr, |t| t.red()), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".if_supports_color(Stream::Stderr, |t| t.yellow()), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        if !Self::quiet() {
            println!("{} {}", "ℹ".if_supports_color(Stream::Stdout, |t| t.blue()), message);
        }
    }

    /// Print an aligned `label: value` line
    pub fn field(label: &str, value: &str) {
        if !Self::quiet() {
            let label = format!("{:<16}", format!("{}:", label));
            println!("  {} {}", label.if_supports_color(Stream::Stdout, |t| t.dimmed()), value);
        }
    }

    /// Print a header
    pub fn header(message: &str) {
        if !Self::quiet() {
            println!();
            println!("{}", message.if_supports_color(Stream::Stdout, |t| t.bold()));
            println!("{}", "─".repeat(message.chars().count()));
        }
    }

    /// Print a pre-rendered multi-line failure block to stderr
    pub fn fatal_block(block: &str) {
        eprintln!("{}", block.if_supports_color(Stream::Stderr, |t| t.red()));
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

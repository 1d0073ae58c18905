//! CLI utilities for signguard
//!
//! Terminal output formatting and status messages shared by the binary.

#![warn(missing_docs)]

pub mod output;

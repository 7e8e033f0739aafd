//! Output formatting module
//!
//! Renders run reports and partition plans for the terminal or for tools.

mod formatter;

pub use formatter::{OutputFormat, ReportFormatter};

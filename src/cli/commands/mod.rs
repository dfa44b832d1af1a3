//! Command handlers. Each returns the text to print.

/// Daily record entry commands
pub mod record;
/// Route registration commands
pub mod route;
/// Summary and payout commands
pub mod settlement;
/// User registration commands
pub mod user;

use crate::core::export::{ENGLISH_LABELS, Labels, format_amount};

/// Labels for terminal output. Every amount the CLI prints goes through these.
pub const CLI_LABELS: Labels = ENGLISH_LABELS;

/// Formats a won amount for terminal output, e.g. `54,500 KRW`.
#[must_use]
pub fn won(value: i64) -> String {
    format_amount(value, &CLI_LABELS)
}

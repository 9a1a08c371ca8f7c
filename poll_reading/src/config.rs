// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A single poll, as normalized from one data row.
///
/// Results are stored as fractions in [0, 1], whatever the notation in the
/// source file ("57" and "0.57" both end up as 0.57).
#[derive(PartialEq, Debug, Clone)]
pub struct PollRecord {
    /// Free-text month label, kept as-is after trimming.
    pub month: String,
    /// Day of the month of the poll.
    pub date: i64,
    /// Number of respondents.
    pub sample_size: i64,
    /// Short code classifying the polled population ("lv", "rv", "a", ...).
    /// Empty when the source row carried no type token.
    pub sample_type: String,
    pub harris_result: f64,
    pub trump_result: f64,
}

// ********* Errors ***********

/// Errors that prevent normalization from completing successfully.
///
/// Rows with fewer than 5 fields are not an error: they are dropped
/// silently. A numeric column that does not parse in a row with enough
/// fields aborts the whole run instead, and no partial table is returned.
#[derive(PartialEq, Debug, Clone)]
pub enum PollingErrors {
    MalformedNumericField {
        field: &'static str,
        value: String,
        /// 1-based position of the row among the data rows, header excluded.
        lineno: usize,
    },
}

impl Error for PollingErrors {}

impl Display for PollingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollingErrors::MalformedNumericField {
                field,
                value,
                lineno,
            } => write!(
                f,
                "malformed numeric field '{}' on data row {}: {:?}",
                field, lineno, value
            ),
        }
    }
}

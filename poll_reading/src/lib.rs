mod config;
use log::{debug, info};

pub use crate::config::*;

// **** Private helpers ****

// One CSV record per line. The sample column may be quoted ("1,500 lv" for
// instance), so a plain split on commas would cut it in half.
fn split_line(line: &str) -> Vec<String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match rdr.records().next() {
        Some(Ok(record)) => record.iter().map(|s| s.trim().to_string()).collect(),
        // A line the CSV parser cannot read is handled like a short row.
        _ => Vec::new(),
    }
}

fn parse_int_field(s: &str, field: &'static str, lineno: usize) -> Result<i64, PollingErrors> {
    s.replace(',', "")
        .trim()
        .parse::<i64>()
        .map_err(|_| PollingErrors::MalformedNumericField {
            field,
            value: s.to_string(),
            lineno,
        })
}

// Heuristic: a value above 1.0 is a whole-number percentage ("57"), anything
// at or below 1.0 is taken verbatim as a fraction ("0.57"). There is no
// format flag in the data to distinguish the two notations.
fn parse_pct_decimal(s: &str, field: &'static str, lineno: usize) -> Result<f64, PollingErrors> {
    let v = s
        .trim()
        .parse::<f64>()
        .map_err(|_| PollingErrors::MalformedNumericField {
            field,
            value: s.to_string(),
            lineno,
        })?;
    Ok(if v > 1.0 { v / 100.0 } else { v })
}

// Callers guarantee a non-empty slice.
fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

// Window length for the history comparison. 2k <= n holds for every n >= 2
// in both branches (30 <= n/2 when n >= 60, and 2*(n/2) <= n otherwise), so
// the two windows cannot overlap. n == 1 is the one degenerate case: both
// windows are the same single record and the change is exactly zero.
fn history_window_len(n: usize) -> usize {
    if n >= 60 {
        30
    } else {
        std::cmp::max(1, n / 2)
    }
}

// **** Normalization ****

/// Normalizes raw text lines into an ordered poll table.
///
/// Lines are trimmed and blank lines dropped before anything else. The first
/// remaining line is treated as a header and discarded without validation.
/// Rows with fewer than 5 comma-separated fields are skipped silently; a
/// numeric field that does not parse in a row with enough fields aborts the
/// whole run.
///
/// The order of the returned table is the order of the input lines: index 0
/// is the most recent poll, later indices are older polls.
pub fn normalize(raw_lines: &[String]) -> Result<Vec<PollRecord>, PollingErrors> {
    let lines: Vec<&str> = raw_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Ok(Vec::new());
    }

    let mut table: Vec<PollRecord> = Vec::new();
    for (idx, line) in lines.iter().enumerate().skip(1) {
        // 1-based position among the data rows; the header is not counted.
        let lineno = idx;
        let parts = split_line(line);
        debug!("normalize: data row {:?} fields {:?}", lineno, parts);
        if parts.len() < 5 {
            // Lenient policy: short rows are dropped, not reported.
            debug!("normalize: dropping short row {:?}", lineno);
            continue;
        }

        let month = parts[0].clone();
        let date = parse_int_field(&parts[1], "date", lineno)?;

        let sample_tokens: Vec<&str> = parts[2].split_whitespace().collect();
        let sample_size =
            parse_int_field(sample_tokens.first().unwrap_or(&""), "sample size", lineno)?;
        let sample_type = sample_tokens.get(1).unwrap_or(&"").to_string();

        let harris_result = parse_pct_decimal(&parts[3], "Harris result", lineno)?;
        let trump_result = parse_pct_decimal(&parts[4], "Trump result", lineno)?;

        table.push(PollRecord {
            month,
            date,
            sample_size,
            sample_type,
            harris_result,
            trump_result,
        });
    }
    info!(
        "normalize: kept {} records out of {} data lines",
        table.len(),
        lines.len() - 1
    );
    Ok(table)
}

// **** Poll sheet and statistics ****

/// The poll table together with the raw lines it was built from.
///
/// [PollSheet::rebuild] always starts over from the original lines and
/// replaces the table wholesale; records are never mutated once appended.
/// The three statistics are read-only queries over the current table and
/// are independent of each other.
pub struct PollSheet {
    raw_lines: Vec<String>,
    table: Vec<PollRecord>,
}

impl PollSheet {
    /// Creates a sheet with an empty table. Call [PollSheet::rebuild] to
    /// populate it.
    pub fn new(raw_lines: Vec<String>) -> PollSheet {
        PollSheet {
            raw_lines,
            table: Vec::new(),
        }
    }

    /// (Re)builds the table from the raw lines.
    pub fn rebuild(&mut self) -> Result<(), PollingErrors> {
        self.table = normalize(&self.raw_lines)?;
        Ok(())
    }

    pub fn records(&self) -> &[PollRecord] {
        &self.table
    }

    /// The candidate with the single highest poll result, formatted with the
    /// result as a percentage with one decimal, e.g. `"Harris 57.0%"`.
    ///
    /// The two maxima are taken over independent columns and need not come
    /// from the same poll. Exact float equality of the maxima reports
    /// `"EVEN"`, and so does an empty table (`"EVEN 0.0%"`).
    pub fn highest_polling_candidate(&self) -> String {
        if self.table.is_empty() {
            return "EVEN 0.0%".to_string();
        }
        let max_h = self
            .table
            .iter()
            .map(|r| r.harris_result)
            .fold(f64::MIN, f64::max);
        let max_t = self
            .table
            .iter()
            .map(|r| r.trump_result)
            .fold(f64::MIN, f64::max);
        if max_h > max_t {
            format!("Harris {:.1}%", max_h * 100.0)
        } else if max_t > max_h {
            format!("Trump {:.1}%", max_t * 100.0)
        } else {
            format!("EVEN {:.1}%", max_h * 100.0)
        }
    }

    /// Average results over the likely-voter polls: sample type equal to
    /// `"lv"` or containing `"likely"`, case-insensitive.
    ///
    /// When no poll matches, the average falls back to the full table. An
    /// empty table yields `(0.0, 0.0)`.
    pub fn likely_voter_polling_average(&self) -> (f64, f64) {
        if self.table.is_empty() {
            return (0.0, 0.0);
        }
        let lv: Vec<&PollRecord> = self
            .table
            .iter()
            .filter(|r| {
                let t = r.sample_type.to_lowercase();
                t == "lv" || t.contains("likely")
            })
            .collect();
        let set: Vec<&PollRecord> = if lv.is_empty() {
            self.table.iter().collect()
        } else {
            lv
        };
        let h: Vec<f64> = set.iter().map(|r| r.harris_result).collect();
        let t: Vec<f64> = set.iter().map(|r| r.trump_result).collect();
        (mean(&h), mean(&t))
    }

    /// Change in average result between the most recent polls (the first
    /// window of the table) and the earliest ones (the last window).
    ///
    /// The window holds 30 polls when the table has at least 60, half the
    /// table otherwise. An empty table yields `(0.0, 0.0)`.
    pub fn polling_history_change(&self) -> (f64, f64) {
        let n = self.table.len();
        if n == 0 {
            return (0.0, 0.0);
        }
        let k = history_window_len(n);
        let h: Vec<f64> = self.table.iter().map(|r| r.harris_result).collect();
        let t: Vec<f64> = self.table.iter().map(|r| r.trump_result).collect();
        (
            mean(&h[..k]) - mean(&h[n - k..]),
            mean(&t[..k]) - mean(&t[n - k..]),
        )
    }
}

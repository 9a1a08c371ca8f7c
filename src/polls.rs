use log::{debug, info, warn};

use poll_reading::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

#[derive(Debug, Snafu)]
pub enum PollError {
    #[snafu(display("Error opening data file {path}"))]
    OpeningData {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    OpeningJson { source: std::io::Error },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing summary file {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PollResult<T> = Result<T, PollError>;

/// The line supplier: reads the poll data file and hands back its lines in
/// file order. Path handling and file I/O stay here, outside the reading
/// library.
pub fn read_poll_lines(path: &str) -> PollResult<Vec<String>> {
    let contents = fs::read_to_string(path).context(OpeningDataSnafu {
        path: path.to_string(),
    })?;
    Ok(contents.lines().map(|s| s.to_string()).collect())
}

pub fn read_summary(path: String) -> PollResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub source: String,
    pub records: usize,
}

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

fn signed_pct(v: f64) -> String {
    format!("{:+.2}%", v * 100.0)
}

fn build_summary_js(source_path: &str, sheet: &PollSheet) -> JSValue {
    let c = SummaryConfig {
        source: simplify_file_name(source_path),
        records: sheet.records().len(),
    };
    let (lv_h, lv_t) = sheet.likely_voter_polling_average();
    let (ch_h, ch_t) = sheet.polling_history_change();
    json!({
        "config": c,
        "highestPollingCandidate": sheet.highest_polling_candidate(),
        "likelyVoterPollingAverage": {
            "Harris": pct(lv_h),
            "Trump": pct(lv_t),
        },
        "pollingHistoryChange": {
            "Harris": signed_pct(ch_h),
            "Trump": signed_pct(ch_t),
        },
    })
}

pub fn run_report(args: &Args) -> PollResult<()> {
    let input_path = match args.input.clone() {
        Some(p) => p,
        None => {
            whatever!("No input file specified. Use --input to pass the polling data file.")
        }
    };

    let raw_lines = read_poll_lines(&input_path)?;
    info!("Read {} lines from {:?}", raw_lines.len(), input_path);

    let mut sheet = PollSheet::new(raw_lines);
    if let Err(e) = sheet.rebuild() {
        whatever!("Normalization error: {:?}", e)
    }
    info!("Normalized {} poll records", sheet.records().len());

    let (lv_h, lv_t) = sheet.likely_voter_polling_average();
    let (ch_h, ch_t) = sheet.polling_history_change();

    println!(
        "Highest Polling Candidate: {}",
        sheet.highest_polling_candidate()
    );
    println!("Likely Voter Polling Average:");
    println!("  Harris: {}", pct(lv_h));
    println!("  Trump: {}", pct(lv_t));
    println!("Polling History Change:");
    println!("  Harris: {}", signed_pct(ch_h));
    println!("  Trump: {}", signed_pct(ch_t));

    let summary_js = build_summary_js(&input_path, &sheet);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js),
        Some(path) => fs::write(path, &pretty_js).context(WritingSummarySnafu {
            path: path.to_string(),
        })?,
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = args.reference.clone() {
        let summary_ref = read_summary(summary_p)?;
        info!("reference summary: {:?}", summary_ref);
        let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_ref(), "\n");
            whatever!("Difference detected between computed summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> PollSheet {
        let rows = [
            "month,date,sample,Harris result,Trump result",
            "Sep,15,\"1,500 lv\",57,43",
            "Sep,12,800 rv,0.49,0.47",
            "Sep,10,650 lv,0.47,0.45",
            "Aug,28,900 a,46,48",
        ];
        let mut sheet = PollSheet::new(rows.iter().map(|s| s.to_string()).collect());
        sheet.rebuild().unwrap();
        sheet
    }

    #[test]
    fn summary_has_the_expected_shape() {
        let sheet = sample_sheet();
        let js = build_summary_js("data/polling_data.csv", &sheet);
        assert_eq!(js["config"]["source"], "polling_data.csv");
        assert_eq!(js["config"]["records"], 4);
        assert_eq!(js["highestPollingCandidate"], "Harris 57.0%");
        assert_eq!(js["likelyVoterPollingAverage"]["Harris"], "52.00%");
        assert_eq!(js["likelyVoterPollingAverage"]["Trump"], "44.00%");
        // k = 2: (0.57 + 0.49) / 2 against (0.47 + 0.46) / 2.
        assert_eq!(js["pollingHistoryChange"]["Harris"], "+6.50%");
        assert_eq!(js["pollingHistoryChange"]["Trump"], "-1.50%");
    }

    #[test]
    fn summary_is_stable_across_rebuilds() {
        let mut sheet = sample_sheet();
        let before = build_summary_js("p.csv", &sheet);
        sheet.rebuild().unwrap();
        assert_eq!(before, build_summary_js("p.csv", &sheet));
    }

    #[test]
    fn summary_write_failure_names_the_file() {
        let dir = std::env::temp_dir();
        let input = dir.join("polltab_write_failure_input.csv");
        fs::write(
            &input,
            "month,date,sample,Harris result,Trump result\nSep,1,100 lv,50,48\n",
        )
        .unwrap();
        let out = dir.join("polltab-missing-dir").join("summary.json");
        let args = Args {
            input: Some(input.to_str().unwrap().to_string()),
            reference: None,
            out: Some(out.to_str().unwrap().to_string()),
            verbose: false,
        };
        let err = run_report(&args).unwrap_err();
        assert!(format!("{}", err).contains("summary.json"));
    }

    #[test]
    fn missing_input_is_reported() {
        let args = Args {
            input: None,
            reference: None,
            out: None,
            verbose: false,
        };
        assert!(run_report(&args).is_err());
    }
}

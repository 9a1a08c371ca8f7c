use clap::Parser;

/// This is a polling report program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The CSV file containing the polling data. The file is expected to
    /// start with a header line, followed by one poll per line:
    /// month, date, sample size and type, Harris result, Trump result.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path) A reference file containing a polling summary in JSON format. If provided,
    /// polltab will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the report will be written
    /// in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

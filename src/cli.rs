use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "go-license-checkr",
    about = "Group Go packages into libraries by license file and report where each license lives",
    version
)]
pub struct Cli {
    /// Go package patterns to analyze (anything `go list` accepts)
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Git remote to derive license URLs from, most preferred first (repeatable)
    #[arg(long = "git-remote", value_name = "NAME")]
    pub git_remotes: Vec<String>,

    /// Write the library report here instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write skipped packages here instead of stderr (CSV report only)
    #[arg(long, value_name = "FILE")]
    pub skipped_libs_path: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "csv", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Config file [default: <dir>/.go-license-checkr/config.toml, fallback ~/.config/go-license-checkr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum confidence for a license text to be identified, 0.0 to 1.0
    #[arg(long, value_name = "F")]
    pub confidence_threshold: Option<f64>,

    /// Worker threads for license lookups [default: number of CPUs]
    #[arg(long, short, value_name = "N")]
    pub jobs: Option<usize>,

    /// Working directory for `go list`
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Csv,
    Terminal,
    Json,
}

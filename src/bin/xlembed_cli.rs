//! CLI tool for xlembed - embeds the images referenced in an XLSX file
//!
//! Usage:
//!   xlembed_cli <input.xlsx>                          # Whole-sheet scan
//!   xlembed_cli <input.xlsx> --header Photos          # Named column, fan-out
//!   xlembed_cli <input.xlsx> --config cfg.json -o out.xlsx

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{Level, LevelFilter, Metadata, Record};
use xlembed::{embed_images, EmbedConfig, HttpFetcher, ScanPolicy, XlembedError};

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            match record.level() {
                Level::Info => eprintln!("{}", record.args()),
                level => eprintln!("[{}] {}", level.as_str().to_lowercase(), record.args()),
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

#[derive(Debug, Parser)]
#[command(
    version,
    about = "Embed the images referenced by URLs in an XLSX file as anchored thumbnails."
)]
struct Args {
    /// Workbook to read.
    input: PathBuf,

    /// Output workbook (default: `<input>_with_images.xlsx`).
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// JSON config file; flags given here override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// single-column-single-image, single-column-multi-image or whole-sheet.
    #[arg(long, value_parser = parse_policy)]
    policy: Option<ScanPolicy>,

    /// Header label of the image column.
    #[arg(long, value_name = "LABEL")]
    header: Option<String>,

    /// Per-image fetch timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<f64>,

    /// Log every scanned cell and failed URL.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn verbosity(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}

fn parse_policy(value: &str) -> Result<ScanPolicy, String> {
    value.parse().map_err(|e: XlembedError| e.to_string())
}

/// Config file first, then flags on top.
fn build_config(args: &Args) -> Result<EmbedConfig, XlembedError> {
    let mut config = match &args.config {
        Some(path) => EmbedConfig::from_json(&fs::read_to_string(path)?)?,
        None => EmbedConfig::default(),
    };
    if let Some(header) = &args.header {
        config.header_label = Some(header.clone());
        // A bare --header means the default named-column policy.
        if args.policy.is_none() && !config.scan_policy.requires_header() {
            config.scan_policy = ScanPolicy::default();
        }
    }
    if let Some(policy) = args.policy {
        config.scan_policy = policy;
    }
    if let Some(timeout) = args.timeout {
        config.fetch_timeout_secs = timeout;
    }
    config.validate()?;
    Ok(config)
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{stem}_with_images.xlsx"))
}

fn run(args: &Args) -> Result<(), XlembedError> {
    let config = build_config(args)?;
    let data = fs::read(&args.input)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    let fetcher = HttpFetcher::new().with_user_agent(format!("xlembed/{}", xlembed::version()));
    let embedded = embed_images(&data, &config, &fetcher)?;
    fs::write(&output, &embedded.bytes)?;

    let report = &embedded.report;
    log::info!(
        "Written: {} ({} of {} image(s) embedded, {} failed)",
        output.display(),
        report.embedded,
        report.attempts,
        report.failed()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(args.verbosity());
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_config_error() => {
            eprintln!("Configuration error: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error processing {}: {e}", args.input.display());
            ExitCode::FAILURE
        }
    }
}

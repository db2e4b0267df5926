#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

use crate::config::Config;
use crate::runner::Plan;
use check_engine::report::{self, Format};
use check_engine::RunResult;
use clap::{Parser, ValueEnum};
use log::{error, warn};
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::exit;

mod config;
mod runner;

const EXIT_PASSED: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_FATAL: i32 = 2;

#[derive(Parser, Debug)]
#[command(version, about = "Verify event log contents against count checks", long_about = None)]
struct CliArgs {
    #[arg(short, long, help = "Check file location")]
    config_file: Option<PathBuf>,

    #[arg(short, long, help = "Directory holding the event logs", default_value = ".")]
    dir: PathBuf,

    #[arg(
        short,
        long,
        help = "Default event log file name",
        default_value = config::DEFAULT_LOG_NAME
    )]
    log: PathBuf,

    #[arg(
        long = "check",
        help = r#"Inline check, e.g. '{event_type="dns", dns.type="query"} | count == 2'"#
    )]
    checks: Vec<String>,

    #[arg(long, value_enum, help = "Report format", default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[arg(long, help = "Application log level", default_value_t = log::LevelFilter::Info)]
    log_level: log::LevelFilter,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
        }
    }
}

fn main() {
    let cli_args = CliArgs::parse();
    env_logger::builder()
        .filter_level(cli_args.log_level)
        .init();

    let format = Format::from(cli_args.format);
    let config = match &cli_args.config_file {
        Some(path) => match config::load(path) {
            Ok(c) => c,
            Err(e) => fatal("config error", e, format),
        },
        None => Config::default(),
    };

    let plan = match Plan::new(config, &cli_args.checks, &cli_args.dir, &cli_args.log) {
        Ok(p) => p,
        Err(e) => fatal("config error", e, format),
    };
    if plan.checks().is_empty() {
        warn!("No checks configured, nothing to verify");
    }

    let outcome = plan.run();
    let mut stdout = io::stdout().lock();
    if let Err(e) = write_report(&outcome, format, &mut stdout).and_then(|_| stdout.flush()) {
        error!("Failed to write report: {}", e);
        exit(EXIT_FATAL);
    }

    exit(exit_code(&outcome));
}

fn exit_code(outcome: &Result<RunResult, check_engine::Error>) -> i32 {
    match outcome {
        Ok(result) if result.passed() => EXIT_PASSED,
        Ok(_) => EXIT_FAILED,
        Err(_) => EXIT_FATAL,
    }
}

fn write_report<W: Write>(
    outcome: &Result<RunResult, check_engine::Error>,
    format: Format,
    out: &mut W,
) -> io::Result<()> {
    match outcome {
        Ok(result) => report::report(result, format, out),
        Err(e) => report::report_fatal(e.category(), &e.to_string(), format, out),
    }
}

fn fatal(category: &str, error: impl Display, format: Format) -> ! {
    let mut stdout = io::stdout().lock();
    let written = report::report_fatal(category, &error.to_string(), format, &mut stdout)
        .and_then(|_| stdout.flush());
    if let Err(e) = written {
        error!("{}: {} (failed to write report: {})", category, error, e);
    }
    exit(EXIT_FATAL);
}

//! kleanup - find recently touched directories, choose what to keep, archive it.
//!
//! Usage:
//!   kleanup [-o REPORT]              Interactive scan, selection and archive
//!   kleanup scan DATE [PATH]...      Summarize directories with files since DATE
//!   kleanup --help                   Show help

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use kleanup_analyze::{GroupSummarizer, SelectionList};
use kleanup_core::{
    parse_start_date, DirectoryRecord, KleanupError, ScanConfig, SummaryGroup, TimeWindow,
    TimestampKind,
};
use kleanup_ops::{format_size, ArchiveOptions, DiskSpaceProbe, ManifestGuard, SevenZipArchiver};
use kleanup_scan::{SkipCounter, TreeAggregator};
use kleanup_session::{Session, SessionOutcome, TerminalConsole};

/// Exit status for rejected operator input.
const EXIT_BAD_INPUT: i32 = 2;

/// Exit status after an interrupt.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "kleanup",
    version,
    about = "Find recently touched directories and archive the ones you choose",
    long_about = "kleanup scans the configured locations for files created or modified \
                  since a start date, lets you select or ignore the directories it \
                  finds, and packs the result into an encrypted 7z archive."
)]
struct Cli {
    /// Append an audit report to this file after archiving
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Timestamp compared against the start date
    #[arg(short, long, default_value = "created")]
    timestamp: TimestampKind,

    /// Archive file to create
    #[arg(long, default_value = "archive.7z")]
    archive: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize directories with files since a date, without archiving
    Scan {
        /// Start date (mm/dd/yy)
        date: String,

        /// Paths to scan (defaults to the priority locations)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Some(Command::Scan {
            date,
            paths,
            format,
        }) => run_scan(&cli, date, paths, *format),
        None => run_interactive(&cli),
    };

    if let Err(report) = &result {
        if let Some(err) = report.downcast_ref::<KleanupError>() {
            if err.is_user_input() {
                eprintln!("{err}");
                std::process::exit(EXIT_BAD_INPUT);
            }
        }
    }

    result
}

/// Install the stderr log subscriber.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("KLEANUP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn scan_config(cli: &Cli) -> Result<ScanConfig> {
    ScanConfig::builder()
        .timestamp(cli.timestamp)
        .build()
        .context("Invalid scan configuration")
}

/// Run the full interactive session.
fn run_interactive(cli: &Cli) -> Result<()> {
    let config = scan_config(cli)?;
    let options = ArchiveOptions::builder()
        .archive_name(cli.archive.clone())
        .build()
        .context("Invalid archive options")?;

    let guard = ManifestGuard::new();
    let handler_guard = guard.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nShutdown requested... exiting.");
        handler_guard.cleanup();
        std::process::exit(EXIT_INTERRUPTED);
    })
    .context("Failed to install interrupt handler")?;

    let mut console = TerminalConsole::new();
    let archiver = SevenZipArchiver::from_options(&options);
    let outcome = Session::new(&config, &options, &mut console, &DiskSpaceProbe, &archiver)
        .with_guard(guard)
        .with_report(cli.output.clone())
        .run()?;
    tracing::debug!(?outcome, "session finished");

    if let SessionOutcome::Archived {
        archive,
        total_size,
        files,
        ..
    } = outcome
    {
        eprintln!(
            "Wrote {} ({} files, {} selected)",
            archive.display(),
            files,
            format_size(total_size)
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct ScanExport<'a> {
    records: Vec<&'a DirectoryRecord>,
    groups: Vec<&'a SummaryGroup>,
    skipped: usize,
}

/// Aggregate and summarize without archiving.
fn run_scan(cli: &Cli, date: &str, paths: &[PathBuf], format: OutputFormat) -> Result<()> {
    let start = parse_start_date(date)?;
    let config = scan_config(cli)?;
    let roots = if paths.is_empty() {
        config.priority_roots.clone()
    } else {
        paths.to_vec()
    };

    eprintln!("Scanning {} location(s)...", roots.len());

    let skipped = SkipCounter::new();
    let records = TreeAggregator::new(&config).aggregate_with(
        &roots,
        &TimeWindow::since(start),
        Some(&skipped),
    );
    let groups = GroupSummarizer::new().summarize(&records);

    match format {
        OutputFormat::Text => {
            let list = SelectionList::present(&groups, 1);
            println!();
            println!("Directories containing files {} since {date}:", cli.timestamp);
            println!("{}", "-".repeat(80));
            for entry in list.iter() {
                println!(
                    "{}.\t({})\t{:<40}\t{}",
                    entry.index,
                    entry.group.matched_file_count,
                    entry.group.display_path(),
                    format_size(entry.group.total_size_bytes)
                );
            }
            let total: u64 = groups.values().map(|g| g.total_size_bytes).sum();
            println!("{}", "-".repeat(80));
            println!(
                " {} directories, {} groups, {} total",
                records.len(),
                groups.len(),
                format_size(total)
            );
            if !skipped.is_empty() {
                println!(" {} unreadable entries skipped", skipped.len());
            }
        }
        OutputFormat::Json => {
            let export = ScanExport {
                records: records.values().collect(),
                groups: groups.values().collect(),
                skipped: skipped.len(),
            };
            println!("{}", serde_json::to_string_pretty(&export)?);
        }
    }

    Ok(())
}

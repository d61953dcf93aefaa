use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use zottag::driver::{self, RunError, RunOptions, RunReport};
use zottag::renamer::{RenameRules, RulesError};
use zottag::zotero::{ZoteroClientBuilder, ZoteroError};
use zottag::{LibraryRef, LibraryType};

const EXIT_USAGE: i32 = 1;
const EXIT_INTERNAL: i32 = 2;

/// zottag - split, lowercase and tidy the tags of a Zotero library
#[derive(Parser)]
#[command(name = "zottag")]
#[command(about = "Normalize the tags of a Zotero library in place")]
#[command(version)]
struct Cli {
    /// Numeric user or group ID of the library
    #[arg(value_name = "ZOTEROID")]
    library_id: String,

    /// API key with write access to the library
    #[arg(value_name = "APIKEY")]
    api_key: String,

    /// Whether the ID names a personal or a group library
    #[arg(value_name = "TYPE", value_enum)]
    library_type: LibraryType,

    /// JSON file with custom replacement and removal rules
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// Show what would change without writing to the library
    #[arg(long)]
    dry_run: bool,

    /// Continue when fewer items or tags load than the server reports
    #[arg(long)]
    allow_partial: bool,

    /// Results requested per page
    #[arg(long, value_name = "N", default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..=100))]
    page_size: u64,

    /// Tags removed per delete request
    #[arg(long, value_name = "N", default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..=50))]
    delete_batch_size: u64,

    /// Log request details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // A missing .env file is the normal case
    let _ = dotenvy::dotenv();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            print!("{}", e.render());
            let exit_code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            std::process::exit(exit_code);
        }
    };

    if let Err(e) = zottag::logging::init_logging(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    if let Err(e) = execute(&cli) {
        report_failure(&e);
        std::process::exit(exit_code_for(&e));
    }
}

/// Loads rules, connects to the library and runs the clean-up.
fn execute(cli: &Cli) -> Result<()> {
    let rules = match &cli.rules {
        Some(path) => RenameRules::from_path(path)?,
        None => RenameRules::default(),
    };

    let client = ZoteroClientBuilder::new()
        .library(LibraryRef::new(&cli.library_id, cli.library_type))
        .api_key(&cli.api_key)
        .build()
        .context("Failed to create Zotero client")?;

    let options = RunOptions {
        page_size: cli.page_size as usize,
        delete_batch_size: cli.delete_batch_size as usize,
        dry_run: cli.dry_run,
        allow_partial: cli.allow_partial,
    };

    let mut out = io::stdout().lock();
    let report = driver::run(&client, &rules, &options, &mut out)?;
    print_summary(&report, &mut out)?;

    Ok(())
}

fn print_summary(report: &RunReport, out: &mut dyn Write) -> io::Result<()> {
    if report.dry_run {
        writeln!(out, "Dry run: no changes were written.")
    } else if report.plan.is_empty() {
        writeln!(out, "Nothing to do, every tag is already normalized.")
    } else {
        writeln!(
            out,
            "Everything went amazing! You can sync your Zotero for happiness"
        )
    }
}

/// Prints the failure in a form someone can act on.
fn report_failure(error: &anyhow::Error) {
    match error.downcast_ref::<RunError>() {
        Some(RunError::AddTagsFailed { failures }) => {
            println!("We had an issue adding the tags to:\n");
            for failure in failures {
                println!("  {}: {}", failure.key, failure.reason);
            }
            println!("\nNo tags were deleted. Please check.");
        }
        Some(RunError::DeleteTagsFailed { failed, .. }) => {
            println!("Some tags could not be deleted:\n");
            for outcome in failed {
                println!(
                    "  batch {}: {} ({} tags)",
                    outcome.batch,
                    outcome.error.as_deref().unwrap_or("unknown error"),
                    outcome.tags.len()
                );
            }
        }
        _ => eprintln!("Error: {error:#}"),
    }
}

/// Maps an error to its exit code: usage and configuration problems are 1,
/// run failures carry their own code, anything else is 2.
fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(run_error) = error.downcast_ref::<RunError>() {
        return run_error.exit_code();
    }
    let is_config_error = error.chain().any(|cause| {
        cause.is::<RulesError>()
            || matches!(
                cause.downcast_ref::<ZoteroError>(),
                Some(ZoteroError::Config(_) | ZoteroError::InvalidUrl(_))
            )
    });

    if is_config_error { EXIT_USAGE } else { EXIT_INTERNAL }
}

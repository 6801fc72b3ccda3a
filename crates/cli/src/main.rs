//! # casegrid-cli
//!
//! Command-line interface for refreshing casegrid report workbooks.

use anyhow::{bail, Context, Result};
use casegrid_report::{Dataset, HorizonPlan, KeyNormalizer, RefreshSummary, Refresher, ReportLayout};
use casegrid_sheet::Book;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// casegrid - incremental refresh of daily case report workbooks
#[derive(Parser)]
#[command(name = "casegrid")]
#[command(author, version, about = "Extend multi-sheet case reports with fetched data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Report layout (YAML); the built-in report layout when omitted
    #[arg(short, long, global = true, value_name = "FILE")]
    layout: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Append every period the dataset has beyond the workbook
    Refresh {
        /// Workbook to extend (.json or .xlsx)
        #[arg(short, long)]
        workbook: PathBuf,

        /// Statistics feed (JSON)
        #[arg(short, long)]
        dataset: PathBuf,

        /// National summary per date (JSON object)
        #[arg(short, long)]
        summary: Option<PathBuf>,

        /// Where to save the refreshed workbook (defaults to the input for .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also export the refreshed workbook to this .xlsx file
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Run the refresh but save nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the refresh summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how many periods a refresh would append
    Horizon {
        #[arg(short, long)]
        workbook: PathBuf,

        #[arg(short, long)]
        dataset: PathBuf,
    },

    /// Print the canonical key of each label
    Normalize {
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Resolve report labels against a fetched dataset
    Resolve {
        #[arg(short, long)]
        dataset: PathBuf,

        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Print the active layout as YAML after validating it
    Layout,

    /// Convert an .xlsx workbook to the JSON workbook format
    ImportXlsx { input: PathBuf, output: PathBuf },

    /// Export a JSON workbook to .xlsx
    ExportXlsx { input: PathBuf, output: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let layout = load_layout(cli.layout.as_deref())?;

    match cli.command {
        Command::Refresh {
            workbook,
            dataset,
            summary,
            output,
            xlsx,
            dry_run,
            json,
        } => {
            let dataset = load_dataset(&dataset, summary.as_deref())?;
            let mut book = load_book(&workbook)?;
            let refresher = Refresher::new(layout)?;
            let result = refresher
                .run(&mut book, &dataset)
                .context("Refresh aborted, workbook left unchanged")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }

            if dry_run || result.is_noop() {
                return Ok(());
            }
            let target = save_target(&workbook, output)?;
            book.save_json(&target)
                .with_context(|| format!("Failed to save workbook: {}", target.display()))?;
            println!("{} {}", "Saved".green().bold(), target.display());
            if let Some(xlsx) = xlsx {
                book.save_as_xlsx(&xlsx)
                    .with_context(|| format!("Failed to export: {}", xlsx.display()))?;
                println!("{} {}", "Exported".green().bold(), xlsx.display());
            }
            Ok(())
        }
        Command::Horizon { workbook, dataset } => {
            let dataset = load_dataset(&dataset, None)?;
            let book = load_book(&workbook)?;
            let plan = Refresher::new(layout)?.plan(&book, &dataset)?;
            print_plan(&plan);
            Ok(())
        }
        Command::Normalize { labels } => {
            let normalizer = KeyNormalizer::new(&layout.stop_words);
            for label in &labels {
                let key = normalizer.normalize(label);
                if key.is_empty() {
                    println!("{} {}", label, "(empty)".yellow());
                } else {
                    println!("{} -> {}", label, key.cyan());
                }
            }
            Ok(())
        }
        Command::Resolve { dataset, labels } => {
            let dataset = load_dataset(&dataset, None)?;
            let refresher = Refresher::new(layout)?;
            let index = refresher.index(&dataset);
            let mut failed = 0;
            for label in &labels {
                match index.resolve(label) {
                    Ok(record) => println!("{} -> {} ({})", label, record.name.cyan(), record.id),
                    Err(e) => {
                        failed += 1;
                        println!("{} {e}", "Error:".red().bold());
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} labels did not resolve", labels.len());
            }
            Ok(())
        }
        Command::Layout => {
            print!("{}", layout.to_yaml_string()?);
            Ok(())
        }
        Command::ImportXlsx { input, output } => {
            let book = Book::from_xlsx(&input)
                .with_context(|| format!("Failed to read workbook: {}", input.display()))?;
            book.save_json(&output)
                .with_context(|| format!("Failed to save workbook: {}", output.display()))?;
            println!("{} {} sheets", "Imported".green().bold(), book.sheet_count());
            Ok(())
        }
        Command::ExportXlsx { input, output } => {
            let book = load_book(&input)?;
            book.save_as_xlsx(&output)
                .with_context(|| format!("Failed to export: {}", output.display()))?;
            println!("{} {}", "Exported".green().bold(), output.display());
            Ok(())
        }
    }
}

fn load_layout(path: Option<&Path>) -> Result<ReportLayout> {
    let Some(path) = path else {
        return Ok(ReportLayout::default());
    };
    ReportLayout::from_yaml_file(path)
        .with_context(|| format!("Failed to load layout: {}", path.display()))
}

fn load_dataset(feed: &Path, summary: Option<&Path>) -> Result<Dataset> {
    let mut dataset = Dataset::from_feed_file(feed)
        .with_context(|| format!("Failed to load dataset: {}", feed.display()))?;
    if let Some(path) = summary {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        dataset = dataset
            .with_summary_json(&content)
            .with_context(|| format!("Invalid summary: {}", path.display()))?;
    }
    Ok(dataset)
}

fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
}

/// Load a workbook, picking the format from the file extension.
fn load_book(path: &Path) -> Result<Book> {
    let book = if is_xlsx(path) {
        Book::from_xlsx(path)
    } else {
        Book::from_json_file(path)
    };
    let book = book.with_context(|| format!("Failed to read workbook: {}", path.display()))?;
    tracing::debug!(path = %path.display(), sheets = book.sheet_count(), "loaded workbook");
    Ok(book)
}

/// JSON file the refreshed workbook is written to.
fn save_target(input: &Path, output: Option<PathBuf>) -> Result<PathBuf> {
    match output {
        Some(path) if is_xlsx(&path) => bail!(
            "--output writes the JSON workbook; use --xlsx for {}",
            path.display()
        ),
        Some(path) => Ok(path),
        None if is_xlsx(input) => bail!("Input is .xlsx; pass --output for the refreshed JSON workbook"),
        None => Ok(input.to_path_buf()),
    }
}

fn print_plan(plan: &HorizonPlan) {
    println!(
        "{} {} (last recorded {}, data through {})",
        "Horizon:".cyan().bold(),
        plan.horizon,
        plan.last_recorded,
        plan.last_available
    );
    for period in &plan.new_periods {
        let marker = if plan.trigger_periods.contains(period) {
            " (report day)".yellow().to_string()
        } else {
            String::new()
        };
        println!("  {period}{marker}");
    }
}

fn print_summary(summary: &RefreshSummary) {
    if summary.is_noop() {
        println!("{} up to date at {}", "Report".green().bold(), summary.plan.last_recorded);
        return;
    }
    print_plan(&summary.plan);
    for outcome in &summary.sheets {
        let status = if outcome.is_unchanged() {
            "unchanged".dimmed().to_string()
        } else {
            format!("+{} cols, +{} rows", outcome.columns_added, outcome.rows_added)
        };
        println!("  {:<20} {status}", outcome.sheet);
    }
}

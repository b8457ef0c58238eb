use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use cop_engine::config::{load_from_path, EngineConfig};
use cop_engine::edit;
use cop_engine::ledger::Offense;
use cop_engine::runner::{run_units, CancelToken, RunMode, SourceUnit, UnitResult, UnitRun};
use cop_engine::{Driver, DriverOptions, Registry, UnitReport, UnitStatus};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use ast_grep_language::SupportLang;

#[derive(Parser)]
#[command(name = "cop-engine")]
#[command(about = "Rule-driven static analysis and autocorrection", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report offenses without changing any file
    Check {
        /// Files or directories to inspect (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print offenses as JSON
        #[arg(long)]
        json: bool,
    },

    /// Autocorrect offenses in place
    Fix {
        /// Files or directories to correct (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// List bundled rules
    Rules,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            paths,
            config,
            json,
        } => cmd_check(paths, config, json),

        Commands::Fix {
            paths,
            config,
            dry_run,
            diff,
        } => cmd_fix(paths, config, dry_run, diff),

        Commands::Rules => cmd_rules(),
    }
}

/// Helper: Load the config file, or defaults when none is given.
fn load_config(path: Option<PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(load_from_path(&path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Helper: Collect source files of `language` under `paths`, sorted.
///
/// Explicit file arguments are taken as-is; directories are walked and
/// filtered by extension.
fn discover_sources(paths: &[PathBuf], language: SupportLang) -> Result<Vec<PathBuf>> {
    let roots: Vec<PathBuf> = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths.to_vec()
    };

    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root);
            continue;
        }
        if !root.exists() {
            anyhow::bail!("No such file or directory: {}", root.display());
        }
        for entry in WalkDir::new(&root) {
            let entry = entry?;
            if entry.file_type().is_file() && has_language_extension(entry.path(), language) {
                files.push(entry.path().to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn has_language_extension(path: &Path, language: SupportLang) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| SupportLang::from_str(ext).ok())
        .is_some_and(|lang| lang == language)
}

fn read_units(files: &[PathBuf]) -> Result<Vec<SourceUnit>> {
    files
        .iter()
        .map(|file| {
            let text = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            Ok(SourceUnit::new(file.display().to_string(), text))
        })
        .collect()
}

#[derive(Serialize)]
struct JsonOffense {
    #[serde(flatten)]
    offense: Offense,
    line: usize,
    column: usize,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: &'a str,
    offenses: Vec<JsonOffense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_check(paths: Vec<PathBuf>, config: Option<PathBuf>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let registry = Registry::bundled()?;
    let driver = Driver::new(&registry, DriverOptions::from(&config));

    let files = discover_sources(&paths, config.language())?;
    let units = read_units(&files)?;
    let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();

    let runs = run_units(
        &driver,
        units,
        RunMode::Analyze,
        &CancelToken::new(),
        config.engine.threads,
    )?;

    let mut total_offenses = 0;
    let mut total_failed = 0;
    let mut report = Vec::new();

    for (run, text) in runs.iter().zip(&texts) {
        match &run.result {
            UnitResult::Analyzed(ledger) => {
                let offenses = ledger.sorted_offenses();
                total_offenses += offenses.len();
                if json {
                    report.push(JsonFile {
                        path: &run.name,
                        offenses: offenses
                            .into_iter()
                            .map(|offense| {
                                let location = offense.location(text);
                                JsonOffense {
                                    offense,
                                    line: location.line,
                                    column: location.column,
                                }
                            })
                            .collect(),
                        error: None,
                    });
                } else {
                    for offense in &offenses {
                        print_offense(&run.name, text, offense);
                    }
                }
            }
            UnitResult::Failed(err) => {
                total_failed += 1;
                if json {
                    report.push(JsonFile {
                        path: &run.name,
                        offenses: Vec::new(),
                        error: Some(err.to_string()),
                    });
                } else {
                    eprintln!("{} {}: {}", "✗".red(), run.name, err);
                }
            }
            UnitResult::Corrected(_) | UnitResult::Cancelled => {}
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!(
            "{} inspected, {} found",
            format!("{} files", files.len()).bold(),
            format!("{} offenses", total_offenses).yellow()
        );
    }

    if total_offenses > 0 || total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_fix(paths: Vec<PathBuf>, config: Option<PathBuf>, dry_run: bool, show_diff: bool) -> Result<()> {
    let config = load_config(config)?;
    let registry = Registry::bundled()?;
    let driver = Driver::new(&registry, DriverOptions::from(&config));

    let files = discover_sources(&paths, config.language())?;
    let units = read_units(&files)?;

    let runs = run_units(
        &driver,
        units,
        RunMode::Correct,
        &CancelToken::new(),
        config.engine.threads,
    )?;

    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    let totals = apply_runs(&runs, &files, dry_run, show_diff);

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} fixed", format!("{}", totals.fixed).green());
    println!("  {} offenses remaining", format!("{}", totals.remaining).yellow());
    println!("  {} failed", format!("{}", totals.failed).red());

    if totals.remaining > 0 || totals.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FixTotals {
    fixed: usize,
    remaining: usize,
    failed: usize,
}

/// Helper: Report each unit and write its correction.
///
/// A file that fails to write is counted and skipped; later files are still
/// written.
fn apply_runs(runs: &[UnitRun], files: &[PathBuf], dry_run: bool, show_diff: bool) -> FixTotals {
    let mut totals = FixTotals::default();

    for (run, file) in runs.iter().zip(files) {
        let report = match &run.result {
            UnitResult::Corrected(report) => report,
            UnitResult::Failed(err) => {
                eprintln!("{} {}: {}", "✗".red(), run.name, err);
                totals.failed += 1;
                continue;
            }
            UnitResult::Analyzed(_) | UnitResult::Cancelled => continue,
        };

        for fault in &report.faults {
            eprintln!(
                "{} {}: rule {} faulted at {}: {}",
                "!".yellow(),
                run.name,
                fault.rule,
                fault.node,
                fault.reason
            );
        }

        let remaining = report.final_offenses();
        totals.remaining += remaining.len();
        for offense in remaining {
            print_offense(&run.name, report.final_text(), offense);
        }

        match report.status() {
            UnitStatus::Fixed | UnitStatus::PartiallyFixed => {
                if let Some(corrected) = report.corrected_text() {
                    if let Err(err) = write_correction(file, report, corrected, dry_run) {
                        eprintln!("{} {}: {:#}", "✗".red(), run.name, err);
                        totals.failed += 1;
                        continue;
                    }
                    totals.fixed += 1;
                    if show_diff {
                        display_diff(file, report.original_text(), corrected);
                    }
                }
            }
            UnitStatus::Aborted => {
                eprintln!(
                    "{} {}: correction aborted after {} passes, file left unchanged",
                    "✗".red(),
                    run.name,
                    report.iterations()
                );
                totals.failed += 1;
            }
            UnitStatus::Clean | UnitStatus::Reported => {}
        }
    }

    totals
}

fn write_correction(file: &Path, report: &UnitReport, corrected: &str, dry_run: bool) -> Result<()> {
    let verb = if dry_run { "Would fix" } else { "Fixed" };
    if !dry_run {
        edit::persist(file, report.original_text(), corrected)
            .with_context(|| format!("failed to write {}", file.display()))?;
    }
    println!(
        "{} {}: {} ({} passes, {:?})",
        "✓".green(),
        file.display(),
        verb,
        report.iterations(),
        report.status()
    );
    Ok(())
}

fn cmd_rules() -> Result<()> {
    let registry = Registry::bundled()?;
    println!("{}", "Bundled rules:".bold());
    for registered in registry.rules() {
        let rule = registered.rule();
        let kinds = if rule.interested_kinds().is_empty() {
            "*".to_string()
        } else {
            rule.interested_kinds().join(", ")
        };
        let correctable = if rule.supports_autocorrect() {
            "correctable".green()
        } else {
            "report-only".dimmed()
        };
        println!(
            "  {} [{}] {} ({})",
            registered.id().as_str().cyan(),
            rule.severity(),
            correctable,
            kinds
        );
        if !rule.description().is_empty() {
            println!("      {}", rule.description().dimmed());
        }
    }
    Ok(())
}

/// Helper: Print one offense as `path:line:col: severity: [rule] message`.
fn print_offense(path: &str, source: &str, offense: &Offense) {
    let location = offense.location(source);
    let marker = if offense.correctable { " [correctable]" } else { "" };
    println!(
        "{}:{}:{}: {}: {} {}{}",
        path,
        location.line,
        location.column,
        offense.severity.to_string().yellow(),
        format!("[{}]", offense.rule).cyan(),
        offense.message,
        marker.dimmed()
    );
}

/// Helper: Show unified diff between original and corrected content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (corrected)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

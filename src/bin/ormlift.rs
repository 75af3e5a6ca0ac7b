//! ormlift: TypeORM to Prisma codemod
//!
//! # Usage
//!
//! ```bash
//! # Rewrite a NestJS project in place and write prisma/schema.prisma
//! ormlift src/
//!
//! # Show what would change without writing anything
//! ormlift src/ --dry-run --format json
//!
//! # Print the rewrite rule table
//! ormlift rules
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use ormlift::prelude::*;
use ormlift::rewrite::RULES;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &["node_modules", "dist", ".git"];

#[derive(Parser)]
#[command(name = "ormlift")]
#[command(version)]
#[command(about = "Lift TypeORM repository code onto the Prisma client", long_about = None)]
#[command(after_help = "EXAMPLES:
    ormlift src/
    ormlift src/users/users.service.ts --dry-run
    ormlift src/ --schema-out prisma/schema.prisma --format json")]
struct Cli {
    /// Files or directories to transform
    paths: Vec<PathBuf>,

    /// Config file (defaults to ./ormlift.toml, then the user config dir)
    #[arg(short, long, env = "ORMLIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Where the generated schema is written
    #[arg(long, default_value = "prisma/schema.prisma")]
    schema_out: PathBuf,

    /// Report changes without writing files
    #[arg(short, long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the repository method rewrite table
    Rules,
}

/// Outcome for one file, as reported with `--format json`.
#[derive(Serialize)]
struct FileReport {
    path: PathBuf,
    changed: bool,
    flags: ChangeFlags,
    models: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct RunReport {
    files: Vec<FileReport>,
    schema: Option<PathBuf>,
    dry_run: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Some(Commands::Rules) = &cli.command {
        show_rules();
        return;
    }
    if cli.paths.is_empty() {
        println!("{}", "ormlift: TypeORM to Prisma codemod".cyan().bold());
        println!();
        println!("Usage: ormlift <PATHS>... [OPTIONS]");
        println!();
        println!("Try: ormlift --help");
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ormlift=debug" } else { "ormlift=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = CodemodConfig::load(cli.config.as_deref()).context("loading config")?;
    let codemod = Codemod::new(config);
    let mut schema = SchemaDocument::new(&codemod.config().schema);
    let mut reports = Vec::new();

    for path in discover(&cli.paths) {
        let report = process_file(&codemod, &path, cli.dry_run, &mut schema);
        if cli.format == OutputFormat::Text {
            print_report(&report);
        }
        reports.push(report);
    }

    let schema_path = if schema.is_empty() {
        None
    } else {
        if !cli.dry_run {
            write_schema(&cli.schema_out, &schema)?;
        }
        Some(cli.schema_out.clone())
    };

    match cli.format {
        OutputFormat::Json => {
            let report = RunReport {
                files: reports,
                schema: schema_path,
                dry_run: cli.dry_run,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => print_summary(&reports, schema_path.as_deref(), cli.dry_run),
    }
    Ok(())
}

/// Every `.ts` file under the given paths, sorted, declaration files excluded.
fn discover(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in paths {
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.depth() > 0
                    && e.file_name().to_str().is_some_and(|name| SKIP_DIRS.contains(&name)))
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file() && is_typescript(path) {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn is_typescript(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    name.ends_with(".ts") && !name.ends_with(".d.ts")
}

fn process_file(codemod: &Codemod, path: &Path, dry_run: bool, schema: &mut SchemaDocument) -> FileReport {
    let mut report = FileReport {
        path: path.to_path_buf(),
        changed: false,
        flags: ChangeFlags::default(),
        models: Vec::new(),
        error: None,
    };
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            warn!(path = %path.display(), "unreadable: {e}");
            report.error = Some(e.to_string());
            return report;
        }
    };

    match codemod.transform(&source) {
        Ok(transformation) => {
            report.flags = transformation.flags;
            report.models = transformation.schema.models.iter().map(|m| m.name.clone()).collect();
            report.changed = transformation.output != source;
            schema.accept(&transformation.schema);
            if report.changed
                && !dry_run
                && let Err(e) = fs::write(path, &transformation.output)
            {
                report.error = Some(e.to_string());
            }
            debug!(path = %path.display(), changed = report.changed, "processed");
        }
        Err(e) => {
            let message = match e.line_col(&source) {
                Some((line, col)) => format!("{line}:{col}: {e}"),
                None => e.to_string(),
            };
            warn!(path = %path.display(), "skipped: {message}");
            report.error = Some(message);
        }
    }
    report
}

fn write_schema(path: &Path, schema: &SchemaDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, schema.render()).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn print_report(report: &FileReport) {
    let path = report.path.display().to_string();
    if let Some(error) = &report.error {
        println!("  {} {} {}", "✗".red(), path, error.dimmed());
        return;
    }
    if !report.changed {
        println!("  {} {}", "·".dimmed(), path.dimmed());
        return;
    }
    let mut tags = Vec::new();
    let flags = report.flags;
    if flags.entities {
        tags.push("entities");
    }
    if flags.repositories {
        tags.push("repositories");
    }
    if flags.modules {
        tags.push("modules");
    }
    if flags.services {
        tags.push("services");
    }
    println!("  {} {} {}", "✓".green(), path, format!("[{}]", tags.join(", ")).cyan());
}

fn print_summary(reports: &[FileReport], schema: Option<&Path>, dry_run: bool) {
    let changed = reports.iter().filter(|r| r.changed).count();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    println!();
    println!(
        "{} {} of {} files{}",
        if dry_run { "Would change".yellow().bold() } else { "Changed".green().bold() },
        changed,
        reports.len(),
        if failed > 0 {
            format!(", {} failed", failed).red().to_string()
        } else {
            String::new()
        }
    );
    if let Some(path) = schema {
        let verb = if dry_run { "Would write schema to" } else { "Wrote schema to" };
        println!("{} {}", verb.green(), path.display().to_string().white());
    }
}

fn show_rules() {
    println!("{}", "Repository method rewrites".cyan().bold());
    println!();
    for rule in RULES {
        println!(
            "  {} → {} {}",
            format!("{:<20}", rule.source).yellow(),
            format!("{:<12}", rule.target).green(),
            format!("{:?}", rule.transform).dimmed()
        );
    }
    println!(
        "  {}   {}",
        format!("{:<20}", ormlift::rewrite::QUERY_BUILDER).yellow(),
        "left as is, flagged for manual port".dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_skips_unreadable_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/node_modules")).unwrap();
        fs::write(dir.path().join("src/user.service.ts"), "export {};\n").unwrap();
        fs::write(dir.path().join("src/user.d.ts"), "").unwrap();
        fs::write(dir.path().join("src/node_modules/dep.ts"), "").unwrap();

        let missing = dir.path().join("missing");
        let files = discover(&[missing, dir.path().to_path_buf()]);
        assert_eq!(files, vec![dir.path().join("src/user.service.ts")]);
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;

use tabulacion_ranking::{
    export::{write_csv, ReportEnvelope},
    load_records, EngineConfig,
};

#[derive(Parser)]
#[command(name = "tabulacion")]
#[command(about = "Rank tabulación tasks by process code")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Engine config (JSON); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Top-N process codes across a task export (.csv, .json, .txt)
    Rank {
        file: PathBuf,

        /// Report length (defaults to the config's default_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show how individual task names are classified
    Classify {
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// List the reference taxonomy
    Taxonomy,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Rank {
            file,
            limit,
            format,
        } => run_rank(&config, file, limit.unwrap_or(config.default_limit), format),
        Command::Classify { texts } => run_classify(&config, &texts),
        Command::Taxonomy => run_taxonomy(&config),
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TABULACION_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn run_rank(config: &EngineConfig, file: PathBuf, limit: usize, format: OutputFormat) -> Result<()> {
    let aggregator = config.build()?;
    let records = load_records(&file)
        .with_context(|| format!("Failed to load tasks from {}", file.display()))?;
    let outcome = aggregator.aggregate_records(&records, limit);

    match format {
        OutputFormat::Json => {
            println!("{}", ReportEnvelope::new(&outcome, limit).to_json_pretty()?);
        }
        OutputFormat::Csv => {
            write_csv(&outcome.report, io::stdout().lock())?;
        }
        OutputFormat::Table => {
            let summary = &outcome.summary;

            println!("📊 Top {} tabulaciones - {}", limit, file.display());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!(
                "✓ {} tasks: {} classified, {} unclassified, {} distinct codes\n",
                summary.records, summary.classified, summary.unclassified, summary.distinct_codes
            );

            if outcome.report.is_empty() {
                println!("Nothing to display.");
                return Ok(());
            }

            let width = outcome
                .report
                .iter()
                .map(|entry| entry.display_name().chars().count())
                .max()
                .unwrap_or(0);

            for (position, entry) in outcome.report.iter().enumerate() {
                let marker = if entry.code.is_canonical() { " " } else { "*" };
                println!(
                    "{:>3}. {:<width$} {:>6}{}",
                    position + 1,
                    entry.display_name(),
                    entry.count,
                    marker,
                    width = width
                );
            }

            if outcome.report.iter().any(|entry| !entry.code.is_canonical()) {
                println!("\n* not in the reference taxonomy");
            }
        }
    }

    Ok(())
}

fn run_classify(config: &EngineConfig, texts: &[String]) -> Result<()> {
    let aggregator = config.build()?;

    for text in texts {
        let classification = aggregator.classify(text);

        println!("🔎 {:?}", text);
        println!("   layer:      {}", classification.layer);
        println!(
            "   candidates: {}",
            classification
                .candidates
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        if classification.is_unclassified() {
            println!("   codes:      (unclassified)");
        } else {
            let codes: Vec<String> = classification
                .codes
                .iter()
                .map(|code| {
                    if code.is_canonical() {
                        code.to_string()
                    } else {
                        format!("{} (unknown)", code)
                    }
                })
                .collect();
            println!("   codes:      {}", codes.join(", "));
        }
    }

    Ok(())
}

fn run_taxonomy(config: &EngineConfig) -> Result<()> {
    let taxonomy = config.reference_taxonomy();

    println!("📚 Reference taxonomy ({} codes)", taxonomy.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for code in taxonomy.iter() {
        println!("{}{}", "  ".repeat(code.depth().saturating_sub(1)), code);
    }

    Ok(())
}

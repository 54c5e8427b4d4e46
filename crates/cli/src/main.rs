use anyhow::Result;
use clap::{Parser, Subcommand};
use semorg_core::config;
use semorg_core::pipeline::{Organizer, DEFAULT_UNDO_DIR};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref());
    let organizer = Organizer::new(cfg).with_undo_dir(&cli.undo_dir);

    match cli.command {
        Commands::Analyze { sources, json } => run_analyze(&organizer, &sources, json).await,
        Commands::Organize {
            sources,
            dest,
            threshold,
            execute,
            json,
        } => run_organize(&organizer, &sources, dest, threshold, execute, json).await,
        Commands::Undo { journal, json } => run_undo(&organizer, journal, json).await,
        Commands::Search {
            query,
            sources,
            topk,
            json,
        } => run_search(&organizer, &sources, &query, topk, json).await,
        Commands::Ask { question, sources } => run_ask(&organizer, &sources, &question).await,
    }
}

#[derive(Parser)]
#[command(name = "semorg")]
#[command(about = "Semantic file organizer", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding undo journals
    #[arg(long, default_value = DEFAULT_UNDO_DIR)]
    undo_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze files and report the groups that would be formed
    Analyze {
        /// Files or directories to analyze
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Group related files into project folders
    Organize {
        /// Files or directories to organize
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Destination root (defaults to the configured output directory)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Similarity threshold override, 0 < t <= 1
        #[arg(long)]
        threshold: Option<f32>,
        /// Actually move files; without this flag the run is a dry run
        #[arg(long, default_value_t = false)]
        execute: bool,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Revert the most recent organization run (or a named journal)
    Undo {
        /// Undo journal to replay; newest is used when omitted
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Rank files against a free-text query
    Search {
        /// Query text
        query: String,
        /// Files or directories to search
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Number of results
        #[arg(short, long, default_value_t = 10)]
        topk: usize,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask a question about the scanned files (needs a chat provider)
    Ask {
        /// Question text
        question: String,
        /// Files or directories to read
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
}

async fn run_analyze(organizer: &Organizer, sources: &[PathBuf], json: bool) -> Result<()> {
    let report = organizer.analyze(sources).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Analyzed {} files", report.total_files);
    for (kind, count) in &report.by_type {
        println!("  {kind}: {count}");
    }
    if report.clusters.is_empty() {
        println!("No related file groups found.");
        return Ok(());
    }
    println!("\nFound {} project groups:", report.clusters.len());
    for cluster in &report.clusters {
        println!(
            "  {} ({}, {} files, confidence {:.2})",
            cluster.name, cluster.project_type, cluster.file_count, cluster.confidence
        );
        if !cluster.common_keywords.is_empty() {
            println!("    keywords: {}", cluster.common_keywords.join(", "));
        }
    }
    println!("\n{} files did not join any group", report.unclustered_files);
    Ok(())
}

async fn run_organize(
    organizer: &Organizer,
    sources: &[PathBuf],
    dest: Option<PathBuf>,
    threshold: Option<f32>,
    execute: bool,
    json: bool,
) -> Result<()> {
    let summary = organizer
        .organize(sources, dest.as_deref(), threshold, execute)
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.projects.is_empty() {
        println!("Nothing to organize ({} files scanned).", summary.total_files);
        return Ok(());
    }
    let mode = if summary.dry_run { "Would organize" } else { "Organized" };
    println!(
        "{mode} {} of {} files into {} projects:",
        summary.organized_files,
        summary.total_files,
        summary.projects.len()
    );
    for project in &summary.projects {
        println!(
            "  {} ({}, {} files)",
            project.project_name,
            project.project_type.title(),
            project.file_count
        );
    }
    for report in &summary.reports {
        if report.failed_operations > 0 {
            println!(
                "  {}: {} operations failed",
                report.project_name, report.failed_operations
            );
            for err in &report.errors {
                println!("    {err}");
            }
        }
    }
    if let Some(journal) = &summary.undo_journal {
        println!("Undo journal: {}", journal.display());
    }
    if summary.dry_run {
        println!("Dry run only. Pass --execute to move files.");
    }
    Ok(())
}

async fn run_undo(organizer: &Organizer, journal: Option<PathBuf>, json: bool) -> Result<()> {
    match organizer.undo(journal.as_deref()).await? {
        Some(outcome) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "Reverted {} operations from {} ({} failed)",
                    outcome.report.successful_operations,
                    outcome.journal.display(),
                    outcome.report.failed_operations
                );
                for err in &outcome.report.errors {
                    println!("  {err}");
                }
            }
        }
        None => println!("No undo journals found."),
    }
    Ok(())
}

async fn run_search(
    organizer: &Organizer,
    sources: &[PathBuf],
    query: &str,
    topk: usize,
    json: bool,
) -> Result<()> {
    let hits = organizer.search(sources, query, topk).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for hit in &hits {
        println!("{:.3}  {}", hit.score, hit.path.display());
    }
    Ok(())
}

async fn run_ask(organizer: &Organizer, sources: &[PathBuf], question: &str) -> Result<()> {
    let answer = organizer.ask(sources, question).await?;
    println!("{answer}");
    Ok(())
}

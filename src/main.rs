mod config;
mod error;
mod normalize;
mod pipeline;
mod render;
mod scanner;
mod strains;
mod transform;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use normalize::Simplifier;
use pipeline::{Pipeline, RunSummary};

#[derive(Parser)]
#[command(
    name = "poem_markdown",
    about = "Render classical Chinese poem JSON with tonal patterns as Markdown",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Options for a bare invocation, same as `convert`
    #[command(flatten)]
    convert: ConvertArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Convert poem files → <output>/*.md
    Convert(ConvertArgs),
    /// Load the strain directory and report what it contains
    Strains {
        /// Directory of strain JSON files
        #[arg(long = "strains", env = "STRAIN_DIR", default_value = "strains")]
        strain_dir: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Directory of poem JSON files
    #[arg(long = "poems", env = "POEM_DIR", default_value = "poems")]
    poem_dir: PathBuf,
    /// Directory of strain JSON files
    #[arg(long = "strains", env = "STRAIN_DIR", default_value = "strains")]
    strain_dir: PathBuf,
    /// Output directory, created if missing
    #[arg(long = "output", env = "OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,
    /// Convert every poem file instead of stopping after the first
    #[arg(long, env = "POEM_ALL_FILES")]
    all_files: bool,
    /// Append 字数/句数 sections
    #[arg(long = "counts")]
    include_counts: bool,
}

impl From<ConvertArgs> for Config {
    fn from(args: ConvertArgs) -> Self {
        Config {
            poem_dir: args.poem_dir,
            strain_dir: args.strain_dir,
            output_dir: args.output_dir,
            all_files: args.all_files,
            include_counts: args.include_counts,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Convert(args)) => run_convert(args.into()),
        Some(Command::Strains { strain_dir }) => run_strains(&strain_dir),
        // Default: convert
        None => run_convert(cli.convert.into()),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  CONVERT MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_convert(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        poems = %config.poem_dir.display(),
        strains = %config.strain_dir.display(),
        output = %config.output_dir.display(),
        all_files = config.all_files,
        "starting conversion"
    );

    let summary = Pipeline::new(config, Simplifier)
        .run()
        .context("conversion aborted")?;

    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    tracing::info!(
        files = summary.strain_files,
        skipped = summary.strain_files_skipped,
        entries = summary.strain_entries,
        overwritten = summary.strain_overwrites,
        "strain index"
    );
    for file in &summary.files {
        tracing::info!(
            source = %file.source,
            output = %file.output.display(),
            converted = file.converted,
            "wrote"
        );
        for poem in &file.dropped {
            tracing::debug!(
                source = %file.source,
                position = poem.position,
                id = ?poem.id,
                reason = %poem.reason,
                "dropped"
            );
        }
    }

    let dropped: usize = summary.files.iter().map(|f| f.dropped.len()).sum();
    tracing::info!(
        files_written = summary.files.len(),
        files_failed = summary.failed.len(),
        poems_converted = summary.converted(),
        poems_dropped = dropped,
        stopped_early = summary.stopped_early,
        "conversion finished"
    );
    for (file, error) in &summary.failed {
        tracing::warn!(file = %file, error = %error, "file not converted");
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  STRAINS MODE
// ═══════════════════════════════════════════════════════════════════════

fn run_strains(dir: &Path) -> anyhow::Result<()> {
    let load = strains::load_strains(dir)
        .with_context(|| format!("cannot load strains from {}", dir.display()))?;

    println!("files:       {}", load.files_considered);
    println!("skipped:     {}", load.skipped.len());
    for name in &load.skipped {
        println!("  {name}");
    }
    if load.index.is_empty() {
        tracing::warn!(dir = %dir.display(), "no strain entries found");
    }
    println!("entries:     {}", load.index.len());
    println!("overwritten: {}", load.index.overwritten);
    Ok(())
}

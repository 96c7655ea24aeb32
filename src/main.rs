// Blueprint - plan-ranked, test-repaired code synthesis
// Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use blueprint::config::load_config;
use blueprint::dataset::JsonlDataset;
use blueprint::providers::create_provider;
use blueprint::results::ResultStore;
use blueprint::runner::run_problems;
use blueprint::Solver;

#[derive(Parser)]
#[command(name = "blueprint")]
#[command(about = "Solve programming problems with ranked plans and test-driven repair")]
#[command(version)]
struct Args {
    /// Log at debug level (prompts and responses)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve every problem in a JSONL file
    Solve {
        /// Problems, one JSON object per line
        #[arg(long)]
        problems: PathBuf,

        /// Results file (JSONL); existing entries are skipped
        #[arg(long)]
        results: PathBuf,

        /// Config file (default: ~/.blueprint/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Exemplars to retrieve
        #[arg(long)]
        k: Option<usize>,

        /// Evaluations per plan
        #[arg(long)]
        t: Option<usize>,

        /// Target language, e.g. Python3
        #[arg(long)]
        language: Option<String>,

        /// Model name or preset (gpt4, chatgpt)
        #[arg(long)]
        model: Option<String>,

        /// Problems read stdin and write stdout
        #[arg(long)]
        stdio: bool,

        /// Delete the results file before starting
        #[arg(long)]
        discard_previous: bool,
    },

    /// Print the summary of a results file
    Summary {
        #[arg(long)]
        results: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "blueprint=debug"
    } else {
        "blueprint=info"
    };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Solve {
            problems,
            results,
            config,
            k,
            t,
            language,
            model,
            stdio,
            discard_previous,
        } => {
            let mut config = load_config(config.as_deref())?;

            if let Some(k) = k {
                config.solver.k = k;
            }
            if let Some(t) = t {
                config.solver.t = t;
            }
            if let Some(language) = language {
                config.solver.language = language;
            }
            if let Some(model) = model {
                if let Some(entry) = config.providers.first_mut() {
                    entry.set_model(&model);
                }
            }
            if stdio {
                config.evaluator.stdio = true;
            }
            config.validate().context("Invalid settings after applying flags")?;

            let provider = create_provider(&config)?;
            let dataset = Arc::new(JsonlDataset::load(&problems, &config.evaluator)?);
            let problems = dataset.problems().to_vec();
            let mut store = ResultStore::open(&results, discard_previous)?;

            let solver = Solver::new(provider, dataset, config.solver.clone());
            let summary = run_problems(&solver, &problems, &mut store).await?;

            println!("{}", summary);
        }

        Command::Summary { results } => {
            if !results.exists() {
                anyhow::bail!("Results file not found: {}", results.display());
            }
            let store = ResultStore::open(&results, false)?;
            println!("{}", store.summary());
        }
    }

    Ok(())
}

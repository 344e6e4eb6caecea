#![forbid(unsafe_code)]

//! `tunegrid`: evaluate a built-in model over an argument grid.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tg_cli::report::{format_optimal, write_optimal_csv};
use tg_cli::{run_pipeline, RunConfig};
use tg_viz::{render_text, write_vega_lite};

/// Grid evaluation of model arguments against held-out data.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every combination and report the optimal ones
    Run {
        /// JSON run configuration
        #[arg(short, long)]
        config: PathBuf,
        /// Diagnostics table CSV (stdout when absent)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Vega-Lite plot document
        #[arg(long)]
        plot: Option<PathBuf>,
        /// Optimal rows CSV
        #[arg(long)]
        optimal: Option<PathBuf>,
        /// Print the plot series as text on stderr
        #[arg(long)]
        show_plot: bool,
    },
    /// Enumerate the grid without evaluating anything
    Grid {
        /// JSON run configuration
        #[arg(short, long)]
        config: PathBuf,
        /// Print at most this many combinations
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<RunConfig> {
    RunConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

fn run(
    config: PathBuf,
    out: Option<PathBuf>,
    plot: Option<PathBuf>,
    optimal: Option<PathBuf>,
    show_plot: bool,
) -> Result<()> {
    let config = load_config(&config)?;
    let report = run_pipeline(&config).context("grid evaluation failed")?;

    match &out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            report.run.table.write_csv(BufWriter::new(file))?;
            tracing::info!("Wrote {} rows to {}", report.run.table.len(), path.display());
        }
        None => report.run.table.write_csv(io::stdout().lock())?,
    }

    let summary = format_optimal(&report.choices);
    if out.is_some() {
        print!("{summary}");
    } else {
        eprint!("{summary}");
    }

    if let Some(path) = &optimal {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_optimal_csv(&report.optimal, BufWriter::new(file))?;
    }

    match (&report.plot, &plot) {
        (Some((data, spec)), Some(path)) => {
            write_vega_lite(path, data, spec)
                .with_context(|| format!("writing plot {}", path.display()))?;
        }
        (None, Some(_)) => {
            anyhow::bail!("--plot given but the config has no \"plot\" section");
        }
        _ => {}
    }
    if show_plot {
        if let Some((data, _)) = &report.plot {
            eprint!("{}", render_text(data));
        }
    }

    io::stdout().flush()?;
    Ok(())
}

fn grid(config: PathBuf, limit: Option<usize>) -> Result<()> {
    let config = load_config(&config)?;
    let grid = config.grid().context("invalid argument grid")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{} combinations of {}", grid.size(), grid.names().join(", "))?;
    for (index, combination) in grid.combinations().take(limit.unwrap_or(usize::MAX)).enumerate() {
        writeln!(out, "{index:>6}  {combination}")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            config,
            out,
            plot,
            optimal,
            show_plot,
        } => run(config, out, plot, optimal, show_plot),
        Command::Grid { config, limit } => grid(config, limit),
    }
}

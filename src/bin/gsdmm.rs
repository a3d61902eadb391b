//! Command line front end for fitting a Dirichlet Multinomial Mixture.
//!
//! ```text
//! gsdmm fit --input tweets.jsonl --max-clusters 200 --seed 7 -v
//! ```

use clap::{Args, Parser, Subcommand};
use gsdmm::{load_corpus, CorpusFormat, Dmm, Hyperparameters};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Short-text clustering with a Dirichlet Multinomial Mixture.
#[derive(Parser)]
#[command(name = "gsdmm", version, about)]
struct Cli {
    /// Verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the model to a corpus and write one label per document
    Fit(FitArgs),
}

#[derive(Args)]
struct FitArgs {
    /// Path to the corpus file
    #[arg(short, long)]
    input: PathBuf,

    /// Corpus format: ldac, jsonl or txt (inferred from the extension if omitted)
    #[arg(short = 't', long = "format")]
    format: Option<CorpusFormat>,

    /// Upper bound on the number of clusters
    #[arg(short = 'k', long, default_value_t = Hyperparameters::default().max_clusters)]
    max_clusters: usize,

    /// Concentration parameter, intended range (0, 1)
    #[arg(long, default_value_t = Hyperparameters::default().concentration)]
    alpha: f64,

    /// Smoothing parameter, > 0
    #[arg(long, default_value_t = Hyperparameters::default().smoothing)]
    beta: f64,

    /// Upper bound on Gibbs sweeps
    #[arg(long, default_value_t = Hyperparameters::default().max_sweeps)]
    max_sweeps: usize,

    /// Random seed for a reproducible fit
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the labels (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run_fit(args: FitArgs) -> gsdmm::Result<()> {
    tracing::info!(path = %args.input.display(), "loading corpus");
    let (corpus, _vocab) = load_corpus(&args.input, args.format)?;

    let mut dmm = Dmm::from_params(Hyperparameters {
        max_clusters: args.max_clusters,
        concentration: args.alpha,
        smoothing: args.beta,
        max_sweeps: args.max_sweeps,
    });
    if let Some(seed) = args.seed {
        dmm = dmm.with_seed(seed);
    }

    tracing::info!(docs = corpus.len(), vocab = corpus.vocab_size(), "fitting model");
    let fit = dmm.fit(&corpus)?;
    tracing::info!(
        status = ?fit.status,
        sweeps = fit.sweeps,
        clusters = fit.n_clusters(),
        "fit complete"
    );

    if corpus.labels().is_some() {
        let score = corpus.adjusted_rand_index(&fit.labels)?;
        tracing::info!(ari = score, "adjusted rand index against ground truth");
    }

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);
    for label in &fit.labels {
        writeln!(out, "{label}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Fit(args) => run_fit(args),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "gsdmm failed");
        std::process::exit(1);
    }
}

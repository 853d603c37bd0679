//! Train and apply landing-outcome classifiers.
//!
//! Usage:
//!   liftoff train --input data/spacex_clean.csv --artifacts-dir artifacts
//!   liftoff predict --artifact artifacts/best_model.json --input new_launches.csv

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liftoff_ml::pipeline::{load_artifact, RunReport};
use liftoff_ml::PipelineConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "liftoff")]
#[command(about = "Select and apply the best landing-outcome classifier")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train every candidate, keep the most accurate one
    Train {
        /// JSON config file; flags below override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Clean launch table (CSV)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for the model artifact and metrics report
        #[arg(short, long)]
        artifacts_dir: Option<PathBuf>,

        /// Fraction of rows held out for evaluation
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Random seed for the split
        #[arg(short, long)]
        seed: Option<u64>,

        /// Train candidates one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Score a clean CSV with a saved model
    Predict {
        /// Model artifact written by `train`
        #[arg(short, long, default_value = "artifacts/best_model.json")]
        artifact: PathBuf,

        /// CSV with the same feature columns (a Class column is ignored)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn print_summary(report: &RunReport) {
    println!("\n{}", "=".repeat(44));
    println!("MODEL SELECTION SUMMARY");
    println!("{}", "=".repeat(44));
    println!("Train rows: {}, Test rows: {}", report.n_train, report.n_test);
    println!("{:-<44}", "");
    println!("{:<4} {:<12} {:>10}  {}", "#", "Candidate", "Accuracy", "Status");
    println!("{:-<44}", "");
    for c in &report.candidates {
        match &c.outcome {
            Ok(s) => println!(
                "{:<4} {:<12} {:>10.4}  ok",
                c.index, c.name, s.evaluation.accuracy
            ),
            Err(_) => println!("{:<4} {:<12} {:>10}  failed", c.index, c.name, "-"),
        }
    }
    println!("{:-<44}", "");
    println!(
        "\nBest model: {} (accuracy={:.4})",
        report.selection.name, report.selection.accuracy
    );
    println!("Saved model to {}", report.paths.artifact.display());
    println!("Saved metrics to {}", report.paths.metrics.display());
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Train {
            config,
            input,
            artifacts_dir,
            test_fraction,
            seed,
            sequential,
        } => {
            let mut cfg = match config {
                Some(path) => PipelineConfig::from_json_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(p) = input {
                cfg.input_path = p;
            }
            if let Some(d) = artifacts_dir {
                cfg.artifacts_dir = d;
            }
            if let Some(f) = test_fraction {
                cfg.test_fraction = f;
            }
            if let Some(s) = seed {
                cfg.seed = s;
            }
            if sequential {
                cfg.parallel = false;
            }

            tracing::info!(
                input = %cfg.input_path.display(),
                seed = cfg.seed,
                "starting training run"
            );
            let report = liftoff_ml::run(&cfg)?;
            println!("Features: {}, Samples: {}", report.n_features, report.n_samples);
            print_summary(&report);
        }
        Command::Predict { artifact, input } => {
            let bundle = load_artifact(&artifact)?;
            let labels = bundle
                .predict_csv(&input)
                .with_context(|| format!("scoring {}", input.display()))?;
            tracing::info!(
                model = bundle.model.as_classifier().name(),
                rows = labels.len(),
                "scored input"
            );
            for label in labels.iter() {
                println!("{label}");
            }
        }
    }

    Ok(())
}

// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application);
// this layer only routes and prints results.
//
// Four commands are supported:
//   1. `train`    - trains the classifier on labelled sentences
//   2. `predict`  - labels new sentences with a checkpoint
//   3. `evaluate` - scores a checkpoint on labelled sentences
//   4. `score`    - scores an existing predictions file
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, ScoreArgs, TrainArgs};

use crate::domain::level::Level;

/// The main CLI struct; clap generates the parser from the fields.
#[derive(Parser, Debug)]
#[command(
    name = "cefr-classifier",
    version,
    about = "Train a transformer to rate French sentences A1-C2, and score it with exact, coarse and fuzzy accuracy."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Score(args)    => run_score(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on: {}", args.data);
    let checkpoint_dir = args.checkpoint_dir.clone();

    // Convert CLI args → application config
    let summary = TrainUseCase::new(args.into()).execute()?;

    match (summary.best_epoch, summary.best) {
        (Some(epoch), Some(best)) => {
            println!("\nBest checkpoint: epoch {} of {}", epoch, summary.epochs_run);
            println!("{}", best);
        }
        _ => println!(
            "\nNo validation set; the latest of {} epochs will be used for inference.",
            summary.epochs_run
        ),
    }
    println!("Training complete. Checkpoints saved to '{}'.", checkpoint_dir);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case  = PredictUseCase::new(&args.checkpoint_dir, args.device.map(Into::into))?;
    let histogram = use_case.execute(&args.input, &args.output)?;

    let total: usize = histogram.iter().sum();
    println!("Predicted {} sentences → {}", total, args.output.display());
    for (level, count) in Level::ALL.iter().zip(histogram) {
        println!("  {}  {:>6}", level, count);
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(&args.checkpoint_dir, args.device.map(Into::into))?;
    let report   = use_case.execute(&args.data)?;
    println!("{}", report);

    if let Some(path) = &args.report {
        report.save_json(path)?;
        println!("\nReport written to '{}'", path.display());
    }
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<()> {
    use crate::application::score_use_case::ScoreUseCase;

    let accuracy = ScoreUseCase::execute(&args.predictions, &args.truth)?;
    println!("{}", accuracy);
    Ok(())
}

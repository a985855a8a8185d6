use anyhow::Context;
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::path::PathBuf;
use validator::Validate;
use vitals_predictor::{
    config::Config,
    logging::init_tracing,
    ml::{ModelType, Trainer, TrainingOptions},
};

#[derive(Parser)]
#[command(name = "vitals-cli")]
#[command(about = "Train the activity classifier and query the prediction service", long_about = None)]
#[command(version)]
struct Cli {
    /// Prediction service base URL
    #[arg(short, long, global = true, default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model from a labeled CSV dataset and save the artifact
    Train {
        /// Dataset path (defaults to training.dataset_path)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Artifact output path (defaults to model.path)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// random_forest, decision_tree or logistic_regression
        #[arg(short, long)]
        algorithm: Option<ModelType>,

        /// Seed for the split and the estimator
        #[arg(short, long)]
        seed: Option<u64>,

        /// Held-out fraction
        #[arg(short, long)]
        test_size: Option<f64>,

        /// Number of trees (random forest)
        #[arg(short, long)]
        n_trees: Option<u16>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask a running service to classify the latest reading
    Predict,

    /// Show the model loaded by a running service
    Model,

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            dataset,
            model,
            algorithm,
            seed,
            test_size,
            n_trees,
            json,
        } => {
            let mut config = Config::load().context("Failed to load configuration")?;
            init_tracing(&config.observability);

            if let Some(path) = dataset {
                config.training.dataset_path = path;
            }
            if let Some(path) = model {
                config.model.path = path;
            }
            if let Some(algorithm) = algorithm {
                config.training.algorithm = algorithm;
            }
            if let Some(seed) = seed {
                config.training.seed = seed;
            }
            if let Some(test_size) = test_size {
                config.training.test_size = test_size;
            }
            if let Some(n_trees) = n_trees {
                config.training.n_trees = n_trees;
            }
            config
                .training
                .validate()
                .context("Invalid training configuration")?;

            let trainer = Trainer::new(TrainingOptions::from_config(&config));
            let report = tokio::task::spawn_blocking(move || trainer.run())
                .await
                .context("Training task panicked")?
                .context("Training failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Accuracy: {}", report.accuracy);
                println!("Model saved as {}", report.model_path.display());
            }
        }

        Commands::Predict => {
            let body = get_json(&format!("{}/predict", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Model => {
            let body = get_json(&format!("{}/model", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Health => {
            let body = get_json(&format!("{}/health", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}

async fn get_json(url: &str) -> anyhow::Result<serde_json::Value> {
    let response = Client::new()
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .with_context(|| format!("Response from {} is not JSON", url))?;

    if !status.is_success() {
        anyhow::bail!(
            "{} returned {}: {}",
            url,
            status,
            serde_json::to_string_pretty(&body)?
        );
    }
    Ok(body)
}

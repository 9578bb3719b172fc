//! Training Session Example
//!
//! Demonstrates run versioning, top-K checkpoint retention, and metric
//! logging with a synthetic speech-enhancement model whose validation
//! loss decays with noise.
//!
//! Run with: cargo run --example training_session

use std::io::Write;

use ehnet_train::config::{CheckpointConfig, ModelConfig, TrainerConfig};
use ehnet_train::model::{ExecutionEngine, TrainableModel};
use ehnet_train::retain::ScoreMode;
use ehnet_train::track::MetricLogger;
use ehnet_train::trainer::Trainer;
use rand::Rng;

struct CpuEngine;

impl ExecutionEngine for CpuEngine {
    fn device(&self) -> &str {
        "cpu"
    }
}

/// Synthetic EHNet stand-in: loss decays geometrically with noise.
struct SyntheticModel {
    loss: f64,
    rng: rand::rngs::ThreadRng,
}

impl TrainableModel for SyntheticModel {
    fn train_epoch(&mut self, _engine: &dyn ExecutionEngine) -> ehnet_train::Result<()> {
        let noise: f64 = self.rng.gen_range(0.9..1.1);
        self.loss = self.loss * 0.85 * noise;
        Ok(())
    }

    fn evaluate(&mut self) -> ehnet_train::Result<f64> {
        Ok(self.loss)
    }

    fn save_state(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        // A real model streams its parameter tensors here.
        writer.write_all(&self.loss.to_le_bytes())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== EHNet Training Session ===\n");

    // -------------------------------------------------------------------------
    // 1. Configuration (every hyperparameter explicit)
    // -------------------------------------------------------------------------
    println!("1. Building configuration...");

    let model_config = ModelConfig::new(
        "WAVs/dataset/training",
        "WAVs/dataset/validation",
        "WAVs/dataset/testing_seen_noise",
    );
    model_config.validate()?;

    let checkpoints = CheckpointConfig {
        base_dir: "runs".into(),
        run_name: "ehnet".to_string(),
        keep_top_k: 5,
        metric: "val_loss".to_string(),
        mode: ScoreMode::Min,
    };
    let trainer_config = TrainerConfig {
        min_epochs: 1,
        max_epochs: 20,
    };

    println!("   Batch size: {}", model_config.batch_size);
    println!("   Frequency bins: {}", model_config.n_frequency_bins);
    println!(
        "   LSTM: {} layers x {} units ({} dropout)",
        model_config.n_lstm_layers, model_config.n_lstm_units, model_config.lstm_dropout
    );
    println!(
        "   Retention: top {} by {} ({:?})",
        checkpoints.keep_top_k, checkpoints.metric, checkpoints.mode
    );

    // -------------------------------------------------------------------------
    // 2. Allocate a versioned run directory
    // -------------------------------------------------------------------------
    println!("\n2. Allocating run directory...");

    let mut trainer = Trainer::new(trainer_config, checkpoints)?;
    println!("   Version: {}", trainer.run_dir().version());
    println!("   Directory: {}", trainer.run_dir().path().display());

    // -------------------------------------------------------------------------
    // 3. Fit
    // -------------------------------------------------------------------------
    println!("\n3. Training ({} epochs)...", trainer_config.max_epochs);

    let mut model = SyntheticModel {
        loss: 1.0,
        rng: rand::thread_rng(),
    };
    let report = trainer.fit(&mut model, &CpuEngine)?;

    // -------------------------------------------------------------------------
    // 4. Inspect the metric log
    // -------------------------------------------------------------------------
    println!("\n4. Validation loss curve:");

    let records = MetricLogger::read_from_run_dir(&report.run_dir)?;
    for record in &records {
        println!("   Epoch {:>2}: {:.4}", record.epoch(), record.value());
    }

    // -------------------------------------------------------------------------
    // 5. Retained checkpoints
    // -------------------------------------------------------------------------
    println!("\n5. Retained checkpoints (best {} of {} epochs):", 5, report.epochs_trained);
    for path in &report.retained_checkpoints {
        println!("   {}", path.display());
    }
    println!(
        "\n   Best {}: {:.4}",
        "val_loss",
        report.best_score.unwrap_or(f64::NAN)
    );

    println!("\n=== Training Session Complete ===");
    Ok(())
}

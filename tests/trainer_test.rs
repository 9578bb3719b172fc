//! Trainer Integration Tests
//!
//! End-to-end: a trainer allocates a versioned run directory, drives a
//! model through epochs, logs the configured metric, and leaves exactly
//! the top-K checkpoint artifacts behind.

use std::io::Write;

use ehnet_train::config::{CheckpointConfig, ModelConfig, TrainerConfig, TrainingConfig};
use ehnet_train::model::{ExecutionEngine, TrainableModel};
use ehnet_train::retain::ScoreMode;
use ehnet_train::track::MetricLogger;
use ehnet_train::trainer::Trainer;
use tempfile::TempDir;

struct CpuEngine;

impl ExecutionEngine for CpuEngine {
    fn device(&self) -> &str {
        "cpu"
    }
}

/// Stand-in for EHNet: validation loss decays geometrically per epoch.
struct DecayModel {
    loss: f64,
}

impl TrainableModel for DecayModel {
    fn train_epoch(&mut self, _engine: &dyn ExecutionEngine) -> ehnet_train::Result<()> {
        self.loss *= 0.8;
        Ok(())
    }

    fn evaluate(&mut self) -> ehnet_train::Result<f64> {
        Ok(self.loss)
    }

    fn save_state(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writer.write_all(&self.loss.to_le_bytes())
    }
}

fn config(base: &TempDir, keep_top_k: usize, max_epochs: u64) -> (TrainerConfig, CheckpointConfig) {
    (
        TrainerConfig {
            min_epochs: 1,
            max_epochs,
        },
        CheckpointConfig {
            base_dir: base.path().to_path_buf(),
            run_name: "ehnet".to_string(),
            keep_top_k,
            metric: "val_loss".to_string(),
            mode: ScoreMode::Min,
        },
    )
}

// =============================================================================
// End-to-End Fit
// =============================================================================

#[test]
fn test_fit_end_to_end() {
    let base = TempDir::new().unwrap();
    let (trainer_config, checkpoints) = config(&base, 5, 12);
    let mut trainer = Trainer::new(trainer_config, checkpoints).unwrap();

    let mut model = DecayModel { loss: 1.0 };
    let report = trainer.fit(&mut model, &CpuEngine).unwrap();

    assert_eq!(report.epochs_trained, 12);
    assert_eq!(report.version, 0);
    assert_eq!(report.retained_checkpoints.len(), 5);

    // Monotonically improving loss: the best score is the last epoch's.
    let expected_best = 1.0 * 0.8f64.powi(12);
    assert!((report.best_score.unwrap() - expected_best).abs() < 1e-12);

    // Every retained artifact exists and holds the serialized state.
    for path in &report.retained_checkpoints {
        assert_eq!(std::fs::metadata(path).unwrap().len(), 8);
    }
}

#[test]
fn test_fit_logs_every_epoch_metric() {
    let base = TempDir::new().unwrap();
    let (trainer_config, checkpoints) = config(&base, 2, 6);
    let mut trainer = Trainer::new(trainer_config, checkpoints).unwrap();

    let report = trainer
        .fit(&mut DecayModel { loss: 2.0 }, &CpuEngine)
        .unwrap();

    let records = MetricLogger::read_from_run_dir(&report.run_dir).unwrap();
    assert_eq!(records.len(), 6);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.key(), "val_loss");
        assert_eq!(record.epoch(), i as u64);
        assert_eq!(record.run_id(), "ehnet-version_0");
    }
    // The curve is strictly decreasing.
    for pair in records.windows(2) {
        assert!(pair[0].value() > pair[1].value());
    }
}

#[test]
fn test_run_dir_holds_only_checkpoints_and_metric_log() {
    let base = TempDir::new().unwrap();
    let (trainer_config, checkpoints) = config(&base, 3, 10);
    let mut trainer = Trainer::new(trainer_config, checkpoints).unwrap();

    let report = trainer
        .fit(&mut DecayModel { loss: 1.0 }, &CpuEngine)
        .unwrap();

    let mut names: Vec<String> = std::fs::read_dir(&report.run_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let checkpoints = names.iter().filter(|n| n.starts_with("ckpt-")).count();
    assert_eq!(checkpoints, 3);
    assert!(names.contains(&"metrics.jsonl".to_string()));
    assert_eq!(names.len(), 4);
}

// =============================================================================
// Versioning Through the Trainer
// =============================================================================

#[test]
fn test_two_launches_never_share_a_directory() {
    let base = TempDir::new().unwrap();

    let (tc1, cc1) = config(&base, 1, 2);
    let mut first = Trainer::new(tc1, cc1).unwrap();
    let first_report = first.fit(&mut DecayModel { loss: 1.0 }, &CpuEngine).unwrap();

    let (tc2, cc2) = config(&base, 1, 2);
    let mut second = Trainer::new(tc2, cc2).unwrap();
    let second_report = second
        .fit(&mut DecayModel { loss: 1.0 }, &CpuEngine)
        .unwrap();

    assert_eq!(first_report.version, 0);
    assert_eq!(second_report.version, 1);
    assert_ne!(first_report.run_dir, second_report.run_dir);

    // The first run's artifacts are untouched by the second.
    assert_eq!(first_report.retained_checkpoints.len(), 1);
    assert!(first_report.retained_checkpoints[0].exists());
}

// =============================================================================
// Configuration Surface
// =============================================================================

#[test]
fn test_trainer_rejects_invalid_config() {
    let base = TempDir::new().unwrap();
    let (mut trainer_config, checkpoints) = config(&base, 1, 2);
    trainer_config.max_epochs = 0;

    assert!(Trainer::new(trainer_config, checkpoints).is_err());

    let (trainer_config, mut checkpoints) = config(&base, 1, 2);
    checkpoints.keep_top_k = 0;
    assert!(Trainer::new(trainer_config, checkpoints).is_err());
}

#[test]
fn test_full_config_round_trip_through_toml() {
    let base = TempDir::new().unwrap();
    let config = TrainingConfig {
        model: ModelConfig::new(
            "WAVs/dataset/training",
            "WAVs/dataset/validation",
            "WAVs/dataset/testing_seen_noise",
        ),
        checkpoints: CheckpointConfig {
            base_dir: base.path().to_path_buf(),
            run_name: "ehnet".to_string(),
            keep_top_k: 5,
            metric: "val_loss".to_string(),
            mode: ScoreMode::Min,
        },
        trainer: TrainerConfig {
            min_epochs: 200,
            max_epochs: 200,
        },
    };

    let text = toml::to_string(&config).unwrap();
    let path = base.path().join("train.toml");
    std::fs::write(&path, text).unwrap();

    let loaded = TrainingConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

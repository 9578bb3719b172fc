//! Statically enumerated training configuration
//!
//! Every recognized hyperparameter is an explicit field, validated at
//! construction rather than accessed by dynamic attribute lookup. The
//! model hyperparameters are passed through opaquely to the trainable
//! model; the retention core never inspects them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::retain::ScoreMode;
use crate::{Error, Result};

/// EHNet model hyperparameters.
///
/// Defaults reproduce the reference training setup: 32-sample batches of
/// 256-bin spectrograms through 256 convolutional kernels (32 frequency x
/// 11 time) into a 2-layer, 1024-unit LSTM with 0.3 dropout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Directory of training WAV spectrograms
    pub train_dir: PathBuf,
    /// Directory of validation WAV spectrograms
    pub val_dir: PathBuf,
    /// Directory of test WAV spectrograms
    pub test_dir: PathBuf,
    /// Batch size
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Spectrogram frequency bins per frame
    #[serde(default = "default_n_frequency_bins")]
    pub n_frequency_bins: usize,
    /// Number of convolutional kernels
    #[serde(default = "default_n_kernels")]
    pub n_kernels: usize,
    /// Kernel extent along the frequency axis
    #[serde(default = "default_kernel_size_f")]
    pub kernel_size_f: usize,
    /// Kernel extent along the time axis
    #[serde(default = "default_kernel_size_t")]
    pub kernel_size_t: usize,
    /// Stacked LSTM layers
    #[serde(default = "default_n_lstm_layers")]
    pub n_lstm_layers: usize,
    /// Hidden units per LSTM layer
    #[serde(default = "default_n_lstm_units")]
    pub n_lstm_units: usize,
    /// Dropout between LSTM layers, in [0, 1)
    #[serde(default = "default_lstm_dropout")]
    pub lstm_dropout: f64,
}

const fn default_batch_size() -> usize {
    32
}
const fn default_n_frequency_bins() -> usize {
    256
}
const fn default_n_kernels() -> usize {
    256
}
const fn default_kernel_size_f() -> usize {
    32
}
const fn default_kernel_size_t() -> usize {
    11
}
const fn default_n_lstm_layers() -> usize {
    2
}
const fn default_n_lstm_units() -> usize {
    1024
}
const fn default_lstm_dropout() -> f64 {
    0.3
}

impl ModelConfig {
    /// Create a config with default hyperparameters for the given data directories.
    #[must_use]
    pub fn new(
        train_dir: impl Into<PathBuf>,
        val_dir: impl Into<PathBuf>,
        test_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_dir: train_dir.into(),
            val_dir: val_dir.into(),
            test_dir: test_dir.into(),
            batch_size: default_batch_size(),
            n_frequency_bins: default_n_frequency_bins(),
            n_kernels: default_n_kernels(),
            kernel_size_f: default_kernel_size_f(),
            kernel_size_t: default_kernel_size_t(),
            n_lstm_layers: default_n_lstm_layers(),
            n_lstm_units: default_n_lstm_units(),
            lstm_dropout: default_lstm_dropout(),
        }
    }

    /// Validate the hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if any count is zero or the dropout
    /// is outside [0, 1).
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("batch_size", self.batch_size),
            ("n_frequency_bins", self.n_frequency_bins),
            ("n_kernels", self.n_kernels),
            ("kernel_size_f", self.kernel_size_f),
            ("kernel_size_t", self.kernel_size_t),
            ("n_lstm_layers", self.n_lstm_layers),
            ("n_lstm_units", self.n_lstm_units),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be at least 1 (got 0)"
                )));
            }
        }
        if !(0.0..1.0).contains(&self.lstm_dropout) {
            return Err(Error::InvalidConfig(format!(
                "lstm_dropout must be in [0, 1) (got {})",
                self.lstm_dropout
            )));
        }
        Ok(())
    }
}

/// Checkpoint retention configuration.
///
/// The scored metric and its directionality are required inputs: there is
/// no default direction, so a config that names a metric without saying
/// whether lower or higher is better fails validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointConfig {
    /// Directory under which run version directories are allocated
    pub base_dir: PathBuf,
    /// Run name shared by successive versions of this experiment
    pub run_name: String,
    /// Number of best checkpoints to retain on disk
    #[serde(default = "default_keep_top_k")]
    pub keep_top_k: usize,
    /// Metric key scored for retention (e.g. "val_loss")
    pub metric: String,
    /// Whether lower or higher metric values are better
    pub mode: ScoreMode,
}

const fn default_keep_top_k() -> usize {
    5
}

impl CheckpointConfig {
    /// Validate the retention settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the run name or metric key is
    /// empty, or `keep_top_k` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.run_name.is_empty() {
            return Err(Error::InvalidConfig(
                "run_name must be a non-empty identifier".to_string(),
            ));
        }
        if self.metric.is_empty() {
            return Err(Error::InvalidConfig(
                "metric must name the scored validation metric".to_string(),
            ));
        }
        if self.keep_top_k == 0 {
            return Err(Error::InvalidConfig(
                "keep_top_k must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Epoch bounds for the training loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainerConfig {
    /// Minimum epochs to train before stopping is considered
    #[serde(default = "default_min_epochs")]
    pub min_epochs: u64,
    /// Total epochs to train
    pub max_epochs: u64,
}

const fn default_min_epochs() -> u64 {
    200
}

impl TrainerConfig {
    /// Validate the epoch bounds.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `max_epochs` is zero or below
    /// `min_epochs`.
    pub fn validate(&self) -> Result<()> {
        if self.max_epochs == 0 {
            return Err(Error::InvalidConfig(
                "max_epochs must be at least 1".to_string(),
            ));
        }
        if self.max_epochs < self.min_epochs {
            return Err(Error::InvalidConfig(format!(
                "max_epochs ({}) must be at least min_epochs ({})",
                self.max_epochs, self.min_epochs
            )));
        }
        Ok(())
    }
}

/// Top-level training configuration, loadable from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingConfig {
    /// Model hyperparameters (passed through to the trainable model)
    pub model: ModelConfig,
    /// Checkpoint retention settings
    pub checkpoints: CheckpointConfig,
    /// Epoch bounds
    pub trainer: TrainerConfig,
}

impl TrainingConfig {
    /// Load and validate a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, fails to parse, or any
    /// section fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| Error::InvalidConfig(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first section's `Error::InvalidConfig`.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.checkpoints.validate()?;
        self.trainer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_checkpoints() -> CheckpointConfig {
        CheckpointConfig {
            base_dir: PathBuf::from("runs"),
            run_name: "ehnet".to_string(),
            keep_top_k: 5,
            metric: "val_loss".to_string(),
            mode: ScoreMode::Min,
        }
    }

    #[test]
    fn test_model_config_defaults() {
        let config = ModelConfig::new("train", "val", "test");
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.n_frequency_bins, 256);
        assert_eq!(config.n_kernels, 256);
        assert_eq!(config.kernel_size_f, 32);
        assert_eq!(config.kernel_size_t, 11);
        assert_eq!(config.n_lstm_layers, 2);
        assert_eq!(config.n_lstm_units, 1024);
        assert!((config.lstm_dropout - 0.3).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_config_rejects_zero_counts() {
        let mut config = ModelConfig::new("train", "val", "test");
        config.n_lstm_layers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("n_lstm_layers"));
    }

    #[test]
    fn test_model_config_rejects_dropout_of_one() {
        let mut config = ModelConfig::new("train", "val", "test");
        config.lstm_dropout = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_checkpoint_config_requires_metric() {
        let mut config = valid_checkpoints();
        config.metric = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metric"));
    }

    #[test]
    fn test_checkpoint_config_rejects_k_zero() {
        let mut config = valid_checkpoints();
        config.keep_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_checkpoint_config_rejects_empty_run_name() {
        let mut config = valid_checkpoints();
        config.run_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trainer_config_epoch_bounds() {
        let config = TrainerConfig {
            min_epochs: 200,
            max_epochs: 100,
        };
        assert!(config.validate().is_err());

        let config = TrainerConfig {
            min_epochs: 200,
            max_epochs: 250,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_training_config_from_toml() {
        let text = r#"
            [model]
            train_dir = "WAVs/dataset/training"
            val_dir = "WAVs/dataset/validation"
            test_dir = "WAVs/dataset/testing_seen_noise"

            [checkpoints]
            base_dir = "runs"
            run_name = "ehnet"
            metric = "val_loss"
            mode = "min"

            [trainer]
            max_epochs = 200
        "#;
        let config: TrainingConfig = toml::from_str(text).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.checkpoints.keep_top_k, 5);
        assert_eq!(config.checkpoints.mode, ScoreMode::Min);
        assert_eq!(config.trainer.min_epochs, 200);
        assert_eq!(config.model.n_lstm_units, 1024);
    }

    #[test]
    fn test_training_config_rejects_missing_mode() {
        let text = r#"
            [model]
            train_dir = "a"
            val_dir = "b"
            test_dir = "c"

            [checkpoints]
            base_dir = "runs"
            run_name = "ehnet"
            metric = "val_loss"

            [trainer]
            max_epochs = 200
        "#;
        assert!(toml::from_str::<TrainingConfig>(text).is_err());
    }
}

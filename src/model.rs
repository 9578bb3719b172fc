//! External collaborator seams
//!
//! The trainable model and the numeric execution engine are opaque to this
//! crate: the retention core only needs an evaluation score per epoch and
//! a way to stream serialized parameters into a checkpoint file. The
//! actual EHNet architecture, autodiff, and optimizer math live behind
//! these traits.

use std::io::Write;

use crate::Result;

/// Opaque numeric execution engine.
///
/// Performs gradient computation and parameter updates. The training loop
/// hands it to the model each epoch and never inspects it.
pub trait ExecutionEngine {
    /// Human-readable device/backend name, for logging only.
    fn device(&self) -> &str;
}

/// A model the trainer can fit.
///
/// Implementations own their data pipeline; the directories and
/// hyperparameters arrive via [`crate::config::ModelConfig`], which this
/// crate passes through without inspection.
pub trait TrainableModel {
    /// Run one training epoch on the engine.
    ///
    /// # Errors
    ///
    /// Returns error if the epoch cannot be completed.
    fn train_epoch(&mut self, engine: &dyn ExecutionEngine) -> Result<()>;

    /// Evaluate on the validation set, returning the configured metric.
    ///
    /// # Errors
    ///
    /// Returns error if evaluation fails.
    fn evaluate(&mut self) -> Result<f64>;

    /// Whether the model requests stopping before `max_epochs` (e.g. the
    /// metric has converged).
    ///
    /// Checked after each evaluation, but only honored once `min_epochs`
    /// have completed. Defaults to never stopping early.
    fn stop_requested(&self) -> bool {
        false
    }

    /// Stream the current parameter state into a checkpoint artifact.
    ///
    /// Called only when the retainer decides to keep the epoch's
    /// checkpoint, so a rejected epoch costs no serialization.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails.
    fn save_state(&self, writer: &mut dyn Write) -> std::io::Result<()>;
}

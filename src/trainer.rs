//! Training loop
//!
//! Owns the run directory, the checkpoint retainer, and the metric log,
//! and drives the model through epochs. Checkpoint retention is an
//! explicit synchronous `offer` after each evaluation rather than an
//! implicit callback: the decision is a pure function of the retained
//! state and the new (epoch, score) record.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::{CheckpointConfig, TrainerConfig};
use crate::model::{ExecutionEngine, TrainableModel};
use crate::retain::{RetainerDecision, TopKRetainer};
use crate::track::{MetricLogger, MetricRecord, RunRecord, RunStatus};
use crate::version::{RunDir, RunVersioner};
use crate::{Error, Result};

/// Summary of a completed fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Output directory of the run
    pub run_dir: PathBuf,
    /// Allocated run version
    pub version: u64,
    /// Epochs actually trained
    pub epochs_trained: u64,
    /// Best score observed under the configured mode, if any epoch evaluated
    pub best_score: Option<f64>,
    /// Artifact paths retained at the end, in creation order
    pub retained_checkpoints: Vec<PathBuf>,
}

/// Drives training epochs and checkpoint retention for one run.
pub struct Trainer {
    trainer_config: TrainerConfig,
    metric_key: String,
    run_dir: RunDir,
    run: RunRecord,
    retainer: TopKRetainer,
    logger: MetricLogger,
}

impl Trainer {
    /// Allocate a fresh run directory and set up retention and logging.
    ///
    /// Allocation failure is fatal: with no output directory there is no
    /// safe place to write checkpoints.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for bad settings, or the versioner's
    /// allocation error.
    pub fn new(trainer_config: TrainerConfig, checkpoints: CheckpointConfig) -> Result<Self> {
        trainer_config.validate()?;
        checkpoints.validate()?;

        let versioner = RunVersioner::new(&checkpoints.base_dir, &checkpoints.run_name);
        let run_dir = versioner.allocate()?;

        let retainer = TopKRetainer::new(
            run_dir.path(),
            checkpoints.keep_top_k,
            checkpoints.mode,
        )?;
        let logger = MetricLogger::create(run_dir.path())?;

        let run_id = format!("{}-version_{}", checkpoints.run_name, run_dir.version());
        Ok(Self {
            trainer_config,
            metric_key: checkpoints.metric,
            run_dir,
            run: RunRecord::new(run_id),
            retainer,
            logger,
        })
    }

    /// Get the allocated run directory.
    #[must_use]
    pub const fn run_dir(&self) -> &RunDir {
        &self.run_dir
    }

    /// Get the run record.
    #[must_use]
    pub const fn run(&self) -> &RunRecord {
        &self.run
    }

    /// Train the model for the configured number of epochs.
    ///
    /// Each epoch: train, evaluate, log the metric, then offer the
    /// checkpoint. A failed checkpoint write discards that epoch's offer
    /// and training continues; any other error marks the run failed and
    /// propagates.
    ///
    /// A model may end the run before `max_epochs` via
    /// [`TrainableModel::stop_requested`], but never before `min_epochs`
    /// have completed.
    ///
    /// # Errors
    ///
    /// Returns the model's or logger's error after marking the run Failed.
    pub fn fit<M: TrainableModel>(
        &mut self,
        model: &mut M,
        engine: &dyn ExecutionEngine,
    ) -> Result<FitReport> {
        self.run.start();
        info!(
            run_id = self.run.run_id(),
            device = engine.device(),
            max_epochs = self.trainer_config.max_epochs,
            min_epochs = self.trainer_config.min_epochs,
            "starting fit"
        );

        let mut epochs_trained = 0;
        for epoch in 0..self.trainer_config.max_epochs {
            if let Err(e) = self.run_epoch(model, engine, epoch) {
                self.run.complete(RunStatus::Failed);
                error!(epoch, error = %e, "run failed");
                return Err(e);
            }
            epochs_trained = epoch + 1;
            if epochs_trained >= self.trainer_config.min_epochs && model.stop_requested() {
                info!(epoch, "stop requested by model, ending fit early");
                break;
            }
        }

        self.run.complete(RunStatus::Success);
        let report = FitReport {
            run_dir: self.run_dir.path().to_path_buf(),
            version: self.run_dir.version(),
            epochs_trained,
            best_score: self.retainer.best().map(|r| r.score()),
            retained_checkpoints: self
                .retainer
                .retained()
                .iter()
                .map(|r| r.artifact_path().to_path_buf())
                .collect(),
        };
        info!(
            run_id = self.run.run_id(),
            epochs = report.epochs_trained,
            best_score = report.best_score,
            "fit complete"
        );
        Ok(report)
    }

    fn run_epoch<M: TrainableModel>(
        &mut self,
        model: &mut M,
        engine: &dyn ExecutionEngine,
        epoch: u64,
    ) -> Result<()> {
        model.train_epoch(engine)?;
        let score = model.evaluate()?;

        self.logger
            .log(MetricRecord::new(
                self.run.run_id(),
                self.metric_key.as_str(),
                epoch,
                score,
            ))?;

        match self.retainer.offer(epoch, score, |w| model.save_state(w)) {
            Ok(RetainerDecision::Accepted(_) | RetainerDecision::Rejected) => Ok(()),
            // Losing one epoch's checkpoint is recoverable; keep training.
            Err(Error::WriteFailure(msg)) => {
                warn!(epoch, "checkpoint discarded: {msg}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

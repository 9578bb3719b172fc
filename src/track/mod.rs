//! Run tracking
//!
//! Data structures and the on-disk metric log for a single training run.
//!
//! ## Schema Overview
//!
//! ```text
//! RunRecord (1) ──< MetricRecord (N) [time-series, metrics.jsonl]
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ehnet_train::track::{MetricLogger, MetricRecord, RunRecord, RunStatus};
//!
//! # fn main() -> ehnet_train::Result<()> {
//! // Start a run
//! let mut run = RunRecord::new("ehnet-version_0");
//! run.start();
//!
//! // Log metrics into the run directory
//! let mut logger = MetricLogger::create("runs/ehnet/version_0")?;
//! logger.log(MetricRecord::new(run.run_id(), "val_loss", 0, 0.5))?;
//!
//! // Complete the run
//! run.complete(RunStatus::Success);
//! # Ok(())
//! # }
//! ```

mod logger;
mod metric_record;
mod run_record;

pub use logger::MetricLogger;
pub use metric_record::MetricRecord;
pub use run_record::{RunRecord, RunStatus};

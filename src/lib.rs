//! # ehnet-train: Run Management for EHNet Speech-Enhancement Training
//!
//! Run versioning, top-K checkpoint retention, and metric tracking for
//! training an encoder-decoder convolutional-recurrent speech-enhancement
//! network over spectrogram data.
//!
//! The model architecture and the numeric engine are external
//! collaborators behind traits; this crate owns the policy around them:
//!
//! - [`version`]: allocate a fresh, strictly increasing `version_{N}`
//!   output directory per run, safe against concurrent launches.
//! - [`retain`]: keep only the K best-scoring checkpoints on disk,
//!   evicting the worst, with deterministic tie-breaking.
//! - [`track`]: run lifecycle records and a JSONL metric log.
//! - [`trainer`]: the owning loop wiring the three together.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::io::Write;
//!
//! use ehnet_train::retain::{ScoreMode, TopKRetainer};
//!
//! # fn main() -> ehnet_train::Result<()> {
//! let mut retainer = TopKRetainer::new("runs/ehnet/version_0", 5, ScoreMode::Min)?;
//!
//! // Offer each epoch's validation loss; the artifact is only written
//! // if it makes the top 5.
//! let decision = retainer.offer(0, 0.42, |w| w.write_all(b"weights"))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod model;
pub mod retain;
pub mod track;
pub mod trainer;
pub mod version;

pub use error::{Error, Result};

//! Top-K checkpoint retention
//!
//! Keeps the K best-scoring checkpoint artifacts on disk, evicting the
//! worst scorer when a new one displaces it. Ties break deterministically:
//! an equal score displaces the current worst only when its epoch is newer.
//!
//! The retention decision is a pure function of (current state, new
//! record); side effects are exactly the filesystem writes and deletes of
//! the decision. Artifacts are materialized before their record is
//! inserted, so an interruption between steps leaves at most an orphan
//! file, never a dangling record pointing at a missing file.

use std::cmp::Ordering;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Error, Result};

/// Whether lower or higher scores are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// Lower score is better (e.g. validation loss)
    Min,
    /// Higher score is better (e.g. accuracy)
    Max,
}

/// A retained checkpoint on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRecord {
    epoch: u64,
    score: f64,
    artifact_path: PathBuf,
    seq: u64,
}

impl CheckpointRecord {
    /// Get the epoch the checkpoint was taken at.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get the score the checkpoint was retained under.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Get the artifact path on disk.
    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Get the creation sequence number (monotonic within a retainer).
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

/// Outcome of offering a checkpoint to the retainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetainerDecision {
    /// The artifact was materialized at this path and is now retained
    Accepted(PathBuf),
    /// The offer did not beat the current worst; nothing was written
    Rejected,
}

/// Bounded best-K checkpoint retainer for a single run directory.
///
/// Single-threaded with respect to the training loop: one `offer` at a
/// time, synchronous filesystem I/O only.
#[derive(Debug)]
pub struct TopKRetainer {
    dir: PathBuf,
    k: usize,
    mode: ScoreMode,
    retained: Vec<CheckpointRecord>,
    next_seq: u64,
}

impl TopKRetainer {
    /// Create a retainer writing into `dir`, keeping the best `k` offers.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `k` is zero or `dir` is not an
    /// existing directory.
    pub fn new(dir: impl Into<PathBuf>, k: usize, mode: ScoreMode) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig(
                "k must be greater than 0".to_string(),
            ));
        }
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(Error::InvalidConfig(format!(
                "checkpoint directory does not exist: {}",
                dir.display()
            )));
        }
        Ok(Self {
            dir,
            k,
            mode,
            retained: Vec::with_capacity(k),
            next_seq: 0,
        })
    }

    /// Offer a checkpoint for retention.
    ///
    /// The artifact is only materialized if the offer will be kept: below
    /// capacity every offer is accepted; at capacity the offer must be
    /// strictly better than the current worst under the mode, or equal
    /// with a newer epoch. The producer receives the open artifact file.
    ///
    /// A NaN score (divergent loss) is always rejected: it can never rank
    /// against a real score, so it must never displace one.
    ///
    /// # Errors
    ///
    /// Returns `Error::WriteFailure` if the producer fails mid-write (no
    /// record is inserted, nothing is evicted); eviction-delete failures
    /// are logged as stale artifacts and do not fail the call.
    pub fn offer<F>(&mut self, epoch: u64, score: f64, producer: F) -> Result<RetainerDecision>
    where
        F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
    {
        if score.is_nan() {
            warn!(epoch, "checkpoint rejected: score is NaN");
            return Ok(RetainerDecision::Rejected);
        }

        let evict_worst = if self.retained.len() < self.k {
            false
        } else if self.displaces_worst(epoch, score) {
            true
        } else {
            info!(epoch, score, "checkpoint rejected (not among best {})", self.k);
            return Ok(RetainerDecision::Rejected);
        };

        let record = self.materialize(epoch, score, producer)?;
        let path = record.artifact_path.clone();
        self.retained.push(record);

        if evict_worst {
            self.evict(self.worst_index());
        }

        info!(epoch, score, path = %path.display(), "checkpoint retained");
        Ok(RetainerDecision::Accepted(path))
    }

    /// Number of checkpoints currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// Check whether no checkpoints are retained yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Retained records, in creation order.
    #[must_use]
    pub fn retained(&self) -> &[CheckpointRecord] {
        &self.retained
    }

    /// The best retained record under the mode, if any.
    #[must_use]
    pub fn best(&self) -> Option<&CheckpointRecord> {
        self.retained
            .iter()
            .min_by(|a, b| self.rank(a.score, a.epoch, b.score, b.epoch))
    }

    /// Rank two (score, epoch) pairs from best to worst under the mode.
    ///
    /// Equal scores rank the newer epoch better (the tie-break rule).
    /// Scores are never NaN here: `offer` rejects NaN before ranking, so
    /// `partial_cmp` is total over the retained set.
    fn rank(&self, score_a: f64, epoch_a: u64, score_b: f64, epoch_b: u64) -> Ordering {
        let by_score = match self.mode {
            ScoreMode::Min => score_a.partial_cmp(&score_b),
            ScoreMode::Max => score_b.partial_cmp(&score_a),
        }
        .unwrap_or(Ordering::Equal);
        by_score.then(epoch_b.cmp(&epoch_a))
    }

    /// Whether a new (epoch, score) beats the current worst retained.
    fn displaces_worst(&self, epoch: u64, score: f64) -> bool {
        let worst = &self.retained[self.worst_index()];
        self.rank(score, epoch, worst.score, worst.epoch) == Ordering::Less
    }

    /// Index of the worst retained record under the mode.
    fn worst_index(&self) -> usize {
        debug_assert!(!self.retained.is_empty());
        let mut worst = 0;
        for i in 1..self.retained.len() {
            let (a, b) = (&self.retained[i], &self.retained[worst]);
            if self.rank(a.score, a.epoch, b.score, b.epoch) == Ordering::Greater {
                worst = i;
            }
        }
        worst
    }

    /// Write the artifact to a temp file, then rename into place.
    ///
    /// Either the artifact fully exists at its final path or nothing of it
    /// remains on disk.
    fn materialize<F>(&mut self, epoch: u64, score: f64, producer: F) -> Result<CheckpointRecord>
    where
        F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
    {
        let seq = self.next_seq;
        let final_path = self
            .dir
            .join(format!("ckpt-{seq:05}-epoch{epoch}-{score:.4}.bin"));
        let tmp_path = final_path.with_extension("bin.tmp");

        let write_result = File::create(&tmp_path)
            .and_then(|mut file| {
                producer(&mut file)?;
                file.sync_all()
            })
            .and_then(|()| std::fs::rename(&tmp_path, &final_path));

        if let Err(e) = write_result {
            // Remove the partial temp file; the record is never inserted.
            let _ = std::fs::remove_file(&tmp_path);
            return Err(Error::WriteFailure(format!(
                "epoch {epoch}: {e} (while writing {})",
                final_path.display()
            )));
        }

        self.next_seq += 1;
        Ok(CheckpointRecord {
            epoch,
            score,
            artifact_path: final_path,
            seq,
        })
    }

    /// Delete the artifact at `index` and drop its record.
    ///
    /// A failed delete keeps the record's file on disk as a stale
    /// artifact; the record itself is still dropped so the retained set
    /// reflects the retention decision. Losing the new checkpoint over a
    /// disk-space leak would be the worse trade.
    fn evict(&mut self, index: usize) {
        let record = self.retained.swap_remove(index);
        match std::fs::remove_file(&record.artifact_path) {
            Ok(()) => {
                info!(
                    epoch = record.epoch,
                    score = record.score,
                    path = %record.artifact_path.display(),
                    "evicted checkpoint"
                );
            }
            Err(e) => {
                warn!(
                    epoch = record.epoch,
                    path = %record.artifact_path.display(),
                    error = %e,
                    "stale artifact: eviction delete failed, file left for later cleanup"
                );
            }
        }
    }
}

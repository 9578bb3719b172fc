//! Run versioning
//!
//! Allocates a fresh, monotonically increasing version number for each
//! training run sharing a (`base_dir`, `run_name`) pair and creates an
//! isolated output directory for it. Versions never collide and are never
//! reused, even when version directories have been deleted: a high-water
//! marker file alongside the version directories records the highest
//! number ever allocated, so deleting the newest run cannot rewind the
//! counter.
//!
//! Layout: `base_dir/run_name/version_{N}/`

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{Error, Result};

/// Prefix of version subdirectories under `base_dir/run_name/`
const VERSION_PREFIX: &str = "version_";

/// Marker file recording the highest version ever allocated for a run name
const HIGH_WATER_FILE: &str = ".highest_version";

/// Directory-creation attempts before allocation is declared exhausted
const MAX_ALLOCATION_ATTEMPTS: u32 = 8;

/// An allocated run output directory.
///
/// Owned exclusively by the run that created it; never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    version: u64,
    path: PathBuf,
}

impl RunDir {
    /// Get the allocated version number.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Get the output directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Allocates versioned output directories for successive runs of a name.
#[derive(Debug, Clone)]
pub struct RunVersioner {
    base_dir: PathBuf,
    run_name: String,
}

impl RunVersioner {
    /// Create a versioner for the given base directory and run name.
    ///
    /// The base directory does not need to exist yet; `allocate` creates it.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, run_name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            run_name: run_name.into(),
        }
    }

    /// Allocate the next version and create its output directory.
    ///
    /// Claims one past the highest version either present on disk or
    /// recorded in the high-water marker (0 if neither exists), so a
    /// deleted version directory — including the newest — is never
    /// refilled. The claim is an atomic `create_dir`: if another process
    /// wins the same number, the next number is tried, up to a bounded
    /// attempt count.
    ///
    /// # Errors
    ///
    /// Returns `Error::VersionAllocationExhausted` if every attempt lost
    /// its race, or an IO error if the scan or creation fails outright.
    pub fn allocate(&self) -> Result<RunDir> {
        let run_root = self.base_dir.join(&self.run_name);
        std::fs::create_dir_all(&run_root)?;

        let mut version = Self::next_version(&run_root)?;
        for attempt in 0..MAX_ALLOCATION_ATTEMPTS {
            let path = run_root.join(format!("{VERSION_PREFIX}{version}"));
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    Self::persist_high_water(&run_root, version)?;
                    info!(
                        run_name = %self.run_name,
                        version,
                        path = %path.display(),
                        "allocated run directory"
                    );
                    return Ok(RunDir { version, path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    // Lost the race for this number; claim the next one.
                    let conflict = Error::DirectoryConflict { path };
                    debug!(attempt, %conflict, "retrying version allocation");
                    version += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::VersionAllocationExhausted {
            base_dir: self.base_dir.clone(),
            run_name: self.run_name.clone(),
            attempts: MAX_ALLOCATION_ATTEMPTS,
        })
    }

    /// Next version number: one past the highest known, 0 if none.
    ///
    /// Takes the maximum of the directory scan and the persisted
    /// high-water mark: the scan catches directories created by runs that
    /// never recorded a mark, the mark catches directories that were
    /// deleted since. Robust to gaps; never "first gap".
    fn next_version(run_root: &Path) -> Result<u64> {
        let mut max_existing: Option<u64> = None;
        for entry in std::fs::read_dir(run_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(number) = name
                .to_str()
                .and_then(|n| n.strip_prefix(VERSION_PREFIX))
                .and_then(|n| n.parse::<u64>().ok())
            else {
                continue;
            };
            max_existing = Some(max_existing.map_or(number, |m| m.max(number)));
        }

        let next_scanned = max_existing.map_or(0, |m| m + 1);
        let next_recorded = Self::read_high_water(run_root)?.map_or(0, |m| m + 1);
        Ok(next_scanned.max(next_recorded))
    }

    /// Read the highest version ever allocated, if recorded.
    fn read_high_water(run_root: &Path) -> Result<Option<u64>> {
        match std::fs::read_to_string(run_root.join(HIGH_WATER_FILE)) {
            Ok(text) => Ok(text.trim().parse::<u64>().ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Record `version` as the high-water mark if it moved forward.
    ///
    /// Written to a temp file and renamed into place; the mark only ever
    /// increases.
    fn persist_high_water(run_root: &Path, version: u64) -> Result<()> {
        if Self::read_high_water(run_root)?.is_some_and(|current| current >= version) {
            return Ok(());
        }
        let tmp = run_root.join(format!("{HIGH_WATER_FILE}.{version}.tmp"));
        std::fs::write(&tmp, version.to_string())?;
        std::fs::rename(&tmp, run_root.join(HIGH_WATER_FILE))?;
        Ok(())
    }
}

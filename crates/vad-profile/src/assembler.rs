//! Profile assembly: scans in, one time-height record out.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::record::{ProfileBuilder, ProfileRecord};
use radar_scan::{Platform, RetrievedVad, ScanReader, DEFAULT_VELOCITY_FIELD};
use vad_common::{HeightGrid, VadError, VadResult};

/// Run options for [`ProfileAssembler`].
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerOptions {
    /// Velocity field fed to the retrieval.
    pub velocity_field: String,
    /// Heights every retrieval is sampled at.
    pub grid: HeightGrid,
    /// Open and retrieve scans on the rayon pool. Results are still
    /// assembled in sorted input order.
    pub parallel: bool,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            velocity_field: DEFAULT_VELOCITY_FIELD.to_string(),
            grid: HeightGrid::default(),
            parallel: false,
        }
    }
}

/// One processed scan, before it joins the record.
struct ScanOutcome {
    time: DateTime<Utc>,
    platform: Platform,
    vad: RetrievedVad,
}

/// Stacks per-scan VAD retrievals into a [`ProfileRecord`].
pub struct ProfileAssembler<R> {
    reader: R,
    options: AssemblerOptions,
}

impl<R: ScanReader> ProfileAssembler<R> {
    pub fn new(reader: R, options: AssemblerOptions) -> Self {
        Self { reader, options }
    }

    /// Assemble a profile from `paths`.
    ///
    /// Paths are sorted lexicographically first. Files the reader reports
    /// as unreadable are skipped with a warning; any other error aborts.
    /// Fails with `NoUsableScans` when nothing could be read.
    pub fn assemble<P: AsRef<Path>>(&self, paths: &[P]) -> VadResult<ProfileRecord> {
        let mut sorted: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        sorted.sort();

        info!(
            files = sorted.len(),
            field = %self.options.velocity_field,
            levels = self.options.grid.len(),
            parallel = self.options.parallel,
            "Assembling VAD profile"
        );

        let mut builder = ProfileBuilder::new(self.options.grid.clone());
        let mut skipped = 0usize;

        if self.options.parallel {
            let outcomes: Vec<VadResult<Option<ScanOutcome>>> =
                sorted.par_iter().map(|path| self.process(path)).collect();
            for outcome in outcomes {
                if let Some(scan) = outcome? {
                    builder.push(scan.time, scan.platform, &scan.vad)?;
                } else {
                    skipped += 1;
                }
            }
        } else {
            for path in &sorted {
                if let Some(scan) = self.process(path)? {
                    builder.push(scan.time, scan.platform, &scan.vad)?;
                } else {
                    skipped += 1;
                }
            }
        }

        let record = builder.finish().ok_or(VadError::NoUsableScans {
            attempted: sorted.len(),
        })?;

        info!(
            scans = record.n_times(),
            skipped,
            first = %record.base_time(),
            "Assembled VAD profile"
        );
        Ok(record)
    }

    /// Open and retrieve one scan. `Ok(None)` means the file was skipped.
    fn process(&self, path: &Path) -> VadResult<Option<ScanOutcome>> {
        let scan = match self.reader.open(path) {
            Ok(scan) => scan,
            Err(e) if e.is_skippable() => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable scan");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let vad = scan.retrieve_vad(&self.options.velocity_field, &self.options.grid)?;
        let expected = self.options.grid.len();
        if vad.aligned_len() != Some(expected) {
            let actual = [vad.u_wind.len(), vad.v_wind.len(), vad.speed.len(), vad.direction.len()]
                .into_iter()
                .find(|&n| n != expected)
                .unwrap_or(expected);
            return Err(VadError::GridMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            });
        }

        debug!(path = %path.display(), time = %scan.time(), "Processed scan");
        Ok(Some(ScanOutcome {
            time: scan.time(),
            platform: scan.platform(),
            vad,
        }))
    }
}

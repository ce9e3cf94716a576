//! Synthetic scans and readers for exercising the profile pipeline without
//! radar files.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use radar_scan::{Platform, RadarScan, RetrievedVad, ScanReader, DEFAULT_VELOCITY_FIELD};
use vad_common::{HeightGrid, VadError, VadResult};

/// Radar location used by synthetic scans (SGP I5, Garber OK).
pub const SGP_I5: Platform = Platform {
    altitude: 336.0,
    longitude: -97.593,
    latitude: 36.491,
};

/// `2017-10-05 hh:mm:00 UTC`
pub fn sample_time(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 10, 5, hour, minute, 0)
        .single()
        .expect("valid sample time")
}

/// A scan whose retrieval is a constant wind at every level.
#[derive(Debug, Clone)]
pub struct SyntheticScan {
    pub time: DateTime<Utc>,
    pub platform: Platform,
    pub u: f64,
    pub v: f64,
    /// Name of the only velocity field the scan carries.
    pub field: String,
    /// Return this many levels regardless of the grid.
    pub forced_levels: Option<usize>,
}

impl SyntheticScan {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            platform: SGP_I5,
            u: 5.0,
            v: 5.0,
            field: DEFAULT_VELOCITY_FIELD.to_string(),
            forced_levels: None,
        }
    }

    pub fn with_wind(mut self, u: f64, v: f64) -> Self {
        self.u = u;
        self.v = v;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = field.to_string();
        self
    }

    /// Misbehave by returning `levels` values whatever the grid.
    pub fn with_forced_levels(mut self, levels: usize) -> Self {
        self.forced_levels = Some(levels);
        self
    }
}

impl RadarScan for SyntheticScan {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn altitude(&self) -> f64 {
        self.platform.altitude
    }

    fn longitude(&self) -> f64 {
        self.platform.longitude
    }

    fn latitude(&self) -> f64 {
        self.platform.latitude
    }

    fn retrieve_vad(&self, velocity_field: &str, grid: &HeightGrid) -> VadResult<RetrievedVad> {
        if velocity_field != self.field {
            return Err(VadError::MissingField(velocity_field.to_string()));
        }
        let n = self.forced_levels.unwrap_or(grid.len());
        RetrievedVad::from_components(vec![self.u; n], vec![self.v; n])
    }
}

/// What a [`SyntheticReader`] does when asked to open a path.
#[derive(Debug, Clone)]
enum Entry {
    Scan(SyntheticScan),
    Corrupt(String),
}

/// In-memory scan reader keyed by file name.
///
/// Paths with no registered entry are reported as unreadable, the same way
/// a non-radar file would be.
#[derive(Debug, Clone, Default)]
pub struct SyntheticReader {
    entries: HashMap<PathBuf, Entry>,
}

impl SyntheticReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scan under `path`.
    pub fn with_scan(mut self, path: impl Into<PathBuf>, scan: SyntheticScan) -> Self {
        self.entries.insert(path.into(), Entry::Scan(scan));
        self
    }

    /// Register a path whose open fails with a non-skippable error.
    pub fn with_corrupt(mut self, path: impl Into<PathBuf>, message: &str) -> Self {
        self.entries.insert(path.into(), Entry::Corrupt(message.to_string()));
        self
    }

    /// A reader with one scan every `step_minutes` starting at `start`,
    /// named `scan_000.nc`, `scan_001.nc`, ... under `dir`. Returns the
    /// reader and the paths in time order.
    pub fn time_series(
        dir: &Path,
        start: DateTime<Utc>,
        count: usize,
        step_minutes: i64,
    ) -> (Self, Vec<PathBuf>) {
        let mut reader = Self::new();
        let mut paths = Vec::with_capacity(count);
        for i in 0..count {
            let path = dir.join(format!("scan_{:03}.nc", i));
            let time = start + Duration::minutes(step_minutes * i as i64);
            let u = (i as f64 * 0.5).sin() * 10.0;
            reader = reader.with_scan(&path, SyntheticScan::new(time).with_wind(u, 8.0));
            paths.push(path);
        }
        (reader, paths)
    }
}

impl ScanReader for SyntheticReader {
    fn open(&self, path: &Path) -> VadResult<Box<dyn RadarScan>> {
        match self.entries.get(path) {
            Some(Entry::Scan(scan)) => Ok(Box::new(scan.clone())),
            Some(Entry::Corrupt(message)) => Err(VadError::Scan {
                path: path.to_path_buf(),
                message: message.clone(),
            }),
            None => Err(VadError::UnreadableScan {
                path: path.to_path_buf(),
                reason: "not a registered synthetic scan".to_string(),
            }),
        }
    }
}

//! Scan capability traits and the per-scan retrieval result.

use chrono::{DateTime, Utc};
use std::path::Path;

use vad_common::wind::uv_to_speed_direction;
use vad_common::{HeightGrid, VadError, VadResult};

/// Radar location: altitude in meters, longitude and latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Platform {
    pub altitude: f64,
    pub longitude: f64,
    pub latitude: f64,
}

/// Wind profile retrieved from one scan, one value per grid level.
///
/// Missing levels are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedVad {
    pub u_wind: Vec<f64>,
    pub v_wind: Vec<f64>,
    pub speed: Vec<f64>,
    pub direction: Vec<f64>,
}

impl RetrievedVad {
    /// Derive speed and direction from U/V components.
    pub fn from_components(u_wind: Vec<f64>, v_wind: Vec<f64>) -> VadResult<Self> {
        if u_wind.len() != v_wind.len() {
            return Err(VadError::InvalidData(format!(
                "u has {} levels but v has {}",
                u_wind.len(),
                v_wind.len()
            )));
        }
        let (speed, direction) = u_wind
            .iter()
            .zip(&v_wind)
            .map(|(&u, &v)| uv_to_speed_direction(u, v))
            .unzip();
        Ok(Self {
            u_wind,
            v_wind,
            speed,
            direction,
        })
    }

    /// Number of levels, or `None` when the four arrays disagree.
    pub fn aligned_len(&self) -> Option<usize> {
        let n = self.u_wind.len();
        (self.v_wind.len() == n && self.speed.len() == n && self.direction.len() == n).then_some(n)
    }
}

/// One opened radar volume.
pub trait RadarScan: Send + Sync {
    /// Scan start time.
    fn time(&self) -> DateTime<Utc>;

    fn altitude(&self) -> f64;

    fn longitude(&self) -> f64;

    fn latitude(&self) -> f64;

    fn platform(&self) -> Platform {
        Platform {
            altitude: self.altitude(),
            longitude: self.longitude(),
            latitude: self.latitude(),
        }
    }

    /// Retrieve u/v/speed/direction on `grid` from the named velocity field.
    ///
    /// Fails with `VadError::MissingField` when the scan has no such field.
    fn retrieve_vad(&self, velocity_field: &str, grid: &HeightGrid) -> VadResult<RetrievedVad>;
}

/// Opens files as radar scans.
///
/// Implementations report a file that is not a scan at all with
/// `VadError::UnreadableScan`; callers may skip those.
pub trait ScanReader: Send + Sync {
    fn open(&self, path: &Path) -> VadResult<Box<dyn RadarScan>>;
}

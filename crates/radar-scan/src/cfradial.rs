//! CfRadial volume reader.
//!
//! Opening a file reads only the scan geometry (ray angles, gate ranges,
//! sweep boundaries, platform location and timestamp). The velocity field
//! is read on demand by [`RadarScan::retrieve_vad`], so an opened scan holds
//! no netcdf handle and can move freely between threads.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::nc::{dimension_names, get_global_str_attr, get_str_attr, read_unpacked, silence_hdf5_errors};
use crate::scan::{Platform, RadarScan, RetrievedVad, ScanReader};
use crate::vad::{self, Sweep, VadSettings};
use vad_common::time::{offset_time, parse_cf_seconds_since};
use vad_common::{HeightGrid, VadError, VadResult};

/// Variables every CfRadial volume carries.
const REQUIRED_VARIABLES: &[&str] = &[
    "time",
    "range",
    "azimuth",
    "elevation",
    "sweep_start_ray_index",
    "sweep_end_ray_index",
    "latitude",
    "longitude",
    "altitude",
];

/// Opens CfRadial files.
#[derive(Debug, Clone, Default)]
pub struct CfRadialReader {
    settings: VadSettings,
}

impl CfRadialReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: VadSettings) -> Self {
        Self { settings }
    }
}

impl ScanReader for CfRadialReader {
    fn open(&self, path: &Path) -> VadResult<Box<dyn RadarScan>> {
        Ok(Box::new(CfRadialScan::open(path, self.settings)?))
    }
}

/// Geometry of one CfRadial volume.
#[derive(Debug, Clone)]
pub struct CfRadialScan {
    path: PathBuf,
    time: DateTime<Utc>,
    platform: Platform,
    azimuth: Vec<f64>,
    elevation: Vec<f64>,
    range: Vec<f64>,
    /// Inclusive (start, end) ray index of each sweep.
    sweeps: Vec<(usize, usize)>,
    /// Names of (time, range) data fields.
    fields: Vec<String>,
    settings: VadSettings,
}

impl CfRadialScan {
    /// Open `path` and read its geometry.
    ///
    /// A file netcdf cannot open, or one lacking the CfRadial coordinate
    /// variables, is reported as `UnreadableScan`. Inconsistent geometry
    /// inside an otherwise valid volume is a `Scan` error.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path, settings: VadSettings) -> VadResult<Self> {
        silence_hdf5_errors();

        let file = netcdf::open(path).map_err(|e| VadError::UnreadableScan {
            path: path.to_path_buf(),
            reason: format!("failed to open NetCDF: {}", e),
        })?;

        if let Some(missing) = REQUIRED_VARIABLES
            .iter()
            .find(|name| file.variable(name).is_none())
        {
            return Err(VadError::UnreadableScan {
                path: path.to_path_buf(),
                reason: format!("not a CfRadial volume (no '{}' variable)", missing),
            });
        }

        let read = |name: &str| -> VadResult<Vec<f64>> {
            let var = file.variable(name).ok_or_else(|| scan_error(path, format!("missing {}", name)))?;
            read_unpacked(&var).map_err(|e| scan_error(path, format!("failed to read {}: {}", name, e)))
        };

        let times = read("time")?;
        let range = read("range")?;
        let azimuth = read("azimuth")?;
        let elevation = read("elevation")?;
        let sweep_start = read("sweep_start_ray_index")?;
        let sweep_end = read("sweep_end_ray_index")?;

        let scalar = |name: &str| -> VadResult<f64> {
            read(name)?
                .first()
                .copied()
                .filter(|v| v.is_finite())
                .ok_or_else(|| scan_error(path, format!("{} has no value", name)))
        };
        let platform = Platform {
            altitude: scalar("altitude")?,
            longitude: scalar("longitude")?,
            latitude: scalar("latitude")?,
        };

        let n_rays = azimuth.len();
        if elevation.len() != n_rays || times.len() != n_rays {
            return Err(scan_error(
                path,
                format!(
                    "ray count mismatch: time {}, azimuth {}, elevation {}",
                    times.len(),
                    n_rays,
                    elevation.len()
                ),
            ));
        }

        let sweeps = sweep_bounds(&sweep_start, &sweep_end, n_rays).map_err(|m| scan_error(path, m))?;
        let time = scan_time(&file, &times).ok_or_else(|| scan_error(path, "no usable scan time".to_string()))?;

        let fields = file
            .variables()
            .filter(|var| dimension_names(var) == ["time", "range"])
            .map(|var| var.name())
            .collect::<Vec<_>>();

        debug!(
            time = %time,
            rays = n_rays,
            gates = range.len(),
            sweeps = sweeps.len(),
            fields = fields.len(),
            "Opened CfRadial scan"
        );

        Ok(Self {
            path: path.to_path_buf(),
            time,
            platform,
            azimuth,
            elevation,
            range,
            sweeps,
            fields,
            settings,
        })
    }

    /// Mean elevation of each sweep, degrees.
    pub fn sweep_elevations(&self) -> Vec<f64> {
        self.sweeps
            .iter()
            .map(|&(start, end)| {
                let rays = &self.elevation[start..=end];
                rays.iter().sum::<f64>() / rays.len() as f64
            })
            .collect()
    }

    fn read_field(&self, name: &str) -> VadResult<Vec<f64>> {
        let file = netcdf::open(&self.path).map_err(|e| scan_error(&self.path, format!("failed to reopen: {}", e)))?;
        let var = file
            .variable(name)
            .ok_or_else(|| VadError::MissingField(name.to_string()))?;
        let values = read_unpacked(&var).map_err(|e| scan_error(&self.path, format!("failed to read {}: {}", name, e)))?;

        let expected = self.azimuth.len() * self.range.len();
        if values.len() != expected {
            return Err(scan_error(
                &self.path,
                format!("{} has {} values, expected {}", name, values.len(), expected),
            ));
        }
        Ok(values)
    }
}

impl RadarScan for CfRadialScan {
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

    fn platform(&self) -> Platform {
        self.platform
    }

    fn retrieve_vad(&self, velocity_field: &str, grid: &HeightGrid) -> VadResult<RetrievedVad> {
        if !self.fields.iter().any(|f| f == velocity_field) {
            return Err(VadError::MissingField(velocity_field.to_string()));
        }

        let velocity = self.read_field(velocity_field)?;
        let n_gates = self.range.len();
        let elevations = self.sweep_elevations();

        let sweeps: Vec<Sweep<'_>> = self
            .sweeps
            .iter()
            .zip(elevations)
            .map(|(&(start, end), elevation)| Sweep {
                azimuth: &self.azimuth[start..=end],
                elevation,
                ranges: &self.range,
                velocity: &velocity[start * n_gates..(end + 1) * n_gates],
            })
            .collect();

        let result = vad::retrieve(&sweeps, grid, &self.settings)?;
        debug!(
            path = %self.path.display(),
            field = velocity_field,
            valid_levels = result.u_wind.iter().filter(|u| u.is_finite()).count(),
            "Retrieved VAD profile"
        );
        Ok(result)
    }
}

fn scan_error(path: &Path, message: String) -> VadError {
    VadError::Scan {
        path: path.to_path_buf(),
        message,
    }
}

/// Validate sweep start/end ray indices against the ray count.
fn sweep_bounds(start: &[f64], end: &[f64], n_rays: usize) -> Result<Vec<(usize, usize)>, String> {
    if start.len() != end.len() {
        return Err(format!(
            "{} sweep starts but {} sweep ends",
            start.len(),
            end.len()
        ));
    }
    start
        .iter()
        .zip(end)
        .map(|(&s, &e)| {
            if !s.is_finite() || !e.is_finite() || s < 0.0 || e < s || e as usize >= n_rays {
                Err(format!("sweep bounds {}..={} outside {} rays", s, e, n_rays))
            } else {
                Ok((s as usize, e as usize))
            }
        })
        .collect()
}

/// First ray time, falling back to the `time_coverage_start` global attribute.
fn scan_time(file: &netcdf::File, times: &[f64]) -> Option<DateTime<Utc>> {
    let from_units = file
        .variable("time")
        .and_then(|var| get_str_attr(&var, "units"))
        .and_then(|units| parse_cf_seconds_since(&units))
        .and_then(|base| {
            let first = times.iter().copied().find(|t| t.is_finite())?;
            Some(offset_time(&base, first))
        });

    from_units.or_else(|| {
        let start = get_global_str_attr(file, "time_coverage_start")?;
        DateTime::parse_from_rfc3339(start.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

//! Reading persisted profiles back from NetCDF.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use radar_scan::nc::{get_str_attr, read_unpacked, silence_hdf5_errors};
use radar_scan::Platform;
use vad_common::time::{offset_time, parse_cf_seconds_since};
use vad_common::{TimeHeightField, VadError, VadResult};

/// Variables a profile must carry to be plotted.
pub const REQUIRED_VARIABLES: &[&str] = &["u_wind", "v_wind", "speed", "direction", "height", "time"];

/// A profile as read from disk. Fill values are NaN.
#[derive(Debug, Clone)]
pub struct PersistedProfile {
    pub path: PathBuf,
    pub times: Vec<DateTime<Utc>>,
    /// Heights, meters.
    pub heights: Vec<f64>,
    pub u_wind: TimeHeightField,
    pub v_wind: TimeHeightField,
    pub speed: TimeHeightField,
    pub direction: TimeHeightField,
    /// Absent when the file lacks `lon`, `lat` or `alt`.
    pub platform: Option<Platform>,
    /// Text global attributes.
    pub attributes: BTreeMap<String, String>,
}

impl PersistedProfile {
    /// Time of the first scan.
    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.times.first().copied()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Read and validate a profile file.
///
/// Every variable in [`REQUIRED_VARIABLES`] is checked for before any data
/// is read; the first one missing is reported as `MissingVariable`.
pub fn read_profile(path: &Path) -> VadResult<PersistedProfile> {
    silence_hdf5_errors();

    let file = netcdf::open(path).map_err(|e| nc_error(path, e))?;

    if let Some(missing) = REQUIRED_VARIABLES
        .iter()
        .find(|name| file.variable(name).is_none())
    {
        return Err(VadError::MissingVariable {
            path: path.to_path_buf(),
            name: missing.to_string(),
        });
    }

    let read = |name: &str| -> VadResult<Vec<f64>> {
        let var = file.variable(name).ok_or_else(|| VadError::MissingVariable {
            path: path.to_path_buf(),
            name: name.to_string(),
        })?;
        read_unpacked(&var).map_err(|e| nc_error(path, e))
    };

    let heights = read("height")?;
    let offsets = read("time")?;
    let n_heights = heights.len();
    let n_times = offsets.len();

    let field = |name: &str| -> VadResult<TimeHeightField> {
        let values = read(name)?;
        if values.len() != n_times * n_heights {
            return Err(VadError::InvalidData(format!(
                "{}: {} has {} values, expected {} x {}",
                path.display(),
                name,
                values.len(),
                n_times,
                n_heights
            )));
        }
        TimeHeightField::from_values(n_heights, values)
    };
    let u_wind = field("u_wind")?;
    let v_wind = field("v_wind")?;
    let speed = field("speed")?;
    let direction = field("direction")?;

    let base = time_base(&file).ok_or_else(|| {
        VadError::InvalidData(format!("{}: cannot determine time reference", path.display()))
    })?;
    let times = offsets.iter().map(|&s| offset_time(&base, s)).collect();

    let scalar = |name: &str| -> Option<f64> {
        let var = file.variable(name)?;
        read_unpacked(&var).ok()?.first().copied()
    };
    let platform = match (scalar("alt"), scalar("lon"), scalar("lat")) {
        (Some(altitude), Some(longitude), Some(latitude)) => Some(Platform {
            altitude,
            longitude,
            latitude,
        }),
        _ => None,
    };

    let attributes = file
        .attributes()
        .filter_map(|attr| match attr.value() {
            Ok(netcdf::AttributeValue::Str(s)) => Some((attr.name().to_string(), s)),
            _ => None,
        })
        .collect();

    debug!(path = %path.display(), times = n_times, heights = n_heights, "Read VAD profile");

    Ok(PersistedProfile {
        path: path.to_path_buf(),
        times,
        heights,
        u_wind,
        v_wind,
        speed,
        direction,
        platform,
        attributes,
    })
}

/// Reference of the `time` axis: its CF units, else `base_time`.
fn time_base(file: &netcdf::File) -> Option<DateTime<Utc>> {
    let from_units = file
        .variable("time")
        .and_then(|var| get_str_attr(&var, "units"))
        .and_then(|units| parse_cf_seconds_since(&units));

    from_units.or_else(|| {
        let var = file.variable("base_time")?;
        let epoch: Vec<i64> = var.get_values(..).ok()?;
        Utc.timestamp_opt(*epoch.first()?, 0).single()
    })
}

fn nc_error(path: &Path, err: netcdf::Error) -> VadError {
    VadError::NetCdf(format!("{}: {}", path.display(), err))
}

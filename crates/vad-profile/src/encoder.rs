//! NetCDF output for assembled profiles.
//!
//! Layout of a written file:
//!
//! ```text
//! dimensions:
//!     time = UNLIMITED ;
//!     height = H ;
//! variables:
//!     int64 base_time ;                     seconds since 1970-01-01
//!     double time_offset(time) ;            seconds since base_time
//!     double time(time) ;                   seconds since base_time
//!     double height(height) ;               meters
//!     double u_wind(time, height) ;         _FillValue = -9999
//!     double v_wind(time, height) ;
//!     double speed(time, height) ;
//!     double direction(time, height) ;
//!     double lon ; double lat ; double alt ;
//! ```

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::provenance::Provenance;
use crate::record::ProfileRecord;
use vad_common::registry::SiteMetadata;
use vad_common::time::{
    base_time_string, cf_seconds_since, epoch_seconds, output_filename, seconds_between, whole_seconds,
};
use vad_common::{SiteRegistry, TimeHeightField, VadError, VadResult};

/// Fill value of the wind variables.
pub const FILL_VALUE: f64 = -9999.0;

/// Unit string of `base_time`.
pub const EPOCH_UNITS: &str = "seconds since 1970-1-1 0:00:00 0:00";

/// Global attributes written from the run rather than the registry.
pub const PROVENANCE_ATTRIBUTES: &[&str] = &["command_line", "history", "software"];

/// Writes profiles for sites known to a registry.
pub struct ProfileEncoder<'a> {
    registry: &'a SiteRegistry,
}

impl<'a> ProfileEncoder<'a> {
    pub fn new(registry: &'a SiteRegistry) -> Self {
        Self { registry }
    }

    /// Path the profile for `site` would be written to under `dir`.
    pub fn output_path(&self, record: &ProfileRecord, site: &str, dir: &Path) -> VadResult<PathBuf> {
        let metadata = self.registry.require_metadata(site)?;
        Ok(dir.join(output_filename(metadata.datastream(), &record.base_time(), "nc")))
    }

    /// Write `record` for `site` into `dir`, replacing any file of the same
    /// name. Returns the written path.
    ///
    /// An unregistered site fails before anything touches the filesystem.
    pub fn write(
        &self,
        record: &ProfileRecord,
        site: &str,
        dir: &Path,
        provenance: &Provenance,
    ) -> VadResult<PathBuf> {
        let metadata = self.registry.require_metadata(site)?;
        let path = dir.join(output_filename(metadata.datastream(), &record.base_time(), "nc"));

        std::fs::create_dir_all(dir)?;
        write_netcdf(&path, record, metadata, provenance)
            .map_err(|e| VadError::NetCdf(format!("{}: {}", path.display(), e)))?;

        let (n_times, n_heights) = record.shape();
        info!(
            path = %path.display(),
            site,
            times = n_times,
            heights = n_heights,
            "Wrote VAD profile"
        );
        Ok(path)
    }
}

/// Replace non-finite values with the fill value.
fn filled(field: &TimeHeightField) -> Vec<f64> {
    field
        .values()
        .iter()
        .map(|&v| if v.is_finite() { v } else { FILL_VALUE })
        .collect()
}

fn write_netcdf(
    path: &Path,
    record: &ProfileRecord,
    metadata: &SiteMetadata,
    provenance: &Provenance,
) -> netcdf::Result<()> {
    let (n_times, n_heights) = record.shape();
    // `base_time` holds whole seconds; offsets must be measured from the
    // same instant the units string names.
    let base = whole_seconds(&record.base_time());
    let offset_units = cf_seconds_since(&base);
    let offsets: Vec<f64> = record.times().iter().map(|t| seconds_between(&base, t)).collect();
    let platform = record.platform();

    let mut file = netcdf::create(path)?;

    for (key, value) in metadata.attributes() {
        file.add_attribute(key, value.as_str())?;
    }
    file.add_attribute("command_line", provenance.command_line.as_str())?;
    file.add_attribute("history", provenance.history())?;
    file.add_attribute("software", provenance.software.as_str())?;

    file.add_unlimited_dimension("time")?;
    file.add_dimension("height", n_heights)?;

    {
        let mut var = file.add_variable::<i64>("base_time", &[])?;
        var.put_attribute("string", base_time_string(&base))?;
        var.put_attribute("units", EPOCH_UNITS)?;
        var.put_attribute("long_name", "Base time in Epoch")?;
        var.put_attribute("ancillary_variables", "time_offset")?;
        var.put_attribute("calendar", "gregorian")?;
        var.put_values(&[epoch_seconds(&base)], ..)?;
    }
    {
        let mut var = file.add_variable::<f64>("time_offset", &["time"])?;
        var.put_attribute("units", offset_units.as_str())?;
        var.put_attribute("long_name", "Time offset from base_time")?;
        var.put_attribute("ancillary_variables", "base_time")?;
        var.put_attribute("calendar", "gregorian")?;
        var.put_values(&offsets, (&[0usize], &[n_times]))?;
    }
    {
        let mut var = file.add_variable::<f64>("time", &["time"])?;
        var.put_attribute("standard_name", "time")?;
        var.put_attribute("units", offset_units.as_str())?;
        var.put_attribute("long_name", "Scan start time")?;
        var.put_attribute("calendar", "gregorian")?;
        var.put_values(&offsets, (&[0usize], &[n_times]))?;
    }
    {
        let mut var = file.add_variable::<f64>("height", &["height"])?;
        var.put_attribute("standard_name", "height")?;
        var.put_attribute("units", "meter")?;
        var.put_attribute("long_name", "Height above ground")?;
        var.put_values(record.heights().levels(), ..)?;
    }

    let fields = [
        ("u_wind", "eastward_wind", "m/s", "Eastward wind component", record.u_wind()),
        ("v_wind", "northward_wind", "m/s", "Northward wind component", record.v_wind()),
        ("speed", "wind_speed", "m/s", "Horizontal wind speed", record.speed()),
        (
            "direction",
            "wind_from_direction",
            "degree",
            "Horizontal wind direction",
            record.direction(),
        ),
    ];
    for (name, standard_name, units, long_name, field) in fields {
        let mut var = file.add_variable::<f64>(name, &["time", "height"])?;
        var.set_fill_value(FILL_VALUE)?;
        var.put_attribute("standard_name", standard_name)?;
        var.put_attribute("units", units)?;
        var.put_attribute("long_name", long_name)?;
        var.put_values(&filled(field), (&[0usize, 0], &[n_times, n_heights]))?;
        debug!(variable = name, "Wrote field");
    }

    let scalars = [
        ("lon", "longitude", "degree_E", "East longitude", platform.longitude, Some((-180.0, 180.0))),
        ("lat", "latitude", "degree_N", "North latitude", platform.latitude, Some((-90.0, 90.0))),
        ("alt", "altitude", "m", "Altitude above mean sea level", platform.altitude, None),
    ];
    for (name, standard_name, units, long_name, value, valid) in scalars {
        let mut var = file.add_variable::<f64>(name, &[])?;
        var.put_attribute("standard_name", standard_name)?;
        var.put_attribute("units", units)?;
        var.put_attribute("long_name", long_name)?;
        if let Some((min, max)) = valid {
            var.put_attribute("valid_min", min)?;
            var.put_attribute("valid_max", max)?;
        }
        var.put_values(&[value], ..)?;
    }

    Ok(())
}

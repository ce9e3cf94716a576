//! Generators for synthetic radar volumes.
//!
//! [`CfRadialVolume`] writes a small but structurally complete CfRadial file
//! whose radial velocity is the projection of a known uniform wind, so the
//! retrieval can be checked against the wind that produced it.

use chrono::{DateTime, Utc};
use std::path::Path;

use radar_scan::{Platform, DEFAULT_VELOCITY_FIELD};

use crate::fixtures::SGP_I5;

/// Fill value for synthetic data fields.
pub const FIELD_FILL: f32 = -9999.0;

/// Radial velocity seen at azimuth/elevation (degrees) for wind (u, v).
pub fn radial_velocity(u: f64, v: f64, azimuth_deg: f64, elevation_deg: f64) -> f64 {
    let (s, c) = azimuth_deg.to_radians().sin_cos();
    (u * s + v * c) * elevation_deg.to_radians().cos()
}

/// Parameters of a synthetic CfRadial volume.
#[derive(Debug, Clone)]
pub struct CfRadialVolume {
    pub start: DateTime<Utc>,
    pub platform: Platform,
    pub u: f64,
    pub v: f64,
    /// One sweep per entry, degrees.
    pub elevations: Vec<f64>,
    pub rays_per_sweep: usize,
    pub n_gates: usize,
    /// Gate spacing, meters.
    pub gate_spacing: f64,
    pub velocity_field: String,
    /// Every n-th ray is written as fill, when set.
    pub gap_every: Option<usize>,
}

impl CfRadialVolume {
    pub fn new(start: DateTime<Utc>, u: f64, v: f64) -> Self {
        Self {
            start,
            platform: SGP_I5,
            u,
            v,
            elevations: vec![4.0, 8.0, 12.0],
            rays_per_sweep: 180,
            n_gates: 160,
            gate_spacing: 250.0,
            velocity_field: DEFAULT_VELOCITY_FIELD.to_string(),
            gap_every: None,
        }
    }

    pub fn with_velocity_field(mut self, name: &str) -> Self {
        self.velocity_field = name.to_string();
        self
    }

    pub fn with_elevations(mut self, elevations: &[f64]) -> Self {
        self.elevations = elevations.to_vec();
        self
    }

    pub fn with_gaps(mut self, every: usize) -> Self {
        self.gap_every = Some(every);
        self
    }

    pub fn n_rays(&self) -> usize {
        self.elevations.len() * self.rays_per_sweep
    }

    /// Write the volume to `path`.
    pub fn write(&self, path: &Path) -> netcdf::Result<()> {
        let n_rays = self.n_rays();
        let n_sweeps = self.elevations.len();

        let mut azimuth = Vec::with_capacity(n_rays);
        let mut elevation = Vec::with_capacity(n_rays);
        let mut times = Vec::with_capacity(n_rays);
        for (sweep, &el) in self.elevations.iter().enumerate() {
            for ray in 0..self.rays_per_sweep {
                azimuth.push(ray as f64 * 360.0 / self.rays_per_sweep as f64);
                elevation.push(el);
                times.push((sweep * self.rays_per_sweep + ray) as f64 * 0.05);
            }
        }

        let range: Vec<f64> = (0..self.n_gates)
            .map(|g| (g as f64 + 0.5) * self.gate_spacing)
            .collect();

        let mut velocity = Vec::with_capacity(n_rays * self.n_gates);
        let mut reflectivity = Vec::with_capacity(n_rays * self.n_gates);
        for ray in 0..n_rays {
            let gap = self.gap_every.is_some_and(|n| n > 0 && ray % n == 0);
            for g in 0..self.n_gates {
                if gap {
                    velocity.push(FIELD_FILL);
                } else {
                    velocity.push(radial_velocity(self.u, self.v, azimuth[ray], elevation[ray]) as f32);
                }
                reflectivity.push(20.0 - g as f32 * 0.05);
            }
        }

        let sweep_start: Vec<i32> = (0..n_sweeps).map(|s| (s * self.rays_per_sweep) as i32).collect();
        let sweep_end: Vec<i32> = (0..n_sweeps)
            .map(|s| ((s + 1) * self.rays_per_sweep - 1) as i32)
            .collect();

        let mut file = netcdf::create(path)?;
        file.add_attribute("Conventions", "CF/Radial")?;
        file.add_attribute(
            "time_coverage_start",
            self.start.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        )?;

        file.add_dimension("time", n_rays)?;
        file.add_dimension("range", self.n_gates)?;
        file.add_dimension("sweep", n_sweeps)?;

        {
            let mut var = file.add_variable::<f64>("time", &["time"])?;
            var.put_attribute(
                "units",
                format!("seconds since {}", self.start.format("%Y-%m-%dT%H:%M:%SZ")),
            )?;
            var.put_values(&times, ..)?;
        }
        {
            let mut var = file.add_variable::<f64>("range", &["range"])?;
            var.put_attribute("units", "meters")?;
            var.put_values(&range, ..)?;
        }
        {
            let mut var = file.add_variable::<f64>("azimuth", &["time"])?;
            var.put_attribute("units", "degrees")?;
            var.put_values(&azimuth, ..)?;
        }
        {
            let mut var = file.add_variable::<f64>("elevation", &["time"])?;
            var.put_attribute("units", "degrees")?;
            var.put_values(&elevation, ..)?;
        }
        {
            let mut var = file.add_variable::<i32>("sweep_start_ray_index", &["sweep"])?;
            var.put_values(&sweep_start, ..)?;
        }
        {
            let mut var = file.add_variable::<i32>("sweep_end_ray_index", &["sweep"])?;
            var.put_values(&sweep_end, ..)?;
        }

        for (name, value, units) in [
            ("latitude", self.platform.latitude, "degrees_north"),
            ("longitude", self.platform.longitude, "degrees_east"),
            ("altitude", self.platform.altitude, "meters"),
        ] {
            let mut var = file.add_variable::<f64>(name, &[])?;
            var.put_attribute("units", units)?;
            var.put_values(&[value], ..)?;
        }

        {
            let mut var = file.add_variable::<f32>(&self.velocity_field, &["time", "range"])?;
            var.set_fill_value(FIELD_FILL)?;
            var.put_attribute("units", "meters_per_second")?;
            var.put_values(&velocity, ..)?;
        }
        {
            let mut var = file.add_variable::<f32>("reflectivity", &["time", "range"])?;
            var.set_fill_value(FIELD_FILL)?;
            var.put_attribute("units", "dBZ")?;
            var.put_values(&reflectivity, ..)?;
        }

        Ok(())
    }
}

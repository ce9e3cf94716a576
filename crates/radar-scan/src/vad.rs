//! Velocity Azimuth Display retrieval.
//!
//! For a uniform wind (u, v) observed at elevation `el`, the radial velocity
//! around a ring of constant range is
//!
//! ```text
//! vr(az) = a + (u·sin(az) + v·cos(az))·cos(el)
//! ```
//!
//! Each sweep is processed gate by gate: the three harmonic coefficients are
//! fit by least squares over the rays of the sweep, the wind components are
//! recovered from the first harmonic, and the resulting per-gate profile is
//! interpolated linearly onto the height grid. Sweeps are then averaged
//! level by level, ignoring missing values.

use nalgebra::{Matrix3, Vector3};

use crate::scan::RetrievedVad;
use vad_common::{HeightGrid, VadResult};

/// Effective earth radius (4/3 model), meters.
pub const EFFECTIVE_EARTH_RADIUS: f64 = 4.0 / 3.0 * 6_371_000.0;

/// Below this the harmonic fit is considered ill-conditioned.
const MIN_NORMALIZED_DETERMINANT: f64 = 1e-6;

/// Tuning knobs for the retrieval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadSettings {
    /// Minimum number of valid rays on a range ring before a fit is attempted.
    pub min_valid_rays: usize,
    /// Sweeps with `cos(elevation)` below this are too steep to resolve
    /// horizontal wind and are skipped.
    pub min_cos_elevation: f64,
}

impl Default for VadSettings {
    fn default() -> Self {
        Self {
            min_valid_rays: 16,
            min_cos_elevation: 0.1,
        }
    }
}

/// One sweep of a volume: rays x gates of radial velocity.
#[derive(Debug, Clone, Copy)]
pub struct Sweep<'a> {
    /// Azimuth of each ray (degrees).
    pub azimuth: &'a [f64],
    /// Mean elevation of the sweep (degrees).
    pub elevation: f64,
    /// Range of each gate (meters).
    pub ranges: &'a [f64],
    /// Row-major radial velocity, `azimuth.len() * ranges.len()` values, NaN missing.
    pub velocity: &'a [f64],
}

/// Height of the beam centre above the radar (meters), 4/3 earth model.
pub fn beam_height(range: f64, elevation_deg: f64) -> f64 {
    let r = EFFECTIVE_EARTH_RADIUS;
    let el = elevation_deg.to_radians();
    (range * range + r * r + 2.0 * range * r * el.sin()).sqrt() - r
}

/// Least-squares fit of `vr = a + b·sin(az) + c·cos(az)`.
///
/// Returns `(a, b, c)`, or `None` with too few valid samples or a singular
/// system (rays bunched in azimuth).
pub fn fit_harmonics(azimuth_deg: &[f64], vr: &[f64], min_valid: usize) -> Option<(f64, f64, f64)> {
    let mut ata = Matrix3::<f64>::zeros();
    let mut atb = Vector3::<f64>::zeros();
    let mut count = 0usize;

    for (&az, &v) in azimuth_deg.iter().zip(vr) {
        if !az.is_finite() || !v.is_finite() {
            continue;
        }
        let (s, c) = az.to_radians().sin_cos();
        let row = Vector3::new(1.0, s, c);
        ata += row * row.transpose();
        atb += row * v;
        count += 1;
    }

    if count < min_valid.max(3) {
        return None;
    }

    // Normalized determinant is 0.25 for rays spread evenly around the
    // circle and tends to zero as they bunch up.
    let n = count as f64;
    if (ata.determinant() / (n * n * n)).abs() < MIN_NORMALIZED_DETERMINANT {
        return None;
    }

    let solution = ata.lu().solve(&atb)?;
    if solution.iter().all(|x| x.is_finite()) {
        Some((solution[0], solution[1], solution[2]))
    } else {
        None
    }
}

/// Linear interpolation of `(xs, ys)` at `targets`.
///
/// `xs` must be increasing. Targets outside `xs` and targets bracketed by
/// a missing value yield NaN.
pub fn interpolate_onto(xs: &[f64], ys: &[f64], targets: &[f64]) -> Vec<f64> {
    targets
        .iter()
        .map(|&t| {
            let n = xs.len().min(ys.len());
            if n == 0 || !t.is_finite() || t < xs[0] || t > xs[n - 1] {
                return f64::NAN;
            }
            let hi = xs[..n].partition_point(|&x| x < t);
            if hi < n && xs[hi] == t {
                return ys[hi];
            }
            if hi == 0 {
                return f64::NAN;
            }
            let lo = hi - 1;
            let (x0, x1, y0, y1) = (xs[lo], xs[hi], ys[lo], ys[hi]);
            if !y0.is_finite() || !y1.is_finite() || x1 <= x0 {
                return f64::NAN;
            }
            y0 + (y1 - y0) * (t - x0) / (x1 - x0)
        })
        .collect()
}

/// Per-level (u, v) for one sweep, or `None` if the sweep is unusable.
pub fn retrieve_sweep(
    sweep: &Sweep<'_>,
    grid: &HeightGrid,
    settings: &VadSettings,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let cos_el = sweep.elevation.to_radians().cos();
    if sweep.elevation.is_nan() || sweep.elevation <= 0.0 || cos_el < settings.min_cos_elevation {
        return None;
    }

    let n_rays = sweep.azimuth.len();
    let n_gates = sweep.ranges.len();
    if n_rays == 0 || n_gates == 0 || sweep.velocity.len() != n_rays * n_gates {
        return None;
    }

    let mut heights = Vec::with_capacity(n_gates);
    let mut u_gates = Vec::with_capacity(n_gates);
    let mut v_gates = Vec::with_capacity(n_gates);
    let mut ring = vec![f64::NAN; n_rays];

    for (g, &range) in sweep.ranges.iter().enumerate() {
        for (ray, slot) in ring.iter_mut().enumerate() {
            *slot = sweep.velocity[ray * n_gates + g];
        }
        let (u, v) = match fit_harmonics(sweep.azimuth, &ring, settings.min_valid_rays) {
            Some((_, b, c)) => (b / cos_el, c / cos_el),
            None => (f64::NAN, f64::NAN),
        };
        heights.push(beam_height(range, sweep.elevation));
        u_gates.push(u);
        v_gates.push(v);
    }

    if heights.windows(2).any(|w| w[1] <= w[0]) {
        return None;
    }

    let levels = grid.levels();
    Some((
        interpolate_onto(&heights, &u_gates, levels),
        interpolate_onto(&heights, &v_gates, levels),
    ))
}

/// Retrieve one profile from a set of sweeps.
///
/// Levels no sweep covers are NaN. The result always has `grid.len()` levels.
pub fn retrieve(sweeps: &[Sweep<'_>], grid: &HeightGrid, settings: &VadSettings) -> VadResult<RetrievedVad> {
    let n = grid.len();
    let mut u_sum = vec![0.0; n];
    let mut v_sum = vec![0.0; n];
    let mut counts = vec![0usize; n];

    for sweep in sweeps {
        let Some((u, v)) = retrieve_sweep(sweep, grid, settings) else {
            continue;
        };
        for i in 0..n {
            if u[i].is_finite() && v[i].is_finite() {
                u_sum[i] += u[i];
                v_sum[i] += v[i];
                counts[i] += 1;
            }
        }
    }

    let mean = |sum: &[f64]| -> Vec<f64> {
        sum.iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { f64::NAN })
            .collect()
    };

    RetrievedVad::from_components(mean(&u_sum), mean(&v_sum))
}

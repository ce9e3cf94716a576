//! Wind vector conversions.

/// Meters per second in one knot.
pub const MS_PER_KNOT: f64 = 0.514444;

/// Convert m/s to knots.
pub fn ms_to_knots(ms: f64) -> f64 {
    ms / MS_PER_KNOT
}

/// Convert U/V components (m/s) to (speed, direction).
///
/// Direction is in degrees, meteorological convention: the direction the
/// wind blows FROM, clockwise from north, in [0, 360).
/// - 0° = wind from North (V < 0, U = 0)
/// - 90° = wind from East (U < 0, V = 0)
/// - 180° = wind from South (V > 0, U = 0)
/// - 270° = wind from West (U > 0, V = 0)
///
/// Non-finite components yield NaN for both values.
pub fn uv_to_speed_direction(u: f64, v: f64) -> (f64, f64) {
    if !u.is_finite() || !v.is_finite() {
        return (f64::NAN, f64::NAN);
    }

    let speed = u.hypot(v);
    let mut direction = (-u).atan2(-v).to_degrees();
    if direction < 0.0 {
        direction += 360.0;
    }
    if direction >= 360.0 {
        direction -= 360.0;
    }

    (speed, direction)
}

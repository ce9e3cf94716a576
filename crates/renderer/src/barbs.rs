//! Wind barb glyphs.
//!
//! A barb is a shaft pointing into the wind with feathers on its far end:
//! a pennant (flag) per 50 kt, a full barb per 10 kt and a half barb for a
//! remaining 5 kt. Speeds are not rounded, so 9.9 kt is one half barb and
//! 4.9 kt draws as an empty circle.
//!
//! Glyphs are built in a local frame with the station at the origin, then
//! rotated so the shaft points upwind. Feathers sit clockwise of the shaft,
//! as on northern hemisphere charts.

/// Feather spacing along the shaft, as a fraction of the barb length.
pub const SPACING_FRACTION: f64 = 0.125;
/// Distance a feather extends from the shaft.
pub const HEIGHT_FRACTION: f64 = 0.4;
/// Base of a pennant along the shaft.
pub const WIDTH_FRACTION: f64 = 0.25;
/// Radius of the calm-wind circle.
pub const EMPTY_RADIUS_FRACTION: f64 = 0.1;

/// Number of feathers of each kind for a speed in knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarbTails {
    pub flags: u32,
    pub full: u32,
    pub half: bool,
    /// No feathers at all; drawn as a circle.
    pub empty: bool,
}

impl BarbTails {
    /// Decompose `speed_kt`. Negative and non-finite speeds count as calm.
    pub fn from_knots(speed_kt: f64) -> Self {
        let mag = if speed_kt.is_finite() { speed_kt.max(0.0) } else { 0.0 };

        let flags = (mag / 50.0).floor();
        let mag = mag - flags * 50.0;
        let full = (mag / 10.0).floor();
        let mag = mag - full * 10.0;
        let half = mag >= 5.0;

        let flags = flags as u32;
        let full = full as u32;
        Self {
            flags,
            full,
            half,
            empty: !(half || flags > 0 || full > 0),
        }
    }
}

/// One drawable piece of a barb, in pixel offsets from the station
/// (x right, y down).
#[derive(Debug, Clone, PartialEq)]
pub enum BarbPrimitive {
    Line([(f64, f64); 2]),
    Flag([(f64, f64); 3]),
    Circle { center: (f64, f64), radius: f64 },
}

/// Build the primitives of a barb of `length` pixels for a wind of
/// components `u`, `v` (any speed unit, knots expected for the tails).
///
/// Returns an empty vector for non-finite components.
pub fn barb_primitives(u: f64, v: f64, length: f64) -> Vec<BarbPrimitive> {
    if !u.is_finite() || !v.is_finite() {
        return Vec::new();
    }

    let speed = u.hypot(v);
    let tails = BarbTails::from_knots(speed);

    if tails.empty {
        return vec![BarbPrimitive::Circle {
            center: (0.0, 0.0),
            radius: EMPTY_RADIUS_FRACTION * length,
        }];
    }

    // Shaft direction (upwind) and the clockwise perpendicular, y up
    let d = (-u / speed, -v / speed);
    let p = (d.1, -d.0);

    // Local (across, along) to screen offsets
    let to_screen = |across: f64, along: f64| -> (f64, f64) {
        let x = along * d.0 + across * p.0;
        let y = along * d.1 + across * p.1;
        (x, -y)
    };

    let spacing = SPACING_FRACTION * length;
    let height = HEIGHT_FRACTION * length;
    let width = WIDTH_FRACTION * length;

    let mut primitives = vec![BarbPrimitive::Line([to_screen(0.0, 0.0), to_screen(0.0, length)])];
    let mut offset = length;

    for _ in 0..tails.flags {
        if offset != length {
            offset += spacing / 2.0;
        }
        primitives.push(BarbPrimitive::Flag([
            to_screen(0.0, offset),
            to_screen(height, offset - width / 2.0),
            to_screen(0.0, offset - width),
        ]));
        offset -= width + spacing;
    }

    for _ in 0..tails.full {
        primitives.push(BarbPrimitive::Line([
            to_screen(0.0, offset),
            to_screen(height, offset + width / 2.0),
        ]));
        offset -= spacing;
    }

    if tails.half {
        // A lone half barb is set in from the end of the shaft
        if offset == length {
            offset -= 1.5 * spacing;
        }
        primitives.push(BarbPrimitive::Line([
            to_screen(0.0, offset),
            to_screen(height / 2.0, offset + width / 4.0),
        ]));
    }

    primitives
}

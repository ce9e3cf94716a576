//! Color scales for wind-speed rendering.
//!
//! A [`ColorScale`] pairs a list of color stops with bin boundaries. Values
//! are classified into bins by the boundaries, and each bin takes its color
//! from an even sampling of the stops, so a 21-stop ramp over 20 bins gives
//! every bin a distinct color. Values below the first boundary take the first
//! color, values at or above the last boundary take the last color.

use serde::{Deserialize, Serialize};

/// Color representation supporting multiple formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// RGB array: [r, g, b]
    Array(Vec<u8>),

    /// Hex string "#RRGGBB" or a named color such as "darkorange"
    Text(String),
}

impl Color {
    /// Convert to an RGB triple, `None` if the color cannot be parsed.
    pub fn to_rgb(&self) -> Option<(u8, u8, u8)> {
        match self {
            Color::Array(arr) if arr.len() == 3 => Some((arr[0], arr[1], arr[2])),
            Color::Array(_) => None,
            Color::Text(s) if s.starts_with('#') => hex_to_rgb(s),
            Color::Text(s) => named_color(s),
        }
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// CSS/X11 names used by the barb color ramps.
fn named_color(name: &str) -> Option<(u8, u8, u8)> {
    let rgb = match name.to_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "gray" | "grey" => (128, 128, 128),
        "cyan" => (0, 255, 255),
        "blue" => (0, 0, 255),
        "darkblue" => (0, 0, 139),
        "lime" => (0, 255, 0),
        "green" => (0, 128, 0),
        "darkgreen" => (0, 100, 0),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "darkorange" => (255, 140, 0),
        "red" => (255, 0, 0),
        "firebrick" => (178, 34, 34),
        "maroon" => (128, 0, 0),
        "purple" => (128, 0, 128),
        "mediumpurple" => (147, 112, 219),
        "rebeccapurple" => (102, 51, 153),
        "hotpink" => (255, 105, 180),
        "deeppink" => (255, 20, 147),
        "magenta" => (255, 0, 255),
        "pink" => (255, 192, 203),
        _ => return None,
    };
    Some(rgb)
}

/// Serialized form of a color scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScaleConfig {
    /// Color stops, evenly spaced from the lowest to the highest bin
    pub colors: Vec<Color>,
    /// Bin boundaries (knots), strictly increasing
    pub bounds: Vec<f64>,
    /// Colorbar tick values (knots)
    #[serde(default)]
    pub ticks: Vec<f64>,
}

/// A validated, immutable color scale.
///
/// Built once at registry load and shared by reference between sites.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    name: String,
    stops: Vec<(u8, u8, u8)>,
    bounds: Vec<f64>,
    ticks: Vec<f64>,
}

impl ColorScale {
    /// Validate a config and build the scale.
    pub fn from_config(name: &str, config: &ColorScaleConfig) -> Result<Self, String> {
        if config.colors.len() < 2 {
            return Err(format!("{}: color scale needs at least 2 colors", name));
        }
        if config.bounds.len() < 2 {
            return Err(format!("{}: color scale needs at least 2 bounds", name));
        }
        if config.bounds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(format!("{}: bounds must be strictly increasing", name));
        }

        let stops = config
            .colors
            .iter()
            .map(|c| {
                c.to_rgb()
                    .ok_or_else(|| format!("{}: unrecognized color {:?}", name, c))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            stops,
            bounds: config.bounds.clone(),
            ticks: config.ticks.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    /// Number of color bins between the boundaries.
    pub fn n_bins(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Bin holding `value`, clamped to the first/last bin. `None` for NaN.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let upper = self.bounds.partition_point(|&b| b <= value);
        Some(upper.saturating_sub(1).min(self.n_bins() - 1))
    }

    /// Color of bin `index`, sampled evenly along the stops.
    pub fn bin_color(&self, index: usize) -> (u8, u8, u8) {
        let n_bins = self.n_bins();
        let t = if n_bins <= 1 {
            0.5
        } else {
            index.min(n_bins - 1) as f64 / (n_bins - 1) as f64
        };
        self.sample(t)
    }

    /// Color for a data value (knots), `None` for NaN.
    pub fn color_for(&self, value: f64) -> Option<(u8, u8, u8)> {
        self.bin_index(value).map(|i| self.bin_color(i))
    }

    /// Linear interpolation along the stops, `t` in [0, 1].
    fn sample(&self, t: f64) -> (u8, u8, u8) {
        let t = t.clamp(0.0, 1.0);
        let segments = (self.stops.len() - 1) as f64;
        let pos = t * segments;
        let i = (pos.floor() as usize).min(self.stops.len() - 2);
        let frac = pos - i as f64;

        let lerp_u8 = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - frac) + (b as f64) * frac).round() as u8 };

        let (r1, g1, b1) = self.stops[i];
        let (r2, g2, b2) = self.stops[i + 1];
        (lerp_u8(r1, r2), lerp_u8(g1, g2), lerp_u8(b1, b2))
    }
}

//! Height grids and time-height fields.

use serde::{Deserialize, Serialize};

use crate::error::{VadError, VadResult};

/// Default lowest sampled height (meters).
pub const DEFAULT_GRID_START: f64 = 0.0;
/// Default highest sampled height (meters).
pub const DEFAULT_GRID_STOP: f64 = 10_000.0;
/// Default number of sampled heights.
pub const DEFAULT_GRID_LEVELS: usize = 101;

/// Ordered, strictly increasing heights (meters) at which VAD profiles are sampled.
///
/// One grid is shared by every scan of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightGrid {
    levels: Vec<f64>,
}

impl HeightGrid {
    /// Build a grid from explicit levels.
    pub fn new(levels: Vec<f64>) -> VadResult<Self> {
        if levels.is_empty() {
            return Err(VadError::InvalidGrid("grid has no levels".to_string()));
        }
        if let Some(bad) = levels.iter().find(|h| !h.is_finite()) {
            return Err(VadError::InvalidGrid(format!("non-finite level {}", bad)));
        }
        if let Some(i) = levels.windows(2).position(|w| w[1] <= w[0]) {
            return Err(VadError::InvalidGrid(format!(
                "levels must be strictly increasing ({} followed by {})",
                levels[i],
                levels[i + 1]
            )));
        }
        Ok(Self { levels })
    }

    /// Evenly spaced levels from `start` to `stop` inclusive.
    pub fn linspace(start: f64, stop: f64, count: usize) -> VadResult<Self> {
        match count {
            0 => Err(VadError::InvalidGrid("grid has no levels".to_string())),
            1 => Self::new(vec![start]),
            _ => {
                let step = (stop - start) / (count - 1) as f64;
                let mut levels: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
                levels[count - 1] = stop;
                Self::new(levels)
            }
        }
    }

    /// Parse `start:stop:count`, e.g. `0:10000:101`.
    pub fn parse_spec(spec: &str) -> VadResult<Self> {
        let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(VadError::InvalidGrid(format!(
                "expected start:stop:count, got '{}'",
                spec
            )));
        }
        let parse_f = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| VadError::InvalidGrid(format!("bad number '{}'", s)))
        };
        let start = parse_f(parts[0])?;
        let stop = parse_f(parts[1])?;
        let count = parts[2]
            .parse::<usize>()
            .map_err(|_| VadError::InvalidGrid(format!("bad level count '{}'", parts[2])))?;
        Self::linspace(start, stop, count)
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for HeightGrid {
    /// 101 levels from 0 to 10 km.
    fn default() -> Self {
        let step = (DEFAULT_GRID_STOP - DEFAULT_GRID_START) / (DEFAULT_GRID_LEVELS - 1) as f64;
        Self {
            levels: (0..DEFAULT_GRID_LEVELS)
                .map(|i| DEFAULT_GRID_START + step * i as f64)
                .collect(),
        }
    }
}

/// A (time, height) field stored row-major, one row per scan.
///
/// The time axis is never collapsed: a single-scan field has shape (1, H).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeHeightField {
    n_height: usize,
    values: Vec<f64>,
}

impl TimeHeightField {
    /// An empty field with `n_height` columns.
    pub fn new(n_height: usize) -> Self {
        Self {
            n_height,
            values: Vec::new(),
        }
    }

    /// Build from row-major values. `values.len()` must be a multiple of `n_height`.
    pub fn from_values(n_height: usize, values: Vec<f64>) -> VadResult<Self> {
        if n_height == 0 || values.len() % n_height != 0 {
            return Err(VadError::InvalidData(format!(
                "{} values cannot be shaped into rows of {}",
                values.len(),
                n_height
            )));
        }
        Ok(Self { n_height, values })
    }

    /// Append one time row. The row must match the height dimension exactly.
    pub fn push_row(&mut self, row: &[f64]) -> VadResult<()> {
        if row.len() != self.n_height {
            return Err(VadError::InvalidData(format!(
                "row has {} values, field has {} heights",
                row.len(),
                self.n_height
            )));
        }
        self.values.extend_from_slice(row);
        Ok(())
    }

    /// (time, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_times(), self.n_height)
    }

    pub fn n_times(&self) -> usize {
        if self.n_height == 0 {
            0
        } else {
            self.values.len() / self.n_height
        }
    }

    pub fn n_heights(&self) -> usize {
        self.n_height
    }

    pub fn row(&self, t: usize) -> Option<&[f64]> {
        let start = t * self.n_height;
        self.values.get(start..start + self.n_height)
    }

    pub fn get(&self, t: usize, h: usize) -> Option<f64> {
        if h >= self.n_height {
            return None;
        }
        self.values.get(t * self.n_height + h).copied()
    }

    /// Row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

//! Common types and utilities shared across the VAD profile workspace.

pub mod error;
pub mod grid;
pub mod registry;
pub mod style;
pub mod time;
pub mod wind;

pub use error::{VadError, VadResult};
pub use grid::{HeightGrid, TimeHeightField};
pub use registry::{PlotValues, SiteMetadata, SiteRegistry};
pub use style::{Color, ColorScale, ColorScaleConfig};

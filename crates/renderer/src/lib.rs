//! Quicklook rendering for VAD wind profiles.
//!
//! - Wind barb glyph geometry
//! - PNG encoding of RGB buffers
//! - Daily time-height quicklooks

pub mod barbs;
pub mod png;
pub mod quicklook;

pub use barbs::{barb_primitives, BarbPrimitive, BarbTails};
pub use quicklook::{render_quicklook, subsample, BarbSample, QuicklookOptions};

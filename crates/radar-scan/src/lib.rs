//! Radar scan access and VAD wind retrieval.
//!
//! The profile assembler only talks to scans through the [`ScanReader`] and
//! [`RadarScan`] traits. This crate ships one implementation of each:
//! [`CfRadialReader`] opens CfRadial volumes with the native netcdf library,
//! and retrieval fits a first-harmonic model to the radial velocity of every
//! range gate (see [`vad`]).

pub mod cfradial;
pub mod nc;
pub mod scan;
pub mod vad;

pub use cfradial::{CfRadialReader, CfRadialScan};
pub use nc::silence_hdf5_errors;
pub use scan::{Platform, RadarScan, RetrievedVad, ScanReader};
pub use vad::VadSettings;

/// Velocity field used when the caller does not name one.
pub const DEFAULT_VELOCITY_FIELD: &str = "corrected_velocity";

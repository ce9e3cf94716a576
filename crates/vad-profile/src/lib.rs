//! VAD profile assembly and persistence.
//!
//! [`ProfileAssembler`] turns a set of radar scans into a [`ProfileRecord`],
//! [`ProfileEncoder`] writes that record as a NetCDF time-height file named
//! after the site's datastream, and [`read_profile`] loads such a file back.

pub mod assembler;
pub mod encoder;
pub mod provenance;
pub mod reader;
pub mod record;

pub use assembler::{AssemblerOptions, ProfileAssembler};
pub use encoder::{ProfileEncoder, FILL_VALUE};
pub use provenance::Provenance;
pub use reader::{read_profile, PersistedProfile, REQUIRED_VARIABLES};
pub use record::{ProfileBuilder, ProfileRecord};

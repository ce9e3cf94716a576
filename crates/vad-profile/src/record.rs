//! The in-memory time-height profile.

use chrono::{DateTime, Utc};

use radar_scan::{Platform, RetrievedVad};
use vad_common::{HeightGrid, TimeHeightField, VadError, VadResult};

/// A frozen VAD profile: one row per successfully processed scan.
///
/// Always holds at least one scan. Rows are in processing order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    times: Vec<DateTime<Utc>>,
    heights: HeightGrid,
    u_wind: TimeHeightField,
    v_wind: TimeHeightField,
    speed: TimeHeightField,
    direction: TimeHeightField,
    platform: Platform,
}

impl ProfileRecord {
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Time of the first scan; anchors `base_time` and the output filename.
    pub fn base_time(&self) -> DateTime<Utc> {
        self.times[0]
    }

    pub fn heights(&self) -> &HeightGrid {
        &self.heights
    }

    pub fn u_wind(&self) -> &TimeHeightField {
        &self.u_wind
    }

    pub fn v_wind(&self) -> &TimeHeightField {
        &self.v_wind
    }

    pub fn speed(&self) -> &TimeHeightField {
        &self.speed
    }

    pub fn direction(&self) -> &TimeHeightField {
        &self.direction
    }

    /// Platform location of the first successfully processed scan.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// (time, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.times.len(), self.heights.len())
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }
}

/// Accumulates scans into a [`ProfileRecord`].
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    times: Vec<DateTime<Utc>>,
    heights: HeightGrid,
    u_wind: TimeHeightField,
    v_wind: TimeHeightField,
    speed: TimeHeightField,
    direction: TimeHeightField,
    platform: Option<Platform>,
}

impl ProfileBuilder {
    pub fn new(heights: HeightGrid) -> Self {
        let n = heights.len();
        Self {
            times: Vec::new(),
            heights,
            u_wind: TimeHeightField::new(n),
            v_wind: TimeHeightField::new(n),
            speed: TimeHeightField::new(n),
            direction: TimeHeightField::new(n),
            platform: None,
        }
    }

    /// Append one scan's retrieval.
    ///
    /// The platform is captured from the first scan only. A retrieval whose
    /// length differs from the grid is rejected and leaves the builder
    /// unchanged.
    pub fn push(&mut self, time: DateTime<Utc>, platform: Platform, vad: &RetrievedVad) -> VadResult<()> {
        let expected = self.heights.len();
        if vad.aligned_len() != Some(expected) {
            return Err(VadError::InvalidData(format!(
                "retrieval has {}/{}/{}/{} levels (u/v/speed/direction), grid has {}",
                vad.u_wind.len(),
                vad.v_wind.len(),
                vad.speed.len(),
                vad.direction.len(),
                expected
            )));
        }

        self.u_wind.push_row(&vad.u_wind)?;
        self.v_wind.push_row(&vad.v_wind)?;
        self.speed.push_row(&vad.speed)?;
        self.direction.push_row(&vad.direction)?;
        self.times.push(time);
        self.platform.get_or_insert(platform);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Freeze the profile, or `None` if no scan was pushed.
    pub fn finish(self) -> Option<ProfileRecord> {
        let platform = self.platform?;
        Some(ProfileRecord {
            times: self.times,
            heights: self.heights,
            u_wind: self.u_wind,
            v_wind: self.v_wind,
            speed: self.speed,
            direction: self.direction,
            platform,
        })
    }
}

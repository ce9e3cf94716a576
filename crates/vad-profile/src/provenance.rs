//! Run provenance recorded in every output file.

use chrono::{DateTime, Utc};

/// Software credit line.
pub const SOFTWARE: &str = concat!("vad-profile ", env!("CARGO_PKG_VERSION"));

/// Who produced a file, where, when and how.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub command_line: String,
    pub user: String,
    pub host: String,
    pub created: DateTime<Utc>,
    pub software: String,
}

impl Provenance {
    /// Capture the current process invocation.
    pub fn capture() -> Self {
        Self {
            command_line: std::env::args().collect::<Vec<_>>().join(" "),
            user: current_user(),
            host: hostname(),
            created: Utc::now(),
            software: SOFTWARE.to_string(),
        }
    }

    /// Value of the `history` global attribute.
    pub fn history(&self) -> String {
        format!(
            "created by {} on {} at {} using {}",
            self.user,
            self.host,
            self.created.format("%Y-%m-%dT%H:%M:%S%.6f"),
            self.software
        )
    }
}

/// Host name of the machine, `unknown` if it cannot be determined.
pub fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|s| !s.is_empty()))
        .or_else(|| std::env::var("COMPUTERNAME").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_history_format() {
        let provenance = Provenance {
            command_line: "vad profile a.nc".to_string(),
            user: "radar".to_string(),
            host: "node1".to_string(),
            created: Utc.with_ymd_and_hms(2017, 10, 6, 1, 2, 3).unwrap(),
            software: SOFTWARE.to_string(),
        };
        assert_eq!(
            provenance.history(),
            format!("created by radar on node1 at 2017-10-06T01:02:03.000000 using {}", SOFTWARE)
        );
    }

    #[test]
    fn test_capture() {
        let provenance = Provenance::capture();
        assert!(!provenance.host.is_empty());
        assert!(provenance.software.starts_with("vad-profile "));
    }
}

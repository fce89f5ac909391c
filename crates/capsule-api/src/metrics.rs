use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters collected over one generator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    /// Modules the generator was asked to process
    pub modules_attempted: usize,

    /// Modules whose artifacts were written (or verified in check mode)
    pub modules_generated: usize,

    /// Modules with no exported functions
    pub modules_skipped: usize,

    /// Modules that failed
    pub modules_failed: usize,

    /// Source files scanned for markers
    pub files_scanned: usize,

    /// API groups emitted
    pub groups: usize,

    /// Functions emitted across all groups
    pub functions: usize,

    /// Wall time of the run
    #[serde(with = "duration_millis")]
    pub total_time: Duration,
}

// Helper module for serializing Duration
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: u64 = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl Default for GenerationMetrics {
    fn default() -> Self {
        Self {
            modules_attempted: 0,
            modules_generated: 0,
            modules_skipped: 0,
            modules_failed: 0,
            files_scanned: 0,
            groups: 0,
            functions: 0,
            total_time: Duration::ZERO,
        }
    }
}

impl GenerationMetrics {
    /// True when no module failed
    pub fn is_success(&self) -> bool {
        self.modules_failed == 0
    }
}

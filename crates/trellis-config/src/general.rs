//! General engine configuration.

use serde::{Deserialize, Serialize};

/// Default result limit for list queries.
const fn default_limit() -> u32 {
    20
}

/// Default deadline for an in-progress analysis before a supervising caller
/// should mark it failed with a timeout error.
const fn default_analysis_timeout_secs() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default result limit for list queries.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Deadline in seconds after which an in-progress trend analysis is
    /// considered overdue. The engine runs no timers of its own; the value
    /// is consumed by whatever process drives the trend collaborators.
    #[serde(default = "default_analysis_timeout_secs")]
    pub analysis_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            analysis_timeout_secs: default_analysis_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.analysis_timeout_secs, 600);
    }
}

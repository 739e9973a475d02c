// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command line configuration loaded from environment variables.

use crate::pipeline::StudyConfig;

/// Default tracing filter when neither `BUILDABLE_LOG` nor `RUST_LOG` is set
pub const DEFAULT_LOG_FILTER: &str = "info,buildable=debug";

/// Settings the `buildable-study` tool reads from its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Number of worker threads for batch evaluation.
    pub worker_threads: usize,
    /// Tracing filter directive.
    pub log_filter: String,
    /// Overrides the shadow simulation latitude.
    pub latitude: Option<f64>,
    /// Overrides the shadow sampling interval, hours.
    pub shadow_step_hours: Option<f64>,
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, ignoring unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            worker_threads: lookup("BUILDABLE_WORKER_THREADS")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or_else(num_cpus::get),
            log_filter: lookup("BUILDABLE_LOG")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
            latitude: lookup("BUILDABLE_LATITUDE").and_then(|v| v.parse().ok()),
            shadow_step_hours: lookup("BUILDABLE_SHADOW_STEP_HOURS").and_then(|v| v.parse().ok()),
        }
    }

    /// Study configuration with the environment overrides applied.
    pub fn study_config(&self) -> StudyConfig {
        let mut config = StudyConfig::default();
        if let Some(latitude) = self.latitude {
            config.shadow.latitude = latitude;
        }
        if let Some(step) = self.shadow_step_hours {
            config.shadow.step_hours = step;
        }
        config
    }
}

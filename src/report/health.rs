//! Aggregate health check over all plugins

use std::fmt;

use serde::Serialize;

use crate::freshness::resolver::Resolution;

pub const TEST_NAME: &str = "plugin_health_check";

const BADGE_LABEL: &str = "Plugins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Good,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Good => "good",
            HealthStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    /// Name the check is registered under, independent of its outcome
    pub title: String,
    pub label: String,
    pub status: HealthStatus,
    pub badge: Badge,
    pub description: String,
    pub actions: String,
    pub test: String,
    /// Display names of stale plugins in evaluation order
    pub stale_plugins: Vec<String>,
}

impl HealthCheck {
    /// Build the check from resolved plugins.
    ///
    /// Only plugins with a known, stale date count. Unresolved plugins never
    /// make the check fail.
    pub fn evaluate(resolutions: &[Resolution], threshold_years: u32) -> Self {
        let stale_plugins: Vec<String> = resolutions
            .iter()
            .filter(|r| r.is_stale())
            .map(|r| r.name.clone())
            .collect();

        let years = years_phrase(threshold_years);

        let (label, status, color, description) = if stale_plugins.is_empty() {
            (
                format!("All plugins have been updated within the last {}", years),
                HealthStatus::Good,
                "blue",
                format!("All plugins have been updated within the last {}.", years),
            )
        } else {
            (
                format!("Some of your plugins have not been updated in over {}", years),
                HealthStatus::Critical,
                "red",
                format!(
                    "The following plugins have not been updated in over {}: {}. \
                     It is highly suggested you look for actively developed alternatives.",
                    years,
                    stale_plugins.join(", ")
                ),
            )
        };

        Self {
            title: Self::title(threshold_years),
            label,
            status,
            badge: Badge {
                label: BADGE_LABEL.to_string(),
                color: color.to_string(),
            },
            description,
            actions: String::new(),
            test: TEST_NAME.to_string(),
            stale_plugins,
        }
    }

    pub fn title(threshold_years: u32) -> String {
        format!(
            "Check for any plugins that have not been updated in {}",
            years_phrase(threshold_years)
        )
    }

    pub fn is_good(&self) -> bool {
        self.status == HealthStatus::Good
    }
}

impl fmt::Display for HealthCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}] {}", self.status.as_str(), self.label)?;
        writeln!(f, "{}", self.description)
    }
}

fn years_phrase(years: u32) -> String {
    if years == 1 {
        "1 year".to_string()
    } else {
        format!("{} years", years)
    }
}

//! Incident records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "SEV-1")]
    Sev1,
    #[serde(rename = "SEV-2")]
    Sev2,
    #[serde(rename = "SEV-3")]
    Sev3,
    #[serde(rename = "SEV-4")]
    Sev4,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Sev1 => "SEV-1",
            Severity::Sev2 => "SEV-2",
            Severity::Sev3 => "SEV-3",
            Severity::Sev4 => "SEV-4",
        }
    }

    /// Only SEV-1 and SEV-2 page the on-call engineer.
    pub fn pages_on_call(self) -> bool {
        matches!(self, Severity::Sev1 | Severity::Sev2)
    }

    /// Response-time target in minutes. SEV-4 is best effort.
    pub fn sla_target_minutes(self) -> Option<u64> {
        match self {
            Severity::Sev1 => Some(5),
            Severity::Sev2 => Some(15),
            Severity::Sev3 => Some(120),
            Severity::Sev4 => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Severity::Sev1 => "🔴",
            Severity::Sev2 => "🟠",
            Severity::Sev3 => "🟡",
            Severity::Sev4 => "🟢",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SEV-1" => Ok(Severity::Sev1),
            "SEV-2" => Ok(Severity::Sev2),
            "SEV-3" => Ok(Severity::Sev3),
            "SEV-4" => Ok(Severity::Sev4),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Resolved,
}

/// A status update posted during an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    pub author: String,
    pub message: String,
    pub posted_at: u64,
}

/// Fields supplied when opening an incident.
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub title: String,
    pub severity: Severity,
    pub commander: String,
    pub channel_id: String,
    pub started_at: u64,
}

/// Timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub status: Status,
    pub commander: String,
    pub channel_id: String,
    pub started_at: u64,
    pub resolved_at: Option<u64>,
    pub page_on_call: bool,
    pub updates: Vec<IncidentUpdate>,
}

impl Incident {
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Minutes from start to resolution, or to `now` while active.
    pub fn duration_minutes(&self, now: u64) -> u64 {
        self.resolved_at.unwrap_or(now).saturating_sub(self.started_at) / 60
    }

    pub fn is_sla_violated(&self, now: u64) -> bool {
        self.severity
            .sla_target_minutes()
            .is_some_and(|target| self.duration_minutes(now) > target)
    }
}

/// Human duration for Slack: `2d 3h`, `4h 12m` or `9m`.
pub fn format_duration(minutes: u64) -> String {
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

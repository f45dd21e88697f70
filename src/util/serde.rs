//! Shared serializable identifiers and enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cluster identifier.
pub type ClusterId = u64;

/// Deployment identifier.
pub type DeploymentId = u64;

/// Owning organization identifier.
pub type OrganizationId = u64;

/// Deployment priority class. Higher is more urgent.
///
/// Serialized as its integer score (1..=3) so it can double as the
/// wait-queue ordering score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    /// Background work.
    #[default]
    Low = 1,
    /// Regular work.
    Normal = 2,
    /// Urgent work.
    High = 3,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Normal, Self::High];

    /// Queue ordering score.
    pub const fn score(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = crate::core::SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Normal),
            3 => Ok(Self::High),
            other => Err(crate::core::SchedulerError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.score()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.score())
    }
}

/// Resource dimension tracked by the capacity ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// CPU units.
    Cpu,
    /// Memory units.
    Ram,
    /// GPU units.
    Gpu,
}

impl ResourceKind {
    /// All tracked dimensions.
    pub const ALL: [Self; 3] = [Self::Cpu, Self::Ram, Self::Gpu];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Gpu => "gpu",
        };
        f.write_str(name)
    }
}

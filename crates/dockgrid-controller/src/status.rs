//! Container status classification.

use std::fmt;

/// A container status as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Restarting,
    Created,
    Removing,
    Paused,
    Exited,
    Dead,
    /// Anything the runtime reports that we do not recognize.
    Unknown(String),
}

impl ContainerStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "running" => ContainerStatus::Running,
            "restarting" => ContainerStatus::Restarting,
            "created" => ContainerStatus::Created,
            "removing" => ContainerStatus::Removing,
            "paused" => ContainerStatus::Paused,
            "exited" => ContainerStatus::Exited,
            "dead" => ContainerStatus::Dead,
            other => ContainerStatus::Unknown(other.to_string()),
        }
    }

    /// Live containers count toward a service's target.
    ///
    /// Restarting counts: the runtime resurrects crashed containers on its
    /// own, and a crash-looping container still holds its reservation.
    pub fn is_live(&self) -> bool {
        matches!(self, ContainerStatus::Running | ContainerStatus::Restarting)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ContainerStatus::Unknown(_))
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerStatus::Running => "running",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Created => "created",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
            ContainerStatus::Unknown(raw) => raw.as_str(),
        };
        f.write_str(s)
    }
}

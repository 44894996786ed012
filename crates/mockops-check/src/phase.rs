//! Check run phases

use serde::{Deserialize, Serialize};

/// Phase of a single [`crate::CheckRunner::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPhase {
    /// Not running
    #[default]
    Idle,
    /// Running the setup script
    RunningSetup,
    /// Running the check body
    RunningCheck,
    /// Running the teardown script
    RunningTeardown,
    /// Run finished
    Done,
}

impl CheckPhase {
    /// Phases reachable from `self`
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [CheckPhase] {
        match self {
            Self::Idle | Self::Done => &[Self::RunningSetup],
            Self::RunningSetup => &[Self::RunningCheck],
            Self::RunningCheck => &[Self::RunningTeardown],
            Self::RunningTeardown => &[Self::Done],
        }
    }

    /// Check if `self → to` is legal
    #[inline]
    #[must_use]
    pub fn can_transition(self, to: CheckPhase) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Phase is executing something
    #[inline]
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(
            self,
            Self::RunningSetup | Self::RunningCheck | Self::RunningTeardown
        )
    }

    /// Short label for logs
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RunningSetup => "setup",
            Self::RunningCheck => "check",
            Self::RunningTeardown => "teardown",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for CheckPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

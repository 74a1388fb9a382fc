/// Why the debugger-visible machine is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PauseReason {
    /// The debugger requested a pause.
    Requested,
    /// Execution reached an active breakpoint (handle).
    BreakPoint(u32),
    /// A memory access hit an active watchpoint (handle).
    WatchPoint(u32),
}

/// Execution state observed at the start of each execution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Host frame-drive advances the machine.
    #[default]
    Running,
    /// Host frame-drive delivers video without advancing; only debugger steps run.
    Paused(PauseReason),
}

impl RunState {
    /// Returns `true` when paused for any reason.
    #[must_use]
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused(_))
    }

    /// Returns the pause reason, if paused.
    #[must_use]
    pub const fn pause_reason(self) -> Option<PauseReason> {
        match self {
            Self::Paused(reason) => Some(reason),
            Self::Running => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PauseReason, RunState};

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(!RunState::default().is_paused());
    }

    #[test]
    fn pause_reason_is_reported_only_when_paused() {
        assert_eq!(RunState::Running.pause_reason(), None);
        assert_eq!(
            RunState::Paused(PauseReason::BreakPoint(3)).pause_reason(),
            Some(PauseReason::BreakPoint(3))
        );
        assert!(RunState::Paused(PauseReason::Requested).is_paused());
    }
}

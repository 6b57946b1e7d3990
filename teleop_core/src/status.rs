//! Session phase reported by the run controller.

/// `Init → Running → Draining → Stopped`, or `Init → Stopped` when the
/// session is aborted before input is ready. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Built, input source not yet handed over.
    Init,
    /// Ticking at the configured rate and applying input.
    Running,
    /// Targets zeroed, flush ticks in progress.
    Draining,
    /// `Robot::stop` has been called.
    Stopped,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Stopped => "stopped",
        }
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_enter(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Init, Phase::Running)
                | (Phase::Running, Phase::Draining)
                | (Phase::Draining, Phase::Stopped)
                | (Phase::Init, Phase::Stopped)
        )
    }
}

use std::fmt;

/// Where the controller is in the startup sequence.
///
/// Transitions only move forward; a fresh value is built on every process
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Started,
    WizardPending,
    SplashShown,
    MainWindowShown,
    ShuttingDown,
}

impl LifecycleState {
    /// Human-readable label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Started => "started",
            LifecycleState::WizardPending => "wizard-pending",
            LifecycleState::SplashShown => "splash-shown",
            LifecycleState::MainWindowShown => "main-window-shown",
            LifecycleState::ShuttingDown => "shutting-down",
        }
    }

    /// Whether `start` has run.
    pub fn is_started(&self) -> bool {
        *self != LifecycleState::Uninitialized
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

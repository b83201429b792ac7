use app::BoxError;
use settings::SettingsError;
use thiserror::Error;

use crate::state::LifecycleState;

#[derive(Error, Debug)]
pub enum ToolkitError {
    #[error("toolkit already initialized in this process")]
    AlreadyInitialized,

    #[error("event loop is no longer running")]
    Disconnected,

    #[error("no display available")]
    NoDisplay,

    #[error("overlay creation failed: {0}")]
    Overlay(String),
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("toolkit error: {0}")]
    Toolkit(#[from] ToolkitError),

    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] std::io::Error),

    #[error("event loop already ran (state: {0})")]
    AlreadyRan(LifecycleState),

    #[error("no toolkit instance or source configured")]
    NoToolkit,

    #[error("first-run setup required but no setup wizard configured")]
    NoSetupWizard,

    #[error("setup wizard failed")]
    Wizard(#[source] BoxError),

    #[error("no main window type configured")]
    NoMainWindow,

    #[error("main window construction failed")]
    MainWindow(#[source] BoxError),

    #[error("main window construction panicked: {0}")]
    MainWindowPanicked(String),
}

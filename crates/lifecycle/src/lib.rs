//! Application lifecycle controller.
//!
//! Takes the process from "nothing initialized" to "main window visible":
//!
//! 1. [`LifecycleController::start`] installs the interrupt handler and obtains
//!    the toolkit (the single event loop of the process).
//! 2. [`LifecycleController::run_setup_wizard`] asks the [`SettingsGate`]
//!    whether first-run setup is needed and blocks on the wizard if so.
//! 3. [`LifecycleController::run`] shows the splash overlay, schedules the
//!    deferred main-window construction and hands control to the event loop.
//!
//! The GUI toolkit, setup wizard and main window are collaborators behind
//! the traits in [`toolkit`] and [`window`].

mod config;
mod controller;
mod error;
mod gate;
mod records;
pub mod signal;
pub mod splash;
mod state;
pub mod toolkit;
pub mod window;

pub use config::LaunchConfig;
pub use controller::{
    DEFAULT_SUPPORT_CONTACT, FATAL_EXIT_CODE, LifecycleController, LifecycleControllerBuilder,
    MAIN_WINDOW_DELAY,
};
pub use error::{LifecycleError, ToolkitError};
pub use gate::SettingsGate;
pub use records::{ApplicationSettings, PathSettings};
pub use signal::ShutdownState;
pub use state::LifecycleState;

//! Collaborators the controller hands control to: the first-run setup wizard
//! and the main window.

use std::collections::BTreeMap;

use app::BoxError;

use crate::signal::ShutdownState;
use crate::toolkit::{LoopProxy, Toolkit};

/// Named main-window construction parameters.
pub type WindowParams = BTreeMap<String, String>;

/// What a main window receives instead of a reference to the controller.
#[derive(Debug, Clone)]
pub struct WindowContext {
    pub proxy: LoopProxy,
    pub shutdown: ShutdownState,
    pub params: WindowParams,
}

/// The application's main window once constructed.
pub trait MainWindow {
    /// Bring to the foreground and focus.
    fn raise(&mut self);
}

/// Constructs the main window on the event-loop thread.
pub trait MainWindowBuilder<T: Toolkit> {
    /// Type name, for logs.
    fn name(&self) -> &str;

    fn build(&self, toolkit: &mut T, ctx: WindowContext) -> Result<Box<dyn MainWindow>, BoxError>;
}

/// First-run configuration flow. Blocks until setup is complete.
pub trait SetupWizard {
    fn run(&mut self) -> Result<(), BoxError>;
}

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use app::{LOG_LIFECYCLE, ProgressFeed};
use settings::SettingsStore;

use crate::config::LaunchConfig;
use crate::error::{LifecycleError, ToolkitError};
use crate::gate::SettingsGate;
use crate::signal::{InterruptGuard, ShutdownState, install_interrupt_handler};
use crate::splash::{self, SplashHandle, SplashOptions};
use crate::state::LifecycleState;
use crate::toolkit::{
    DeferredTask, Dispatcher, LoopEvent, LoopProxy, STARTUP_ATTRIBUTES, Toolkit, ToolkitSource,
};
use crate::window::{MainWindow, MainWindowBuilder, SetupWizard, WindowContext, WindowParams};

/// Delay between entering the event loop and building the main window.
pub const MAIN_WINDOW_DELAY: Duration = Duration::from_millis(50);

/// Exit status after the main window failed to come up.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Where users are sent when startup fails.
pub const DEFAULT_SUPPORT_CONTACT: &str = "the project issue tracker";

/// Drives the process from "nothing initialized" to "main window visible".
///
/// The controller owns the toolkit. Code that needs to reach the running loop
/// gets a [`LoopProxy`] through its [`WindowContext`].
pub struct LifecycleController<T: Toolkit> {
    config: LaunchConfig,
    store: Arc<SettingsStore>,
    toolkit: Option<T>,
    source: Option<ToolkitSource<T>>,
    wizard: Option<Box<dyn SetupWizard>>,
    progress: Option<ProgressFeed>,
    install_signal_handler: bool,
    interrupt_guard: Option<InterruptGuard>,
    session: Session<T>,
}

impl<T: Toolkit> LifecycleController<T> {
    pub fn builder(config: LaunchConfig, store: Arc<SettingsStore>) -> LifecycleControllerBuilder<T> {
        LifecycleControllerBuilder::new(config, store)
    }

    pub fn state(&self) -> LifecycleState {
        self.session.state
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    pub fn shutdown(&self) -> &ShutdownState {
        &self.session.shutdown
    }

    /// The main window, once constructed.
    pub fn main_window(&self) -> Option<&dyn MainWindow> {
        self.session.main_window.as_deref()
    }

    pub fn has_splash(&self) -> bool {
        self.session.splash.is_some()
    }

    /// `start`, then `run_setup_wizard`, then `run`.
    pub fn launch(&mut self) -> Result<i32, LifecycleError> {
        if !self.config.initialize_gui {
            tracing::info!(target: LOG_LIFECYCLE, "GUI initialization disabled");
            return Ok(0);
        }
        self.start()?;
        self.run_setup_wizard()?;
        self.run()
    }

    /// Install the interrupt handler and obtain the toolkit.
    ///
    /// An instance passed to the builder is reused; the toolkit source is only
    /// consulted when there is none. Calling this again is a no-op.
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        if !self.config.initialize_gui || self.session.state.is_started() {
            return Ok(());
        }

        if self.install_signal_handler && self.interrupt_guard.is_none() {
            let guard = install_interrupt_handler(self.session.shutdown.clone())?;
            self.interrupt_guard = Some(guard);
        }

        let mut toolkit = match self.toolkit.take() {
            Some(toolkit) => {
                tracing::debug!(target: LOG_LIFECYCLE, "reusing existing toolkit instance");
                toolkit
            }
            None => {
                let source = self.source.take().ok_or(LifecycleError::NoToolkit)?;
                source()?
            }
        };
        for attribute in STARTUP_ATTRIBUTES {
            toolkit.set_attribute(attribute);
        }

        let proxy = toolkit.proxy();
        self.session.shutdown.attach_loop(proxy.clone());
        if let Some(feed) = &self.progress {
            let sink = proxy.clone();
            feed.connect(move |event| {
                // the loop may already be gone during shutdown
                let _ = sink.post(LoopEvent::Progress(event));
            });
        }
        self.session.proxy = Some(proxy);
        self.toolkit = Some(toolkit);

        self.session.transition(LifecycleState::Started);
        Ok(())
    }

    /// Ask the settings gate whether first-run setup is needed and, if so,
    /// block on the setup wizard. Returns whether the wizard ran.
    pub fn run_setup_wizard(&mut self) -> Result<bool, LifecycleError> {
        if !self.config.initialize_gui {
            return Ok(false);
        }

        let gate = SettingsGate::new(&self.store, self.config.disable_setup_wizard);
        if !gate.should_run_setup()? {
            return Ok(false);
        }

        let wizard = self.wizard.as_mut().ok_or(LifecycleError::NoSetupWizard)?;
        let resume = self.session.state;
        self.session.transition(LifecycleState::WizardPending);
        wizard.run().map_err(LifecycleError::Wizard)?;
        self.session.transition(resume);
        Ok(true)
    }

    /// Show the splash, schedule the main window and run the event loop.
    /// Runs once per process; later calls return [`LifecycleError::AlreadyRan`].
    ///
    /// Blocks until the loop exits and returns the process exit code:
    /// [`FATAL_EXIT_CODE`] if the main window failed, 0 after an interrupt,
    /// otherwise whatever the loop returned.
    pub fn run(&mut self) -> Result<i32, LifecycleError> {
        if !self.config.initialize_gui {
            return Ok(0);
        }
        if self.session.state >= LifecycleState::SplashShown {
            return Err(LifecycleError::AlreadyRan(self.session.state));
        }
        if !self.session.state.is_started() {
            self.start()?;
        }
        let toolkit = self.toolkit.as_mut().ok_or(LifecycleError::NoToolkit)?;

        if !self.config.no_splash && self.session.splash.is_none() {
            let options = SplashOptions {
                enabled: true,
                image: self.config.splash_image.as_deref(),
                title: &self.config.splash_title,
            };
            match splash::show(toolkit, &options) {
                Ok(handle) => self.session.splash = handle,
                Err(err) => {
                    tracing::warn!(target: LOG_LIFECYCLE, "continuing without splash: {err}");
                }
            }
        }

        toolkit.single_shot(MAIN_WINDOW_DELAY, DeferredTask::ShowMainWindow);
        self.session.transition(LifecycleState::SplashShown);

        let shutdown = self.session.shutdown.clone();
        shutdown.set_loop_running(true);
        let code = toolkit.exec(&mut self.session);
        shutdown.set_loop_running(false);

        if let Some(feed) = &self.progress {
            feed.disconnect();
        }
        splash::dismiss(&mut self.session.splash);

        let code = if self.session.failed {
            FATAL_EXIT_CODE
        } else if shutdown.is_requested() {
            self.session.transition(LifecycleState::ShuttingDown);
            0
        } else {
            code
        };
        tracing::info!(target: LOG_LIFECYCLE, code, "event loop finished");
        Ok(code)
    }

    /// Build the main window right away instead of from the event loop.
    ///
    /// Dismisses the splash either way. Unlike the deferred path, a failure
    /// is returned to the caller instead of ending the loop. Once a main
    /// window exists this is a no-op.
    pub fn show_main_window(&mut self) -> Result<(), LifecycleError> {
        if !self.config.initialize_gui {
            return Ok(());
        }
        let toolkit = self.toolkit.as_mut().ok_or(LifecycleError::NoToolkit)?;
        self.session.show_main_window(toolkit)
    }
}

/// Controller state that the event loop dispatches into.
struct Session<T: Toolkit> {
    state: LifecycleState,
    initialize_gui: bool,
    shutdown: ShutdownState,
    proxy: Option<LoopProxy>,
    splash: Option<SplashHandle<T::Overlay>>,
    window_override: Option<Box<dyn MainWindowBuilder<T>>>,
    default_window: Option<Box<dyn MainWindowBuilder<T>>>,
    params: WindowParams,
    main_window: Option<Box<dyn MainWindow>>,
    failed: bool,
    support_contact: String,
}

impl<T: Toolkit> Session<T> {
    fn transition(&mut self, next: LifecycleState) {
        if self.state != next {
            tracing::debug!(
                target: LOG_LIFECYCLE,
                from = self.state.label(),
                to = next.label(),
                "state transition"
            );
            self.state = next;
        }
    }

    fn show_main_window(&mut self, toolkit: &mut T) -> Result<(), LifecycleError> {
        if !self.initialize_gui {
            return Ok(());
        }
        if self.main_window.is_some() {
            tracing::debug!(target: LOG_LIFECYCLE, "main window already shown");
            return Ok(());
        }

        let result = self.build_main_window(toolkit);
        splash::dismiss(&mut self.splash);

        let mut window = result?;
        window.raise();
        self.main_window = Some(window);
        self.transition(LifecycleState::MainWindowShown);
        Ok(())
    }

    fn build_main_window(&self, toolkit: &mut T) -> Result<Box<dyn MainWindow>, LifecycleError> {
        let builder = self
            .window_override
            .as_deref()
            .or(self.default_window.as_deref())
            .ok_or(LifecycleError::NoMainWindow)?;
        let proxy = self
            .proxy
            .clone()
            .ok_or(LifecycleError::Toolkit(ToolkitError::Disconnected))?;
        let ctx = WindowContext {
            proxy,
            shutdown: self.shutdown.clone(),
            params: self.params.clone(),
        };

        tracing::info!(target: LOG_LIFECYCLE, window = builder.name(), "constructing main window");
        match panic::catch_unwind(AssertUnwindSafe(|| builder.build(toolkit, ctx))) {
            Ok(Ok(window)) => Ok(window),
            Ok(Err(err)) => Err(LifecycleError::MainWindow(err)),
            Err(payload) => Err(LifecycleError::MainWindowPanicked(panic_message(payload))),
        }
    }

    /// Report a main-window failure and end the loop with [`FATAL_EXIT_CODE`].
    fn fail(&mut self, err: LifecycleError) {
        self.failed = true;

        let mut chain = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            chain.push_str(&format!("\n  caused by: {cause}"));
            source = cause.source();
        }
        tracing::error!(target: LOG_LIFECYCLE, "main window failed: {chain}");
        eprintln!("{chain}");
        eprintln!(
            "An error occurred while initializing the application.\n\
             Please report this issue at {}.",
            self.support_contact
        );

        if let Some(proxy) = &self.proxy {
            if let Err(err) = proxy.exit(FATAL_EXIT_CODE) {
                tracing::error!(target: LOG_LIFECYCLE, "failed to stop event loop: {err}");
            }
        }
    }
}

impl<T: Toolkit> Dispatcher<T> for Session<T> {
    fn dispatch(&mut self, event: LoopEvent, toolkit: &mut T) {
        match event {
            LoopEvent::Deferred(DeferredTask::ShowMainWindow) => {
                if let Err(err) = self.show_main_window(toolkit) {
                    self.fail(err);
                }
            }
            LoopEvent::Progress(progress) => {
                splash::update_message(self.splash.as_mut(), &progress.text);
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Configures a [`LifecycleController`].
pub struct LifecycleControllerBuilder<T: Toolkit> {
    config: LaunchConfig,
    store: Arc<SettingsStore>,
    toolkit: Option<T>,
    source: Option<ToolkitSource<T>>,
    wizard: Option<Box<dyn SetupWizard>>,
    window_override: Option<Box<dyn MainWindowBuilder<T>>>,
    default_window: Option<Box<dyn MainWindowBuilder<T>>>,
    params: WindowParams,
    progress: Option<ProgressFeed>,
    shutdown: ShutdownState,
    install_signal_handler: bool,
    support_contact: String,
}

impl<T: Toolkit> LifecycleControllerBuilder<T> {
    pub fn new(config: LaunchConfig, store: Arc<SettingsStore>) -> Self {
        Self {
            config,
            store,
            toolkit: None,
            source: None,
            wizard: None,
            window_override: None,
            default_window: None,
            params: WindowParams::new(),
            progress: None,
            shutdown: ShutdownState::new(),
            install_signal_handler: true,
            support_contact: DEFAULT_SUPPORT_CONTACT.to_string(),
        }
    }

    /// An already existing toolkit instance; it is reused instead of creating one.
    pub fn with_toolkit(mut self, toolkit: T) -> Self {
        self.toolkit = Some(toolkit);
        self
    }

    pub fn with_toolkit_source<F>(mut self, source: F) -> Self
    where
        F: FnOnce() -> Result<T, ToolkitError> + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_setup_wizard(mut self, wizard: impl SetupWizard + 'static) -> Self {
        self.wizard = Some(Box::new(wizard));
        self
    }

    /// Main window used instead of the default one.
    pub fn with_main_window(mut self, builder: impl MainWindowBuilder<T> + 'static) -> Self {
        self.window_override = Some(Box::new(builder));
        self
    }

    pub fn with_default_main_window(mut self, builder: impl MainWindowBuilder<T> + 'static) -> Self {
        self.default_window = Some(Box::new(builder));
        self
    }

    pub fn with_window_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_window_params(mut self, params: WindowParams) -> Self {
        self.params.extend(params);
        self
    }

    /// Forward progress events to the splash status line while it is shown.
    pub fn with_progress_feed(mut self, feed: ProgressFeed) -> Self {
        self.progress = Some(feed);
        self
    }

    pub fn with_shutdown_state(mut self, shutdown: ShutdownState) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Skip installing the process interrupt handler.
    pub fn without_signal_handler(mut self) -> Self {
        self.install_signal_handler = false;
        self
    }

    pub fn with_support_contact(mut self, contact: impl Into<String>) -> Self {
        self.support_contact = contact.into();
        self
    }

    pub fn build(self) -> LifecycleController<T> {
        LifecycleController {
            session: Session {
                state: LifecycleState::Uninitialized,
                initialize_gui: self.config.initialize_gui,
                shutdown: self.shutdown,
                proxy: None,
                splash: None,
                window_override: self.window_override,
                default_window: self.default_window,
                params: self.params,
                main_window: None,
                failed: false,
                support_contact: self.support_contact,
            },
            config: self.config,
            store: self.store,
            toolkit: self.toolkit,
            source: self.source,
            wizard: self.wizard,
            progress: self.progress,
            install_signal_handler: self.install_signal_handler,
            interrupt_guard: None,
        }
    }
}

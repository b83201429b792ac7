//! Recording fake toolkit for controller tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app::{BoxError, ProgressEvent};
use lifecycle::toolkit::{
    DeferredTask, Dispatcher, DisplayInfo, LoopEvent, LoopProxy, LoopSender, MessageStyle, Overlay,
    OverlaySpec, Rect, Toolkit, ToolkitAttribute,
};
use lifecycle::window::{MainWindow, MainWindowBuilder, SetupWizard, WindowContext};
use lifecycle::{ApplicationSettings, LaunchConfig, PathSettings, ToolkitError};
use settings::SettingsStore;

pub type Trace = Rc<RefCell<Vec<String>>>;

pub fn trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(trace: &Trace) -> Vec<String> {
    trace.borrow().clone()
}

pub fn position(trace: &Trace, entry: &str) -> usize {
    trace
        .borrow()
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry:?} not in trace {:?}", trace.borrow()))
}

pub fn contains(trace: &Trace, entry: &str) -> bool {
    trace.borrow().iter().any(|e| e == entry)
}

pub fn gui_config() -> LaunchConfig {
    LaunchConfig {
        disable_setup_wizard: true,
        ..LaunchConfig::default()
    }
}

pub fn store_in(dir: &Path) -> Arc<SettingsStore> {
    Arc::new(
        SettingsStore::builder()
            .with_settings_file(dir.join("kiln.settings.ron"))
            .build()
            .unwrap(),
    )
}

enum Message {
    Event(LoopEvent),
    Exit(i32),
}

#[derive(Clone, Default)]
struct QueueSender {
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl LoopSender for QueueSender {
    fn post(&self, event: LoopEvent) -> Result<(), ToolkitError> {
        self.queue.lock().unwrap().push_back(Message::Event(event));
        Ok(())
    }

    fn exit(&self, code: i32) -> Result<(), ToolkitError> {
        self.queue.lock().unwrap().push_back(Message::Exit(code));
        Ok(())
    }
}

/// Single-threaded stand-in for a GUI event loop.
///
/// `exec` first drains posted events, then fires timers in delay order, and
/// returns 0 once there is nothing left to do.
pub struct FakeToolkit {
    trace: Trace,
    sender: QueueSender,
    timers: Vec<(Duration, DeferredTask)>,
    pub displays: Vec<DisplayInfo>,
    pub fail_overlay: bool,
}

impl FakeToolkit {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            sender: QueueSender::default(),
            timers: Vec::new(),
            displays: vec![DisplayInfo {
                name: "fake-0".into(),
                geometry: Rect {
                    x: 0,
                    y: 0,
                    width: 1920,
                    height: 1080,
                },
            }],
            fail_overlay: false,
        }
    }

    fn record(&self, entry: impl Into<String>) {
        self.trace.borrow_mut().push(entry.into());
    }
}

impl Toolkit for FakeToolkit {
    type Overlay = FakeOverlay;

    fn set_attribute(&mut self, attribute: ToolkitAttribute) {
        self.record(format!("attr:{attribute:?}"));
    }

    fn displays(&self) -> Vec<DisplayInfo> {
        self.displays.clone()
    }

    fn create_overlay(&mut self, spec: OverlaySpec) -> Result<FakeOverlay, ToolkitError> {
        if self.fail_overlay {
            self.record("overlay:create-failed");
            return Err(ToolkitError::Overlay("refused".into()));
        }
        self.record(format!(
            "overlay:create:{}x{}",
            spec.geometry.width, spec.geometry.height
        ));
        Ok(FakeOverlay {
            trace: self.trace.clone(),
        })
    }

    fn process_events(&mut self) {
        self.record("process_events");
    }

    fn single_shot(&mut self, delay: Duration, task: DeferredTask) {
        self.record(format!("single_shot:{}ms", delay.as_millis()));
        self.timers.push((delay, task));
        self.timers.sort_by_key(|(delay, _)| *delay);
    }

    fn exec(&mut self, dispatcher: &mut dyn Dispatcher<Self>) -> i32 {
        self.record("exec:start");
        loop {
            loop {
                let message = self.sender.queue.lock().unwrap().pop_front();
                match message {
                    Some(Message::Exit(code)) => {
                        self.record(format!("exec:exit:{code}"));
                        return code;
                    }
                    Some(Message::Event(event)) => dispatcher.dispatch(event, self),
                    None => break,
                }
            }

            if self.timers.is_empty() {
                self.record("exec:idle");
                return 0;
            }
            let (_, task) = self.timers.remove(0);
            self.record(format!("timer:{task:?}"));
            dispatcher.dispatch(LoopEvent::Deferred(task), self);
        }
    }

    fn proxy(&self) -> LoopProxy {
        LoopProxy::new(self.sender.clone())
    }
}

pub struct FakeOverlay {
    trace: Trace,
}

impl Overlay for FakeOverlay {
    fn show(&mut self) {
        self.trace.borrow_mut().push("overlay:show".into());
    }

    fn set_message(&mut self, text: &str, _style: MessageStyle) {
        self.trace.borrow_mut().push(format!("overlay:message:{text}"));
    }

    fn close(&mut self) {
        self.trace.borrow_mut().push("overlay:close".into());
    }
}

pub struct FakeWindow {
    trace: Trace,
}

impl MainWindow for FakeWindow {
    fn raise(&mut self) {
        self.trace.borrow_mut().push("window:raise".into());
    }
}

pub enum WindowBehavior {
    Succeed,
    Fail,
    Panic,
    /// Simulates an interrupt arriving while the window is being built.
    Interrupt,
    /// Posts a progress event to the loop while building.
    ReportProgress,
}

pub struct FakeWindowBuilder {
    pub label: &'static str,
    pub trace: Trace,
    pub behavior: WindowBehavior,
}

impl FakeWindowBuilder {
    pub fn new(trace: &Trace, behavior: WindowBehavior) -> Self {
        Self {
            label: "window",
            trace: trace.clone(),
            behavior,
        }
    }

    pub fn labeled(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

impl MainWindowBuilder<FakeToolkit> for FakeWindowBuilder {
    fn name(&self) -> &str {
        self.label
    }

    fn build(
        &self,
        _toolkit: &mut FakeToolkit,
        ctx: WindowContext,
    ) -> Result<Box<dyn MainWindow>, BoxError> {
        let params: Vec<String> = ctx.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.trace
            .borrow_mut()
            .push(format!("{}:build[{}]", self.label, params.join(",")));

        match self.behavior {
            WindowBehavior::Succeed => {}
            WindowBehavior::Fail => return Err("window exploded".into()),
            WindowBehavior::Panic => panic!("window panicked"),
            WindowBehavior::Interrupt => {
                lifecycle::signal::handle_interrupt(&ctx.shutdown, &mut Vec::new());
            }
            WindowBehavior::ReportProgress => {
                ctx.proxy.post(LoopEvent::Progress(ProgressEvent {
                    stage: "window".into(),
                    text: "Restoring layout".into(),
                }))?;
            }
        }
        Ok(Box::new(FakeWindow {
            trace: self.trace.clone(),
        }))
    }
}

/// Completes setup: points the base path at an existing directory and clears
/// the wizard flag.
pub struct FakeWizard {
    pub trace: Trace,
    pub store: Arc<SettingsStore>,
    pub base_path: std::path::PathBuf,
}

impl SetupWizard for FakeWizard {
    fn run(&mut self) -> Result<(), BoxError> {
        self.trace.borrow_mut().push("wizard:run".into());
        let base_path = self.base_path.clone();
        self.store
            .update::<PathSettings, _>(|p| p.base_path = base_path)?;
        self.store
            .update::<ApplicationSettings, _>(|a| a.run_setup_wizard = false)?;
        Ok(())
    }
}

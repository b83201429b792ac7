//! Seam between the lifecycle controller and a GUI toolkit.
//!
//! A toolkit owns the single event loop of the process. Everything the
//! controller needs from it (displays, overlay windows, one-shot timers,
//! running the loop) goes through [`Toolkit`]; other threads talk to the
//! running loop only through a [`LoopProxy`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use app::ProgressEvent;
use image::RgbaImage;

use crate::error::ToolkitError;

/// Rendering attributes applied before the event loop is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolkitAttribute {
    UseDesktopOpenGl,
    EnableHighDpiScaling,
    UseHighDpiPixmaps,
}

/// Attributes the controller sets during `start`.
pub const STARTUP_ATTRIBUTES: [ToolkitAttribute; 3] = [
    ToolkitAttribute::UseDesktopOpenGl,
    ToolkitAttribute::EnableHighDpiScaling,
    ToolkitAttribute::UseHighDpiPixmaps,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub name: String,
    pub geometry: Rect,
}

/// Window flags of the splash overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayFlags {
    pub frameless: bool,
    pub stays_on_top: bool,
    pub translucent: bool,
    /// Only opaque canvas pixels receive input.
    pub mask_from_alpha: bool,
}

impl OverlayFlags {
    pub const SPLASH: OverlayFlags = OverlayFlags {
        frameless: true,
        stays_on_top: true,
        translucent: true,
        mask_from_alpha: true,
    };
}

/// Everything needed to create an overlay window.
#[derive(Clone)]
pub struct OverlaySpec {
    pub display: String,
    pub geometry: Rect,
    pub canvas: RgbaImage,
    pub flags: OverlayFlags,
}

impl fmt::Debug for OverlaySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlaySpec")
            .field("display", &self.display)
            .field("geometry", &self.geometry)
            .field("canvas", &self.canvas.dimensions())
            .field("flags", &self.flags)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAlignment {
    BottomCenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStyle {
    pub alignment: MessageAlignment,
    /// RGBA
    pub color: [u8; 4],
}

impl MessageStyle {
    /// White text, bottom and horizontally centered.
    pub const SPLASH: MessageStyle = MessageStyle {
        alignment: MessageAlignment::BottomCenter,
        color: [255, 255, 255, 255],
    };
}

/// A transient top-level window owned by the splash presenter.
pub trait Overlay {
    fn show(&mut self);
    fn set_message(&mut self, text: &str, style: MessageStyle);
    fn close(&mut self);
}

/// Work scheduled with [`Toolkit::single_shot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    ShowMainWindow,
}

/// Events delivered to a [`Dispatcher`] on the event-loop thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Deferred(DeferredTask),
    Progress(ProgressEvent),
}

/// Receives loop events while [`Toolkit::exec`] runs.
pub trait Dispatcher<T: Toolkit> {
    fn dispatch(&mut self, event: LoopEvent, toolkit: &mut T);
}

/// The sending half of a toolkit's event queue.
pub trait LoopSender: Send + Sync {
    fn post(&self, event: LoopEvent) -> Result<(), ToolkitError>;
    /// Ask the loop to return `code` from `exec`.
    fn exit(&self, code: i32) -> Result<(), ToolkitError>;
}

/// Thread-safe handle to the event loop.
#[derive(Clone)]
pub struct LoopProxy {
    sender: Arc<dyn LoopSender>,
}

impl LoopProxy {
    pub fn new(sender: impl LoopSender + 'static) -> Self {
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn post(&self, event: LoopEvent) -> Result<(), ToolkitError> {
        self.sender.post(event)
    }

    pub fn exit(&self, code: i32) -> Result<(), ToolkitError> {
        self.sender.exit(code)
    }

    pub fn request_quit(&self) -> Result<(), ToolkitError> {
        self.sender.exit(0)
    }
}

impl fmt::Debug for LoopProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopProxy").finish_non_exhaustive()
    }
}

/// The process-wide GUI toolkit and its event loop.
pub trait Toolkit: Sized + 'static {
    type Overlay: Overlay;

    fn set_attribute(&mut self, attribute: ToolkitAttribute);

    /// Displays in system order.
    /// Connected displays, primary first.
    fn displays(&self) -> Vec<DisplayInfo>;

    fn create_overlay(&mut self, spec: OverlaySpec) -> Result<Self::Overlay, ToolkitError>;

    /// Synchronously handle pending paint/display events.
    fn process_events(&mut self);

    /// Deliver `LoopEvent::Deferred(task)` once, `delay` after the loop
    /// starts processing events.
    fn single_shot(&mut self, delay: Duration, task: DeferredTask);

    /// Run the event loop until an exit is requested; returns the exit code.
    fn exec(&mut self, dispatcher: &mut dyn Dispatcher<Self>) -> i32;

    fn proxy(&self) -> LoopProxy;
}

/// Produces the toolkit when no instance exists yet.
pub type ToolkitSource<T> = Box<dyn FnOnce() -> Result<T, ToolkitError>>;

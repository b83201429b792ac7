//! A toolkit without a windowing system.
//!
//! Runs a real single-threaded event loop: posted events arrive over a
//! channel, one-shot timers are kept in a heap, and overlays report their
//! status lines through the log.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use app::LOG_SPLASH;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use lifecycle::ToolkitError;
use lifecycle::toolkit::{
    DeferredTask, Dispatcher, DisplayInfo, LoopEvent, LoopProxy, LoopSender, MessageStyle,
    Overlay, OverlaySpec, Toolkit, ToolkitAttribute,
};

static INSTANCE_CLAIMED: AtomicBool = AtomicBool::new(false);

enum Message {
    Event(LoopEvent),
    Exit(i32),
}

struct ChannelSender(Sender<Message>);

impl LoopSender for ChannelSender {
    fn post(&self, event: LoopEvent) -> Result<(), ToolkitError> {
        self.0
            .send(Message::Event(event))
            .map_err(|_| ToolkitError::Disconnected)
    }

    fn exit(&self, code: i32) -> Result<(), ToolkitError> {
        self.0
            .send(Message::Exit(code))
            .map_err(|_| ToolkitError::Disconnected)
    }
}

struct Timer {
    due: Instant,
    seq: u64,
    task: DeferredTask,
}

// ordered by deadline, then by scheduling order
impl Ord for Timer {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Timer {}

/// The process-wide console toolkit. At most one instance exists at a time.
pub struct ConsoleToolkit {
    displays: Vec<DisplayInfo>,
    attributes: Vec<ToolkitAttribute>,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    /// Timers scheduled before `exec`; their delay counts from loop start.
    pending: Vec<(Duration, DeferredTask)>,
    timers: BinaryHeap<Reverse<Timer>>,
    next_seq: u64,
    running: bool,
}

impl ConsoleToolkit {
    pub fn new(displays: Vec<DisplayInfo>) -> Result<Self, ToolkitError> {
        if INSTANCE_CLAIMED.swap(true, Ordering::SeqCst) {
            return Err(ToolkitError::AlreadyInitialized);
        }

        let (sender, receiver) = crossbeam_channel::unbounded();
        Ok(Self {
            displays,
            attributes: Vec::new(),
            sender,
            receiver,
            pending: Vec::new(),
            timers: BinaryHeap::new(),
            next_seq: 0,
            running: false,
        })
    }

    pub fn attributes(&self) -> &[ToolkitAttribute] {
        &self.attributes
    }

    fn arm(&mut self, delay: Duration, task: DeferredTask) {
        let timer = Timer {
            due: Instant::now() + delay,
            seq: self.next_seq,
            task,
        };
        self.next_seq += 1;
        self.timers.push(Reverse(timer));
    }

    fn pop_due(&mut self, now: Instant) -> Option<DeferredTask> {
        if self.timers.peek().is_some_and(|Reverse(t)| t.due <= now) {
            self.timers.pop().map(|Reverse(t)| t.task)
        } else {
            None
        }
    }
}

impl Drop for ConsoleToolkit {
    fn drop(&mut self) {
        INSTANCE_CLAIMED.store(false, Ordering::SeqCst);
    }
}

impl Toolkit for ConsoleToolkit {
    type Overlay = ConsoleOverlay;

    fn set_attribute(&mut self, attribute: ToolkitAttribute) {
        tracing::debug!(target: app::LOG_LIFECYCLE, ?attribute, "toolkit attribute set");
        if !self.attributes.contains(&attribute) {
            self.attributes.push(attribute);
        }
    }

    fn displays(&self) -> Vec<DisplayInfo> {
        self.displays.clone()
    }

    fn create_overlay(&mut self, spec: OverlaySpec) -> Result<ConsoleOverlay, ToolkitError> {
        if spec.geometry.width == 0 {
            return Err(ToolkitError::Overlay("zero-width overlay".into()));
        }
        let (width, height) = spec.canvas.dimensions();
        tracing::info!(
            target: LOG_SPLASH,
            display = %spec.display,
            canvas = %format!("{width}x{height}"),
            "splash overlay created"
        );
        Ok(ConsoleOverlay {
            visible: false,
            message: None,
        })
    }

    fn process_events(&mut self) {
        // Nothing is painted; posted events wait for `exec`.
    }

    fn single_shot(&mut self, delay: Duration, task: DeferredTask) {
        if self.running {
            self.arm(delay, task);
        } else {
            self.pending.push((delay, task));
        }
    }

    fn exec(&mut self, dispatcher: &mut dyn Dispatcher<Self>) -> i32 {
        self.running = true;
        for (delay, task) in std::mem::take(&mut self.pending) {
            self.arm(delay, task);
        }

        let code = loop {
            while let Some(task) = self.pop_due(Instant::now()) {
                dispatcher.dispatch(LoopEvent::Deferred(task), self);
            }

            let message = match self.timers.peek() {
                Some(Reverse(timer)) => {
                    let timeout = timer.due.saturating_duration_since(Instant::now());
                    match self.receiver.recv_timeout(timeout) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break 0,
                    }
                }
                None => match self.receiver.recv() {
                    Ok(message) => message,
                    Err(_) => break 0,
                },
            };

            match message {
                Message::Event(event) => dispatcher.dispatch(event, self),
                Message::Exit(code) => break code,
            }
        };

        self.running = false;
        code
    }

    fn proxy(&self) -> LoopProxy {
        LoopProxy::new(ChannelSender(self.sender.clone()))
    }
}

pub struct ConsoleOverlay {
    visible: bool,
    message: Option<String>,
}

impl Overlay for ConsoleOverlay {
    fn show(&mut self) {
        self.visible = true;
    }

    fn set_message(&mut self, text: &str, _style: MessageStyle) {
        if self.visible && self.message.as_deref() != Some(text) {
            tracing::info!(target: LOG_SPLASH, "{text}");
            self.message = Some(text.to_string());
        }
    }

    fn close(&mut self) {
        if self.visible {
            self.visible = false;
            tracing::debug!(target: LOG_SPLASH, "splash overlay closed");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// Serializes tests that need the single toolkit instance.
    static INSTANCE_LOCK: Mutex<()> = Mutex::new(());

    pub(crate) fn exclusive() -> MutexGuard<'static, ()> {
        INSTANCE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
        quit_after: Option<usize>,
        proxy: Option<LoopProxy>,
    }

    impl Dispatcher<ConsoleToolkit> for Recorder {
        fn dispatch(&mut self, event: LoopEvent, _toolkit: &mut ConsoleToolkit) {
            self.seen.push(format!("{event:?}"));
            if Some(self.seen.len()) == self.quit_after {
                if let Some(proxy) = &self.proxy {
                    proxy.request_quit().unwrap();
                }
            }
        }
    }

    #[test]
    fn only_one_instance_at_a_time() {
        let _guard = exclusive();
        let first = ConsoleToolkit::new(Vec::new()).unwrap();
        assert!(matches!(
            ConsoleToolkit::new(Vec::new()),
            Err(ToolkitError::AlreadyInitialized)
        ));
        drop(first);
        assert!(ConsoleToolkit::new(Vec::new()).is_ok());
    }

    #[test]
    fn exit_code_is_returned_from_exec() {
        let _guard = exclusive();
        let mut toolkit = ConsoleToolkit::new(Vec::new()).unwrap();
        toolkit.proxy().exit(7).unwrap();

        assert_eq!(toolkit.exec(&mut Recorder::default()), 7);
    }

    #[test]
    fn timers_fire_in_delay_order_after_loop_start() {
        let _guard = exclusive();
        let mut toolkit = ConsoleToolkit::new(Vec::new()).unwrap();
        toolkit.single_shot(Duration::from_millis(20), DeferredTask::ShowMainWindow);
        let proxy = toolkit.proxy();
        proxy
            .post(LoopEvent::Progress(app::ProgressEvent {
                stage: "s".into(),
                text: "first".into(),
            }))
            .unwrap();

        let mut recorder = Recorder {
            quit_after: Some(2),
            proxy: Some(proxy),
            ..Default::default()
        };
        let started = Instant::now();
        assert_eq!(toolkit.exec(&mut recorder), 0);

        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(recorder.seen[0].contains("first"));
        assert_eq!(recorder.seen[1], "Deferred(ShowMainWindow)");
    }

    #[test]
    fn proxy_works_from_other_threads() {
        let _guard = exclusive();
        let mut toolkit = ConsoleToolkit::new(Vec::new()).unwrap();
        let proxy = toolkit.proxy();

        let handle = std::thread::spawn(move || proxy.exit(3).unwrap());
        assert_eq!(toolkit.exec(&mut Recorder::default()), 3);
        handle.join().unwrap();
    }

    #[test]
    fn attributes_are_recorded_once() {
        let _guard = exclusive();
        let mut toolkit = ConsoleToolkit::new(Vec::new()).unwrap();
        toolkit.set_attribute(ToolkitAttribute::UseHighDpiPixmaps);
        toolkit.set_attribute(ToolkitAttribute::UseHighDpiPixmaps);
        assert_eq!(toolkit.attributes(), &[ToolkitAttribute::UseHighDpiPixmaps]);
    }
}

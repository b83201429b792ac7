//! Interrupt handling.
//!
//! The OS handler only feeds a watcher thread. The watcher prints a notice,
//! marks shutdown as requested and asks the running event loop to quit.
//! Before a loop runs (or if the quit request fails) it exits the process
//! with status 0.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use app::LOG_SIGNAL;

use crate::toolkit::LoopProxy;

#[derive(Default)]
struct Inner {
    requested: AtomicBool,
    loop_running: AtomicBool,
    proxy: RwLock<Option<LoopProxy>>,
}

/// Shared between the controller, the interrupt watcher and anyone who wants
/// to ask whether shutdown is underway.
#[derive(Clone, Default)]
pub struct ShutdownState {
    inner: Arc<Inner>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark shutdown as requested. Returns true on the first call.
    pub fn request(&self) -> bool {
        !self.inner.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    pub fn attach_loop(&self, proxy: LoopProxy) {
        *self
            .inner
            .proxy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(proxy);
    }

    pub fn set_loop_running(&self, running: bool) {
        self.inner.loop_running.store(running, Ordering::SeqCst);
    }

    pub fn is_loop_running(&self) -> bool {
        self.inner.loop_running.load(Ordering::SeqCst)
    }

    fn proxy(&self) -> Option<LoopProxy> {
        self.inner
            .proxy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for ShutdownState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownState")
            .field("requested", &self.is_requested())
            .field("loop_running", &self.is_loop_running())
            .finish()
    }
}

/// What the watcher does after handling one interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// The running loop was asked to quit; the main thread finishes up.
    QuitRequested,
    /// Terminate the process right away.
    Exit(i32),
}

/// React to one interrupt.
pub fn handle_interrupt(state: &ShutdownState, out: &mut impl Write) -> InterruptOutcome {
    let _ = writeln!(out, "\nExiting...");
    let _ = out.flush();
    let _ = io::stderr().flush();

    let first = state.request();
    if !first || !state.is_loop_running() {
        return InterruptOutcome::Exit(0);
    }

    let Some(proxy) = state.proxy() else {
        return InterruptOutcome::Exit(0);
    };
    match proxy.request_quit() {
        Ok(()) => InterruptOutcome::QuitRequested,
        Err(err) => {
            tracing::error!(target: LOG_SIGNAL, "failed to quit event loop: {err}");
            let _ = writeln!(out, "failed to quit event loop: {err}");
            InterruptOutcome::Exit(0)
        }
    }
}

/// Keeps the watcher thread alive. Dropping it stops watching.
pub struct InterruptGuard {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Install the interrupt watcher.
#[cfg(unix)]
pub fn install_interrupt_handler(state: ShutdownState) -> io::Result<InterruptGuard> {
    use signal_hook::consts::SIGINT;
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT])?;
    let handle = signals.handle();

    let thread = std::thread::Builder::new()
        .name("interrupt-watcher".into())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::info!(target: LOG_SIGNAL, signal, "interrupt received");
                let outcome = handle_interrupt(&state, &mut io::stdout());
                if let InterruptOutcome::Exit(code) = outcome {
                    std::process::exit(code);
                }
            }
        })?;

    tracing::debug!(target: LOG_SIGNAL, "interrupt handler installed");
    Ok(InterruptGuard {
        handle,
        thread: Some(thread),
    })
}

#[cfg(not(unix))]
pub fn install_interrupt_handler(_state: ShutdownState) -> io::Result<InterruptGuard> {
    tracing::warn!(target: LOG_SIGNAL, "interrupt handling is not supported on this platform");
    Ok(InterruptGuard { thread: None })
}

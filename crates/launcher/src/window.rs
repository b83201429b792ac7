use std::io::BufRead;

use app::{BoxError, LOG_MAIN, report_progress};
use lifecycle::toolkit::LoopProxy;
use lifecycle::window::{MainWindow, MainWindowBuilder, WindowContext};

use crate::console::ConsoleToolkit;

/// Builds the terminal main window.
pub struct ConsoleWindowBuilder {
    app_name: &'static str,
}

impl ConsoleWindowBuilder {
    pub fn new(app_name: &'static str) -> Self {
        Self { app_name }
    }
}

impl MainWindowBuilder<ConsoleToolkit> for ConsoleWindowBuilder {
    fn name(&self) -> &str {
        "ConsoleWindow"
    }

    fn build(
        &self,
        _toolkit: &mut ConsoleToolkit,
        ctx: WindowContext,
    ) -> Result<Box<dyn MainWindow>, BoxError> {
        report_progress("main-window", "Preparing workspace");
        for (name, value) in &ctx.params {
            tracing::debug!(target: LOG_MAIN, %name, %value, "window parameter");
        }
        report_progress("main-window", "Ready");

        Ok(Box::new(ConsoleWindow {
            title: self.app_name,
            proxy: ctx.proxy,
            input: None,
        }))
    }
}

/// Main window on the terminal. Typing `quit` (or closing stdin) ends the
/// event loop.
pub struct ConsoleWindow {
    title: &'static str,
    proxy: LoopProxy,
    input: Option<std::thread::JoinHandle<()>>,
}

impl MainWindow for ConsoleWindow {
    fn raise(&mut self) {
        println!("{} is ready. Type `quit` to exit.", self.title);
        if self.input.is_some() {
            return;
        }

        let proxy = self.proxy.clone();
        let spawned = std::thread::Builder::new()
            .name("console-input".into())
            .spawn(move || watch_input(std::io::stdin().lock(), &proxy));
        match spawned {
            Ok(handle) => self.input = Some(handle),
            Err(err) => tracing::error!(target: LOG_MAIN, "failed to read console input: {err}"),
        }
    }
}

/// Read commands until `quit`/`exit` or end of input, then ask the loop to quit.
fn watch_input(input: impl BufRead, proxy: &LoopProxy) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        match line.trim() {
            "quit" | "exit" => break,
            "" => {}
            other => println!("unknown command `{other}`"),
        }
    }
    if let Err(err) = proxy.request_quit() {
        tracing::warn!(target: LOG_MAIN, "event loop already stopped: {err}");
    }
}

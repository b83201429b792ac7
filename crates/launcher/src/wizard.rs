use std::io::{self, BufRead, Cursor, Stdin, Write};
use std::path::PathBuf;
use std::sync::Arc;

use app::{BoxError, LOG_MAIN};
use lifecycle::window::SetupWizard;
use lifecycle::{ApplicationSettings, PathSettings};
use settings::SettingsStore;

/// Source of wizard answers, one line at a time.
///
/// Must not read past the line it returns: whatever follows belongs to the
/// main window, which reads the same terminal.
pub trait LineInput {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

// `Stdin` keeps its buffer in the process-wide handle, so read-ahead stays
// visible to later `stdin().lock()` readers.
impl LineInput for Stdin {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        Stdin::read_line(self, buf)
    }
}

impl<L: LineInput + ?Sized> LineInput for &mut L {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        (**self).read_line(buf)
    }
}

impl<T: AsRef<[u8]>> LineInput for Cursor<T> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// First-run setup on the terminal: asks for the installation directory,
/// creates it and marks setup as done.
pub struct ConsoleWizard<R, W> {
    store: Arc<SettingsStore>,
    input: R,
    output: W,
}

impl<R: LineInput, W: Write> ConsoleWizard<R, W> {
    pub fn new(store: Arc<SettingsStore>, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    fn ask_base_path(&mut self, current: &PathBuf) -> Result<PathBuf, BoxError> {
        write!(
            self.output,
            "Installation directory [{}]: ",
            current.display()
        )?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let answer = line.trim();
        Ok(if answer.is_empty() {
            current.clone()
        } else {
            PathBuf::from(answer)
        })
    }
}

impl<R: LineInput, W: Write> SetupWizard for ConsoleWizard<R, W> {
    fn run(&mut self) -> Result<(), BoxError> {
        writeln!(self.output, "Welcome! Let's set up your installation.")?;

        let current = self.store.first_or_create::<PathSettings>()?.base_path;
        let base_path = self.ask_base_path(&current)?;
        std::fs::create_dir_all(&base_path)?;

        let stored = base_path.clone();
        self.store
            .update::<PathSettings, _>(move |p| p.base_path = stored)?;
        self.store.first_or_create::<ApplicationSettings>()?;
        self.store
            .update::<ApplicationSettings, _>(|a| a.run_setup_wizard = false)?;

        tracing::info!(target: LOG_MAIN, base_path = %base_path.display(), "setup completed");
        writeln!(self.output, "Setup complete.")?;
        Ok(())
    }
}

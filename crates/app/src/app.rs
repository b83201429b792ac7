mod progress;

use paths::PathContext;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing_subscriber::{
    Layer, filter::LevelFilter, filter::filter_fn, fmt, layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use progress::{PROGRESS_TARGET, ProgressEvent, ProgressFeed, ProgressLayer, report_progress};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub const LOG_MAIN: &str = "main";
pub const LOG_LIFECYCLE: &str = "lifecycle";
pub const LOG_SPLASH: &str = "lifecycle/splash";
pub const LOG_SIGNAL: &str = "lifecycle/signal";

/// Application infrastructure context.
///
/// Contains path management, version info, the progress feed and the
/// logging infrastructure.
pub struct AppContext {
    pub path_context: PathContext,
    pub version: &'static str,
    progress: ProgressFeed,
    /// The log guard must be kept alive for the duration of the application
    /// to ensure log messages are properly flushed.
    _log_guard: tracing_appender::non_blocking::WorkerGuard,
}

impl AppContext {
    pub fn app_id(&self) -> &str {
        self.path_context.app_id()
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn path_context(&self) -> &PathContext {
        &self.path_context
    }

    /// Feed that receives every [`ProgressEvent`] logged after `build`.
    pub fn progress(&self) -> &ProgressFeed {
        &self.progress
    }
}

/// Application metadata trait.
///
/// Define your application's identity by implementing this trait.
pub trait Application: Sized + 'static {
    const APP_ID: &'static str;
    /// Human readable name, shown on the splash screen.
    const APP_NAME: &'static str;
}

/// Builder for creating the application context with proper initialization.
pub struct AppBuilder<A: Application> {
    version: &'static str,
    base_path: Option<PathBuf>,
    _marker: PhantomData<A>,
}

impl<A: Application> AppBuilder<A> {
    pub fn new(version: &'static str) -> Self {
        Self {
            version,
            base_path: None,
            _marker: PhantomData,
        }
    }

    /// Use an explicit data root instead of the detected one.
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Performs all the common initialization:
    /// - Sets up path context (platform-specific directories)
    /// - Ensures all directories exist
    /// - Initializes logging (file + console + progress feed)
    pub fn build(self) -> Result<AppContext, BoxError> {
        let path_context = match self.base_path {
            Some(base) => PathContext::with_base_path(base, A::APP_ID),
            None => PathContext::new(A::APP_ID),
        };

        path_context.ensure_directories()?;

        // Get log file path and split into directory + filename
        let log_file_path = path_context.log_file_now();
        let log_dir = log_file_path
            .parent()
            .ok_or("log file path should have parent directory")?;
        let log_filename = log_file_path
            .file_name()
            .ok_or("log file path should have filename")?;

        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        #[cfg(debug_assertions)]
        let level = LevelFilter::INFO;

        #[cfg(not(debug_assertions))]
        let level = LevelFilter::WARN;

        // Separate layer: file (non-blocking) + console (stdout)
        let file_layer = fmt::Layer::default()
            .with_target(true)
            .with_ansi(false)
            .with_writer(non_blocking)
            .with_filter(filter_fn(move |metadata| {
                metadata.target() != PROGRESS_TARGET && metadata.level() <= &level
            }));

        let console_layer = fmt::Layer::default()
            .with_target(true)
            .with_filter(filter_fn(move |metadata| {
                metadata.target() != PROGRESS_TARGET && metadata.level() <= &level
            }));

        let progress = ProgressFeed::default();

        tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer)
            .with(ProgressLayer::new(progress.clone()))
            .with(tracing_error::ErrorLayer::default())
            .try_init()?;

        tracing::info!(
            target: LOG_MAIN,
            app = A::APP_ID,
            version = self.version,
            log = %log_file_path.display(),
            "logging initialized"
        );

        Ok(AppContext {
            path_context,
            version: self.version,
            progress,
            _log_guard: guard,
        })
    }
}

//! Path context for runtime environment detection and application paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory name used below the platform data directory.
const DATA_DIR_NAME: &str = "kiln";

/// File name of the bundled splash artwork.
pub const SPLASH_IMAGE_FILE: &str = "splashscreen.png";

/// Environment variable that overrides the bundled asset directory.
pub const ASSETS_DIR_ENV: &str = "KILN_ASSETS_DIR";

/// Identifies the runtime environment where the application is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running via `cargo run` or in development mode
    Development,
    /// Running as an installed binary in production
    Production,
}

/// Context for managing the application's data root and the files below it.
#[derive(Debug, Clone)]
pub struct PathContext {
    /// The runtime environment (development or production)
    environment: RuntimeEnvironment,
    /// Root directory for settings, logs and cached state
    base_path: Arc<Path>,
    /// Application identifier (e.g., "kiln")
    app_id: &'static str,
}

impl PathContext {
    /// Creates a new PathContext with automatic environment detection.
    pub fn new(app_id: &'static str) -> Self {
        let environment = Self::detect_environment();
        let base_path = Self::determine_base_path(environment);

        Self {
            environment,
            base_path: base_path.into(),
            app_id,
        }
    }

    /// Creates a PathContext with an explicit base path (useful for testing).
    pub fn with_base_path(base_path: PathBuf, app_id: &'static str) -> Self {
        Self {
            environment: Self::detect_environment(),
            base_path: base_path.into(),
            app_id,
        }
    }

    /// Detects the runtime environment based on executable location.
    fn detect_environment() -> RuntimeEnvironment {
        // If the executable is in a "target/debug" or "target/release" directory,
        // we're likely in development mode
        if let Ok(exe_path) = std::env::current_exe() {
            if exe_path.components().any(|c| c.as_os_str() == "target") {
                return RuntimeEnvironment::Development;
            }
        }

        if std::env::var("CARGO").is_ok() || std::env::var("CARGO_MANIFEST_DIR").is_ok() {
            return RuntimeEnvironment::Development;
        }

        RuntimeEnvironment::Production
    }

    /// Determines the base path based on the runtime environment.
    fn determine_base_path(environment: RuntimeEnvironment) -> PathBuf {
        match environment {
            RuntimeEnvironment::Development => std::env::current_dir()
                .map(|dir| dir.join(".out"))
                .unwrap_or_else(|_| PathBuf::from(".out")),
            RuntimeEnvironment::Production => default_install_dir(),
        }
    }

    pub fn environment(&self) -> RuntimeEnvironment {
        self.environment
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn app_id(&self) -> &str {
        self.app_id
    }

    /// Returns the settings file path: `<base>/<app_id>.settings.ron`
    pub fn settings_file(&self) -> PathBuf {
        self.base_path.join(format!("{}.settings.ron", self.app_id))
    }

    /// Returns the logs directory path: `<base>/logs/`
    pub fn logs_dir(&self) -> PathBuf {
        self.base_path.join("logs")
    }

    /// Returns a log file path with timestamp: `<base>/logs/<app_id>.<timestamp>.log`
    pub fn log_file(&self, timestamp: &str) -> PathBuf {
        self.logs_dir()
            .join(format!("{}.{}.log", self.app_id, timestamp))
    }

    /// Returns a log file path with current timestamp.
    pub fn log_file_now(&self) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        self.log_file(&timestamp)
    }

    /// Directory holding bundled read-only assets.
    ///
    /// Resolution order: `KILN_ASSETS_DIR`, then `assets/` next to the
    /// executable, then `assets/` in the working directory.
    pub fn assets_dir(&self) -> PathBuf {
        if let Ok(dir) = std::env::var(ASSETS_DIR_ENV) {
            let dir = PathBuf::from(dir.trim());
            if !dir.as_os_str().is_empty() {
                return dir;
            }
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join("assets")))
            .filter(|dir| dir.is_dir())
            .unwrap_or_else(|| PathBuf::from("assets"))
    }

    /// Returns the splash artwork path: `<assets>/splashscreen.png`
    pub fn splash_image(&self) -> PathBuf {
        self.assets_dir().join(SPLASH_IMAGE_FILE)
    }

    /// Ensures all necessary directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [self.base_path.to_path_buf(), self.logs_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
            }
        }

        Ok(())
    }
}

/// Default location of the user's installation data (models, documents,
/// caches). Used as the initial `base_path` of a freshly created record.
pub fn default_install_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

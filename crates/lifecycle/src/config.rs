use std::path::PathBuf;

/// Process-level switches, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Never run the first-run wizard, and don't touch the settings records
    /// to decide it.
    pub disable_setup_wizard: bool,
    /// Skip the splash overlay.
    pub no_splash: bool,
    /// When false every lifecycle transition is a no-op (non-interactive mode).
    pub initialize_gui: bool,
    /// Splash artwork; `None` shows the overlay without artwork.
    pub splash_image: Option<PathBuf>,
    /// First status line on the splash overlay.
    pub splash_title: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            disable_setup_wizard: false,
            no_splash: false,
            initialize_gui: true,
            splash_image: None,
            splash_title: "Loading".to_string(),
        }
    }
}

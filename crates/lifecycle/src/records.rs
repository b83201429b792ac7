use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use settings::Settings;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ApplicationSettings {
    /// Set until the first-run wizard has completed once.
    pub run_setup_wizard: bool,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            run_setup_wizard: true,
        }
    }
}

impl Settings for ApplicationSettings {
    const SECTION: &'static str = "application";
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PathSettings {
    /// Installation root for user data.
    pub base_path: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            base_path: paths::default_install_dir(),
        }
    }
}

impl Settings for PathSettings {
    const SECTION: &'static str = "paths";
}

use std::path::PathBuf;

use clap::Parser;
use lifecycle::LaunchConfig;
use lifecycle::toolkit::{DisplayInfo, Rect};
use lifecycle::window::WindowParams;
use paths::PathContext;

#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln desktop launcher")]
pub struct Cli {
    /// Skip the splash screen
    #[arg(long, env = "KILN_NO_SPLASH")]
    pub no_splash: bool,

    /// Never run the first-run setup wizard
    #[arg(long, env = "KILN_DISABLE_SETUP_WIZARD")]
    pub disable_setup_wizard: bool,

    /// Run without any GUI initialization
    #[arg(long, env = "KILN_HEADLESS")]
    pub headless: bool,

    /// Splash artwork (defaults to the bundled splashscreen.png)
    #[arg(long, value_name = "PATH")]
    pub splash_image: Option<PathBuf>,

    /// Data root for settings and logs
    #[arg(long, value_name = "PATH", env = "KILN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Simulated display size; repeat for several displays, the first is primary
    #[arg(long = "display", value_name = "WxH", value_parser = parse_display)]
    pub displays: Vec<(u32, u32)>,

    /// Main window construction parameter
    #[arg(long = "window-param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub window_params: Vec<(String, String)>,
}

impl Cli {
    pub fn launch_config(&self, paths: &PathContext, app_name: &str) -> LaunchConfig {
        LaunchConfig {
            disable_setup_wizard: self.disable_setup_wizard,
            no_splash: self.no_splash,
            initialize_gui: !self.headless,
            splash_image: Some(
                self.splash_image
                    .clone()
                    .unwrap_or_else(|| paths.splash_image()),
            ),
            splash_title: format!("Loading {app_name}"),
        }
    }

    pub fn display_list(&self) -> Vec<DisplayInfo> {
        let sizes = if self.displays.is_empty() {
            vec![(1920, 1080)]
        } else {
            self.displays.clone()
        };

        let mut x = 0;
        sizes
            .into_iter()
            .enumerate()
            .map(|(index, (width, height))| {
                let display = DisplayInfo {
                    name: format!("console-{index}"),
                    geometry: Rect {
                        x,
                        y: 0,
                        width,
                        height,
                    },
                };
                x = x.saturating_add(i32::try_from(width).unwrap_or(i32::MAX));
                display
            })
            .collect()
    }

    pub fn window_param_map(&self) -> WindowParams {
        self.window_params.iter().cloned().collect()
    }
}

fn parse_display(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got `{value}`"))?;
    let width = width.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = height.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if width == 0 || height == 0 {
        return Err("display size must be non-zero".into());
    }
    Ok((width, height))
}

fn parse_param(value: &str) -> Result<(String, String), String> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{value}`"))?;
    if key.is_empty() {
        return Err("parameter name must not be empty".into());
    }
    Ok((key.to_string(), val.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_launch_config() {
        let cli = Cli::try_parse_from([
            "kiln",
            "--no-splash",
            "--headless",
            "--splash-image",
            "/tmp/art.png",
        ])
        .unwrap();
        let paths = PathContext::with_base_path(PathBuf::from("/base"), "kiln");

        let config = cli.launch_config(&paths, "Kiln");

        assert!(config.no_splash);
        assert!(!config.initialize_gui);
        assert_eq!(config.splash_image, Some(PathBuf::from("/tmp/art.png")));
        assert_eq!(config.splash_title, "Loading Kiln");
    }

    #[test]
    fn displays_are_laid_out_left_to_right() {
        let cli =
            Cli::try_parse_from(["kiln", "--display", "1280x720", "--display", "800X600"]).unwrap();

        let displays = cli.display_list();

        assert_eq!(displays.len(), 2);
        assert_eq!(displays[0].name, "console-0");
        assert_eq!(displays[0].geometry.x, 0);
        assert_eq!(displays[1].geometry.x, 1280);
        assert_eq!(displays[1].geometry.width, 800);
    }

    #[test]
    fn default_display_when_none_given() {
        let cli = Cli::try_parse_from(["kiln"]).unwrap();
        let displays = cli.display_list();
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].geometry.width, 1920);
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(Cli::try_parse_from(["kiln", "--display", "wide"]).is_err());
        assert!(Cli::try_parse_from(["kiln", "--display", "0x10"]).is_err());
        assert!(Cli::try_parse_from(["kiln", "--window-param", "novalue"]).is_err());
    }

    #[test]
    fn window_params_collect_into_map() {
        let cli = Cli::try_parse_from([
            "kiln",
            "--window-param",
            "theme=dark",
            "--window-param",
            "profile=a=b",
        ])
        .unwrap();

        let params = cli.window_param_map();
        assert_eq!(params.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(params.get("profile").map(String::as_str), Some("a=b"));
    }
}

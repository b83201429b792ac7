mod cli;
mod console;
mod errors;
mod window;
mod wizard;

use std::sync::Arc;

use app::{AppBuilder, Application, LOG_MAIN};
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use lifecycle::LifecycleController;
use settings::SettingsStore;

use crate::cli::Cli;
use crate::console::ConsoleToolkit;
use crate::window::ConsoleWindowBuilder;
use crate::wizard::ConsoleWizard;

struct Kiln;

impl Application for Kiln {
    const APP_ID: &'static str = "kiln";
    const APP_NAME: &'static str = "Kiln";
}

fn main() -> Result<()> {
    errors::init()?;
    let cli = Cli::parse();

    let mut builder = AppBuilder::<Kiln>::new(env!("CARGO_PKG_VERSION"));
    if let Some(data_dir) = &cli.data_dir {
        builder = builder.with_base_path(data_dir);
    }
    let ctx = builder.build().map_err(|err| eyre!(err))?;

    let store = Arc::new(
        SettingsStore::builder()
            .with_settings_file(ctx.path_context().settings_file())
            .build()?,
    );

    let config = cli.launch_config(ctx.path_context(), Kiln::APP_NAME);
    let displays = cli.display_list();
    // the shared handle, not a private buffer: the main window reads stdin next
    let wizard = ConsoleWizard::new(store.clone(), std::io::stdin(), std::io::stdout());

    let mut controller = LifecycleController::builder(config, store)
        .with_toolkit_source(move || ConsoleToolkit::new(displays))
        .with_setup_wizard(wizard)
        .with_default_main_window(ConsoleWindowBuilder::new(Kiln::APP_NAME))
        .with_window_params(cli.window_param_map())
        .with_progress_feed(ctx.progress().clone())
        .build();

    let code = controller.launch()?;
    if !controller.config().initialize_gui {
        tracing::info!(target: LOG_MAIN, "GUI disabled, nothing to run");
    }
    tracing::info!(target: LOG_MAIN, code, "exiting");

    // flush the log writer before leaving
    drop(controller);
    drop(ctx);
    std::process::exit(code);
}

use color_eyre::Result;

/// Install the color-eyre report and panic hooks.
///
/// The panic hook only prints the report; it does not exit, so a panicking
/// main window is still caught by the controller.
pub fn init() -> Result<()> {
    color_eyre::config::HookBuilder::default()
        .panic_section(format!(
            "This is a bug. Consider reporting it at {}",
            lifecycle::DEFAULT_SUPPORT_CONTACT
        ))
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .install()
}

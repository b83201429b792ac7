use settings::{SettingsError, SettingsStore};

use crate::records::{ApplicationSettings, PathSettings};

/// Decides whether first-run setup has to happen before startup continues.
pub struct SettingsGate<'a> {
    store: &'a SettingsStore,
    setup_disabled: bool,
}

impl<'a> SettingsGate<'a> {
    pub fn new(store: &'a SettingsStore, setup_disabled: bool) -> Self {
        Self {
            store,
            setup_disabled,
        }
    }

    /// True if the base path is missing on disk or the wizard flag is still
    /// set. Missing records are created with defaults; storage errors are
    /// returned unchanged.
    pub fn should_run_setup(&self) -> Result<bool, SettingsError> {
        if self.setup_disabled {
            return Ok(false);
        }

        let path_settings = self.store.first_or_create::<PathSettings>()?;
        let application_settings = self.store.first_or_create::<ApplicationSettings>()?;

        let base_path_missing = !path_settings.base_path.exists();
        let required = base_path_missing || application_settings.run_setup_wizard;
        tracing::debug!(
            target: app::LOG_LIFECYCLE,
            base_path = %path_settings.base_path.display(),
            base_path_missing,
            run_setup_wizard = application_settings.run_setup_wizard,
            required,
            "setup gate evaluated"
        );
        Ok(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn store_in(dir: &Path) -> SettingsStore {
        SettingsStore::builder()
            .with_settings_file(dir.join("kiln.settings.ron"))
            .build()
            .expect("store")
    }

    fn seed(store: &SettingsStore, base_path: &Path, run_setup_wizard: bool) {
        store.create::<PathSettings>().unwrap();
        store
            .update::<PathSettings, _>(|p| p.base_path = base_path.to_path_buf())
            .unwrap();
        store.create::<ApplicationSettings>().unwrap();
        store
            .update::<ApplicationSettings, _>(|a| a.run_setup_wizard = run_setup_wizard)
            .unwrap();
    }

    #[test]
    fn fresh_store_creates_one_record_each() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let required = SettingsGate::new(&store, false).should_run_setup().unwrap();

        assert_eq!(
            store.sections(),
            vec!["application".to_string(), "paths".to_string()]
        );
        let defaults_path = PathSettings::default().base_path;
        let expected = !defaults_path.exists() || ApplicationSettings::default().run_setup_wizard;
        assert_eq!(required, expected);

        // a second evaluation must not create anything new
        SettingsGate::new(&store, false).should_run_setup().unwrap();
        assert_eq!(store.sections().len(), 2);
    }

    #[test]
    fn missing_base_path_requires_setup_even_when_flag_cleared() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        seed(&store, &tmp.path().join("does-not-exist"), false);

        assert!(SettingsGate::new(&store, false).should_run_setup().unwrap());
    }

    #[test]
    fn existing_base_path_and_cleared_flag_skip_setup() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        seed(&store, tmp.path(), false);

        assert!(!SettingsGate::new(&store, false).should_run_setup().unwrap());
    }

    #[test]
    fn wizard_flag_forces_setup() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        seed(&store, tmp.path(), true);

        assert!(SettingsGate::new(&store, false).should_run_setup().unwrap());
    }

    #[test]
    fn disabled_gate_never_touches_storage() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        assert!(!SettingsGate::new(&store, true).should_run_setup().unwrap());
        assert!(store.sections().is_empty());
        assert!(!store.file_path().exists());
    }

    #[test]
    fn storage_errors_propagate() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        // a directory where the settings file should be makes the write fail
        std::fs::create_dir_all(store.file_path()).unwrap();

        let err = SettingsGate::new(&store, false).should_run_setup().unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn failed_write_does_not_leave_records_in_memory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        std::fs::create_dir_all(store.file_path()).unwrap();

        assert!(SettingsGate::new(&store, false).should_run_setup().is_err());
        assert!(store.sections().is_empty());
        // still failing, not answered from an unsaved record
        assert!(SettingsGate::new(&store, false).should_run_setup().is_err());
    }
}

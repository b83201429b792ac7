//! Persisted singleton settings records.
//!
//! Every record type implements [`Settings`] and lives under its own section
//! in a single RON file. Stored values only hold the fields that differ from
//! the type's `Default`.

mod errors;
mod store;

pub use errors::SettingsError;
pub use store::{SettingsStore, SettingsStoreBuilder};

/// A singleton record stored in a [`SettingsStore`].
pub trait Settings: 'static + Send + Sync {
    /// Top-level key of the record in the settings file.
    const SECTION: &'static str;
}

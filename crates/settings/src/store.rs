use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::{Settings, SettingsError};

use ron::value::{Map as RonMap, Value as RonValue};
use serde::{Serialize, de::DeserializeOwned};

/// Convert any serializable struct to `ron::Value`.
fn to_ron_value<T: Serialize>(value: &T) -> Result<RonValue, SettingsError> {
    let s = ron::to_string(value)?;
    let v: RonValue = ron::from_str(&s)?;
    Ok(v)
}

/// Serialized `T::default()` as a map.
fn default_map<T>() -> Result<RonMap, SettingsError>
where
    T: Settings + Default + Serialize,
{
    match to_ron_value(&T::default())? {
        RonValue::Map(m) => Ok(m),
        _ => Err(SettingsError::Invalid("default must serialize to map")),
    }
}

/// Merge default + delta recursively (maps only).
fn merge_maps(default: &RonMap, delta: &RonMap) -> RonMap {
    let mut merged = default.clone();
    for (k, v_delta) in delta.iter() {
        if let Some(v_def) = merged.get(k) {
            match (v_def, v_delta) {
                (RonValue::Map(def_m), RonValue::Map(delta_m)) => {
                    let rec = merge_maps(def_m, delta_m);
                    merged.insert(k.clone(), RonValue::Map(rec));
                }
                _ => {
                    merged.insert(k.clone(), v_delta.clone());
                }
            }
        } else {
            merged.insert(k.clone(), v_delta.clone());
        }
    }
    merged
}

/// Compute recursive diff (new vs default). Returns None if identical.
fn diff_value(new_v: &RonValue, default_v: &RonValue) -> Option<RonValue> {
    match (new_v, default_v) {
        (RonValue::Map(new_m), RonValue::Map(def_m)) => {
            let diff_m = diff_map(new_m, def_m);
            if diff_m.is_empty() {
                None
            } else {
                Some(RonValue::Map(diff_m))
            }
        }
        _ => {
            if new_v == default_v {
                None
            } else {
                Some(new_v.clone())
            }
        }
    }
}

fn diff_map(new_m: &RonMap, def_m: &RonMap) -> RonMap {
    let mut out = RonMap::new();
    for (k, new_v) in new_m.iter() {
        match def_m.get(k) {
            Some(def_v) => {
                if let Some(d) = diff_value(new_v, def_v) {
                    out.insert(k.clone(), d);
                }
            }
            None => {
                out.insert(k.clone(), new_v.clone());
            }
        }
    }
    out
}

fn read_records(path: &Path) -> Result<HashMap<String, RonValue>, SettingsError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }

    Ok(ron::from_str(&content)?)
}

/// Builder for `SettingsStore` (single RON file).
pub struct SettingsStoreBuilder {
    settings_file: Option<PathBuf>,
}

impl SettingsStoreBuilder {
    pub fn new() -> Self {
        Self {
            settings_file: None,
        }
    }

    pub fn with_settings_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SettingsStore, SettingsError> {
        let file_path = self
            .settings_file
            .ok_or(SettingsError::Invalid("settings file not specified"))?;

        if let Some(dir) = file_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let records = read_records(&file_path)?;
        tracing::debug!(
            file = %file_path.display(),
            records = records.len(),
            "settings store opened"
        );

        Ok(SettingsStore {
            file_path,
            records: RwLock::new(records),
        })
    }
}

impl Default for SettingsStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings store (thread-safe).
///
/// - `first` / `create` / `first_or_create` give singleton record semantics
/// - `update` persists only the recursive delta against `Default`
/// - `reload` re-reads the file after external modification
pub struct SettingsStore {
    file_path: PathBuf,
    records: RwLock<HashMap<String, RonValue>>, // section -> delta value (usually Map)
}

impl SettingsStore {
    pub fn builder() -> SettingsStoreBuilder {
        SettingsStoreBuilder::new()
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }

    /// True if a record for `T` exists.
    pub fn contains<T: Settings>(&self) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(T::SECTION)
    }

    /// Names of all stored sections, sorted.
    pub fn sections(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// The stored record for `T`, or `None` if it was never created.
    pub fn first<T>(&self) -> Result<Option<T>, SettingsError>
    where
        T: Settings + Default + Serialize + DeserializeOwned,
    {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let Some(delta) = records.get(T::SECTION) else {
            return Ok(None);
        };

        let merged = match delta {
            RonValue::Map(delta_m) => RonValue::Map(merge_maps(&default_map::<T>()?, delta_m)),
            other => other.clone(), // unexpected but take it
        };
        Ok(Some(merged.into_rust::<T>()?))
    }

    /// Persist a new record holding `T::default()`. Existing records are
    /// never overwritten.
    pub fn create<T>(&self) -> Result<T, SettingsError>
    where
        T: Settings + Default + Serialize + DeserializeOwned,
    {
        {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            if records.contains_key(T::SECTION) {
                return Err(SettingsError::AlreadyExists(T::SECTION));
            }
            let mut next = records.clone();
            next.insert(T::SECTION.to_string(), RonValue::Map(RonMap::new()));
            self.persist(&next)?;
            *records = next;
        }

        tracing::info!(section = T::SECTION, "created settings record");
        Ok(T::default())
    }

    /// First existing record, or create one with defaults and re-read it.
    pub fn first_or_create<T>(&self) -> Result<T, SettingsError>
    where
        T: Settings + Default + Serialize + DeserializeOwned,
    {
        if let Some(record) = self.first::<T>()? {
            return Ok(record);
        }
        self.create::<T>()?;
        self.first::<T>()?.ok_or(SettingsError::NotFound(T::SECTION))
    }

    /// Update via mutable closure. Only delta (recursive) is persisted.
    pub fn update<T, F>(&self, mutator: F) -> Result<(), SettingsError>
    where
        T: Settings + Default + Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let mut record = self.first::<T>()?.ok_or(SettingsError::NotFound(T::SECTION))?;
        mutator(&mut record);

        let new_map = match to_ron_value(&record)? {
            RonValue::Map(m) => m,
            _ => return Err(SettingsError::Invalid("updated must serialize to map")),
        };
        let diff_root = diff_map(&new_map, &default_map::<T>()?);

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = records.clone();
        next.insert(T::SECTION.to_string(), RonValue::Map(diff_root));
        self.persist(&next)?;
        *records = next;
        Ok(())
    }

    /// Reload records from disk.
    pub fn reload(&self) -> Result<(), SettingsError> {
        let fresh = read_records(&self.file_path)?;
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(())
    }

    /// Write `records` to disk. Callers swap them into memory only after
    /// this succeeds.
    fn persist(&self, records: &HashMap<String, RonValue>) -> Result<(), SettingsError> {
        let pretty = ron::ser::PrettyConfig::default();
        let ron_string = ron::ser::to_string_pretty(records, pretty)?;

        let tmp = self.file_path.with_extension("tmp");
        fs::write(&tmp, ron_string)?;
        if let Err(err) = fs::rename(&tmp, &self.file_path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }
}

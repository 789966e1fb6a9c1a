//! Font registry access and the "already installed" check (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error};

use crate::discovery::FontFile;
use crate::error::RegistryError;

/// Registry key holding the system font table on Windows.
pub const FONTS_REGISTRY_PATH: &str = r"SOFTWARE\Microsoft\Windows NT\CurrentVersion\Fonts";

/// One `display name -> file name` pair from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub value: String,
}

/// Lazy, finite sequence of registry entries. Each call to
/// [`FontRegistry::entries`] starts a fresh scan.
pub type RegistryEntries<'a> = Box<dyn Iterator<Item = Result<RegistryEntry, RegistryError>> + 'a>;

/// Key/value store recording installed fonts by display name.
pub trait FontRegistry: Send + Sync {
    fn entries(&self) -> Result<RegistryEntries<'_>, RegistryError>;
    fn get(&self, name: &str) -> Result<Option<String>, RegistryError>;
    fn set(&self, name: &str, value: &str) -> Result<(), RegistryError>;
}

impl<T: FontRegistry + ?Sized> FontRegistry for Arc<T> {
    fn entries(&self) -> Result<RegistryEntries<'_>, RegistryError> {
        (**self).entries()
    }

    fn get(&self, name: &str) -> Result<Option<String>, RegistryError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str) -> Result<(), RegistryError> {
        (**self).set(name, value)
    }
}

/// View over the fonts directory plus registry that answers whether a font
/// is installed and records new installations.
#[derive(Clone, Copy)]
pub struct InstallationRegistry<'a> {
    fonts_dir: &'a Path,
    backend: &'a dyn FontRegistry,
}

impl<'a> InstallationRegistry<'a> {
    pub fn new(fonts_dir: &'a Path, backend: &'a dyn FontRegistry) -> Self {
        Self { fonts_dir, backend }
    }

    /// True when a same-named file sits in the fonts directory or any
    /// registry value names the file (case-insensitive).
    pub fn is_installed(&self, file: &FontFile) -> bool {
        if self.fonts_dir.join(&file.file_name).exists() {
            return true;
        }

        match self.is_registered(&file.file_name) {
            Ok(found) => found,
            Err(err) => {
                debug!(font = %file.file_name, error = %err, "registry lookup failed");
                false
            }
        }
    }

    fn is_registered(&self, file_name: &str) -> Result<bool, RegistryError> {
        let wanted = file_name.to_lowercase();
        let found = self
            .backend
            .entries()?
            .map_while(Result::ok)
            .any(|entry| entry.value.to_lowercase() == wanted);
        Ok(found)
    }

    /// Record `file` under `name`. Without `force`, an existing non-empty
    /// entry is left alone and `false` is returned.
    pub fn register(&self, file: &FontFile, name: &str, force: bool) -> bool {
        if !force {
            match self.backend.get(name) {
                Ok(Some(existing)) if !existing.is_empty() => {
                    debug!(name, "font already registered in registry");
                    return false;
                }
                Ok(_) => {}
                Err(err) => debug!(name, error = %err, "registry query failed"),
            }
        }

        match self.backend.set(name, &file.file_name) {
            Ok(()) => {
                debug!(name, "font registered in registry");
                true
            }
            Err(err) => {
                error!(font = %file.path.display(), error = %err, "registry installation failed");
                false
            }
        }
    }
}

/// Display name used as the registry key: the file stem plus a format tag
/// guessed from the extension.
pub fn derive_name(file: &FontFile) -> String {
    let stem = file.stem();
    match file.extension.as_str() {
        "ttf" | "otf" => format!("{stem} (TrueType)"),
        "ttc" => format!("{stem} (TrueType Collection)"),
        _ => stem,
    }
}

/// In-process registry.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FontRegistry for MemoryRegistry {
    fn entries(&self) -> Result<RegistryEntries<'_>, RegistryError> {
        let entries: Vec<_> = self
            .snapshot()
            .into_iter()
            .map(|(name, value)| Ok::<_, RegistryError>(RegistryEntry { name, value }))
            .collect();
        Ok(Box::new(entries.into_iter()))
    }

    fn get(&self, name: &str) -> Result<Option<String>, RegistryError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<(), RegistryError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Registry persisted as a JSON object (`{"Name (TrueType)": "Name.ttf"}`).
/// Used where the platform has no native font registry.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, RegistryError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

impl FontRegistry for JsonFileRegistry {
    fn entries(&self) -> Result<RegistryEntries<'_>, RegistryError> {
        let values = self.load()?;
        Ok(Box::new(
            values
                .into_iter()
                .map(|(name, value)| Ok::<_, RegistryError>(RegistryEntry { name, value })),
        ))
    }

    fn get(&self, name: &str) -> Result<Option<String>, RegistryError> {
        Ok(self.load()?.remove(name))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        values.insert(name.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

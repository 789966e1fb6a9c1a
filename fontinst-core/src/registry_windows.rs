//! Native Windows font registry backend (made by FontLab https://www.fontlab.com/)

use std::fmt;
use std::io;

use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_SET_VALUE};
use winreg::types::FromRegValue;
use winreg::RegKey;

use crate::error::RegistryError;
use crate::registry::{FontRegistry, RegistryEntries, RegistryEntry, FONTS_REGISTRY_PATH};

/// Registry handle that may cross threads.
struct SharedKey(RegKey);

// SAFETY: an HKEY is a kernel handle; the registry API is safe to call on it
// from any thread.
unsafe impl Send for SharedKey {}
unsafe impl Sync for SharedKey {}

/// The machine-wide font table under `HKEY_LOCAL_MACHINE`.
///
/// The read handle is opened once; writes open a separate handle per call so
/// a non-elevated process can still enumerate.
pub struct WindowsRegistry {
    subkey: String,
    read: SharedKey,
}

impl WindowsRegistry {
    pub fn open() -> Result<Self, RegistryError> {
        let read = open_fonts_key(FONTS_REGISTRY_PATH, KEY_READ)?;
        Ok(Self {
            subkey: FONTS_REGISTRY_PATH.to_string(),
            read: SharedKey(read),
        })
    }
}

fn open_fonts_key(subkey: &str, flags: u32) -> Result<RegKey, RegistryError> {
    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    Ok(hklm.open_subkey_with_flags(subkey, flags)?)
}

impl fmt::Debug for WindowsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowsRegistry")
            .field("subkey", &self.subkey)
            .finish()
    }
}

impl FontRegistry for WindowsRegistry {
    fn entries(&self) -> Result<RegistryEntries<'_>, RegistryError> {
        let values = self.read.0.enum_values().map(|item| {
            item.map(|(name, raw)| {
                let value = String::from_reg_value(&raw).unwrap_or_else(|_| raw.to_string());
                RegistryEntry { name, value }
            })
            .map_err(RegistryError::from)
        });
        Ok(Box::new(values))
    }

    fn get(&self, name: &str) -> Result<Option<String>, RegistryError> {
        match self.read.0.get_value::<String, _>(name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<(), RegistryError> {
        let key = open_fonts_key(&self.subkey, KEY_SET_VALUE)?;
        key.set_value(name, &value.to_string())?;
        Ok(())
    }
}

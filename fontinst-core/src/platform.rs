//! Platform services used by the install strategies (made by FontLab https://www.fontlab.com/)
//!
//! A [`FontStore`] bundles everything a strategy may touch: the fonts
//! directory, the font registry, the elevated shell copy service and the raw
//! font API. Only Windows provides the last two natively; elsewhere they
//! report [`PlatformError::Unavailable`] and the strategies using them decline.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::discovery::FontFile;
use crate::error::PlatformError;
use crate::registry::{FontRegistry, InstallationRegistry, JsonFileRegistry};

#[cfg(windows)]
#[path = "platform_windows.rs"]
mod native;

/// File name of the JSON registry kept next to the fonts on platforms without
/// a native font registry.
pub const REGISTRY_FILE_NAME: &str = "fontinst-registry.json";

/// Copy into the fonts folder through the OS shell, which elevates when needed.
pub trait ShellCopy: Send + Sync {
    fn copy_into_fonts(&self, source: &Path) -> Result<(), PlatformError>;
}

/// Direct access to the OS font table.
pub trait FontApi: Send + Sync {
    /// Load the font at `path`; returns the number of faces added.
    fn add_font_resource(&self, path: &Path) -> Result<u32, PlatformError>;
    /// Tell every top-level window that the font set changed.
    fn broadcast_font_change(&self) -> Result<(), PlatformError>;
}

impl<T: ShellCopy + ?Sized> ShellCopy for Arc<T> {
    fn copy_into_fonts(&self, source: &Path) -> Result<(), PlatformError> {
        (**self).copy_into_fonts(source)
    }
}

impl<T: FontApi + ?Sized> FontApi for Arc<T> {
    fn add_font_resource(&self, path: &Path) -> Result<u32, PlatformError> {
        (**self).add_font_resource(path)
    }

    fn broadcast_font_change(&self) -> Result<(), PlatformError> {
        (**self).broadcast_font_change()
    }
}

/// Stand-in for services the current platform lacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl ShellCopy for Unavailable {
    fn copy_into_fonts(&self, _source: &Path) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable("shell copy service"))
    }
}

impl FontApi for Unavailable {
    fn add_font_resource(&self, _path: &Path) -> Result<u32, PlatformError> {
        Err(PlatformError::Unavailable("font API"))
    }

    fn broadcast_font_change(&self) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable("font change broadcast"))
    }
}

/// Destination of installs plus the services that perform them.
pub struct FontStore {
    fonts_dir: PathBuf,
    registry: Box<dyn FontRegistry>,
    shell: Box<dyn ShellCopy>,
    font_api: Box<dyn FontApi>,
}

impl FontStore {
    /// Store backed by `fonts_dir` and `registry`, with no shell copy service
    /// and no raw font API.
    pub fn new(fonts_dir: impl Into<PathBuf>, registry: impl FontRegistry + 'static) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            registry: Box::new(registry),
            shell: Box::new(Unavailable),
            font_api: Box::new(Unavailable),
        }
    }

    /// The machine's own font store.
    #[cfg(windows)]
    pub fn system() -> Result<Self, PlatformError> {
        let store = Self::new(
            default_fonts_dir()?,
            crate::registry_windows::WindowsRegistry::open()?,
        )
        .with_shell(native::ShellFontsFolder)
        .with_font_api(native::GdiFontApi);
        Ok(store)
    }

    /// The per-user font store, with a JSON registry inside the fonts directory.
    #[cfg(not(windows))]
    pub fn system() -> Result<Self, PlatformError> {
        let fonts_dir = default_fonts_dir()?;
        let registry = JsonFileRegistry::new(fonts_dir.join(REGISTRY_FILE_NAME));
        Ok(Self::new(fonts_dir, registry))
    }

    /// Store rooted at `fonts_dir` using a JSON registry at `registry_path`.
    pub fn with_json_registry(fonts_dir: impl Into<PathBuf>, registry_path: impl Into<PathBuf>) -> Self {
        Self::new(fonts_dir, JsonFileRegistry::new(registry_path))
    }

    pub fn with_shell(mut self, shell: impl ShellCopy + 'static) -> Self {
        self.shell = Box::new(shell);
        self
    }

    pub fn with_font_api(mut self, font_api: impl FontApi + 'static) -> Self {
        self.font_api = Box::new(font_api);
        self
    }

    pub fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    pub fn registry(&self) -> &dyn FontRegistry {
        self.registry.as_ref()
    }

    pub fn shell(&self) -> &dyn ShellCopy {
        self.shell.as_ref()
    }

    pub fn font_api(&self) -> &dyn FontApi {
        self.font_api.as_ref()
    }

    /// Where `file` lands once installed.
    pub fn destination(&self, file: &FontFile) -> PathBuf {
        self.fonts_dir.join(&file.file_name)
    }

    pub fn installations(&self) -> InstallationRegistry<'_> {
        InstallationRegistry::new(&self.fonts_dir, self.registry.as_ref())
    }
}

impl std::fmt::Debug for FontStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontStore")
            .field("fonts_dir", &self.fonts_dir)
            .finish_non_exhaustive()
    }
}

/// Default fonts directory for the current platform.
pub fn default_fonts_dir() -> Result<PathBuf, PlatformError> {
    #[cfg(target_os = "windows")]
    {
        let windir = env::var_os("WINDIR")
            .or_else(|| env::var_os("SYSTEMROOT"))
            .ok_or(PlatformError::Unavailable("WINDIR"))?;
        Ok(PathBuf::from(windir).join("Fonts"))
    }

    #[cfg(target_os = "macos")]
    {
        let home = env::var_os("HOME").ok_or(PlatformError::Unavailable("HOME"))?;
        Ok(PathBuf::from(home).join("Library/Fonts"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let home = env::var_os("HOME").ok_or(PlatformError::Unavailable("HOME"))?;
        Ok(PathBuf::from(home).join(".local/share/fonts"))
    }
}

/// Whether the process runs with administrator rights. `None` where system
/// font installs do not need them.
pub fn is_elevated() -> Option<bool> {
    #[cfg(windows)]
    {
        Some(native::is_user_admin())
    }

    #[cfg(not(windows))]
    {
        None
    }
}

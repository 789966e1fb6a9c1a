//! Install strategies and the ordered chain that tries them (made by FontLab https://www.fontlab.com/)

use std::fs;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::discovery::FontFile;
use crate::error::PlatformError;
use crate::platform::FontStore;
use crate::registry::derive_name;

/// Failure message reported when every strategy declined or failed.
pub const ALL_STRATEGIES_FAILED: &str = "All installation methods failed";

/// Pause after a direct-file install before reporting success.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Result of a single strategy that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Installed,
    Declined(String),
}

impl Attempt {
    fn declined(reason: impl Into<String>) -> Self {
        Self::Declined(reason.into())
    }
}

/// One self-contained way of installing a font.
///
/// `Ok(Attempt::Declined(_))` and `Err(_)` both make the chain move on; the
/// difference is only in how loudly it is logged.
pub trait InstallStrategy {
    /// Short machine-friendly name, e.g. `direct-file`.
    fn label(&self) -> &'static str;
    /// Human wording used in success messages.
    fn description(&self) -> &'static str;
    fn attempt(&self, file: &FontFile, force: bool, store: &FontStore) -> Result<Attempt>;
}

/// Which strategy performed an install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyUsed {
    pub label: String,
    pub description: String,
}

impl StrategyUsed {
    pub fn message(&self) -> String {
        format!("Installed successfully using {}", self.description)
    }
}

fn blocked_by_existing(file: &FontFile, force: bool, store: &FontStore) -> bool {
    !force && store.destination(file).exists()
}

/// Copy via the OS shell service, which handles elevation on its own, then
/// record the font in the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCopyStrategy;

impl InstallStrategy for ShellCopyStrategy {
    fn label(&self) -> &'static str {
        "shell-copy"
    }

    fn description(&self) -> &'static str {
        "the shell copy service"
    }

    fn attempt(&self, file: &FontFile, force: bool, store: &FontStore) -> Result<Attempt> {
        if blocked_by_existing(file, force, store) {
            return Ok(Attempt::declined("destination already exists"));
        }

        match store.shell().copy_into_fonts(&file.path) {
            Ok(()) => {
                // A plain shell copy leaves the registry untouched.
                let name = derive_name(file);
                if !store.installations().register(file, &name, force) {
                    debug!(name, "shell copy kept the existing registry entry");
                }
                Ok(Attempt::Installed)
            }
            Err(PlatformError::Unavailable(what)) => {
                debug!("{what} not available, falling back to other methods");
                Ok(Attempt::declined(format!("{what} not available")))
            }
            Err(err) => Err(err).context("shell copy failed"),
        }
    }
}

/// Remove any stale copy, copy the file into the fonts directory and
/// register it. Returns `false` when the registry refused the entry.
fn copy_and_register(file: &FontFile, force: bool, store: &FontStore) -> Result<bool> {
    let destination = store.destination(file);

    if destination.exists() {
        fs::remove_file(&destination)
            .with_context(|| format!("failed to remove existing font {}", destination.display()))?;
        debug!(path = %destination.display(), "removed existing font file");
    }

    fs::copy(&file.path, &destination).with_context(|| {
        format!(
            "failed to copy {} to {}",
            file.path.display(),
            destination.display()
        )
    })?;

    let name = derive_name(file);
    Ok(store.installations().register(file, &name, force))
}

/// Direct file operations followed by a short settle delay.
#[derive(Debug, Clone, Copy)]
pub struct DirectFileStrategy {
    settle: Duration,
}

impl DirectFileStrategy {
    pub fn new() -> Self {
        Self {
            settle: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

impl Default for DirectFileStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallStrategy for DirectFileStrategy {
    fn label(&self) -> &'static str {
        "direct-file"
    }

    fn description(&self) -> &'static str {
        "direct file operations"
    }

    fn attempt(&self, file: &FontFile, force: bool, store: &FontStore) -> Result<Attempt> {
        if blocked_by_existing(file, force, store) {
            return Ok(Attempt::declined("destination already exists"));
        }

        if !copy_and_register(file, force, store)? {
            return Ok(Attempt::declined("registry entry already present"));
        }

        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        debug!(font = %file.file_name, "font installed successfully");
        Ok(Attempt::Installed)
    }
}

/// Same copy-and-register steps as [`DirectFileStrategy`], without the delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyRegisterStrategy;

impl InstallStrategy for CopyRegisterStrategy {
    fn label(&self) -> &'static str {
        "copy-register"
    }

    fn description(&self) -> &'static str {
        "copy method"
    }

    fn attempt(&self, file: &FontFile, force: bool, store: &FontStore) -> Result<Attempt> {
        if blocked_by_existing(file, force, store) {
            return Ok(Attempt::declined("destination already exists"));
        }

        if copy_and_register(file, force, store)? {
            Ok(Attempt::Installed)
        } else {
            Ok(Attempt::declined("registry entry already present"))
        }
    }
}

/// Last resort: load the font through the OS font API. Only tried when
/// overwriting, since it can raise a system dialog. This is the only
/// strategy that broadcasts a font-change notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontApiStrategy;

impl InstallStrategy for FontApiStrategy {
    fn label(&self) -> &'static str {
        "font-api"
    }

    fn description(&self) -> &'static str {
        "the system font API"
    }

    fn attempt(&self, file: &FontFile, force: bool, store: &FontStore) -> Result<Attempt> {
        if !force {
            return Ok(Attempt::declined("only used when overwriting"));
        }

        let api = store.font_api();
        let added = match api.add_font_resource(&file.path) {
            Ok(added) => added,
            Err(PlatformError::Unavailable(what)) => {
                debug!("{what} not available");
                return Ok(Attempt::declined(format!("{what} not available")));
            }
            Err(err) => return Err(err).context("font API installation failed"),
        };

        if added == 0 {
            return Ok(Attempt::declined("font API loaded no faces"));
        }

        if let Err(err) = api.broadcast_font_change() {
            warn!(error = %err, "font installed but change notification failed");
        }
        Ok(Attempt::Installed)
    }
}

/// Strategies in priority order; the first success wins.
pub struct StrategyChain {
    strategies: Vec<Box<dyn InstallStrategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn InstallStrategy>>) -> Self {
        Self { strategies }
    }

    /// Shell copy, direct file, copy-then-register, font API.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ShellCopyStrategy),
            Box::new(DirectFileStrategy::new()),
            Box::new(CopyRegisterStrategy),
            Box::new(FontApiStrategy),
        ])
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.label()).collect()
    }

    /// Try each strategy in order. `None` means all of them declined or failed.
    pub fn attempt(&self, file: &FontFile, force: bool, store: &FontStore) -> Option<StrategyUsed> {
        for strategy in &self.strategies {
            match strategy.attempt(file, force, store) {
                Ok(Attempt::Installed) => {
                    return Some(StrategyUsed {
                        label: strategy.label().to_string(),
                        description: strategy.description().to_string(),
                    });
                }
                Ok(Attempt::Declined(reason)) => {
                    debug!(
                        strategy = strategy.label(),
                        font = %file.file_name,
                        %reason,
                        "strategy declined"
                    );
                }
                Err(err) => {
                    let message = format!("{err:#}");
                    error!(
                        strategy = strategy.label(),
                        font = %file.path.display(),
                        error = %message,
                        "strategy failed"
                    );
                }
            }
        }
        None
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyChain")
            .field("strategies", &self.labels())
            .finish()
    }
}

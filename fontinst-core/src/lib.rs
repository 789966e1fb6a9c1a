//! fontinst-core: install every font found under a folder
//!
//! The engine behind the `fontinst` command. It walks a folder tree, decides
//! per font whether it is already installed, applies the overwrite policy and
//! hands new or replaced fonts to a chain of install strategies, falling back
//! from one to the next until one succeeds.
//!
//! ## Pieces
//!
//! - [`discovery`]: recursive walk collecting `.ttf`, `.otf`, `.ttc`, `.fon`
//!   and `.fnt` files, plus the folders that held them
//! - [`registry`]: the "already installed?" check and registry writes
//! - [`strategy`]: shell copy, direct file, copy-then-register and raw font
//!   API strategies, tried in that order
//! - [`engine`]: per-file policy decisions, including the overwrite prompt
//! - [`batch`]: the folder-level run and its [`BatchSummary`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use fontinst_core::{BatchRunner, DeclineAll, FontStore, Installer, OverwritePolicy};
//!
//! let runner = BatchRunner::new(Installer::new(FontStore::system()?));
//! let summary = runner.run(Path::new("downloads/fonts"), OverwritePolicy::Never, &DeclineAll)?;
//! println!("{} installed, {} skipped", summary.successful, summary.skipped);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Logging goes through `tracing`; install a subscriber to see it.
//!
//! Made by FontLab https://www.fontlab.com/

pub mod batch;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod output;
pub mod platform;
pub mod registry;
#[cfg(windows)]
mod registry_windows;
pub mod strategy;

pub use batch::{preview, BatchRunner, BatchSummary, FileReport, FileStatus};
pub use discovery::{FontDiscovery, FontFile, PathDiscovery};
pub use engine::{DeclineAll, InstallOutcome, Installer, OverwritePolicy, OverwritePrompt, SkipReason};
pub use error::{BatchError, PlatformError, RegistryError};
pub use platform::FontStore;
pub use registry::{derive_name, FontRegistry, JsonFileRegistry, MemoryRegistry};
#[cfg(windows)]
pub use registry_windows::WindowsRegistry;
pub use strategy::{InstallStrategy, StrategyChain, StrategyUsed};

//! Per-file install decisions (made by FontLab https://www.fontlab.com/)

use std::fmt;
use std::fs;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::discovery::FontFile;
use crate::platform::FontStore;
use crate::strategy::{StrategyChain, StrategyUsed, ALL_STRATEGIES_FAILED};

/// What to do with a font that is already installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    Always,
    Never,
    #[default]
    Prompt,
}

/// Why a font was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyInstalled,
    DeclinedByUser,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyInstalled => f.write_str("already installed"),
            SkipReason::DeclinedByUser => f.write_str("skipped by user"),
        }
    }
}

/// Result of installing one font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(StrategyUsed),
    Skipped(SkipReason),
    Failed(String),
}

impl InstallOutcome {
    pub fn message(&self) -> String {
        match self {
            InstallOutcome::Installed(used) => used.message(),
            InstallOutcome::Skipped(reason) => reason.to_string(),
            InstallOutcome::Failed(message) => message.clone(),
        }
    }
}

/// Asked, synchronously, whether an installed font should be replaced.
pub trait OverwritePrompt {
    fn confirm_overwrite(&self, file: &FontFile) -> bool;
}

impl<F> OverwritePrompt for F
where
    F: Fn(&FontFile) -> bool,
{
    fn confirm_overwrite(&self, file: &FontFile) -> bool {
        self(file)
    }
}

/// Prompt that always answers "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

impl OverwritePrompt for DeclineAll {
    fn confirm_overwrite(&self, _file: &FontFile) -> bool {
        false
    }
}

/// Installs single fonts into a [`FontStore`] through a [`StrategyChain`].
#[derive(Debug)]
pub struct Installer {
    store: FontStore,
    chain: StrategyChain,
}

impl Installer {
    pub fn new(store: FontStore) -> Self {
        Self::with_chain(store, StrategyChain::standard())
    }

    pub fn with_chain(store: FontStore, chain: StrategyChain) -> Self {
        Self { store, chain }
    }

    pub fn store(&self) -> &FontStore {
        &self.store
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    /// Install `file` under `policy`. Never panics or returns early with an
    /// error: every failure becomes [`InstallOutcome::Failed`].
    pub fn install(
        &self,
        file: &FontFile,
        policy: OverwritePolicy,
        prompt: &dyn OverwritePrompt,
    ) -> InstallOutcome {
        match fs::metadata(&file.path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return InstallOutcome::Failed(format!("not a file: {}", file.path.display())),
            Err(err) => return InstallOutcome::Failed(err.to_string()),
        }

        let mut force = policy == OverwritePolicy::Always;

        if self.store.installations().is_installed(file) {
            match policy {
                OverwritePolicy::Never => {
                    return InstallOutcome::Skipped(SkipReason::AlreadyInstalled);
                }
                OverwritePolicy::Prompt => {
                    if !prompt.confirm_overwrite(file) {
                        return InstallOutcome::Skipped(SkipReason::DeclinedByUser);
                    }
                    force = true;
                }
                OverwritePolicy::Always => {}
            }
            info!(font = %file.file_name, "overwriting existing font");
        }

        match self.chain.attempt(file, force, &self.store) {
            Some(used) => InstallOutcome::Installed(used),
            None => InstallOutcome::Failed(ALL_STRATEGIES_FAILED.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;
    use crate::strategy::{Attempt, InstallStrategy};
    use std::cell::Cell;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    struct Probe {
        called: Arc<AtomicBool>,
        forced: Arc<AtomicBool>,
    }

    impl InstallStrategy for Probe {
        fn label(&self) -> &'static str {
            "probe"
        }

        fn description(&self) -> &'static str {
            "probe"
        }

        fn attempt(
            &self,
            _file: &FontFile,
            force: bool,
            _store: &FontStore,
        ) -> anyhow::Result<Attempt> {
            self.called.store(true, Ordering::SeqCst);
            self.forced.store(force, Ordering::SeqCst);
            Ok(Attempt::Installed)
        }
    }

    struct Fixture {
        _tmp: TempDir,
        file: FontFile,
        installer: Installer,
        called: Arc<AtomicBool>,
        forced: Arc<AtomicBool>,
    }

    fn fixture(already_installed: bool) -> Fixture {
        let tmp = tempdir().expect("tempdir");
        let font = tmp.path().join("Inter.otf");
        std::fs::write(&font, b"font").expect("write");
        let fonts_dir = tmp.path().join("fonts");
        std::fs::create_dir_all(&fonts_dir).expect("mkdir");
        if already_installed {
            std::fs::write(fonts_dir.join("Inter.otf"), b"old").expect("seed");
        }

        let called = Arc::new(AtomicBool::new(false));
        let forced = Arc::new(AtomicBool::new(false));
        let chain = StrategyChain::new(vec![Box::new(Probe {
            called: Arc::clone(&called),
            forced: Arc::clone(&forced),
        })]);
        let installer = Installer::with_chain(FontStore::new(fonts_dir, MemoryRegistry::new()), chain);

        Fixture {
            file: FontFile::from_path(font).expect("font"),
            _tmp: tmp,
            installer,
            called,
            forced,
        }
    }

    #[test]
    fn never_skips_installed_font_without_trying() {
        let fx = fixture(true);
        let outcome = fx
            .installer
            .install(&fx.file, OverwritePolicy::Never, &DeclineAll);

        assert_eq!(outcome, InstallOutcome::Skipped(SkipReason::AlreadyInstalled));
        assert!(!fx.called.load(Ordering::SeqCst));
    }

    #[test]
    fn always_forces_strategies_for_installed_font() {
        let fx = fixture(true);
        let outcome = fx
            .installer
            .install(&fx.file, OverwritePolicy::Always, &DeclineAll);

        assert!(matches!(outcome, InstallOutcome::Installed(ref used) if used.label == "probe"));
        assert!(fx.forced.load(Ordering::SeqCst));
    }

    #[test]
    fn prompt_is_only_asked_for_installed_fonts() {
        let asked = Cell::new(0);
        let prompt = |_: &FontFile| {
            asked.set(asked.get() + 1);
            true
        };

        let fresh = fixture(false);
        fresh
            .installer
            .install(&fresh.file, OverwritePolicy::Prompt, &prompt);
        assert_eq!(asked.get(), 0);
        assert!(!fresh.forced.load(Ordering::SeqCst));

        let existing = fixture(true);
        let outcome = existing
            .installer
            .install(&existing.file, OverwritePolicy::Prompt, &prompt);
        assert_eq!(asked.get(), 1);
        assert!(matches!(outcome, InstallOutcome::Installed(_)));
        assert!(existing.forced.load(Ordering::SeqCst));
    }

    #[test]
    fn prompt_no_skips_without_trying() {
        let fx = fixture(true);
        let outcome = fx
            .installer
            .install(&fx.file, OverwritePolicy::Prompt, &DeclineAll);

        assert_eq!(outcome, InstallOutcome::Skipped(SkipReason::DeclinedByUser));
        assert_eq!(outcome.message(), "skipped by user");
        assert!(!fx.called.load(Ordering::SeqCst));
    }

    #[test]
    fn vanished_source_fails_with_io_message() {
        let fx = fixture(false);
        std::fs::remove_file(&fx.file.path).expect("remove");

        let outcome = fx
            .installer
            .install(&fx.file, OverwritePolicy::Always, &DeclineAll);

        assert!(matches!(outcome, InstallOutcome::Failed(_)));
        assert!(!fx.called.load(Ordering::SeqCst));
    }

    #[test]
    fn empty_chain_reports_all_failed() {
        let tmp = tempdir().expect("tempdir");
        let font = tmp.path().join("Inter.ttf");
        std::fs::write(&font, b"font").expect("write");
        let installer = Installer::with_chain(
            FontStore::new(tmp.path().join("fonts"), MemoryRegistry::new()),
            StrategyChain::new(Vec::new()),
        );

        let outcome = installer.install(
            &FontFile::from_path(font).expect("font"),
            OverwritePolicy::Never,
            &DeclineAll,
        );

        assert_eq!(outcome.message(), ALL_STRATEGIES_FAILED);
    }
}

//! Batch runs over a folder tree (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span};

use crate::discovery::{validate_root, Discovered, FontDiscovery, FontFile, PathDiscovery};
use crate::engine::{InstallOutcome, Installer, OverwritePolicy, OverwritePrompt};
use crate::error::BatchError;

/// Per-file status in a [`BatchSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Success,
    Skipped,
    Failed,
    WouldInstall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub dir: PathBuf,
    pub status: FileStatus,
    pub message: String,
}

/// Aggregated result of one batch run.
///
/// `processed == successful + failed + skipped` holds for every summary
/// built by [`BatchRunner`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub folders_processed: usize,
    pub details: Vec<FileReport>,
    #[serde(skip)]
    pub folders: BTreeSet<PathBuf>,
}

impl BatchSummary {
    fn for_folders(folders: BTreeSet<PathBuf>) -> Self {
        Self {
            folders_processed: folders.len(),
            folders,
            ..Self::default()
        }
    }

    fn push(&mut self, file: &FontFile, status: FileStatus, message: String) {
        self.processed += 1;
        match status {
            FileStatus::Success | FileStatus::WouldInstall => self.successful += 1,
            FileStatus::Skipped => self.skipped += 1,
            FileStatus::Failed => self.failed += 1,
        }
        self.details.push(FileReport {
            file: file.file_name.clone(),
            dir: file.dir().to_path_buf(),
            status,
            message,
        });
    }

    fn record(&mut self, file: &FontFile, outcome: &InstallOutcome) {
        let message = outcome.message();
        let status = match outcome {
            InstallOutcome::Installed(_) => {
                info!(font = %file.file_name, "successfully installed");
                FileStatus::Success
            }
            InstallOutcome::Skipped(_) => {
                info!(font = %file.file_name, reason = %message, "skipped");
                FileStatus::Skipped
            }
            InstallOutcome::Failed(_) => {
                error!(font = %file.file_name, error = %message, "failed to install");
                FileStatus::Failed
            }
        };
        self.push(file, status, message);
    }

    /// Whether the counters add up.
    pub fn is_consistent(&self) -> bool {
        self.processed == self.successful + self.failed + self.skipped
            && self.processed == self.details.len()
    }
}

/// Walks a folder and installs every font found with an [`Installer`].
#[derive(Debug)]
pub struct BatchRunner {
    installer: Installer,
    follow_symlinks: bool,
}

impl BatchRunner {
    pub fn new(installer: Installer) -> Self {
        Self {
            installer,
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    /// Install every font under `root`. Only an invalid root is an error;
    /// per-file problems end up in the summary.
    pub fn run(
        &self,
        root: &Path,
        policy: OverwritePolicy,
        prompt: &dyn OverwritePrompt,
    ) -> Result<BatchSummary, BatchError> {
        let span = info_span!("batch", root = %root.display(), mode = "install");
        let _guard = span.enter();

        let found = discover(root, self.follow_symlinks)?;
        if found.files.is_empty() {
            return Ok(BatchSummary::default());
        }
        info!(
            fonts = found.files.len(),
            folders = found.dirs.len(),
            "found font files to install"
        );

        let mut summary = BatchSummary::for_folders(found.dirs);
        for file in &found.files {
            info!(font = %file.file_name, "processing font");
            let outcome = self.installer.install(file, policy, prompt);
            summary.record(file, &outcome);
        }
        Ok(summary)
    }

    /// Report what [`run`](Self::run) would install without touching the
    /// font store.
    pub fn preview(&self, root: &Path) -> Result<BatchSummary, BatchError> {
        preview(root, self.follow_symlinks)
    }
}

/// Dry run: every discovered font is reported as `would_install`.
pub fn preview(root: &Path, follow_symlinks: bool) -> Result<BatchSummary, BatchError> {
    let span = info_span!("batch", root = %root.display(), mode = "preview");
    let _guard = span.enter();

    let found = discover(root, follow_symlinks)?;
    if found.files.is_empty() {
        return Ok(BatchSummary::default());
    }
    info!(
        fonts = found.files.len(),
        folders = found.dirs.len(),
        "found font files that would be installed"
    );

    let mut summary = BatchSummary::for_folders(found.dirs);
    for file in &found.files {
        info!(font = %file.file_name, "would install font");
        summary.push(file, FileStatus::WouldInstall, "would install".to_string());
    }
    Ok(summary)
}

fn discover(root: &Path, follow_symlinks: bool) -> Result<Discovered, BatchError> {
    if let Err(err) = validate_root(root) {
        error!(error = %err, "invalid folder");
        return Err(err);
    }
    let root = fs::canonicalize(root).map_err(|source| BatchError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let found = PathDiscovery::new(&root)
        .follow_symlinks(follow_symlinks)
        .discover()?;
    if found.files.is_empty() {
        info!(folder = %root.display(), "no font files found");
    }
    Ok(found)
}

//! Font discovery helpers for fontinst-core (made by FontLab https://www.fontlab.com/)

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::BatchError;

/// Extensions (lowercase, without the dot) treated as installable fonts.
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "fon", "fnt"];

/// A font file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFile {
    pub path: PathBuf,
    pub file_name: String,
    /// Lowercased extension without the leading dot.
    pub extension: String,
}

impl FontFile {
    /// Build a `FontFile` when `path` carries a supported font extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let extension = font_extension(&path)?;
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            path,
            file_name,
            extension,
        })
    }

    /// Directory holding the file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone())
    }
}

/// Result of walking a root: fonts in traversal order plus every directory
/// that held at least one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    pub files: Vec<FontFile>,
    pub dirs: BTreeSet<PathBuf>,
}

/// Trait for enumerating fonts from some backing store.
pub trait FontDiscovery {
    fn discover(&self) -> Result<Discovered, BatchError>;
}

/// Recursive filesystem walker that collects installable font formats.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    root: PathBuf,
    follow_symlinks: bool,
}

impl PathDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FontDiscovery for PathDiscovery {
    fn discover(&self) -> Result<Discovered, BatchError> {
        validate_root(&self.root)?;

        let mut found = Discovered::default();
        let mut visited: Vec<PathBuf> = Vec::new();
        let mut per_dir: BTreeMap<PathBuf, usize> = BTreeMap::new();

        // Files sort ahead of subdirectories, so each directory's fonts are
        // yielded together before the walk descends.
        let walker = WalkDir::new(&self.root)
            .follow_links(self.follow_symlinks)
            .sort_by(|a, b| {
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("failed to read root folder"));
                    return Err(BatchError::Io {
                        path: self.root.clone(),
                        source,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                visited.push(entry.path().to_path_buf());
                continue;
            }

            if !entry.file_type().is_file() && !links_to_file(&entry) {
                continue;
            }

            if let Some(font) = FontFile::from_path(entry.path()) {
                let dir = font.dir().to_path_buf();
                *per_dir.entry(dir.clone()).or_default() += 1;
                found.dirs.insert(dir);
                found.files.push(font);
            }
        }

        for dir in &visited {
            match per_dir.get(dir) {
                Some(count) => debug!(folder = %dir.display(), count, "found fonts"),
                None if dir != &self.root => {
                    debug!(folder = %dir.display(), "skipping folder (no fonts found)")
                }
                None => {}
            }
        }

        Ok(found)
    }
}

/// An unfollowed symlink that resolves to a regular file still counts as a
/// font. Symlinked directories are only entered under `follow_symlinks`.
fn links_to_file(entry: &walkdir::DirEntry) -> bool {
    entry.path_is_symlink()
        && fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false)
}

/// Check that `root` exists and is a directory.
pub fn validate_root(root: &Path) -> Result<(), BatchError> {
    if !root.exists() {
        return Err(BatchError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(BatchError::RootNotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Lowercased extension when `path` names a supported font format.
pub fn font_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    FONT_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn is_font(path: &Path) -> bool {
    font_extension(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn recognises_font_extensions() {
        assert!(is_font("/A/B/font.ttf".as_ref()));
        assert!(is_font("/A/B/font.OTF".as_ref()));
        assert!(is_font("/A/B/legacy.Fon".as_ref()));
        assert!(is_font("/A/B/bitmap.fnt".as_ref()));
        assert!(!is_font("/A/B/font.woff2".as_ref()));
        assert!(!is_font("/A/B/font.txt".as_ref()));
        assert!(!is_font("/A/B/font".as_ref()));
    }

    #[test]
    fn font_file_splits_name_and_extension() {
        let font = FontFile::from_path("/fonts/sub/Inter-Bold.TTF").expect("font");
        assert_eq!(font.file_name, "Inter-Bold.TTF");
        assert_eq!(font.extension, "ttf");
        assert_eq!(font.stem(), "Inter-Bold");
        assert_eq!(font.dir(), Path::new("/fonts/sub"));
    }

    #[test]
    fn discovers_nested_fonts() {
        let tmp = tempdir().expect("tempdir");
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).expect("mkdir");
        let font_path = nested.join("sample.ttf");
        fs::write(&font_path, b"").expect("touch font");

        let discovery = PathDiscovery::new(tmp.path());
        let found = discovery.discover().expect("discover");

        assert!(found.files.iter().any(|f| f.path == font_path));
        assert_eq!(found.dirs.len(), 1);
        assert!(found.dirs.contains(&nested));
    }

    #[test]
    fn yields_directory_files_before_subdirectories() {
        let tmp = tempdir().expect("tempdir");
        let root = tmp.path();
        fs::create_dir_all(root.join("a")).expect("mkdir");
        fs::write(root.join("z.ttf"), b"").expect("touch");
        fs::write(root.join("a/b.otf"), b"").expect("touch");
        fs::write(root.join("a/a.otf"), b"").expect("touch");

        let found = PathDiscovery::new(root).discover().expect("discover");
        let names: Vec<&str> = found.files.iter().map(|f| f.file_name.as_str()).collect();

        assert_eq!(names, vec!["z.ttf", "a.otf", "b.otf"]);
    }

    #[test]
    fn file_root_is_rejected() {
        let tmp = tempdir().expect("tempdir");
        let file = tmp.path().join("single.ttf");
        fs::write(&file, b"").expect("touch");

        let err = PathDiscovery::new(&file).discover().unwrap_err();
        assert!(matches!(err, BatchError::RootNotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinks_when_enabled() {
        use std::os::unix::fs::symlink;

        let tmp = tempdir().expect("tempdir");
        let real_dir = tmp.path().join("real");
        let link_dir = tmp.path().join("link");
        fs::create_dir_all(&real_dir).expect("mkdir real");
        let font_path = real_dir.join("linked.otf");
        fs::write(&font_path, b"").expect("touch font");
        symlink(&real_dir, &link_dir).expect("symlink");

        let found = PathDiscovery::new(&link_dir)
            .follow_symlinks(true)
            .discover()
            .expect("discover");

        assert!(found.files.iter().any(|f| f.path.ends_with("linked.otf")));
    }

    #[cfg(unix)]
    #[test]
    fn keeps_symlinked_font_files_without_entering_linked_dirs() {
        use std::os::unix::fs::symlink;

        let tmp = tempdir().expect("tempdir");
        let root = tmp.path().join("root");
        let store = tmp.path().join("store");
        fs::create_dir_all(&root).expect("mkdir root");
        fs::create_dir_all(&store).expect("mkdir store");
        fs::write(root.join("Plain.ttf"), b"").expect("touch");
        fs::write(store.join("Real.ttf"), b"").expect("touch");
        symlink(store.join("Real.ttf"), root.join("Linked.ttf")).expect("file symlink");
        symlink(&store, root.join("shelf")).expect("dir symlink");

        let found = PathDiscovery::new(&root).discover().expect("discover");
        let names: Vec<&str> = found.files.iter().map(|f| f.file_name.as_str()).collect();

        assert_eq!(names, vec!["Linked.ttf", "Plain.ttf"]);
        assert_eq!(found.files[0].path, root.join("Linked.ttf"));
        assert_eq!(found.dirs.len(), 1);
    }
}

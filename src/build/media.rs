//! Media copying.
//!
//! The output media folder is replaced wholesale on every build: whatever
//! was there is deleted, then the source media folder is copied in. The
//! source folder must exist.

use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

#[derive(thiserror::Error, Debug)]
pub enum MediaError {
    #[error("media folder not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk media folder: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Replace `dest` with a copy of `source`. Returns the number of files copied.
///
/// A missing `source` is an error, raised after `dest` has been removed.
pub fn replace_media(source: &Path, dest: &Path) -> Result<usize, MediaError> {
    remove_existing(dest)?;

    if !source.is_dir() {
        return Err(MediaError::SourceNotFound(source.to_path_buf()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| copy_error(entry.path(), &target, e))?;
        } else {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| copy_error(entry.path(), &target, e))?;
            copied += 1;
        }
    }

    info!(files = copied, dest = %dest.display(), "copied media");
    Ok(copied)
}

fn remove_existing(path: &Path) -> Result<(), MediaError> {
    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return Ok(());
    };

    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.map_err(|source| MediaError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_error(from: &Path, to: &Path, source: std::io::Error) -> MediaError {
    MediaError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_copies_nested_media() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in");
        let dest = dir.path().join("out");
        write(&source, "logo.png", "png");
        write(&source, "css/site.css", "body {}");

        let copied = replace_media(&source, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(std::fs::read_to_string(dest.join("css/site.css")).unwrap(), "body {}");
        assert!(dest.join("logo.png").is_file());
    }

    #[test]
    fn test_stale_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in");
        let dest = dir.path().join("out");
        write(&source, "new.txt", "new");
        write(&dest, "stale.txt", "old");
        write(&dest, "old/deep.txt", "old");

        replace_media(&source, &dest).unwrap();

        assert!(dest.join("new.txt").is_file());
        assert!(!dest.join("stale.txt").exists());
        assert!(!dest.join("old").exists());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        write(&dest, "stale.txt", "old");

        let result = replace_media(&dir.path().join("missing"), &dest);

        assert!(matches!(result, Err(MediaError::SourceNotFound(path)) if path.ends_with("missing")));
        assert!(!dest.exists());
    }
}

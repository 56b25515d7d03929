//! Discovers post source files. See [`discover`].

use std::fmt;
use std::fs::{self, read_dir};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file found in the posts directory. Entries only live long enough
/// to be parsed into [`crate::post::Post`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEntry {
    /// The full path to the file.
    pub path: PathBuf,

    /// The file name, lossily converted to UTF-8.
    pub name: String,

    /// The last modification time of the file.
    pub modified: SystemTime,
}

/// Lists `dir` and returns its regular files ordered by modification time,
/// most recent first. Anything that isn't a regular file (subdirectories,
/// pipes, sockets) is skipped, and subdirectories are not recursed into. Files
/// sharing a modification time are ordered by name so that the result is the
/// same from one run to the next.
pub fn discover(dir: &Path) -> Result<Vec<SourceEntry>> {
    let annotate = |err: io::Error| Error {
        path: dir.to_owned(),
        err,
    };

    let mut entries = Vec::new();
    for result in read_dir(dir).map_err(annotate)? {
        let entry = result.map_err(annotate)?;
        // Follows symlinks, so a link to a post file is kept.
        let metadata = fs::metadata(entry.path()).map_err(|err| Error {
            path: entry.path(),
            err,
        })?;
        if !metadata.is_file() {
            continue;
        }
        entries.push(SourceEntry {
            path: entry.path(),
            name: entry.file_name().to_string_lossy().into_owned(),
            modified: metadata.modified().map_err(|err| Error {
                path: entry.path(),
                err,
            })?,
        });
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returned when the posts directory (or one of its entries) can't be read.
#[derive(Debug)]
pub struct Error {
    pub path: PathBuf,
    pub err: io::Error,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "listing '{}': {}", self.path.display(), self.err)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    fn touch(dir: &Path, name: &str, secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
        path
    }

    #[test]
    fn test_discover_orders_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "old.md", 1_000);
        touch(dir.path(), "new.md", 3_000);
        touch(dir.path(), "mid.md", 2_000);

        let names: Vec<String> = discover(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["new.md", "mid.md", "old.md"]);
    }

    #[test]
    fn test_discover_is_non_increasing() {
        let dir = tempfile::tempdir().unwrap();
        for (i, secs) in [5u64, 1, 9, 9, 3, 7, 1].iter().enumerate() {
            touch(dir.path(), &format!("{}.md", i), *secs);
        }

        let entries = discover(dir.path()).unwrap();
        assert_eq!(entries.len(), 7);
        for pair in entries.windows(2) {
            assert!(pair[0].modified >= pair[1].modified);
        }
    }

    #[test]
    fn test_discover_breaks_ties_by_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.md", 100);
        touch(dir.path(), "a.md", 100);
        touch(dir.path(), "c.md", 100);

        let names: Vec<String> = discover(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "c.md"]);
    }

    #[test]
    fn test_discover_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "post.md", 100);
        fs::create_dir(dir.path().join("drafts")).unwrap();

        let entries = discover(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "post.md");
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_links_to_files_only() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let target = touch(elsewhere.path(), "linked.md", 200);
        touch(dir.path(), "post.md", 100);
        symlink(&target, dir.path().join("linked.md")).unwrap();
        symlink(elsewhere.path(), dir.path().join("linked-dir")).unwrap();

        let names: Vec<String> = discover(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["linked.md", "post.md"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = discover(&missing).unwrap_err();
        assert_eq!(err.path, missing);
        assert_eq!(err.err.kind(), io::ErrorKind::NotFound);
    }
}

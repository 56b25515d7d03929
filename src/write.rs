//! Writes rendered pages to the output directory. See [`Writer`].

use crate::context::RenderContext;
use crate::render::{self, Renderer};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The file that always holds a copy of the most recent post's page.
pub const INDEX_FILE: &str = "index.html";

/// The one file cleanup leaves alone.
pub const FAVICON_FILE: &str = "favicon.ico";

/// Responsible for clearing the output directory and writing pages into it.
pub struct Writer<'a> {
    /// The directory into which pages are written. Post pages are written to
    /// `{output_directory}/{slug}` and the index page to
    /// `{output_directory}/index.html`.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// Removes every file in the output directory except [`FAVICON_FILE`].
    /// Subdirectories are kept. The directory is created if it doesn't exist.
    ///
    /// Failing to remove a file doesn't stop the cleanup: each failure is
    /// logged and returned, and the remaining files are still removed. Only
    /// failing to create or list the directory is an error.
    pub fn clean(&self) -> Result<Vec<CleanupError>> {
        self.clean_with(|path| fs::remove_file(path))
    }

    fn clean_with<F>(&self, mut remove: F) -> Result<Vec<CleanupError>>
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        let dir = self.output_directory;
        let annotate = |err: io::Error| Error::Io {
            path: dir.to_owned(),
            err,
        };
        fs::create_dir_all(dir).map_err(annotate)?;

        let mut failures = Vec::new();
        for result in fs::read_dir(dir).map_err(annotate)? {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(path = %dir.display(), error = %err, "failed to list stale output");
                    failures.push(CleanupError {
                        path: dir.to_owned(),
                        err,
                    });
                    continue;
                }
            };
            let path = entry.path();
            match entry.file_type() {
                Ok(file_type) if file_type.is_dir() => continue,
                Ok(_) if entry.file_name() == FAVICON_FILE => continue,
                Ok(_) => match remove(&path) {
                    Ok(()) => debug!(path = %path.display(), "removed stale output"),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "failed to remove stale output");
                        failures.push(CleanupError { path, err });
                    }
                },
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to inspect stale output");
                    failures.push(CleanupError { path, err });
                }
            }
        }
        Ok(failures)
    }

    /// Renders the page for `ctx.current` and writes it to
    /// `{output_directory}/{slug}`. If the post is the most recent one (i.e.,
    /// `ctx.index == 0`) the same bytes are written to [`INDEX_FILE`] as well,
    /// through a single [`FanOut`] so the two files can't differ. Returns the
    /// path of the post page.
    pub fn write_page(&self, renderer: &dyn Renderer, ctx: &RenderContext) -> Result<PathBuf> {
        let post = ctx.current.ok_or(Error::NoPost)?;
        let path = self.output_directory.join(&post.slug);
        let page = create(&path)?;
        let render = |w: &mut dyn Write| {
            renderer
                .render(renderer.page_name(), ctx, w)
                .map_err(|err| Error::Render {
                    slug: post.slug.clone(),
                    err,
                })
        };

        if ctx.is_index() {
            let index_path = self.output_directory.join(INDEX_FILE);
            let mut sink = FanOut(page, create(&index_path)?);
            render(&mut sink)?;
            sink.flush().map_err(|err| Error::Io {
                path: path.clone(),
                err,
            })?;
            debug!(slug = %post.slug, "wrote page and index");
        } else {
            let mut sink = page;
            render(&mut sink)?;
            sink.flush().map_err(|err| Error::Io {
                path: path.clone(),
                err,
            })?;
            debug!(slug = %post.slug, "wrote page");
        }
        Ok(path)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })
}

/// A sink that writes everything it receives to both of its writers.
pub struct FanOut<A, B>(pub A, pub B);

impl<A: Write, B: Write> Write for FanOut<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write_all(buf)?;
        self.1.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()?;
        self.1.flush()
    }
}

/// A stale output entry that couldn't be inspected or removed. Cleanup
/// failures are reported but never abort a build.
#[derive(Debug)]
pub struct CleanupError {
    pub path: PathBuf,
    pub err: io::Error,
}

impl fmt::Display for CleanupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "cleaning '{}': {}", self.path.display(), self.err)
    }
}

impl std::error::Error for CleanupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.err)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error creating, listing or writing an output path.
    Io { path: PathBuf, err: io::Error },

    /// An error while rendering the page for the post with this slug.
    Render { slug: String, err: render::Error },

    /// Returned when asked to write a page for a context without a post.
    NoPost,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "writing '{}': {}", path.display(), err),
            Error::Render { slug, err } => write!(f, "rendering `{}`: {}", slug, err),
            Error::NoPost => write!(f, "no post to write a page for"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { err, .. } => Some(err),
            Error::Render { err, .. } => Some(err),
            Error::NoPost => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Site;
    use crate::post::test::post;
    use crate::post::Post;

    const SITE: Site<'static> = Site {
        name: "Test",
        base_url: "https://example.com/",
    };

    /// Writes the slug and position in several small pieces.
    struct Pieces;

    impl Renderer for Pieces {
        fn page_name(&self) -> &str {
            "pieces"
        }

        fn render(&self, page: &str, ctx: &RenderContext, w: &mut dyn Write) -> render::Result<()> {
            let slug = ctx.current.map(|p| p.slug.as_str()).unwrap_or_default();
            for piece in &[page, ":", slug, ":"] {
                w.write_all(piece.as_bytes()).unwrap();
            }
            write!(w, "{}", ctx.index).unwrap();
            Ok(())
        }
    }

    struct Failing;

    impl Renderer for Failing {
        fn page_name(&self) -> &str {
            "failing"
        }

        fn render(&self, page: &str, _: &RenderContext, _: &mut dyn Write) -> render::Result<()> {
            Err(render::Error::UnknownPage(page.to_owned()))
        }
    }

    fn batch() -> Vec<Post> {
        vec![post("c.html", 3), post("b.html", 2), post("a.html", 1)]
    }

    #[test]
    fn test_write_page_duplicates_index() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer {
            output_directory: dir.path(),
        };
        let all = batch();

        let path = writer
            .write_page(&Pieces, &RenderContext::page(SITE, &all, 0, 2))
            .unwrap();
        assert_eq!(path, dir.path().join("c.html"));

        let page = fs::read(dir.path().join("c.html")).unwrap();
        let index = fs::read(dir.path().join(INDEX_FILE)).unwrap();
        assert_eq!(page, b"pieces:c.html:0".to_vec());
        assert_eq!(page, index);
    }

    #[test]
    fn test_write_page_only_index_for_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer {
            output_directory: dir.path(),
        };
        let all = batch();

        writer
            .write_page(&Pieces, &RenderContext::page(SITE, &all, 1, 2))
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("b.html")).unwrap(),
            "pieces:b.html:1"
        );
        assert!(!dir.path().join(INDEX_FILE).exists());
    }

    #[test]
    fn test_write_page_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer {
            output_directory: dir.path(),
        };
        let all = batch();

        match writer.write_page(&Failing, &RenderContext::page(SITE, &all, 2, 2)) {
            Err(Error::Render { slug, .. }) => assert_eq!(slug, "a.html"),
            other => panic!("expected a render error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_page_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let writer = Writer {
            output_directory: &missing,
        };
        let all = batch();

        match writer.write_page(&Pieces, &RenderContext::page(SITE, &all, 1, 2)) {
            Err(Error::Io { path, .. }) => assert_eq!(path, missing.join("b.html")),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_page_rejects_feed_context() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer {
            output_directory: dir.path(),
        };
        let all = batch();

        match writer.write_page(&Pieces, &RenderContext::feed(SITE, &all, 2)) {
            Err(Error::NoPost) => {}
            other => panic!("expected no post, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_keeps_directories_and_favicon() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.html"), "old").unwrap();
        fs::write(dir.path().join(INDEX_FILE), "old index").unwrap();
        fs::write(dir.path().join("rss"), "old feed").unwrap();
        fs::write(dir.path().join(FAVICON_FILE), "icon").unwrap();
        fs::create_dir(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static").join("style.css"), "css").unwrap();

        let writer = Writer {
            output_directory: dir.path(),
        };
        let failures = writer.clean().unwrap();
        assert!(failures.is_empty());

        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(remaining, vec![FAVICON_FILE, "static"]);
        assert!(dir.path().join("static").join("style.css").exists());
    }

    #[test]
    fn test_clean_continues_past_failed_removal() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["a.html", "b.html", "c.html", "rss"] {
            fs::write(dir.path().join(name), "stale").unwrap();
        }
        let stuck = dir.path().join("b.html");

        let writer = Writer {
            output_directory: dir.path(),
        };
        let failures = writer
            .clean_with(|path| match path == stuck.as_path() {
                true => Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked")),
                false => fs::remove_file(path),
            })
            .unwrap();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, stuck);
        assert_eq!(failures[0].err.kind(), io::ErrorKind::PermissionDenied);

        let remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining, vec!["b.html"]);
    }

    #[test]
    fn test_clean_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("public");
        let writer = Writer {
            output_directory: &output,
        };
        assert!(writer.clean().unwrap().is_empty());
        assert!(output.is_dir());
    }

    #[test]
    fn test_fan_out() {
        let mut sink = FanOut(Vec::new(), Vec::new());
        sink.write_all(b"hello, ").unwrap();
        write!(sink, "{}", "world").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.0, b"hello, world".to_vec());
        assert_eq!(sink.0, sink.1);
    }
}

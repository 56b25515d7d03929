//! Resolves and compiles the template backend for a run. See [`resolve`].
//!
//! Two backends are supported. If `post.tera` exists in the templates
//! directory it is compiled with [`tera`]. Otherwise every `*.html` file in
//! the templates directory is compiled with [`gtmpl`]; those files must define
//! a `post` template (`{{define "post"}}...{{end}}`). Either way the rest of
//! the pipeline only sees a [`Renderer`].

use crate::context::RenderContext;
use gtmpl::{Context, Template};
use gtmpl_value::Value;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The markup template whose presence selects the [`tera`] backend. Its file
/// name is also the page name it is registered and invoked under.
pub const MARKUP_TEMPLATE: &str = "post.tera";

/// The template the native backend invokes for every page.
pub const NATIVE_PAGE: &str = "post";

const NATIVE_EXTENSION: &str = "html";

/// A compiled template backend.
pub trait Renderer {
    /// The name of the page template to pass to [`Renderer::render`].
    fn page_name(&self) -> &str;

    /// Renders the page template `page` against `ctx` into `w`.
    fn render(&self, page: &str, ctx: &RenderContext, w: &mut dyn Write) -> Result<()>;
}

/// Picks and compiles the backend for `templates_directory`. This is done
/// once per run; the result is passed to every page write.
pub fn resolve(templates_directory: &Path) -> Result<Box<dyn Renderer>> {
    let markup = templates_directory.join(MARKUP_TEMPLATE);
    if markup.is_file() {
        debug!(path = %markup.display(), "compiling markup template");
        Ok(Box::new(MarkupRenderer::compile(&markup)?))
    } else {
        debug!(dir = %templates_directory.display(), "compiling native templates");
        Ok(Box::new(NativeRenderer::compile(templates_directory)?))
    }
}

/// Renders pages with a single [`tera`] template.
pub struct MarkupRenderer {
    tera: tera::Tera,
}

impl MarkupRenderer {
    /// Compiles the template at `path`, registering it under its file name.
    pub fn compile(path: &Path) -> Result<Self> {
        let mut tera = tera::Tera::default();
        tera.add_template_file(path, Some(MARKUP_TEMPLATE))
            .map_err(|err| Error::Markup {
                path: path.to_owned(),
                err,
            })?;
        Ok(MarkupRenderer { tera })
    }
}

impl Renderer for MarkupRenderer {
    fn page_name(&self) -> &str {
        MARKUP_TEMPLATE
    }

    fn render(&self, page: &str, ctx: &RenderContext, w: &mut dyn Write) -> Result<()> {
        let context = tera::Context::from_serialize(ctx).map_err(Error::MarkupExecute)?;
        self.tera
            .render_to(page, &context, w)
            .map_err(Error::MarkupExecute)
    }
}

/// Renders pages with [`gtmpl`] templates loaded from a directory.
pub struct NativeRenderer {
    template: Template,
}

impl NativeRenderer {
    /// Loads every `*.html` file directly under `dir` (in file name order),
    /// concatenates their trimmed contents and parses the result into a
    /// template whose body invokes [`NATIVE_PAGE`].
    pub fn compile(dir: &Path) -> Result<Self> {
        let annotate = |err: io::Error| Error::Io {
            path: dir.to_owned(),
            err,
        };

        let mut template_files = Vec::new();
        for result in fs::read_dir(dir).map_err(annotate)? {
            let path = result.map_err(annotate)?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == NATIVE_EXTENSION) {
                template_files.push(path);
            }
        }
        if template_files.is_empty() {
            return Err(Error::NoTemplates(dir.to_owned()));
        }
        template_files.sort();

        // Only `define` blocks matter in these files; whitespace around them
        // would otherwise leak into every page.
        let mut contents = String::new();
        for template_file in &template_files {
            let mut file_contents = String::new();
            File::open(template_file)
                .and_then(|mut file| file.read_to_string(&mut file_contents))
                .map_err(|err| Error::Io {
                    path: template_file.clone(),
                    err,
                })?;
            contents.push_str(file_contents.trim());
        }
        contents.push_str(&format!("{{{{template \"{}\" .}}}}", NATIVE_PAGE));

        let mut template = Template::default();
        template.parse(&contents).map_err(|err| Error::Native {
            path: dir.to_owned(),
            message: err.to_string(),
        })?;
        Ok(NativeRenderer { template })
    }
}

impl Renderer for NativeRenderer {
    fn page_name(&self) -> &str {
        NATIVE_PAGE
    }

    fn render(&self, page: &str, ctx: &RenderContext, w: &mut dyn Write) -> Result<()> {
        if page != NATIVE_PAGE {
            return Err(Error::UnknownPage(page.to_owned()));
        }
        let context = Context::from(Value::from(ctx))
            .map_err(|err| Error::NativeExecute(err.to_string()))?;
        self.template
            .execute(&mut &mut *w, &context)
            .map_err(|err| Error::NativeExecute(err.to_string()))
    }
}

/// The result of compiling or executing templates.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem compiling or executing templates.
#[derive(Debug)]
pub enum Error {
    /// Returned when a template file or directory can't be read.
    Io { path: PathBuf, err: io::Error },

    /// Returned when the templates directory has no `*.html` files and no
    /// markup template.
    NoTemplates(PathBuf),

    /// Returned when the markup template doesn't compile.
    Markup { path: PathBuf, err: tera::Error },

    /// Returned when the native templates don't parse.
    Native { path: PathBuf, message: String },

    /// Returned when a page is requested that the backend doesn't provide.
    UnknownPage(String),

    /// Returned when executing the markup template fails.
    MarkupExecute(tera::Error),

    /// Returned when executing the native templates fails.
    NativeExecute(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => write!(f, "reading '{}': {}", path.display(), err),
            Error::NoTemplates(dir) => write!(
                f,
                "no `{}` or `*.{}` templates in '{}'",
                MARKUP_TEMPLATE,
                NATIVE_EXTENSION,
                dir.display()
            ),
            Error::Markup { path, err } => {
                write!(f, "compiling '{}': {}", path.display(), chain(err))
            }
            Error::Native { path, message } => {
                write!(f, "compiling templates in '{}': {}", path.display(), message)
            }
            Error::UnknownPage(page) => write!(f, "no page template named `{}`", page),
            Error::MarkupExecute(err) => chain(err).fmt(f),
            Error::NativeExecute(message) => message.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { err, .. } => Some(err),
            Error::Markup { err, .. } => Some(err),
            Error::MarkupExecute(err) => Some(err),
            Error::NoTemplates(_)
            | Error::Native { .. }
            | Error::UnknownPage(_)
            | Error::NativeExecute(_) => None,
        }
    }
}

// Tera's top-level messages are terse ("Failed to render 'post.tera'"); the
// useful part is further down the source chain.
fn chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Site;
    use crate::post::test::post;

    const SITE: Site<'static> = Site {
        name: "Test Site",
        base_url: "https://example.com/",
    };

    fn render_to_string(renderer: &dyn Renderer, ctx: &RenderContext) -> String {
        let mut out = Vec::new();
        renderer
            .render(renderer.page_name(), ctx, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_resolve_prefers_markup_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MARKUP_TEMPLATE),
            "{{ site_name }}: {{ post.title }} ({{ index }}/{{ all | length }})",
        )
        .unwrap();
        fs::write(dir.path().join("post.html"), "{{define \"post\"}}native{{end}}").unwrap();

        let renderer = resolve(dir.path()).unwrap();
        assert_eq!(renderer.page_name(), MARKUP_TEMPLATE);

        let all = vec![post("a.html", 2), post("b.html", 1)];
        let ctx = RenderContext::page(SITE, &all, 1, 1);
        assert_eq!(
            render_to_string(renderer.as_ref(), &ctx),
            "Test Site: Title of b.html (1/2)"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_native_templates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.html"),
            "{{define \"header\"}}<h1>{{.site_name}}</h1>{{end}}",
        )
        .unwrap();
        fs::write(
            dir.path().join("post.html"),
            "{{define \"post\"}}{{template \"header\" .}}<h2>{{.post.title}}</h2>{{range .recent}}[{{.slug}}]{{end}}{{end}}",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "{{ not a template").unwrap();

        let renderer = resolve(dir.path()).unwrap();
        assert_eq!(renderer.page_name(), NATIVE_PAGE);

        let all = vec![post("a.html", 2), post("b.html", 1)];
        let ctx = RenderContext::page(SITE, &all, 0, 2);
        assert_eq!(
            render_to_string(renderer.as_ref(), &ctx),
            "<h1>Test Site</h1><h2>Title of a.html</h2>[a.html][b.html]"
        );
    }

    #[test]
    fn test_native_unknown_page() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("post.html"), "{{define \"post\"}}x{{end}}").unwrap();
        let renderer = resolve(dir.path()).unwrap();

        let all = vec![post("a.html", 1)];
        let ctx = RenderContext::page(SITE, &all, 0, 1);
        match renderer.render("index", &ctx, &mut Vec::<u8>::new()) {
            Err(Error::UnknownPage(page)) => assert_eq!(page, "index"),
            other => panic!("expected an unknown page, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_resolve_without_templates() {
        let dir = tempfile::tempdir().unwrap();
        match resolve(dir.path()) {
            Err(Error::NoTemplates(path)) => assert_eq!(path, dir.path()),
            other => panic!("expected no templates, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_resolve_bad_markup_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MARKUP_TEMPLATE), "{% if %}").unwrap();
        match resolve(dir.path()) {
            Err(Error::Markup { .. }) => {}
            other => panic!("expected a markup error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_resolve_bad_native_template() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("post.html"), "{{define \"post\"}}{{if}}").unwrap();
        match resolve(dir.path()) {
            Err(Error::Native { .. }) => {}
            other => panic!("expected a native template error, got {:?}", other.err()),
        }
    }
}

//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: discovering and parsing the posts
//! ([`crate::source`], [`crate::post`]), compiling the templates
//! ([`crate::render`]), cleaning the output directory and rendering the post
//! pages ([`crate::write`]), and generating the RSS feed ([`crate::feed`]).

use crate::config::SiteConfig;
use crate::context::{RenderContext, Site};
use crate::feed::{self, Error as FeedError, FeedConfig};
use crate::post::{Error as ParseError, Parser as PostParser};
use crate::render::{self, Error as RenderError};
use crate::source::{self, Error as DiscoveryError};
use crate::write::{CleanupError, Error as WriteError, Writer};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// What a successful build produced.
#[derive(Debug)]
pub struct Report {
    /// The page written for each post, most recent first.
    pub pages: Vec<PathBuf>,

    /// The index page, if there were any posts.
    pub index: Option<PathBuf>,

    /// The feed file.
    pub feed: PathBuf,

    /// Stale output files that couldn't be removed.
    pub cleanup_errors: Vec<CleanupError>,
}

/// Builds the site from a [`SiteConfig`]. The steps run strictly in order and
/// the first failure aborts the build, with one exception: stale files that
/// can't be removed from the output directory are only reported (see
/// [`Writer::clean`]).
///
/// 1. Discover the post files, most recent first.
/// 2. Parse all of them. A malformed post stops the build before the output
///    directory is touched.
/// 3. Compile the templates.
/// 4. Clean the output directory.
/// 5. Write each post page, most recent first, duplicating the first one as
///    `index.html`.
/// 6. Write the feed for the recent posts.
pub fn build_site(config: &SiteConfig) -> Result<Report> {
    let entries = source::discover(&config.posts_directory)?;
    info!(count = entries.len(), dir = %config.posts_directory.display(), "discovered posts");

    let parser = PostParser::new(config.author.as_deref());
    let posts = parser
        .parse_all(&entries)
        .map_err(|(path, err)| Error::MalformedPost { path, err })?;

    let renderer = render::resolve(&config.templates_directory).map_err(Error::TemplateCompile)?;
    info!(page = renderer.page_name(), "compiled templates");

    let writer = Writer {
        output_directory: &config.output_directory,
    };
    let cleanup_errors = writer.clean()?;
    info!(
        dir = %config.output_directory.display(),
        failures = cleanup_errors.len(),
        "cleaned output directory"
    );

    let site = Site {
        name: &config.site_name,
        base_url: &config.base_url,
    };
    let mut pages = Vec::with_capacity(posts.len());
    for index in 0..posts.len() {
        let ctx = RenderContext::page(site, &posts, index, config.recent_posts);
        pages.push(writer.write_page(renderer.as_ref(), &ctx)?);
    }
    info!(count = pages.len(), "wrote pages");

    let feed = feed::write_feed(
        &FeedConfig {
            title: &config.site_name,
            base_url: &config.base_url,
            description: &config.description,
        },
        &RenderContext::feed(site, &posts, config.recent_posts),
        &config.output_directory,
    )?;
    info!(path = %feed.display(), "wrote feed");

    Ok(Report {
        index: match pages.is_empty() {
            true => None,
            false => Some(config.output_directory.join(crate::write::INDEX_FILE)),
        },
        pages,
        feed,
        cleanup_errors,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Each variant names the stage that
/// failed.
#[derive(Debug)]
pub enum Error {
    /// Returned when the posts directory can't be listed.
    Discovery(DiscoveryError),

    /// Returned when a post can't be read or is missing a required field.
    MalformedPost { path: PathBuf, err: ParseError },

    /// Returned when the templates can't be compiled.
    TemplateCompile(RenderError),

    /// Returned when an output page can't be rendered or written, or the
    /// output directory can't be listed.
    Write(WriteError),

    /// Returned for errors building or writing the feed.
    Feed(FeedError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Discovery(err) => write!(f, "Discovering posts: {}", err),
            Error::MalformedPost { path, err } => {
                write!(f, "Parsing post '{}': {}", path.display(), err)
            }
            Error::TemplateCompile(err) => write!(f, "Compiling templates: {}", err),
            Error::Write(err) => write!(f, "Writing output: {}", err),
            Error::Feed(err) => write!(f, "Writing feed: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Discovery(err) => Some(err),
            Error::MalformedPost { err, .. } => Some(err),
            Error::TemplateCompile(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Feed(err) => Some(err),
        }
    }
}

impl From<DiscoveryError> for Error {
    /// Converts [`DiscoveryError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: DiscoveryError) -> Error {
        Error::Discovery(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

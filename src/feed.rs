//! Support for creating the RSS feed from the recent posts.

use crate::context::RenderContext;
use rss::{ChannelBuilder, ItemBuilder};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// The name of the feed file in the output directory.
pub const FEED_FILE: &str = "rss";

/// Bundled channel-level configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub base_url: &'a str,
    pub description: &'a str,
}

/// One entry in the feed. `reserved` is always empty today; it holds a place
/// in the item shape but isn't serialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: String,
    pub reserved: String,
}

/// Accumulates [`FeedItem`]s and writes them out as an RSS channel.
pub struct Feed {
    title: String,
    link: String,
    description: String,
    items: Vec<FeedItem>,
}

impl Feed {
    pub fn new(title: &str, link: &str, description: &str) -> Feed {
        Feed {
            title: title.to_owned(),
            link: link.to_owned(),
            description: description.to_owned(),
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, title: &str, link: &str, description: &str, author: &str, reserved: &str) {
        self.items.push(FeedItem {
            title: title.to_owned(),
            link: link.to_owned(),
            description: description.to_owned(),
            author: author.to_owned(),
            reserved: reserved.to_owned(),
        });
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    /// Serializes the channel into `w`.
    pub fn write_to<W: Write>(&self, w: W) -> Result<W> {
        let items: Vec<rss::Item> = self
            .items
            .iter()
            .map(|item| {
                ItemBuilder::default()
                    .title(item.title.clone())
                    .link(item.link.clone())
                    .description(item.description.clone())
                    .author(item.author.clone())
                    .build()
            })
            .collect();

        let channel = ChannelBuilder::default()
            .title(self.title.clone())
            .link(self.link.clone())
            .description(self.description.clone())
            .generator("lectern".to_owned())
            .items(items)
            .build();
        Ok(channel.write_to(w)?)
    }

    /// Serializes the channel into the file at `path`, replacing it.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let annotate = |err: io::Error| Error::Io {
            path: path.to_owned(),
            err,
        };
        let file = File::create(path).map_err(annotate)?;
        self.write_to(BufWriter::new(file))?
            .flush()
            .map_err(annotate)
    }
}

/// Builds the feed for the summaries in a feed-mode context. Each item links
/// to the summary's slug resolved against `config.base_url`.
pub fn feed(config: &FeedConfig, ctx: &RenderContext) -> Result<Feed> {
    let base = Url::parse(config.base_url).map_err(|err| Error::BaseUrl {
        url: config.base_url.to_owned(),
        err,
    })?;

    let mut feed = Feed::new(config.title, config.base_url, config.description);
    for summary in &ctx.recent {
        let link = base.join(summary.slug()).map_err(|err| Error::Slug {
            slug: summary.slug().to_owned(),
            err,
        })?;
        feed.add_item(
            summary.title(),
            link.as_str(),
            summary.description(),
            summary.author(),
            "",
        );
    }
    Ok(feed)
}

/// Builds the feed and writes it to `{output_directory}/rss`, returning the
/// path of the feed file.
pub fn write_feed(config: &FeedConfig, ctx: &RenderContext, output_directory: &Path) -> Result<PathBuf> {
    let feed = feed(config, ctx)?;
    let path = output_directory.join(FEED_FILE);
    feed.write_to_file(&path)?;
    debug!(items = feed.items().len(), path = %path.display(), "wrote feed");
    Ok(path)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when the site's base URL doesn't parse.
    BaseUrl { url: String, err: url::ParseError },

    /// Returned when a slug can't be resolved against the base URL.
    Slug { slug: String, err: url::ParseError },

    /// Returned when serializing the channel fails.
    Rss(rss::Error),

    /// Returned when the feed file can't be written.
    Io { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::BaseUrl { url, err } => write!(f, "invalid base URL `{}`: {}", url, err),
            Error::Slug { slug, err } => {
                write!(f, "resolving slug `{}` against the base URL: {}", slug, err)
            }
            Error::Rss(err) => err.fmt(f),
            Error::Io { path, err } => write!(f, "writing '{}': {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::BaseUrl { err, .. } => Some(err),
            Error::Slug { err, .. } => Some(err),
            Error::Rss(err) => Some(err),
            Error::Io { err, .. } => Some(err),
        }
    }
}

impl From<rss::Error> for Error {
    /// Converts [`rss::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator when serializing the channel.
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}

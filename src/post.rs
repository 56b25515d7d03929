//! Defines the [`Post`], [`Summary`], [`Parser`], and [`Error`] types. Also
//! defines the logic for parsing a post from a [`SourceEntry`] into memory.
//! See [`crate::value`] for how posts are converted into template values.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;

use crate::feed::FEED_FILE;
use crate::markdown;
use crate::source::SourceEntry;
use crate::write::{FAVICON_FILE, INDEX_FILE};

/// The format of the `Date` frontmatter field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const HTML_EXTENSION: &str = ".html";

/// Output file names that belong to the site rather than to any one post.
const RESERVED_SLUGS: &[&str] = &[INDEX_FILE, FEED_FILE, FAVICON_FILE];

/// A fully parsed post, including its rendered body.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The title of the post.
    pub title: String,

    /// The output file name of the post, which doubles as its URL relative
    /// to the site's base URL (e.g., `hello-world.html`).
    pub slug: String,

    /// A short description used in listings and in the feed.
    pub description: String,

    /// The author of the post.
    pub author: String,

    /// When the post was published.
    pub publish_time: DateTime<Utc>,

    /// The post body, rendered to HTML.
    pub body: String,

    /// The modification time of the source file.
    pub modified: SystemTime,
}

impl Post {
    /// Returns the listing view of the post.
    pub fn summary(&self) -> Summary<'_> {
        Summary(self)
    }

    /// Returns the publish date formatted as [`DATE_FORMAT`].
    pub fn date(&self) -> String {
        self.publish_time.format(DATE_FORMAT).to_string()
    }
}

/// A read-only listing view of a [`Post`]. It borrows the post so the two
/// can never disagree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary<'a>(&'a Post);

impl<'a> Summary<'a> {
    pub fn title(&self) -> &'a str {
        &self.0.title
    }

    pub fn slug(&self) -> &'a str {
        &self.0.slug
    }

    pub fn description(&self) -> &'a str {
        &self.0.description
    }

    pub fn author(&self) -> &'a str {
        &self.0.author
    }

    pub fn publish_time(&self) -> DateTime<Utc> {
        self.0.publish_time
    }

    pub fn date(&self) -> String {
        self.0.date()
    }

    /// Returns the post this summary projects.
    pub fn post(&self) -> &'a Post {
        self.0
    }
}

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// The author to fall back on when a post doesn't name one.
    default_author: Option<&'a str>,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(default_author: Option<&'a str>) -> Parser<'a> {
        Parser { default_author }
    }

    /// Reads and parses the post at `entry`.
    pub fn parse(&self, entry: &SourceEntry) -> Result<Post> {
        let input = fs::read_to_string(&entry.path)?;
        self.parse_str(&entry.name, entry.modified, &input)
    }

    /// Parses all of `entries`, preserving their order. Stops at the first
    /// malformed post, including a post whose slug was already taken by an
    /// earlier one.
    pub fn parse_all(
        &self,
        entries: &[SourceEntry],
    ) -> std::result::Result<Vec<Post>, (PathBuf, Error)> {
        let mut posts = Vec::with_capacity(entries.len());
        let mut owners: HashMap<String, &Path> = HashMap::new();
        for entry in entries {
            let post = self
                .parse(entry)
                .map_err(|err| (entry.path.clone(), err))?;
            if let Some(owner) = owners.insert(post.slug.clone(), &entry.path) {
                return Err((
                    entry.path.clone(),
                    Error::DuplicateSlug {
                        slug: post.slug,
                        owner: owner.to_owned(),
                    },
                ));
            }
            posts.push(post);
        }
        Ok(posts)
    }

    /// Parses a single [`Post`] from the source file's name, its modification
    /// time and its contents. Each post must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with the field `Title` and optionally
    ///    `Description`, `Author`, `Date` and `Slug`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body (markdown)
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Description: The first post.
    /// Date: 2021-04-16
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// Missing optional fields are derived: the slug from the file name, the
    /// description from the text above the `<!-- more -->` fold, the author
    /// from the parser's default and the date from `modified`.
    pub fn parse_str(&self, file_name: &str, modified: SystemTime, input: &str) -> Result<Post> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            match input[FENCE.len()..].find(FENCE) {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                        // yaml_start
                    FENCE.len() + offset,               // yaml_stop
                    FENCE.len() + offset + FENCE.len(), // body_start
                )),
            }
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;
        let markdown = &input[body_start..];

        let slug = match frontmatter.slug {
            Some(slug) => slug.trim().to_owned(),
            None => {
                let stem = Path::new(file_name)
                    .file_stem()
                    .map(|stem| slug::slugify(stem.to_string_lossy()))
                    .unwrap_or_default();
                match stem.is_empty() {
                    true => String::new(),
                    false => format!("{}{}", stem, HTML_EXTENSION),
                }
            }
        };
        if slug.is_empty() {
            return Err(Error::MissingField("Slug"));
        }
        validate_slug(&slug)?;

        let description = frontmatter
            .description
            .or_else(|| markdown::text_above_fold(markdown))
            .ok_or(Error::MissingField("Description"))?;

        let author = frontmatter
            .author
            .or_else(|| self.default_author.map(str::to_owned))
            .ok_or(Error::MissingField("Author"))?;

        let publish_time = match frontmatter.date {
            Some(date) => {
                let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)?;
                match date.and_hms_opt(0, 0, 0) {
                    Some(naive) => Utc.from_utc_datetime(&naive),
                    None => return Err(Error::MissingField("Date")),
                }
            }
            None => DateTime::<Utc>::from(modified),
        };

        let mut body = String::new();
        markdown::to_html(&mut body, markdown);

        Ok(Post {
            title: frontmatter.title,
            slug,
            description,
            author,
            publish_time,
            body,
            modified,
        })
    }
}

/// A slug names a file directly inside the output directory, so it must be a
/// single plain path component that doesn't shadow a site-wide file.
fn validate_slug(slug: &str) -> Result<()> {
    let mut components = Path::new(slug).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || RESERVED_SLUGS.contains(&slug) {
        return Err(Error::InvalidSlug(slug.to_owned()));
    }
    Ok(())
}

#[derive(Deserialize)]
struct Frontmatter {
    /// The title of the post.
    #[serde(rename = "Title")]
    title: String,

    #[serde(default, rename = "Description")]
    description: Option<String>,

    #[serde(default, rename = "Author")]
    author: Option<String>,

    /// The publish date of the post, formatted as [`DATE_FORMAT`].
    #[serde(default, rename = "Date")]
    date: Option<String>,

    #[serde(default, rename = "Slug")]
    slug: Option<String>,
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML,
    /// including a missing `Title`.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a required field is absent and can't be derived.
    MissingField(&'static str),

    /// Returned when the `Date` field isn't formatted as [`DATE_FORMAT`].
    InvalidDate(chrono::ParseError),

    /// Returned when a slug isn't a plain file name, or when it is one of the
    /// site-wide output files (`index.html`, `rss`, `favicon.ico`).
    InvalidSlug(String),

    /// Returned when a post's slug was already taken by the post at `owner`.
    DuplicateSlug { slug: String, owner: PathBuf },

    /// Returned when the source file can't be read.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::MissingField(field) => {
                write!(f, "`{}` is missing and can't be derived", field)
            }
            Error::InvalidDate(err) => write!(f, "invalid `Date`: {}", err),
            Error::InvalidSlug(slug) => {
                write!(f, "`{}` can't be used as a slug", slug)
            }
            Error::DuplicateSlug { slug, owner } => {
                write!(f, "slug `{}` is already used by '{}'", slug, owner.display())
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::MissingField(_) => None,
            Error::InvalidDate(err) => Some(err),
            Error::InvalidSlug(_) => None,
            Error::DuplicateSlug { .. } => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Error {
        Error::InvalidDate(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

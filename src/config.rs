//! Loads the site configuration from a `lectern.yaml` project file.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "lectern.yaml";

#[derive(Deserialize)]
struct RecentPosts(usize);
impl Default for RecentPosts {
    fn default() -> Self {
        RecentPosts(10)
    }
}

#[derive(Deserialize)]
struct Project {
    site_name: String,
    base_url: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    author: Option<String>,

    #[serde(default)]
    recent_posts: RecentPosts,

    #[serde(default = "default_posts")]
    posts: PathBuf,

    #[serde(default = "default_templates")]
    templates: PathBuf,

    #[serde(default = "default_output")]
    output: PathBuf,
}

fn default_posts() -> PathBuf {
    PathBuf::from("posts")
}

fn default_templates() -> PathBuf {
    PathBuf::from("templates")
}

fn default_output() -> PathBuf {
    PathBuf::from("public")
}

/// Everything a build needs to know about the site. Relative directories in
/// the project file are resolved against the project file's directory.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    pub site_name: String,
    pub description: String,

    /// The URL post slugs are resolved against, e.g. `https://example.com/blog/`.
    /// It's validated when the feed is built.
    pub base_url: String,

    /// The author of posts that don't name one.
    pub author: Option<String>,

    /// The number of most recent posts listed on every page and in the feed.
    pub recent_posts: usize,

    pub posts_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub output_directory: PathBuf,
}

impl SiteConfig {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its ancestors,
    /// loading the first one found.
    pub fn from_directory(dir: &Path) -> Result<SiteConfig> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            SiteConfig::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => SiteConfig::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(path: &Path) -> Result<SiteConfig> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)
            .with_context(|| format!("Loading configuration from `{}`", path.display()))?;
        let root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;

        Ok(SiteConfig {
            site_name: project.site_name,
            description: project.description,
            base_url: project.base_url,
            author: project.author,
            recent_posts: project.recent_posts.0,
            posts_directory: root.join(project.posts),
            templates_directory: root.join(project.templates),
            output_directory: root.join(project.output),
        })
    }
}

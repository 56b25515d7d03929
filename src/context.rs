//! Assembles the data handed to the renderer for each output page, and to the
//! feed writer. See [`RenderContext`].

use crate::post::{Post, Summary};

/// Site-wide values every template can see.
#[derive(Clone, Copy, Debug)]
pub struct Site<'a> {
    pub name: &'a str,
    pub base_url: &'a str,
}

/// The bundle of data for one rendered page (or for the feed). A context
/// borrows the ordered post batch and is never modified once built.
#[derive(Clone, Debug)]
pub struct RenderContext<'a> {
    pub site: Site<'a>,

    /// The post being rendered. Empty for the feed.
    pub current: Option<&'a Post>,

    /// The position of `current` in the batch, 0 being the most recent.
    pub index: usize,

    /// Summaries of the most recent posts, at most `window` of them.
    pub recent: Vec<Summary<'a>>,

    /// The whole batch, most recent first. Empty for the feed.
    pub all: &'a [Post],
}

impl<'a> RenderContext<'a> {
    /// Builds the context for the page of `all[index]`.
    ///
    /// Panics if `index` is out of bounds; callers iterate over `all`.
    pub fn page(site: Site<'a>, all: &'a [Post], index: usize, window: usize) -> Self {
        RenderContext {
            site,
            current: Some(&all[index]),
            index,
            recent: recent(all, window),
            all,
        }
    }

    /// Builds the summary-only context that drives feed generation.
    pub fn feed(site: Site<'a>, all: &'a [Post], window: usize) -> Self {
        RenderContext {
            site,
            current: None,
            index: 0,
            recent: recent(all, window),
            all: &[],
        }
    }

    /// Whether this page is also the site index.
    pub fn is_index(&self) -> bool {
        self.current.is_some() && self.index == 0
    }

    /// The next more recent post, if any.
    pub fn prev(&self) -> Option<&'a Post> {
        self.current?;
        match self.index {
            0 => None,
            i => self.all.get(i - 1),
        }
    }

    /// The next older post, if any.
    pub fn next(&self) -> Option<&'a Post> {
        self.current?;
        self.all.get(self.index + 1)
    }
}

/// The number of summaries a recency window of `window` yields from a batch
/// of `total` posts.
pub fn recent_len(window: usize, total: usize) -> usize {
    window.min(total)
}

fn recent(all: &[Post], window: usize) -> Vec<Summary<'_>> {
    all[..recent_len(window, all.len())]
        .iter()
        .map(Post::summary)
        .collect()
}

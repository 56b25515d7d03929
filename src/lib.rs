//! The library code for the `lectern` static blog generator. A build turns a
//! directory of post files into one HTML page per post, an `index.html` that
//! mirrors the most recent post, and an RSS feed. It breaks down into these
//! steps:
//!
//! 1. Discovering the post files, most recent first ([`crate::source`])
//! 2. Parsing each file into a post ([`crate::post`])
//! 3. Compiling the templates ([`crate::render`])
//! 4. Clearing stale output and writing a page per post ([`crate::write`])
//! 5. Writing the feed ([`crate::feed`])
//!
//! Every page is rendered from a [`crate::context::RenderContext`], which
//! carries the post itself, its position, summaries of the most recent posts
//! and the whole ordered batch so templates can link between posts.
//! [`crate::build::build_site`] runs the steps in order.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod context;
pub mod feed;
pub mod markdown;
pub mod post;
pub mod render;
pub mod source;
pub mod value;
pub mod write;

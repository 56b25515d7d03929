//! Markdown handling for post bodies.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Separates the part of a post shown in listings from the rest of the body.
pub const FOLD_TAG: &str = "<!-- more -->";

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Converts markdown to HTML, appending the result onto `out`.
pub fn to_html(out: &mut String, markdown: &str) {
    html::push_html(out, Parser::new_ext(markdown, options()));
}

/// Returns the plain text of the markdown that precedes [`FOLD_TAG`], with
/// whitespace collapsed. Returns [`None`] if there is no fold or if nothing
/// but whitespace precedes it.
pub fn text_above_fold(markdown: &str) -> Option<String> {
    let above = &markdown[..markdown.find(FOLD_TAG)?];
    let mut text = String::new();
    for event in Parser::new_ext(above, options()) {
        match event {
            Event::Text(s) | Event::Code(s) => text.push_str(&s),
            Event::SoftBreak
            | Event::HardBreak
            | Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(_)) => text.push(' '),
            _ => {}
        }
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match text.is_empty() {
        true => None,
        false => Some(text),
    }
}

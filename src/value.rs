//! How posts and render contexts look to templates. Both backends see the
//! same shape: `gtmpl` through [`Value`] conversions and `tera` through
//! [`Serialize`].

use crate::context::RenderContext;
use crate::post::{Post, Summary};
use gtmpl_value::Value;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashMap;

impl From<&Post> for Value {
    fn from(p: &Post) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), (&p.title).into());
        m.insert("slug".to_owned(), (&p.slug).into());
        m.insert("description".to_owned(), (&p.description).into());
        m.insert("author".to_owned(), (&p.author).into());
        m.insert("date".to_owned(), p.date().into());
        m.insert("body".to_owned(), (&p.body).into());
        Value::Object(m)
    }
}

impl From<Summary<'_>> for Value {
    fn from(s: Summary) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), s.title().into());
        m.insert("slug".to_owned(), s.slug().into());
        m.insert("description".to_owned(), s.description().into());
        m.insert("author".to_owned(), s.author().into());
        m.insert("date".to_owned(), s.date().into());
        Value::Object(m)
    }
}

impl From<&RenderContext<'_>> for Value {
    /// Converts a context into a [`Value::Object`] with the fields `post`,
    /// `index`, `recent`, `all`, `prev`, `next`, `site_name` and `base_url`.
    /// Missing posts become [`Value::Nil`].
    fn from(ctx: &RenderContext) -> Value {
        let option_to_value = |opt: Option<&Post>| match opt {
            Some(post) => post.into(),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("post".to_owned(), option_to_value(ctx.current));
        m.insert("index".to_owned(), Value::from(ctx.index as u64));
        m.insert(
            "recent".to_owned(),
            Value::Array(ctx.recent.iter().map(|s| Value::from(*s)).collect()),
        );
        m.insert(
            "all".to_owned(),
            Value::Array(ctx.all.iter().map(Value::from).collect()),
        );
        m.insert("prev".to_owned(), option_to_value(ctx.prev()));
        m.insert("next".to_owned(), option_to_value(ctx.next()));
        m.insert("site_name".to_owned(), ctx.site.name.into());
        m.insert("base_url".to_owned(), ctx.site.base_url.into());
        Value::Object(m)
    }
}

impl Serialize for Post {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Post", 6)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("slug", &self.slug)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("author", &self.author)?;
        s.serialize_field("date", &self.date())?;
        s.serialize_field("body", &self.body)?;
        s.end()
    }
}

impl Serialize for Summary<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Summary", 5)?;
        s.serialize_field("title", self.title())?;
        s.serialize_field("slug", self.slug())?;
        s.serialize_field("description", self.description())?;
        s.serialize_field("author", self.author())?;
        s.serialize_field("date", &self.date())?;
        s.end()
    }
}

impl Serialize for RenderContext<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RenderContext", 8)?;
        s.serialize_field("post", &self.current)?;
        s.serialize_field("index", &self.index)?;
        s.serialize_field("recent", &self.recent)?;
        s.serialize_field("all", self.all)?;
        s.serialize_field("prev", &self.prev())?;
        s.serialize_field("next", &self.next())?;
        s.serialize_field("site_name", self.site.name)?;
        s.serialize_field("base_url", self.site.base_url)?;
        s.end()
    }
}

//! Defines the document types that flow through a build: [`RawDocument`] as
//! loaded from front matter, [`Document`] after author normalization, and the
//! lightweight [`Item`] that templates may iterate over. All three expose
//! their fields to templates through the [`Fields`] trait.

use crate::author::AuthorRecord;
use gtmpl_value::Value;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Name of the field holding a document's source path.
pub const PATH_FIELD: &str = "path";

/// Name of the field holding a document's (primary) author.
pub const AUTHOR_FIELD: &str = "author";

/// Name of the field holding a document's list of authors.
pub const AUTHORS_FIELD: &str = "authors";

/// Front matter that isn't otherwise recognized.
pub type Data = BTreeMap<String, serde_yaml::Value>;

/// Anything a template can treat as "the current document".
pub trait Fields {
    /// Returns the named field, if present.
    fn field(&self, name: &str) -> Option<Value>;

    /// Returns the intrinsic name (slug) of the document.
    fn name(&self) -> &str;
}

/// An author as written in front matter: normally an identifier, but a
/// resolved mapping shows up if already-normalized data is fed back in.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Id(String),
    Resolved(serde_yaml::Mapping),
}

impl From<&AuthorRef> for Value {
    fn from(author: &AuthorRef) -> Value {
        match author {
            AuthorRef::Id(id) => Value::String(id.clone()),
            AuthorRef::Resolved(m) => mapping_to_value(m),
        }
    }
}

/// A document as loaded, before its authors have been resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDocument {
    /// The source path relative to the content root.
    pub path: PathBuf,

    /// The document's intrinsic name, derived from its file name.
    pub slug: String,

    pub author: Option<AuthorRef>,

    pub authors: Option<Vec<AuthorRef>>,

    /// The document's URL, if the host has assigned one.
    pub url: Option<String>,

    /// All other front matter.
    pub data: Data,

    /// The rendered body.
    pub body: String,
}

impl RawDocument {
    /// Creates an empty document with the given path; the slug is derived
    /// from the file stem.
    pub fn new(path: impl Into<PathBuf>) -> RawDocument {
        let path = path.into();
        let slug = path
            .file_stem()
            .map(|stem| slug::slugify(stem.to_string_lossy()))
            .unwrap_or_default();
        RawDocument {
            path,
            slug,
            author: None,
            authors: None,
            url: None,
            data: Data::new(),
            body: String::new(),
        }
    }
}

impl Fields for RawDocument {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            PATH_FIELD => Some(path_value(&self.path)),
            AUTHOR_FIELD => self.author.as_ref().map(Value::from),
            AUTHORS_FIELD => self.authors.as_ref().map(|authors| {
                Value::Array(authors.iter().map(Value::from).collect())
            }),
            _ => common_field(
                name,
                &self.slug,
                &self.url,
                &self.body,
                &self.data,
            ),
        }
    }

    fn name(&self) -> &str {
        &self.slug
    }
}

/// A document whose authors have been resolved. `authors` is never empty and
/// only its first record is primary; see [`crate::normalize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub slug: String,
    pub url: Option<String>,
    pub data: Data,
    pub body: String,
    authors: Vec<AuthorRecord>,
}

impl Document {
    /// Builds a normalized document from the remains of a [`RawDocument`].
    /// Callers must uphold the `authors` invariant.
    pub(crate) fn from_parts(
        raw: RawDocument,
        authors: Vec<AuthorRecord>,
    ) -> Document {
        debug_assert!(!authors.is_empty());
        Document {
            path: raw.path,
            slug: raw.slug,
            url: raw.url,
            data: raw.data,
            body: raw.body,
            authors,
        }
    }

    /// The primary author.
    pub fn author(&self) -> &AuthorRecord {
        &self.authors[0]
    }

    pub fn authors(&self) -> &[AuthorRecord] {
        &self.authors
    }

    /// The document's `title` front matter, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(serde_yaml::Value::as_str)
    }
}

impl Fields for Document {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            PATH_FIELD => Some(path_value(&self.path)),
            AUTHOR_FIELD => Some(Value::from(self.author())),
            AUTHORS_FIELD => Some(Value::Array(
                self.authors.iter().map(Value::from).collect(),
            )),
            _ => common_field(
                name,
                &self.slug,
                &self.url,
                &self.body,
                &self.data,
            ),
        }
    }

    fn name(&self) -> &str {
        &self.slug
    }
}

impl From<&Document> for Value {
    /// Converts a [`Document`] into a [`Value::Object`] for templating.
    fn from(document: &Document) -> Value {
        let mut m: HashMap<String, Value> = document
            .data
            .iter()
            .map(|(k, v)| (k.clone(), yaml_to_value(v)))
            .collect();
        let names = [
            PATH_FIELD,
            AUTHOR_FIELD,
            AUTHORS_FIELD,
            "slug",
            "url",
            "content",
        ];
        for name in &names {
            if let Some(value) = document.field(name) {
                m.insert((*name).to_owned(), value);
            }
        }
        Value::Object(m)
    }
}

/// A plain data object bound by a loop. Unlike documents, items carry no
/// synthesized `path` field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Item {
    pub name: String,
    pub data: Data,
}

impl Fields for Item {
    fn field(&self, name: &str) -> Option<Value> {
        self.data.get(name).map(yaml_to_value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn path_value(path: &std::path::Path) -> Value {
    Value::String(path.display().to_string())
}

fn common_field(
    name: &str,
    slug: &str,
    url: &Option<String>,
    body: &str,
    data: &Data,
) -> Option<Value> {
    match name {
        "slug" => Some(Value::String(slug.to_owned())),
        "url" => url.as_ref().map(|url| Value::String(url.clone())),
        "content" => Some(Value::String(body.to_owned())),
        _ => data.get(name).map(yaml_to_value),
    }
}

/// Converts front matter YAML into a template [`Value`].
pub fn yaml_to_value(yaml: &serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match yaml {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Value::from(i),
            (None, Some(u), _) => Value::from(u),
            (None, None, Some(f)) => Value::from(f),
            _ => Value::Nil,
        },
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => {
            Value::Array(seq.iter().map(yaml_to_value).collect())
        }
        Yaml::Mapping(m) => mapping_to_value(m),
    }
}

// Non-string keys can't be addressed from a template, so they're dropped.
fn mapping_to_value(m: &serde_yaml::Mapping) -> Value {
    Value::Object(
        m.iter()
            .filter_map(|(k, v)| {
                k.as_str().map(|k| (k.to_owned(), yaml_to_value(v)))
            })
            .collect(),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    fn string(value: Option<Value>) -> Option<String> {
        match value {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    #[test]
    fn test_raw_document_fields() {
        let mut doc = RawDocument::new("2021/Hello World.md");
        doc.author = Some(AuthorRef::Id("jane".to_owned()));
        doc.data.insert(
            "title".to_owned(),
            serde_yaml::Value::String("Hello".to_owned()),
        );

        assert_eq!("hello-world", doc.name());
        assert_eq!(
            Some("2021/Hello World.md".to_owned()),
            string(doc.field(PATH_FIELD))
        );
        assert_eq!(Some("jane".to_owned()), string(doc.field(AUTHOR_FIELD)));
        assert_eq!(Some("Hello".to_owned()), string(doc.field("title")));
        assert!(doc.field(AUTHORS_FIELD).is_none());
        assert!(doc.field("url").is_none());
    }

    #[test]
    fn test_document_to_value() {
        let registry: crate::author::AuthorRegistry =
            serde_yaml::from_str("jane:\n  name: Jane Doe\n").unwrap();
        let mut raw = RawDocument::new("posts/a.md");
        raw.author = Some(AuthorRef::Id("jane".to_owned()));
        raw.data.insert(
            "title".to_owned(),
            serde_yaml::Value::String("A".to_owned()),
        );
        let doc = crate::normalize::normalize(raw, &registry).unwrap();

        let m = match Value::from(&doc) {
            Value::Object(m) => m,
            _ => panic!("wanted an object"),
        };
        assert!(matches!(m.get("title"), Some(Value::String(s)) if s == "A"));
        assert!(matches!(m.get("slug"), Some(Value::String(s)) if s == "a"));
        assert!(matches!(
            m.get(AUTHORS_FIELD),
            Some(Value::Array(a)) if a.len() == 1
        ));
        match m.get(AUTHOR_FIELD) {
            Some(Value::Object(author)) => {
                let primary = author.get("primary");
                assert!(matches!(primary, Some(Value::Bool(true))));
            }
            _ => panic!("wanted an author object"),
        }
        assert!(!m.contains_key("url"));
    }

    #[test]
    fn test_item_has_no_path() {
        let item = Item {
            name: "x".to_owned(),
            ..Item::default()
        };
        assert!(item.field(PATH_FIELD).is_none());
        assert_eq!("x", item.name());
    }

    #[test]
    fn test_author_ref_deserialize() -> Result<(), serde_yaml::Error> {
        let refs: Vec<AuthorRef> =
            serde_yaml::from_str("- jane\n- name: Bob\n")?;
        assert_eq!(AuthorRef::Id("jane".to_owned()), refs[0]);
        assert!(matches!(refs[1], AuthorRef::Resolved(_)));
        Ok(())
    }

    #[test]
    fn test_yaml_to_value() -> Result<(), serde_yaml::Error> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("tags: [a, b]\ndraft: false\n1: dropped\n")?;
        let m = match yaml_to_value(&yaml) {
            Value::Object(m) => m,
            _ => panic!("wanted an object"),
        };
        assert_eq!(2, m.len());
        assert!(matches!(m.get("draft"), Some(Value::Bool(false))));
        assert!(matches!(m.get("tags"), Some(Value::Array(a)) if a.len() == 2));
        Ok(())
    }
}

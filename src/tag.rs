//! Defines the [`Tag`] trait for template directives, the [`Tags`] registry
//! that maps directive names to tags, and the built-in tags: [`AuthorTag`]
//! (`author`) and [`PostLinkTag`] (`postlink`).

use crate::author::ConfigurationError;
use crate::context::{resolve, resolve_path, RenderContext};
use crate::document::AUTHOR_FIELD;
use gtmpl_value::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// A template directive, constructed once from its markup and rendered any
/// number of times.
pub trait Tag {
    /// Renders the tag inline for the given context.
    fn render(&self, context: &RenderContext) -> Result<String>;
}

/// Builds a [`Tag`] from the markup following the tag name.
pub type Constructor = fn(&str) -> Result<Box<dyn Tag>>;

/// Maps tag names to their constructors.
pub struct Tags {
    constructors: HashMap<&'static str, Constructor>,
}

impl Default for Tags {
    /// Creates a registry with the built-in tags.
    fn default() -> Self {
        let mut tags = Tags {
            constructors: HashMap::new(),
        };
        tags.register(AuthorTag::NAME, |markup| {
            Ok(Box::new(AuthorTag::new(markup)?))
        });
        tags.register(PostLinkTag::NAME, |markup| {
            Ok(Box::new(PostLinkTag::new(markup)?))
        });
        tags
    }
}

impl Tags {
    /// Registers `constructor` under `name`, replacing any previous tag of
    /// that name.
    pub fn register(&mut self, name: &'static str, constructor: Constructor) {
        self.constructors.insert(name, constructor);
    }

    /// Constructs the tag registered under `name`.
    pub fn parse(&self, name: &str, markup: &str) -> Result<Box<dyn Tag>> {
        match self.constructors.get(name) {
            Some(constructor) => constructor(markup),
            None => Err(Error::UnknownTag(name.to_owned())),
        }
    }

    /// Constructs and renders the tag registered under `name`.
    pub fn render(
        &self,
        name: &str,
        markup: &str,
        context: &RenderContext,
    ) -> Result<String> {
        self.parse(name, markup)?.render(context)
    }
}

/// Renders one property of the current document's author, e.g.
/// `{{ author bio }}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorTag {
    property: String,
}

impl AuthorTag {
    pub const NAME: &'static str = "author";

    pub fn new(markup: &str) -> Result<AuthorTag> {
        let property = markup.trim();
        if property.is_empty() {
            return Err(Error::Syntax {
                tag: Self::NAME,
                message: "expected a property name".to_owned(),
            });
        }
        Ok(AuthorTag {
            property: property.to_owned(),
        })
    }

    // Accepts either a raw identifier or a normalized record, which carries
    // its identifier under `id`.
    fn author_id(context: &RenderContext) -> Option<String> {
        match resolve(context, AUTHOR_FIELD)? {
            Value::String(id) => Some(id),
            Value::Object(mut record) => match record.remove("id")? {
                Value::String(id) => Some(id),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Tag for AuthorTag {
    fn render(&self, context: &RenderContext) -> Result<String> {
        let registry = context
            .site()
            .ok_or(ConfigurationError)
            .and_then(|site| site.registry())
            .map_err(|err| Error::Configuration {
                err,
                path: resolve_path(context),
            })?;

        let id = Self::author_id(context).ok_or_else(|| {
            Error::resolution(
                context,
                "Author must be set to an author name defined in the site \
                 configuration"
                    .to_owned(),
            )
        })?;

        let author = registry.get(&id).ok_or_else(|| {
            Error::resolution(
                context,
                format!(
                    "Could not find author with name '{}'. Authors are \
                     defined in the site configuration",
                    id
                ),
            )
        })?;

        Ok(match author.get(&self.property) {
            Some(value) => value.to_owned(),
            None => {
                warn!(
                    author = %id,
                    property = %self.property,
                    path = ?resolve_path(context),
                    "author property not found"
                );
                format!("Author property not found: {}", self.property)
            }
        })
    }
}

/// Renders a link to another post by its file name less the extension (or
/// its slug), e.g. `{{ postlink 2014-01-01-My_Post Say hello }}`. Without
/// title words the linked post's `title` is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLinkTag {
    post: String,
    title: Option<String>,
}

impl PostLinkTag {
    pub const NAME: &'static str = "postlink";

    pub fn new(markup: &str) -> Result<PostLinkTag> {
        let mut words = markup.split_whitespace();
        let post = words.next().ok_or_else(|| Error::Syntax {
            tag: Self::NAME,
            message: "expected a post name".to_owned(),
        })?;
        let title = words.collect::<Vec<_>>().join(" ");
        Ok(PostLinkTag {
            post: post.to_owned(),
            title: if title.is_empty() { None } else { Some(title) },
        })
    }
}

impl Tag for PostLinkTag {
    fn render(&self, context: &RenderContext) -> Result<String> {
        let post = context
            .site()
            .and_then(|site| site.post(&self.post))
            .ok_or_else(|| {
                Error::resolution(
                    context,
                    format!(
                        "Could not find post '{}' in tag '{}'. Make sure the \
                         post exists and the name is correct",
                        self.post,
                        Self::NAME
                    ),
                )
            })?;
        let url = post.url.as_ref().ok_or_else(|| {
            Error::resolution(
                context,
                format!("Post '{}' has no URL", self.post),
            )
        })?;
        let title = match &self.title {
            Some(title) => title.as_str(),
            None => post.title().unwrap_or(&post.slug),
        };
        Ok(format!("<a href=\"{}\">{}</a>", url, title))
    }
}

/// The result of a fallible tag operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error constructing or rendering a tag. Render errors carry
/// the path of the document being rendered, if it could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when the site defines no authors.
    Configuration {
        err: ConfigurationError,
        path: Option<String>,
    },

    /// Returned when the tag's target can't be resolved.
    Resolution {
        message: String,
        path: Option<String>,
    },

    /// Returned when a tag's markup is malformed.
    Syntax {
        tag: &'static str,
        message: String,
    },

    /// Returned when no tag is registered under the given name.
    UnknownTag(String),
}

impl Error {
    fn resolution(context: &RenderContext, message: String) -> Error {
        Error::Resolution {
            message,
            path: resolve_path(context),
        }
    }
}

struct PostPath<'a>(&'a Option<String>);

impl fmt::Display for PostPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, "\nPost: {}", path),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Configuration { err, path } => {
                write!(f, "{}{}", err, PostPath(path))
            }
            Error::Resolution { message, path } => {
                write!(f, "{}{}", message, PostPath(path))
            }
            Error::Syntax { tag, message } => {
                write!(f, "Syntax error in tag '{}': {}", tag, message)
            }
            Error::UnknownTag(name) => write!(f, "Unknown tag '{}'", name),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Configuration { err, .. } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::build::Site;
    use crate::config::SiteConfig;
    use crate::context::Frame;
    use crate::document::{AuthorRef, Item, RawDocument};
    use crate::normalize::normalize;

    fn site() -> Site {
        Site::new(
            serde_yaml::from_str(
                "authors:\n  \
                   jane:\n    name: Jane\n    bio: Engineer\n  \
                   bob:\n    name: Bob\n",
            )
            .unwrap(),
        )
    }

    fn page(path: &str, author: &str) -> RawDocument {
        let mut page = RawDocument::new(path);
        page.author = Some(AuthorRef::Id(author.to_owned()));
        page
    }

    fn render(markup: &str, context: &RenderContext) -> Result<String> {
        Tags::default().render(AuthorTag::NAME, markup, context)
    }

    #[test]
    fn test_author_property() -> Result<()> {
        let site = site();
        let page = page("posts/a.md", "jane");
        let context = RenderContext::for_page(&site, &page);

        assert_eq!("Engineer", render("bio", &context)?);
        assert_eq!("Jane", render(" name ", &context)?);
        assert_eq!(
            "Author property not found: twitter",
            render("twitter", &context)?
        );
        Ok(())
    }

    #[test]
    fn test_author_in_loop() -> Result<()> {
        let site = site();
        let index = RawDocument::new("index.md");
        let mut post = Item {
            name: "x".to_owned(),
            ..Item::default()
        };
        post.data.insert(
            "author".to_owned(),
            serde_yaml::Value::String("bob".to_owned()),
        );
        let mut context = RenderContext::for_page(&site, &index);
        context.push(Frame::Loop {
            variable: "post",
            item: &post,
        });

        assert_eq!("Bob", render("name", &context)?);
        Ok(())
    }

    #[test]
    fn test_author_of_normalized_document() -> Result<()> {
        let site = site();
        let mut raw = RawDocument::new("posts/a.md");
        raw.authors = Some(vec![
            AuthorRef::Id("bob".to_owned()),
            AuthorRef::Id("jane".to_owned()),
        ]);
        let doc = normalize(raw, site.registry().unwrap()).unwrap();
        let context = RenderContext::for_page(&site, &doc);

        assert_eq!("Bob", render("name", &context)?);
        Ok(())
    }

    #[test]
    fn test_author_without_registry() {
        let site = Site::new(SiteConfig::default());
        let page = page("posts/a.md", "jane");
        let context = RenderContext::for_page(&site, &page);

        let err = render("name", &context).unwrap_err();
        assert_eq!(
            Error::Configuration {
                err: ConfigurationError,
                path: Some("posts/a.md".to_owned()),
            },
            err
        );

        assert!(matches!(
            render("name", &RenderContext::new()),
            Err(Error::Configuration { path: None, .. })
        ));
    }

    #[test]
    fn test_author_missing_or_unknown() {
        let site = site();
        let page = RawDocument::new("posts/none.md");
        let context = RenderContext::for_page(&site, &page);
        let err = render("name", &context).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
        assert!(err.to_string().ends_with("\nPost: posts/none.md"));

        let page = self::page("posts/carol.md", "carol");
        let context = RenderContext::for_page(&site, &page);
        let msg = render("name", &context).unwrap_err().to_string();
        assert!(msg.contains("'carol'"));
        assert!(msg.ends_with("\nPost: posts/carol.md"));
    }

    #[test]
    fn test_author_loop_error_uses_item_name() {
        let site = site();
        let index = RawDocument::new("index.md");
        let post = Item {
            name: "draft".to_owned(),
            ..Item::default()
        };
        let mut context = RenderContext::for_page(&site, &index);
        context.push(Frame::Loop {
            variable: "post",
            item: &post,
        });

        let msg = render("name", &context).unwrap_err().to_string();
        assert!(msg.ends_with("\nPost: draft"));
    }

    #[test]
    fn test_tag_syntax() {
        let tags = Tags::default();
        let context = RenderContext::new();
        assert!(matches!(
            tags.render("author", "  ", &context),
            Err(Error::Syntax { tag: "author", .. })
        ));
        assert!(matches!(
            tags.render("postlink", "", &context),
            Err(Error::Syntax { tag: "postlink", .. })
        ));
        assert_eq!(
            Err(Error::UnknownTag("nope".to_owned())),
            tags.render("nope", "x", &context)
        );
    }

    #[test]
    fn test_postlink() -> Result<()> {
        let mut site = site();
        let mut raw = page("hello-world.md", "jane");
        raw.url = Some("/posts/hello-world.html".to_owned());
        raw.data.insert(
            "title".to_owned(),
            serde_yaml::Value::String("Hello, World".to_owned()),
        );
        site.posts = vec![normalize(raw, site.registry().unwrap()).unwrap()];
        let page = page("other.md", "bob");
        let context = RenderContext::for_page(&site, &page);
        let tags = Tags::default();

        assert_eq!(
            "<a href=\"/posts/hello-world.html\">Hello, World</a>",
            tags.render("postlink", "hello-world", &context)?
        );
        assert_eq!(
            "<a href=\"/posts/hello-world.html\">Say hi</a>",
            tags.render("postlink", "hello-world Say  hi", &context)?
        );

        let mut dated = self::page("2014-01-01-My_Post.md", "bob");
        dated.url = Some("/posts/2014-01-01-My_Post.html".to_owned());
        site.posts.push(normalize(dated, site.registry().unwrap()).unwrap());
        let context = RenderContext::for_page(&site, &page);
        assert_eq!(
            "<a href=\"/posts/2014-01-01-My_Post.html\">Hi</a>",
            tags.render("postlink", "2014-01-01-My_Post Hi", &context)?
        );

        let msg = tags
            .render("postlink", "missing", &context)
            .unwrap_err()
            .to_string();
        assert!(msg.contains("'missing'"));
        assert!(msg.ends_with("\nPost: other.md"));
        Ok(())
    }
}

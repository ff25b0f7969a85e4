//! Defines [`RenderContext`], the stack of scope frames available while a
//! template renders, and [`resolve`], which finds a property of "the current
//! document" in it.
//!
//! A document is rendered in one of two ways: directly, in which case the
//! registers frame holds it as the current page, or as an item in a loop
//! (e.g., the post listing on an index page), in which case the innermost
//! loop frame binds it. [`resolve`] handles both.

use crate::build::Site;
use crate::document::{Fields, PATH_FIELD};
use gtmpl_value::Value;
use tracing::debug;

/// A single scope frame.
pub enum Frame<'a> {
    /// Entered once per iteration of a loop. `variable` is the name the item
    /// is bound to (e.g., `post`).
    Loop {
        variable: &'a str,
        item: &'a dyn Fields,
    },

    /// Build-global handles. `page` is only set when a document is rendered
    /// directly.
    Registers {
        site: &'a Site,
        page: Option<&'a dyn Fields>,
    },
}

/// The scope frames for one template render. Frames are pushed as scopes are
/// entered, so the last frame is the innermost.
#[derive(Default)]
pub struct RenderContext<'a> {
    frames: Vec<Frame<'a>>,
}

impl<'a> RenderContext<'a> {
    pub fn new() -> RenderContext<'a> {
        RenderContext { frames: Vec::new() }
    }

    /// Creates a context for rendering `page` directly.
    pub fn for_page(site: &'a Site, page: &'a dyn Fields) -> RenderContext<'a> {
        let mut context = RenderContext::new();
        context.push(Frame::Registers {
            site,
            page: Some(page),
        });
        context
    }

    pub fn push(&mut self, frame: Frame<'a>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame<'a>> {
        self.frames.pop()
    }

    /// Iterates over the frames from innermost to outermost.
    pub fn scopes(&self) -> impl Iterator<Item = &Frame<'a>> {
        self.frames.iter().rev()
    }

    /// The innermost loop frame's variable name and item.
    pub fn current_loop(&self) -> Option<(&'a str, &'a dyn Fields)> {
        self.scopes().find_map(|frame| match frame {
            Frame::Loop { variable, item } => Some((*variable, *item)),
            _ => None,
        })
    }

    /// The site from the innermost registers frame.
    pub fn site(&self) -> Option<&'a Site> {
        self.scopes().find_map(|frame| match frame {
            Frame::Registers { site, .. } => Some(*site),
            _ => None,
        })
    }

    /// The directly rendered page from the innermost registers frame.
    pub fn page(&self) -> Option<&'a dyn Fields> {
        self.scopes().find_map(|frame| match frame {
            Frame::Registers { page, .. } => *page,
            _ => None,
        })
    }
}

/// Returns `property` of the document currently being rendered.
///
/// If the context is inside a loop, the innermost loop item is the current
/// document. Loop items may lack a `path` field, in which case the item's
/// intrinsic name stands in for it. Outside of loops, the current page from
/// the registers frame is used. Returns `None` if neither is available or
/// the property is absent.
pub fn resolve(context: &RenderContext, property: &str) -> Option<Value> {
    if let Some((variable, item)) = context.current_loop() {
        return match item.field(property) {
            None if property == PATH_FIELD => {
                debug!(
                    variable,
                    name = item.name(),
                    "loop item has no path; using its name"
                );
                Some(Value::String(item.name().to_owned()))
            }
            value => value,
        };
    }
    context.page().and_then(|page| page.field(property))
}

/// Like [`resolve`], but for the document's path, rendered as a string.
/// Used to annotate errors.
pub fn resolve_path(context: &RenderContext) -> Option<String> {
    match resolve(context, PATH_FIELD)? {
        Value::String(path) => Some(path),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SiteConfig;
    use crate::document::{AuthorRef, Item, RawDocument};

    fn item(name: &str, fields: &[(&str, &str)]) -> Item {
        Item {
            name: name.to_owned(),
            data: fields
                .iter()
                .map(|(k, v)| {
                    let value = serde_yaml::Value::String((*v).to_owned());
                    ((*k).to_owned(), value)
                })
                .collect(),
        }
    }

    fn string(value: Option<Value>) -> Option<String> {
        match value {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    fn author(context: &RenderContext) -> Option<String> {
        string(resolve(context, "author"))
    }

    #[test]
    fn test_resolve_direct_page() {
        let site = Site::new(SiteConfig::default());
        let mut page = RawDocument::new("posts/hello.md");
        page.author = Some(AuthorRef::Id("jane".to_owned()));
        let context = RenderContext::for_page(&site, &page);

        assert_eq!(Some("jane".to_owned()), author(&context));
        assert_eq!(
            Some("posts/hello.md".to_owned()),
            resolve_path(&context)
        );
    }

    #[test]
    fn test_resolve_loop_item_path_falls_back_to_name() {
        let site = Site::new(SiteConfig::default());
        let page = RawDocument::new("index.md");
        let post = item("x", &[("title", "X")]);
        let mut context = RenderContext::for_page(&site, &page);
        context.push(Frame::Loop {
            variable: "post",
            item: &post,
        });

        assert_eq!(Some("x".to_owned()), string(resolve(&context, "path")));
        assert_eq!(Some("X".to_owned()), string(resolve(&context, "title")));
    }

    #[test]
    fn test_resolve_loop_shadows_page() {
        let site = Site::new(SiteConfig::default());
        let mut page = RawDocument::new("index.md");
        page.author = Some(AuthorRef::Id("jane".to_owned()));
        let post = item("x", &[("author", "bob"), ("path", "posts/x.md")]);
        let mut context = RenderContext::for_page(&site, &page);
        context.push(Frame::Loop {
            variable: "post",
            item: &post,
        });
        // A nested scope without a page doesn't hide the loop item.
        context.push(Frame::Registers {
            site: &site,
            page: None,
        });

        assert_eq!(Some("bob".to_owned()), author(&context));
        assert_eq!(Some("posts/x.md".to_owned()), resolve_path(&context));

        // Missing fields other than `path` don't fall back to the page.
        assert!(resolve(&context, "bio").is_none());

        context.pop();
        context.pop();
        assert_eq!(Some("jane".to_owned()), author(&context));
    }

    #[test]
    fn test_resolve_without_document() {
        let site = Site::new(SiteConfig::default());
        assert!(resolve(&RenderContext::new(), "author").is_none());

        let mut context = RenderContext::new();
        context.push(Frame::Registers { site: &site, page: None });
        assert!(resolve(&context, "author").is_none());
        assert!(resolve_path(&context).is_none());
        assert!(context.site().is_some());
    }
}

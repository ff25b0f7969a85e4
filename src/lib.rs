//! The library code for `byline`, which resolves the authors of static site
//! content. A build proceeds in two phases:
//!
//! 1. Generation: posts are loaded ([`crate::parser`]) and each post's
//!    `author`/`authors` front matter is normalized against the site's author
//!    registry ([`crate::normalize`]), yielding a read-only [`build::Site`].
//! 2. Rendering: templates invoke tags ([`crate::tag`]) against a
//!    [`context::RenderContext`]. The `author` tag finds the author of the
//!    document being rendered, whether that document is the page itself or an
//!    item in a loop ([`context::resolve`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod author;
pub mod build;
pub mod config;
pub mod context;
pub mod document;
pub mod normalize;
pub mod parser;
pub mod tag;

//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: loading the posts ([`crate::parser`]) and running the
//! generation phase ([`generate`]), which sets the site environment and
//! normalizes every post's authors ([`crate::normalize`]). The resulting
//! [`Site`] is read-only and ready for rendering.

use crate::author::{AuthorRegistry, ConfigurationError};
use crate::config::{Config, SiteConfig};
use crate::document::{Document, RawDocument};
use crate::normalize::{self, Error as NormalizeError};
use crate::parser::{Error as ParseError, Parser as PostParser};
use std::fmt;
use tracing::info;

/// The environment variable selecting the build environment.
pub const ENV_VAR: &str = "BYLINE_ENV";

/// The environment used when [`ENV_VAR`] is unset.
pub const DEFAULT_ENV: &str = "development";

/// Everything a template may reach through the registers frame.
#[derive(Debug)]
pub struct Site {
    pub config: SiteConfig,

    /// The build environment, e.g. `development` or `production`.
    pub env: String,

    /// The normalized posts, in load order.
    pub posts: Vec<Document>,
}

impl Site {
    /// Creates a site with no posts in the default environment.
    pub fn new(config: SiteConfig) -> Site {
        Site {
            config,
            env: DEFAULT_ENV.to_owned(),
            posts: Vec::new(),
        }
    }

    /// Returns the author registry, failing if it's missing or empty.
    pub fn registry(
        &self,
    ) -> std::result::Result<&AuthorRegistry, ConfigurationError> {
        self.config.registry()
    }

    /// Finds a post by its file name less the extension (e.g.,
    /// `2014-01-01-My_Post` for `2014-01-01-My_Post.md`), falling back to its
    /// slug.
    pub fn post(&self, name: &str) -> Option<&Document> {
        self.posts
            .iter()
            .find(|post| {
                post.path.file_stem().map_or(false, |stem| stem == name)
            })
            .or_else(|| self.posts.iter().find(|post| post.slug == name))
    }
}

/// Sets the site environment from [`ENV_VAR`] and exposes it as the `env`
/// setting.
pub fn set_env(site: &mut Site, env: Option<String>) {
    site.env = env.unwrap_or_else(|| DEFAULT_ENV.to_owned());
    site.config.settings.insert(
        "env".to_owned(),
        serde_yaml::Value::String(site.env.clone()),
    );
}

/// Runs the generation phase over the full post collection. This must happen
/// exactly once, before any rendering.
pub fn generate(config: SiteConfig, posts: Vec<RawDocument>) -> Result<Site> {
    let mut site = Site::new(config);
    set_env(&mut site, std::env::var(ENV_VAR).ok());
    site.posts =
        normalize::normalize_all(posts, site.config.authors.as_ref())?;
    info!(env = %site.env, posts = site.posts.len(), "generated site");
    Ok(site)
}

/// Loads and generates the site described by a [`Config`].
pub fn build_site(config: Config) -> Result<Site> {
    let parser = PostParser::new(&config.site.posts_url);
    let posts = parser.parse_posts(&config.posts_source_directory)?;
    info!(
        directory = %config.posts_source_directory.display(),
        posts = posts.len(),
        "loaded posts"
    );
    generate(config.site, posts)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading posts.
    Parse(ParseError),

    /// Returned for errors normalizing post authors.
    Normalize(NormalizeError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Normalize(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Normalize(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<NormalizeError> for Error {
    /// Converts [`NormalizeError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: NormalizeError) -> Error {
        Error::Normalize(err)
    }
}

//! Loads the project configuration. A project is a directory containing a
//! `site.yaml` file and a `posts` directory; the site configuration holds the
//! author registry under its `authors` key.

use crate::author::{AuthorRegistry, ConfigurationError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the site configuration file.
pub const CONFIG_FILE: &str = "site.yaml";

/// The site-wide settings from `site.yaml`.
#[derive(Clone, Debug, Deserialize)]
pub struct SiteConfig {
    /// The author registry.
    #[serde(default)]
    pub authors: Option<AuthorRegistry>,

    /// The URL prefix for post pages, e.g. `/posts/`.
    #[serde(default = "default_posts_url")]
    pub posts_url: String,

    /// Any other settings.
    #[serde(flatten)]
    pub settings: BTreeMap<String, serde_yaml::Value>,
}

fn default_posts_url() -> String {
    String::from("/posts/")
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            authors: None,
            posts_url: default_posts_url(),
            settings: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Returns the author registry, failing if it's missing or empty.
    pub fn registry(
        &self,
    ) -> std::result::Result<&AuthorRegistry, ConfigurationError> {
        AuthorRegistry::require(self.authors.as_ref())
    }

    pub fn setting(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.settings.get(key)
    }
}

/// The locations and settings for a project.
pub struct Config {
    /// The directory containing `site.yaml`.
    pub root_directory: PathBuf,

    /// The directory from which posts are loaded.
    pub posts_source_directory: PathBuf,

    pub site: SiteConfig,
}

impl Config {
    /// Searches `dir` and its ancestors for a `site.yaml` file and loads it.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads the project whose configuration file is at `path`.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let site: SiteConfig =
            serde_yaml::from_reader(file).map_err(|err| Error::Parse {
                path: path.to_owned(),
                err,
            })?;
        let root_directory = path
            .parent()
            .map(Path::to_owned)
            .unwrap_or_default();
        Ok(Config {
            posts_source_directory: root_directory.join("posts"),
            root_directory,
            site,
        })
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the project configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `site.yaml` exists in the directory or its ancestors.
    NotFound,

    /// Returned when the configuration file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the configuration file isn't valid.
    Parse {
        path: PathBuf,
        err: serde_yaml::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                CONFIG_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening config file `{}`: {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading configuration `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Open { err, .. } => Some(err),
            Error::Parse { err, .. } => Some(err),
        }
    }
}

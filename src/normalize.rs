//! Rewrites each document's `author`/`authors` front matter into its
//! canonical form: a non-empty, ordered list of [`AuthorRecord`]s whose first
//! entry is the primary author. See [`normalize`].

use crate::author::{AuthorRecord, AuthorRegistry, ConfigurationError};
use crate::document::{AuthorRef, Document, RawDocument};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Resolves the authors of a borrowed [`RawDocument`] without consuming it.
/// The returned records are copies of the registry's records; only the first
/// one is marked primary. On failure the document is untouched.
pub fn resolve_authors(
    document: &RawDocument,
    registry: &AuthorRegistry,
) -> Result<Vec<AuthorRecord>> {
    let invalid = |problem| Error::Validation {
        path: document.path.clone(),
        problem,
    };

    let refs: &[AuthorRef] = match (&document.author, &document.authors) {
        (Some(_), Some(_)) => return Err(invalid(Problem::BothAuthorFields)),
        (Some(author), None) => std::slice::from_ref(author),
        (None, Some(authors)) => authors.as_slice(),
        (None, None) => &[],
    };
    if refs.is_empty() {
        return Err(invalid(Problem::NoAuthors));
    }

    let mut authors = Vec::with_capacity(refs.len());
    for author in refs {
        let id = match author {
            AuthorRef::Id(id) => id,
            AuthorRef::Resolved(_) => {
                return Err(invalid(Problem::AlreadyNormalized))
            }
        };
        match registry.get(id) {
            Some(record) => authors.push(AuthorRecord {
                primary: false,
                ..record.clone()
            }),
            None => return Err(invalid(Problem::UnknownAuthor(id.clone()))),
        }
    }
    authors[0].primary = true;
    Ok(authors)
}

/// Takes ownership of a [`RawDocument`] and returns its normalized
/// [`Document`]. Fails if the document names both or neither of `author` and
/// `authors`, names an author missing from `registry`, or was already
/// normalized.
pub fn normalize(
    document: RawDocument,
    registry: &AuthorRegistry,
) -> Result<Document> {
    let authors = resolve_authors(&document, registry)?;
    debug!(
        path = %document.path.display(),
        authors = ?authors.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
        "normalized authors"
    );
    Ok(Document::from_parts(document, authors))
}

/// Normalizes every document in order, stopping at the first failure. The
/// registry must define at least one author.
pub fn normalize_all(
    documents: Vec<RawDocument>,
    registry: Option<&AuthorRegistry>,
) -> Result<Vec<Document>> {
    let registry = AuthorRegistry::require(registry)?;
    debug!(authors = ?registry.ids().collect::<Vec<_>>(), "author registry");
    documents
        .into_iter()
        .map(|document| normalize(document, registry))
        .collect()
}

/// The result of a normalization.
pub type Result<T> = std::result::Result<T, Error>;

/// What's wrong with a document's author front matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// Both `author` and `authors` were set.
    BothAuthorFields,

    /// Neither `author` nor `authors` was set, or `authors` was empty.
    NoAuthors,

    /// An author entry was a resolved record rather than an identifier.
    AlreadyNormalized,

    /// An identifier isn't in the registry.
    UnknownAuthor(String),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Problem::BothAuthorFields => {
                write!(f, "You cannot specify both 'author' and 'authors'")
            }
            Problem::NoAuthors => {
                write!(f, "'author' or 'authors' is required")
            }
            Problem::AlreadyNormalized => {
                write!(f, "Authors are already normalized")
            }
            Problem::UnknownAuthor(id) => {
                write!(f, "Could not find author named '{}'", id)
            }
        }
    }
}

/// Represents an error normalizing a document's authors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when the registry is missing or empty.
    Configuration(ConfigurationError),

    /// Returned when a document's author front matter is invalid.
    Validation { path: PathBuf, problem: Problem },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Configuration(err) => err.fmt(f),
            Error::Validation { path, problem } => {
                write!(f, "{}\nPost: {}", problem, path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Configuration(err) => Some(err),
            Error::Validation { .. } => None,
        }
    }
}

impl From<ConfigurationError> for Error {
    /// Converts a [`ConfigurationError`] into an [`Error`]. This allows us to
    /// use the `?` operator when requiring a registry.
    fn from(err: ConfigurationError) -> Error {
        Error::Configuration(err)
    }
}

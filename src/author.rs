//! Defines the [`AuthorRecord`] and [`AuthorRegistry`] types. The registry is
//! loaded once from the `authors` key of the site configuration and is never
//! mutated afterwards; normalization hands out copies of its records.

use gtmpl_value::Value;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The free-form properties of an author (e.g., `name`, `bio`, `avatar`).
pub type Properties = BTreeMap<String, String>;

/// A single author. `id` and `primary` are managed by the engine; everything
/// else lives in `properties`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorRecord {
    /// The registry key this record was resolved from.
    pub id: String,

    /// The author's properties as written in the site configuration.
    pub properties: Properties,

    /// Whether this author is the primary author of a document. Always
    /// `false` for records stored in the registry.
    pub primary: bool,
}

impl AuthorRecord {
    /// Looks up a single property by name.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }
}

impl From<&AuthorRecord> for Value {
    /// Converts an [`AuthorRecord`] into a [`Value::Object`] for templating.
    /// The engine-managed `id` and `primary` fields take precedence over
    /// properties of the same name.
    fn from(record: &AuthorRecord) -> Value {
        let mut m: HashMap<String, Value> = record
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        m.insert("id".to_owned(), Value::String(record.id.clone()));
        m.insert("primary".to_owned(), Value::Bool(record.primary));
        Value::Object(m)
    }
}

/// Maps author identifiers to [`AuthorRecord`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Properties>")]
pub struct AuthorRegistry {
    authors: BTreeMap<String, AuthorRecord>,
}

impl From<BTreeMap<String, Properties>> for AuthorRegistry {
    fn from(authors: BTreeMap<String, Properties>) -> AuthorRegistry {
        AuthorRegistry {
            authors: authors
                .into_iter()
                .map(|(id, properties)| {
                    let record = AuthorRecord {
                        id: id.clone(),
                        properties,
                        primary: false,
                    };
                    (id, record)
                })
                .collect(),
        }
    }
}

impl AuthorRegistry {
    /// Returns the record registered under `id`, if any.
    pub fn get(&self, id: &str) -> Option<&AuthorRecord> {
        self.authors.get(id)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.authors.keys().map(String::as_str)
    }

    /// Validates an optional registry as loaded from configuration. A
    /// registry is only usable if it exists and holds at least one author.
    pub fn require(
        registry: Option<&AuthorRegistry>,
    ) -> Result<&AuthorRegistry, ConfigurationError> {
        match registry {
            Some(registry) if !registry.is_empty() => Ok(registry),
            _ => Err(ConfigurationError),
        }
    }
}

/// Returned when the site configuration defines no authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationError;

impl fmt::Display for ConfigurationError {
    /// Displays a [`ConfigurationError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "At least one author must be defined in the site configuration"
        )
    }
}

impl std::error::Error for ConfigurationError {}

//! Loads [`RawDocument`]s from markdown source files with YAML front matter.

use crate::document::{AuthorRef, Data, RawDocument};
use pulldown_cmark::{html, Parser as MarkdownParser};
use serde::Deserialize;
use std::ffi::OsStr;
use std::fmt;
use std::fs::File;
use std::path::Path;
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`RawDocument`]s from source files.
pub struct Parser<'a> {
    /// `posts_url` is prepended to each post's output path to form its URL
    /// (e.g., `/posts/` yields `/posts/2021/hello.html`).
    posts_url: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(posts_url: &'a str) -> Parser<'a> {
        Parser { posts_url }
    }

    /// Recursively searches `source_directory` for markdown files and parses
    /// each one. Posts are returned in path order. Each file must be
    /// structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter, optionally with `author` or `authors`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// authors: [jane, bob]
    /// ---
    /// # Hello
    /// ```
    pub fn parse_posts(
        &self,
        source_directory: &Path,
    ) -> Result<Vec<RawDocument>> {
        let mut posts = Vec::new();
        for result in WalkDir::new(source_directory)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = result?;
            let extension = entry.path().extension();
            if !entry.file_type().is_file()
                || extension != Some(OsStr::new(MARKDOWN_EXTENSION))
            {
                continue;
            }
            // strip_prefix shouldn't fail since `source_directory` is always
            // an ancestor of the entry
            let relative_path = entry
                .path()
                .strip_prefix(source_directory)
                .unwrap_or_else(|_| entry.path());
            posts.push(self.parse_post(entry.path(), relative_path)?);
        }
        Ok(posts)
    }

    fn parse_post(
        &self,
        full_path: &Path,
        relative_path: &Path,
    ) -> Result<RawDocument> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(full_path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(Error::Io)
            .and_then(|_| self.parse_str(relative_path, &contents))
            .map_err(|e| {
                Error::Annotated(
                    format!("parsing post `{}`", relative_path.display()),
                    Box::new(e),
                )
            })
    }

    /// Parses a single post from its source text. `relative_path` becomes the
    /// document's path.
    pub fn parse_str(
        &self,
        relative_path: &Path,
        input: &str,
    ) -> Result<RawDocument> {
        // The closing fence must be a line of its own; `---` may appear
        // inside front matter values.
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            let mut search = FENCE.len();
            while let Some(offset) = input[search..].find("\n---") {
                let yaml_stop = search + offset + 1;
                let body_start = yaml_stop + FENCE.len();
                let rest = &input[body_start..];
                if rest.is_empty()
                    || rest.starts_with('\n')
                    || rest.starts_with("\r\n")
                {
                    return Ok((FENCE.len(), yaml_stop, body_start));
                }
                search = body_start;
            }
            Err(Error::FrontmatterMissingEndFence)
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let yaml = &input[yaml_start..yaml_stop];
        let frontmatter: Frontmatter = if yaml.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        let mut post = RawDocument::new(relative_path);
        post.author = frontmatter.author;
        post.authors = frontmatter.authors;
        post.data = frontmatter.data;
        post.url = Some(format!(
            "{}{}",
            self.posts_url,
            relative_path.with_extension("html").display()
        ));
        let body = MarkdownParser::new(&input[body_start..]);
        html::push_html(&mut post.body, body);
        Ok(post)
    }
}

#[derive(Deserialize, Default)]
struct Frontmatter {
    #[serde(default)]
    author: Option<AuthorRef>,

    #[serde(default)]
    authors: Option<Vec<AuthorRef>>,

    #[serde(flatten)]
    data: Data,
}

/// Represents the result of a post-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a post.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`].
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

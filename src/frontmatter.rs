//! Front-matter extraction.
//!
//! A post file opens with a TOML block fenced by a line of `+++` (or `++++`)
//! and closed by the same fence. Everything after the closing fence is the
//! Markdown body:
//!
//! ```text
//! +++
//! title = "A"
//! date = 2024-10-12
//! images = ["static/a.jpg"]
//! +++
//! Body text in *Markdown*.
//! ```
//!
//! Blank lines before the opening fence are ignored. Fence lines may carry
//! surrounding whitespace. The two fence styles must not be mixed within one
//! file: a block opened with `++++` only closes on `++++`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("file is empty")]
    Empty,
    #[error("expected a `+++` or `++++` line before any content")]
    MissingOpeningDelimiter,
    #[error("no closing `{delimiter}` line")]
    MissingClosingDelimiter { delimiter: String },
    #[error("front matter is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Front-matter fence styles, longest first.
pub const DELIMITERS: [&str; 2] = ["++++", "+++"];

/// A parsed post source: metadata table plus raw Markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub metadata: toml::Table,
    pub body: String,
}

/// Split raw file content into its metadata table and body.
pub fn parse(content: &str) -> Result<Document, FrontMatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Err(FrontMatterError::Empty);
    }

    let mut lines = content.split_inclusive('\n');

    let delimiter = lines
        .by_ref()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| DELIMITERS.into_iter().find(|d| *d == line))
        .ok_or(FrontMatterError::MissingOpeningDelimiter)?;

    let mut metadata = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim() == delimiter {
            closed = true;
            break;
        }
        metadata.push_str(line);
    }
    if !closed {
        return Err(FrontMatterError::MissingClosingDelimiter {
            delimiter: delimiter.to_string(),
        });
    }

    let body: String = lines.collect();
    let metadata: toml::Table = toml::from_str(&metadata)?;

    Ok(Document {
        metadata,
        body: body.trim_start().to_string(),
    })
}

//! All error types for the l10nmsg crate.
//!
//! Fatal format violations abort the parse of one file and surface a
//! human-readable message naming the offending element or entry. Warnings
//! (unexpected text in structural positions) are logged via `log::warn!`
//! and never abort parsing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    /// Fatal structural violation in an otherwise well-formed source file:
    /// wrong root element, missing `name` attribute, invalid plural
    /// quantity, unparseable Fluent entry, and similar.
    #[error("format error: {0}")]
    Format(String),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a fatal format error.
    pub fn format_error(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }
}

//! Supported localization source formats.
//!
//! Each format module lifts its concrete syntax into the shared message
//! model in [`crate::types`]; the front ends are independent of each other.

pub mod android;
pub mod fluent;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{error::Error, types::Resource};

/// CLDR plural category names, in CLDR order.
pub(crate) const PLURAL_CATEGORIES: [&str; 6] = ["zero", "one", "two", "few", "many", "other"];

/// Identifies a supported localization source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatType {
    /// Android `strings.xml` resource format.
    AndroidStrings,
    /// Fluent `.ftl` format.
    Fluent,
}

impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::AndroidStrings => write!(f, "android"),
            FormatType::Fluent => write!(f, "fluent"),
        }
    }
}

impl FromStr for FormatType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "android" | "androidstrings" | "xml" => Ok(FormatType::AndroidStrings),
            "fluent" | "ftl" => Ok(FormatType::Fluent),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::AndroidStrings => "xml",
            FormatType::Fluent => "ftl",
        }
    }
}

/// Parses `source` as `format` with default options.
pub fn parse_resource(format: FormatType, source: &str) -> Result<Resource, Error> {
    match format {
        FormatType::AndroidStrings => android::parse(source, &android::AndroidOptions::default()),
        FormatType::Fluent => fluent::parse(source, true),
    }
}

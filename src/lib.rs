//! # l10nmsg
//!
//! A parsing core for localization resources: reads Android `strings.xml`
//! and Fluent `.ftl` files into one shared, format-agnostic message model.
//!
//! ## Features
//!
//! - Android strings: whitespace collapsing with `"..."` quoting, printf
//!   placeholders, Android escapes, `<xliff:g>` placeholder spans, plurals,
//!   string arrays, DOCTYPE entities, and resource references.
//! - Fluent: messages, terms, attributes, group and resource comments, and
//!   select expressions hoisted into message-level variants.
//! - A common [`Resource`] model with sections, entries, comments,
//!   metadata, and optional source line positions.
//! - JSON serialization of the model via serde.
//!
//! ## Example
//!
//! ```
//! use l10nmsg::{formats::FormatType, parse_resource};
//!
//! let source = r#"<resources><string name="hello">Hello %1$s</string></resources>"#;
//! let resource = parse_resource(FormatType::AndroidStrings, source).unwrap();
//! assert!(resource.find_entry(&["hello"]).is_some());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod formats;
pub mod linepos;
pub mod types;

pub use error::Error;
pub use formats::{FormatType, android, fluent, parse_resource};
pub use types::{
    AttributeValue, Comment, Entry, Expression, LinePos, Markup, MarkupKind, Message, Metadata,
    Pattern, PatternElement, PatternMessage, Resource, Section, SectionItem, SelectMessage, Value,
    VariableRef, Variant, VariantKey,
};

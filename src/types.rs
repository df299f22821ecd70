//! Core, format-agnostic message model for l10nmsg.
//! Format parsers lift their concrete syntax into these types.
//!
//! A [`Resource`] is an ordered list of [`Section`]s, each holding entries
//! and standalone comments in document order. Every [`Entry`] carries one
//! [`Message`]: either a flat pattern or a selector-based branching message
//! (plurals, gender, ...). All values are immutable trees built once per
//! parse call; nothing here is mutated after parsing returns.

use std::fmt::Display;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::{error::Error, formats::FormatType};

/// A complete parsed localization resource (one `strings.xml` or `.ftl` file).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Resource {
    /// Source format, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub format: Option<FormatType>,

    /// Leading resource-level comment.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub comment: String,

    /// Format-level metadata, insertion order preserved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub meta: Vec<Metadata>,

    /// Ordered list of sections. Most resources have a single root section.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Resource {
    /// Creates an empty resource for `format` with one root section.
    pub fn new(format: FormatType) -> Self {
        Resource {
            format: Some(format),
            comment: String::new(),
            meta: Vec::new(),
            sections: vec![Section::root()],
        }
    }

    /// Looks up a metadata value by key (first match wins).
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.value.as_str())
    }

    /// Finds an entry by its full id path, across all sections.
    pub fn find_entry(&self, id: &[&str]) -> Option<&Entry> {
        self.sections.iter().find_map(|s| {
            s.entries()
                .find(|e| e.id.len() == id.len() && e.id.iter().zip(id).all(|(a, b)| a == b))
        })
    }

    /// Iterates over all entries in document order, skipping comments.
    pub fn all_entries(&self) -> impl Iterator<Item = &Entry> {
        self.sections.iter().flat_map(|s| s.entries())
    }

    /// Reads a JSON-serialized resource from any reader.
    pub fn from_json_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        serde_json::from_reader(reader).map_err(Error::Parse)
    }

    /// Writes this resource as JSON to any writer (file, memory, etc.).
    pub fn to_json_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        serde_json::to_writer(&mut writer, self).map_err(Error::Parse)
    }
}

/// One key/value metadata pair. Keys may repeat across metadata sets but
/// are unique within one set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Metadata {
    pub key: String,
    pub value: String,
}

impl Metadata {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Metadata {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A group of entries, identified by an ordered id path.
/// The root section has an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Section {
    /// Section id path; empty for the root/default section.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub id: Vec<String>,

    /// Section-level comment.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub comment: String,

    /// Entries and standalone comments, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub items: Vec<SectionItem>,

    /// Source line span, when position tracking was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub linepos: Option<LinePos>,
}

impl Section {
    /// Creates the root section (empty id path).
    pub fn root() -> Self {
        Section::default()
    }

    /// Creates a named section.
    pub fn new(id: Vec<String>) -> Self {
        Section {
            id,
            ..Section::default()
        }
    }

    /// Iterates over the entries of this section, skipping comments.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.items.iter().filter_map(|item| match item {
            SectionItem::Entry(e) => Some(e),
            SectionItem::Comment(_) => None,
        })
    }
}

/// Either a localizable entry or a standalone comment between entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum SectionItem {
    Entry(Entry),
    Comment(Comment),
}

/// A standalone comment that is not attached to any entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Comment {
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub linepos: Option<LinePos>,
}

/// A single localizable unit, identified by an ordered id path,
/// e.g. `["greeting"]` or `["planets", "2"]` for a string-array item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entry {
    /// Full entry id path.
    pub id: Vec<String>,

    /// Primary message value.
    pub value: Message,

    /// Named secondary messages (Fluent attributes), insertion order
    /// preserved, names unique per entry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub properties: Vec<(String, Message)>,

    /// Comment attached to this entry.
    #[serde(skip_serializing_if = "String::is_empty")]
    #[serde(default)]
    pub comment: String,

    /// Format-specific metadata (e.g. XML attributes other than `name`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub meta: Vec<Metadata>,

    /// Source line span, when position tracking was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub linepos: Option<LinePos>,
}

impl Entry {
    /// Creates an entry with only an id and value.
    pub fn new(id: Vec<String>, value: Message) -> Self {
        Entry {
            id,
            value,
            properties: Vec::new(),
            comment: String::new(),
            meta: Vec::new(),
            linepos: None,
        }
    }

    /// Looks up a property message by name.
    pub fn property(&self, name: &str) -> Option<&Message> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entry {{ id: {} }}", self.id.join("."))
    }
}

/// An ordered sequence of pattern elements forming one rendered message.
pub type Pattern = Vec<PatternElement>;

/// One element of a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum PatternElement {
    /// Literal text.
    Text(String),
    /// A placeholder expression.
    Expression(Expression),
    /// An explicit open/close/standalone markup tag.
    Markup(Markup),
}

/// The value of an entry: either a flat pattern or a branching select.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Message {
    Pattern(PatternMessage),
    Select(SelectMessage),
}

impl Message {
    /// An empty pattern message.
    pub fn empty() -> Self {
        Message::Pattern(PatternMessage::default())
    }

    /// Returns the flat pattern, if this is a pattern message.
    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Message::Pattern(p) => Some(&p.pattern),
            Message::Select(_) => None,
        }
    }

    /// Returns the select message, if this is one.
    pub fn as_select(&self) -> Option<&SelectMessage> {
        match self {
            Message::Pattern(_) => None,
            Message::Select(s) => Some(s),
        }
    }
}

/// A message with a single flat pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct PatternMessage {
    pub pattern: Pattern,
}

impl PatternMessage {
    pub fn new(pattern: Pattern) -> Self {
        PatternMessage { pattern }
    }

    /// Concatenates the literal text of the pattern, ignoring expressions
    /// and markup.
    pub fn text(&self) -> String {
        pattern_text(&self.pattern)
    }
}

/// Concatenates the literal text elements of a pattern.
pub fn pattern_text(pattern: &Pattern) -> String {
    pattern
        .iter()
        .filter_map(|el| match el {
            PatternElement::Text(s) => Some(s.as_str()),
            _ => None,
        })
        .collect()
}

/// A message whose rendering branches on one or more selector expressions.
///
/// Every variant's key list has exactly one key per selector, in selector
/// order. The catchall key marks the default branch for its selector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectMessage {
    /// Declared variable name -> selector-producing expression,
    /// insertion order preserved.
    pub declarations: Vec<(String, Expression)>,

    /// Selector variable references, in discovery order.
    pub selectors: Vec<VariableRef>,

    /// Variant patterns keyed by per-selector key tuples.
    pub variants: Vec<Variant>,
}

impl SelectMessage {
    /// Finds the variant matching `keys` exactly.
    pub fn variant(&self, keys: &[VariantKey]) -> Option<&Variant> {
        self.variants.iter().find(|v| v.keys == keys)
    }
}

/// One branch of a [`SelectMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Variant {
    pub keys: Vec<VariantKey>,
    pub pattern: Pattern,
}

/// A variant branch label: a plain literal, or the catchall/default marker
/// wrapping the same value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum VariantKey {
    Literal(String),
    Catchall(String),
}

impl VariantKey {
    /// The key value, ignoring catchall status.
    pub fn value(&self) -> &str {
        match self {
            VariantKey::Literal(s) | VariantKey::Catchall(s) => s,
        }
    }

    pub fn is_catchall(&self) -> bool {
        matches!(self, VariantKey::Catchall(_))
    }
}

/// A placeholder expression: an optional argument with an optional function
/// annotation, options, and free-form attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Expression {
    /// The argument: a literal (strings and numbers both carry their source
    /// text), a variable reference, or nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub arg: Option<Value>,

    /// Function annotation, e.g. `"number"` or `"string"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub function: Option<String>,

    /// Function options, insertion order preserved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub options: Vec<(String, Value)>,

    /// Free-form attributes, e.g. `translate: no` or `source: "%1$s"`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub attributes: Vec<(String, AttributeValue)>,
}

impl Expression {
    /// A literal-argument expression with no annotation.
    pub fn literal(value: impl Into<String>) -> Self {
        Expression {
            arg: Some(Value::Literal(value.into())),
            ..Expression::default()
        }
    }

    /// A variable-reference expression with no annotation.
    pub fn variable(name: impl Into<String>) -> Self {
        Expression {
            arg: Some(Value::Variable(VariableRef::new(name))),
            ..Expression::default()
        }
    }

    /// Sets the function annotation.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Appends an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.push((name.into(), value));
        self
    }

    /// Records the original source text of this placeholder.
    pub fn with_source(self, source: impl Into<String>) -> Self {
        self.with_attribute("source", AttributeValue::Literal(source.into()))
    }

    /// Looks up an attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// An argument or option value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Value {
    Literal(String),
    Variable(VariableRef),
}

/// An attribute value: a string, or a bare flag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum AttributeValue {
    Literal(String),
    True,
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Literal(s) => Some(s),
            AttributeValue::True => None,
        }
    }
}

/// An explicit markup tag preserved in a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Markup {
    pub kind: MarkupKind,
    pub name: String,

    /// Tag options (attributes of the source element), only meaningful for
    /// opening tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub options: Vec<(String, Value)>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub attributes: Vec<(String, AttributeValue)>,
}

impl Markup {
    pub fn open(name: impl Into<String>) -> Self {
        Markup {
            kind: MarkupKind::Open,
            name: name.into(),
            options: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn close(name: impl Into<String>) -> Self {
        Markup {
            kind: MarkupKind::Close,
            name: name.into(),
            options: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

/// Markup tag kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupKind {
    Open,
    Close,
    Standalone,
}

/// A reference to a declared or implicit variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VariableRef {
    pub name: String,
}

impl VariableRef {
    pub fn new(name: impl Into<String>) -> Self {
        VariableRef { name: name.into() }
    }
}

/// 1-based source line numbers for one entry, section, or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LinePos {
    /// First line of the attached comment, or of the entry itself.
    pub start: u32,
    /// Line of the entry key.
    pub key: u32,
    /// First line of the value.
    pub value: u32,
    /// Last line of the value (inclusive).
    pub end: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_resource() -> Resource {
        let mut res = Resource::new(FormatType::AndroidStrings);
        res.meta.push(Metadata::new(
            "xmlns:xliff",
            "urn:oasis:names:tc:xliff:document:1.2",
        ));
        res.sections[0].items.push(SectionItem::Entry(Entry::new(
            vec!["hello".to_string()],
            Message::Pattern(PatternMessage::new(vec![
                PatternElement::Text("Hello ".to_string()),
                PatternElement::Expression(
                    Expression::variable("arg1")
                        .with_function("string")
                        .with_source("%1$s"),
                ),
                PatternElement::Text("!".to_string()),
            ])),
        )));
        res
    }

    #[test]
    fn test_find_entry() {
        let res = sample_resource();
        assert!(res.find_entry(&["hello"]).is_some());
        assert!(res.find_entry(&["missing"]).is_none());
        assert!(res.find_entry(&["hello", "0"]).is_none());
    }

    #[test]
    fn test_meta_value() {
        let res = sample_resource();
        assert_eq!(
            res.meta_value("xmlns:xliff"),
            Some("urn:oasis:names:tc:xliff:document:1.2")
        );
        assert_eq!(res.meta_value("xmlns"), None);
    }

    #[test]
    fn test_pattern_text_skips_placeholders() {
        let res = sample_resource();
        let entry = res.find_entry(&["hello"]).unwrap();
        let pattern = entry.value.as_pattern().unwrap();
        assert_eq!(pattern_text(pattern), "Hello !");
    }

    #[test]
    fn test_expression_attribute_lookup() {
        let expr = Expression::variable("arg1").with_source("%1$s");
        assert_eq!(
            expr.attribute("source").and_then(AttributeValue::as_str),
            Some("%1$s")
        );
        assert!(expr.attribute("translate").is_none());
    }

    #[test]
    fn test_variant_key_accessors() {
        let literal = VariantKey::Literal("one".to_string());
        let catchall = VariantKey::Catchall("other".to_string());
        assert_eq!(literal.value(), "one");
        assert_eq!(catchall.value(), "other");
        assert!(!literal.is_catchall());
        assert!(catchall.is_catchall());
        assert_ne!(
            VariantKey::Literal("other".to_string()),
            VariantKey::Catchall("other".to_string())
        );
    }

    #[test]
    fn test_select_message_variant_lookup() {
        let msg = SelectMessage {
            declarations: vec![(
                "quantity".to_string(),
                Expression::variable("quantity").with_function("number"),
            )],
            selectors: vec![VariableRef::new("quantity")],
            variants: vec![
                Variant {
                    keys: vec![VariantKey::Literal("one".to_string())],
                    pattern: vec![PatternElement::Text("One".to_string())],
                },
                Variant {
                    keys: vec![VariantKey::Catchall("other".to_string())],
                    pattern: vec![PatternElement::Text("Many".to_string())],
                },
            ],
        };
        assert!(
            msg.variant(&[VariantKey::Literal("one".to_string())])
                .is_some()
        );
        assert!(
            msg.variant(&[VariantKey::Literal("other".to_string())])
                .is_none()
        );
        assert!(
            msg.variant(&[VariantKey::Catchall("other".to_string())])
                .is_some()
        );
    }

    #[test]
    fn test_entry_property_lookup() {
        let mut entry = Entry::new(vec!["key".to_string()], Message::empty());
        entry.properties.push((
            "title".to_string(),
            Message::Pattern(PatternMessage::new(vec![PatternElement::Text(
                "Title".to_string(),
            )])),
        ));
        assert!(entry.property("title").is_some());
        assert!(entry.property("label").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let res = sample_resource();
        let mut out = Vec::new();
        res.to_json_writer(&mut out).unwrap();
        let parsed = Resource::from_json_reader(std::io::Cursor::new(out)).unwrap();
        assert_eq!(res, parsed);
    }

    #[test]
    fn test_message_empty() {
        let msg = Message::empty();
        assert_eq!(msg.as_pattern().map(Vec::len), Some(0));
        assert!(msg.as_select().is_none());
    }
}

//! Minimal XML document tree for the Android front end.
//!
//! Built on quick-xml events. General entity references are *not* resolved:
//! they stay in the tree as [`Node::Entity`] so the lifting step can turn
//! them into entity expressions. Predefined entities (`&lt;`, `&amp;`, ...)
//! and character references decode to text. Internal-DTD `<!ENTITY>`
//! declarations and comments preceding the root element are captured on the
//! [`Document`].

use lazy_static::lazy_static;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use crate::error::Error;

lazy_static! {
    static ref ENTITY_DECL: Regex =
        Regex::new(r#"<!ENTITY\s+(\S+)\s+(?:"([^"]*)"|'([^']*)')"#).unwrap();
}

/// One node in the document tree, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    /// An unresolved general entity reference, by name.
    Entity(String),
}

/// An element with its attributes and child nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the source, e.g. `xliff:g`.
    pub name: String,
    pub prefix: Option<String>,
    pub local: String,
    /// Resolved namespace URI of this element's prefix, if any.
    pub namespace: Option<String>,
    /// Attributes in document order, excluding namespace declarations.
    pub attributes: Vec<(String, String)>,
    /// Namespace declarations on this element, keyed `xmlns` or `xmlns:p`.
    pub ns_decls: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Looks up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// True if the element has no element, entity, or comment children.
    /// Text children are permitted.
    pub fn has_only_text(&self) -> bool {
        self.children
            .iter()
            .all(|c| matches!(c, Node::Text(_)))
    }

    /// Concatenated text of all direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Node::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A parsed document: the root element plus document-level trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Comments appearing before the root element, in document order.
    pub leading_comments: Vec<String>,
    /// Internal-DTD general entity declarations, in declaration order.
    pub entities: Vec<(String, String)>,
    pub root: Element,
}

/// Parses `source` into a [`Document`] without resolving general entities.
pub fn parse_document(source: &str) -> Result<Document, Error> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().expand_empty_elements = true;

    let mut leading_comments = Vec::new();
    let mut entities = Vec::new();
    // Stack of open elements; the finished root ends up in `root`.
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    // Namespace scopes for prefix resolution, innermost last.
    let mut ns_scopes: Vec<Vec<(String, String)>> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(Error::format_error("multiple root elements"));
                }
                let qname = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut attributes = Vec::new();
                let mut ns_decls = Vec::new();
                for attr in start.attributes() {
                    let attr = attr?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr.unescape_value()?.into_owned();
                    if key == "xmlns" || key.starts_with("xmlns:") {
                        ns_decls.push((key, value));
                    } else {
                        attributes.push((key, value));
                    }
                }
                ns_scopes.push(ns_decls.clone());
                let (prefix, local) = match qname.split_once(':') {
                    Some((p, l)) => (Some(p.to_string()), l.to_string()),
                    None => (None, qname.clone()),
                };
                let namespace = resolve_ns(&ns_scopes, prefix.as_deref());
                stack.push(Element {
                    name: qname,
                    prefix,
                    local,
                    namespace,
                    attributes,
                    ns_decls,
                    children: Vec::new(),
                });
            }
            Event::End(_) => {
                ns_scopes.pop();
                let el = stack
                    .pop()
                    .ok_or_else(|| Error::format_error("unexpected closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(el)),
                    None => root = Some(el),
                }
            }
            Event::Text(text) => {
                // Entity references arrive separately as GeneralRef events,
                // so text only needs decoding.
                let value = text.decode().map_err(quick_xml::Error::from)?.into_owned();
                if let Some(el) = stack.last_mut() {
                    push_text(&mut el.children, &value);
                }
            }
            Event::CData(cdata) => {
                let value = String::from_utf8_lossy(&cdata).into_owned();
                if let Some(el) = stack.last_mut() {
                    push_text(&mut el.children, &value);
                }
            }
            Event::GeneralRef(entity) => {
                let name = entity
                    .decode()
                    .map_err(|e| Error::format_error(e.to_string()))?
                    .into_owned();
                let target = match stack.last_mut() {
                    Some(el) => &mut el.children,
                    // References outside the root are not meaningful.
                    None => continue,
                };
                match resolve_builtin_ref(&name) {
                    Some(c) => {
                        let mut buf = [0u8; 4];
                        push_text(target, c.encode_utf8(&mut buf));
                    }
                    None => target.push(Node::Entity(name)),
                }
            }
            Event::Comment(comment) => {
                let value = String::from_utf8_lossy(&comment).into_owned();
                match stack.last_mut() {
                    Some(el) => el.children.push(Node::Comment(value)),
                    None if root.is_none() => leading_comments.push(value),
                    // Comments after the root element close are dropped.
                    None => {}
                }
            }
            Event::DocType(doctype) => {
                let text = String::from_utf8_lossy(&doctype).into_owned();
                for caps in ENTITY_DECL.captures_iter(&text) {
                    let name = &caps[1];
                    if name.starts_with('%') {
                        // Parameter entities are not localizable content.
                        continue;
                    }
                    let value = caps
                        .get(2)
                        .or_else(|| caps.get(3))
                        .map(|m| m.as_str())
                        .unwrap_or_default();
                    entities.push((name.to_string(), value.to_string()));
                }
            }
            Event::Decl(_) | Event::PI(_) => {}
            Event::Empty(_) => {
                // Unreachable with expand_empty_elements enabled.
            }
            Event::Eof => break,
        }
    }

    let root = root.ok_or_else(|| Error::format_error("no root element"))?;
    Ok(Document {
        leading_comments,
        entities,
        root,
    })
}

/// Appends text, merging with a directly preceding text node.
fn push_text(children: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(prev)) = children.last_mut() {
        prev.push_str(text);
    } else {
        children.push(Node::Text(text.to_string()));
    }
}

/// Resolves a namespace prefix against the current scope stack.
fn resolve_ns(scopes: &[Vec<(String, String)>], prefix: Option<&str>) -> Option<String> {
    let key = match prefix {
        Some(p) => format!("xmlns:{p}"),
        None => "xmlns".to_string(),
    };
    scopes
        .iter()
        .rev()
        .find_map(|scope| scope.iter().find(|(k, _)| *k == key))
        .map(|(_, v)| v.clone())
}

/// Resolves predefined entities and character references to their character.
/// General entities return `None` and stay unresolved.
fn resolve_builtin_ref(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

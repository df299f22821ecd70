//! Support for the Fluent (`.ftl`) localization format.
//!
//! Messages and terms become entries; term ids keep a `-` sigil. Attribute
//! values land in [`Entry::properties`]. Group comments open sections,
//! resource comments accumulate into the resource comment, and a leading
//! standalone comment becomes `info` metadata. Message and term references
//! are represented by `message` function annotations; function names are
//! lower-cased, so e.g. the Fluent `NUMBER` is `number` here.

mod message;
mod spans;

use fluent_syntax::ast;
use fluent_syntax::parser::{self, ParserError};

use crate::{
    error::Error,
    formats::FormatType,
    linepos::LinePosMapper,
    types::{Comment, Entry, Message, Metadata, Resource, Section, SectionItem},
};

use spans::SpanScanner;

/// Parses a `.ftl` file into a message resource.
///
/// With `with_linepos`, entries, sections, and standalone comments carry
/// 1-based source line positions.
pub fn parse(source: &str, with_linepos: bool) -> Result<Resource, Error> {
    let (ast, errors) = match parser::parse(source) {
        Ok(ast) => (ast, Vec::new()),
        Err((partial, errors)) => (partial, errors),
    };
    lift(&ast.body, with_linepos.then_some(source), &errors)
}

/// Lifts an already-parsed Fluent AST into a message resource.
///
/// No line positions are attached, as the AST carries no source offsets.
pub fn lift_resource(ast: &ast::Resource<&str>) -> Result<Resource, Error> {
    lift(&ast.body, None, &[])
}

/// Parses a single Fluent message or term into an entry, with line
/// positions.
pub fn parse_entry(source: &str) -> Result<Entry, Error> {
    let ast = match parser::parse(source) {
        Ok(ast) => ast,
        Err((partial, _)) => partial,
    };
    let mut pos = Position::new(Some(source));
    match ast.body.first() {
        Some(ast::Entry::Message(m)) => lift_message(m, &mut pos),
        Some(ast::Entry::Term(t)) => lift_term(t, &mut pos),
        _ => Err(Error::format_error("source is not a Fluent entry")),
    }
}

/// Parses a Fluent pattern into a message.
///
/// Leading whitespace is stripped; all lines after the first are indented
/// so that the body parses as one value.
pub fn parse_message(source: &str) -> Result<Message, Error> {
    let body = format!("m = {}", source.trim_start().replace('\n', "\n "));
    let ast = match parser::parse(body.as_str()) {
        Ok(ast) => ast,
        Err((_, errors)) => {
            let reason = errors
                .first()
                .map(ParserError::to_string)
                .unwrap_or_else(|| "Fluent parser error".to_string());
            return Err(Error::format_error(reason));
        }
    };
    match ast.body.first() {
        Some(ast::Entry::Message(m)) => match &m.value {
            Some(value) => message::message(value),
            None => Err(Error::format_error("Fluent parser error")),
        },
        _ => Err(Error::format_error("Fluent parser error")),
    }
}

/// Line position machinery, active only when a source buffer is at hand.
struct Position<'a> {
    inner: Option<(LinePosMapper, SpanScanner<'a>)>,
}

impl<'a> Position<'a> {
    fn new(source: Option<&'a str>) -> Self {
        Position {
            inner: source.map(|src| (LinePosMapper::new(src), SpanScanner::new(src))),
        }
    }

    /// Consumes the next comment block of `level` hashes, returning its
    /// line position.
    fn comment(&mut self, level: usize) -> Option<crate::types::LinePos> {
        self.inner.as_mut().map(|(lpm, scanner)| {
            let (start, end) = scanner.comment_block(level);
            lpm.get_linepos(start, start, start, end)
        })
    }

    /// Consumes the next entry named `name`, returning its line position.
    fn entry(
        &mut self,
        name: &str,
        is_term: bool,
        has_comment: bool,
    ) -> Option<crate::types::LinePos> {
        self.inner.as_mut().map(|(lpm, scanner)| {
            let sp = scanner.entry(name, is_term, has_comment);
            lpm.get_linepos(sp.start, sp.key, sp.value, sp.end)
        })
    }
}

fn lift(
    body: &[ast::Entry<&str>],
    source: Option<&str>,
    errors: &[ParserError],
) -> Result<Resource, Error> {
    let mut res = Resource::new(FormatType::Fluent);
    let mut pos = Position::new(source);
    let mut errors = errors.iter();

    let mut body = body;
    if let Some(ast::Entry::Comment(first)) = body.first() {
        let content = comment_content(first);
        if !content.is_empty() {
            res.meta.push(Metadata::new("info", content));
            pos.comment(1);
            body = &body[1..];
        }
    }

    let mut done: Vec<Section> = Vec::new();
    let mut section = Section::root();
    for entry in body {
        match entry {
            ast::Entry::Message(m) => {
                section
                    .items
                    .push(SectionItem::Entry(lift_message(m, &mut pos)?));
            }
            ast::Entry::Term(t) => {
                section
                    .items
                    .push(SectionItem::Entry(lift_term(t, &mut pos)?));
            }
            ast::Entry::ResourceComment(c) => {
                pos.comment(3);
                let content = comment_content(c);
                if !content.is_empty() {
                    res.comment = if res.comment.is_empty() {
                        content
                    } else {
                        format!("{}\n\n{}", res.comment.trim_end(), content)
                    };
                }
            }
            ast::Entry::GroupComment(c) => {
                let linepos = pos.comment(2);
                if !section.items.is_empty() || !section.comment.is_empty() {
                    done.push(std::mem::replace(&mut section, Section::root()));
                }
                section.comment = comment_content(c);
                section.linepos = linepos;
            }
            ast::Entry::Comment(c) => {
                let linepos = pos.comment(1);
                let content = comment_content(c);
                if !content.is_empty() {
                    section
                        .items
                        .push(SectionItem::Comment(Comment { content, linepos }));
                }
            }
            ast::Entry::Junk { .. } => {
                let mut reason = errors
                    .next()
                    .map(ParserError::to_string)
                    .unwrap_or_default();
                if reason.is_empty() {
                    reason = "Fluent parser error".to_string();
                }
                if let Some(last) = section.items.last() {
                    let prev_entry = section.items.iter().rev().find_map(|item| match item {
                        SectionItem::Entry(e) => Some(e),
                        SectionItem::Comment(_) => None,
                    });
                    if let Some(prev) = prev_entry {
                        reason.push_str(&format!(" after message {}", prev.id.join(".")));
                    }
                    let linepos = match last {
                        SectionItem::Entry(e) => e.linepos,
                        SectionItem::Comment(c) => c.linepos,
                    };
                    if let Some(lp) = linepos {
                        reason.push_str(&format!(" at line {}", lp.end));
                    }
                }
                return Err(Error::format_error(reason));
            }
        }
    }
    done.push(section);
    res.sections = done;
    Ok(res)
}

fn lift_message(m: &ast::Message<&str>, pos: &mut Position) -> Result<Entry, Error> {
    let linepos = pos.entry(m.id.name, false, m.comment.is_some());
    let mut entry = fluent_entry(
        m.id.name,
        false,
        m.value.as_ref(),
        &m.attributes,
        m.comment.as_ref(),
    )
    .map_err(|err| {
        Error::format_error(format!("error parsing message {}: {err}", m.id.name))
    })?;
    entry.linepos = linepos;
    Ok(entry)
}

fn lift_term(t: &ast::Term<&str>, pos: &mut Position) -> Result<Entry, Error> {
    let linepos = pos.entry(t.id.name, true, t.comment.is_some());
    let mut entry = fluent_entry(
        t.id.name,
        true,
        Some(&t.value),
        &t.attributes,
        t.comment.as_ref(),
    )
    .map_err(|err| {
        Error::format_error(format!("error parsing message {}: {err}", t.id.name))
    })?;
    entry.linepos = linepos;
    Ok(entry)
}

fn fluent_entry(
    name: &str,
    is_term: bool,
    value: Option<&ast::Pattern<&str>>,
    attributes: &[ast::Attribute<&str>],
    comment: Option<&ast::Comment<&str>>,
) -> Result<Entry, Error> {
    let id = if is_term {
        format!("-{name}")
    } else {
        name.to_string()
    };
    let value = match value {
        Some(pattern) => message::message(pattern)?,
        None => Message::empty(),
    };
    let mut entry = Entry::new(vec![id], value);
    entry.comment = comment.map(comment_content).unwrap_or_default();
    for attr in attributes {
        entry
            .properties
            .push((attr.id.name.to_string(), message::message(&attr.value)?));
    }
    Ok(entry)
}

fn comment_content(c: &ast::Comment<&str>) -> String {
    c.content.join("\n")
}

//! Lifting of Fluent patterns into the shared message model.
//!
//! A pattern with no select expressions lifts to a flat pattern message.
//! Select expressions anywhere in the pattern, including nested ones, are
//! hoisted to message level: the result is a single [`SelectMessage`] over
//! the Cartesian product of the distinct selectors' key sets, with each
//! variant's pattern assembled from the elements reachable under its keys.

use fluent_syntax::ast;
use fluent_syntax::unicode::unescape_unicode_to_string;

use crate::{
    error::Error,
    formats::PLURAL_CATEGORIES,
    types::{
        Expression, Message, Pattern, PatternElement, PatternMessage, SelectMessage, Value,
        VariableRef, Variant, VariantKey,
    },
};

/// One variant key: its name, whether it was written as a number, and
/// whether it is the declared default.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Key {
    name: String,
    numeric: bool,
    default: bool,
}

/// One distinct selector: its lifted expression, the AST selector nodes it
/// was merged from (compared by identity during traversal), and all keys
/// seen across those occurrences.
struct SelectorData<'a> {
    expression: Expression,
    ftl: Vec<&'a ast::InlineExpression<&'a str>>,
    keys: Vec<Key>,
}

/// Lifts one Fluent pattern into a message.
pub(super) fn message(ftl_pattern: &ast::Pattern<&str>) -> Result<Message, Error> {
    let mut sel_data = Vec::new();
    find_selectors(ftl_pattern, &mut sel_data)?;

    let mut variants: Vec<(Vec<Key>, Pattern)> = if sel_data.is_empty() {
        vec![(Vec::new(), Pattern::new())]
    } else {
        let key_lists: Vec<Vec<Key>> = sel_data.iter().map(|sd| ordered_keys(&sd.keys)).collect();
        cartesian(&key_lists)
    };
    let mut filter: Vec<Option<Key>> = vec![None; sel_data.len()];
    let mut var_names: Vec<String> = Vec::new();
    add_pattern(
        ftl_pattern,
        &sel_data,
        &mut filter,
        &mut variants,
        &mut var_names,
    )?;

    if sel_data.is_empty() {
        let pattern = variants.into_iter().next().map(|(_, p)| p).unwrap_or_default();
        return Ok(Message::Pattern(PatternMessage::new(pattern)));
    }

    let mut declarations = Vec::new();
    let mut selectors = Vec::new();
    for sd in &sel_data {
        let stem = match &sd.expression.arg {
            Some(Value::Variable(v)) => v.name.clone(),
            _ => String::new(),
        };
        let mut name = stem.clone();
        let mut i = 0;
        while name.is_empty() || var_names.contains(&name) {
            i += 1;
            name = format!("{stem}_{i}");
        }
        declarations.push((name.clone(), sd.expression.clone()));
        selectors.push(VariableRef::new(name.clone()));
        var_names.push(name);
    }
    let variants = variants
        .into_iter()
        .filter(|(_, pattern)| !pattern.is_empty())
        .map(|(keys, pattern)| Variant {
            keys: keys
                .into_iter()
                .map(|k| {
                    if k.default {
                        VariantKey::Catchall(k.name)
                    } else {
                        VariantKey::Literal(k.name)
                    }
                })
                .collect(),
            pattern,
        })
        .collect();
    Ok(Message::Select(SelectMessage {
        declarations,
        selectors,
        variants,
    }))
}

/// De-duplicates keys preserving first-seen order, then sorts stably so
/// that non-numeric non-default keys come first, numeric keys after them,
/// and default keys last.
fn ordered_keys(keys: &[Key]) -> Vec<Key> {
    let mut out: Vec<Key> = Vec::new();
    for key in keys {
        if !out.contains(key) {
            out.push(key.clone());
        }
    }
    out.sort_by_key(|k| (k.default, k.numeric));
    out
}

/// Key tuples for the Cartesian product of the per-selector key lists,
/// each paired with an empty pattern.
fn cartesian(key_lists: &[Vec<Key>]) -> Vec<(Vec<Key>, Pattern)> {
    let mut combos: Vec<Vec<Key>> = vec![Vec::new()];
    for list in key_lists {
        let mut next = Vec::with_capacity(combos.len() * list.len());
        for combo in &combos {
            for key in list {
                let mut keys = combo.clone();
                keys.push(key.clone());
                next.push(keys);
            }
        }
        combos = next;
    }
    combos.into_iter().map(|keys| (keys, Pattern::new())).collect()
}

/// Collects the distinct selectors of all select expressions in `pattern`,
/// in discovery order. Selectors whose lifted expressions are structurally
/// equal are merged.
fn find_selectors<'a>(
    pattern: &'a ast::Pattern<&'a str>,
    result: &mut Vec<SelectorData<'a>>,
) -> Result<(), Error> {
    for el in &pattern.elements {
        if let ast::PatternElement::Placeable {
            expression: ast::Expression::Select { selector, variants },
        } = el
        {
            let keys: Vec<Key> = variants.iter().map(variant_key).collect();
            let lifted = select_expression(selector, &keys)?;
            match result.iter_mut().find(|sd| sd.expression == lifted) {
                Some(prev) => {
                    prev.ftl.push(selector);
                    prev.keys.extend(keys);
                }
                None => result.push(SelectorData {
                    expression: lifted,
                    ftl: vec![selector],
                    keys,
                }),
            }
            for v in variants {
                find_selectors(&v.value, result)?;
            }
        }
    }
    Ok(())
}

/// Appends the elements of `pattern` to every variant consistent with the
/// active key filters, recursing into select expressions.
fn add_pattern<'a>(
    pattern: &'a ast::Pattern<&'a str>,
    sel_data: &[SelectorData<'a>],
    filter: &mut [Option<Key>],
    variants: &mut [(Vec<Key>, Pattern)],
    var_names: &mut Vec<String>,
) -> Result<(), Error> {
    for el in &pattern.elements {
        let mut exp = match el {
            ast::PatternElement::TextElement { value } => {
                for (_, pattern) in matching(variants, filter) {
                    if let Some(PatternElement::Text(prev)) = pattern.last_mut() {
                        prev.push_str(value);
                    } else {
                        pattern.push(PatternElement::Text((*value).to_string()));
                    }
                }
                continue;
            }
            ast::PatternElement::Placeable { expression } => expression,
        };
        while let ast::Expression::Inline(ast::InlineExpression::Placeable { expression }) = exp {
            exp = expression.as_ref();
        }
        match exp {
            ast::Expression::Select {
                selector,
                variants: ftl_variants,
            } => {
                let idx = sel_data
                    .iter()
                    .position(|sd| sd.ftl.iter().any(|s| std::ptr::eq(*s, selector)))
                    .ok_or_else(|| Error::format_error("selector not found"))?;
                let prev = filter[idx].take();
                for v in ftl_variants {
                    filter[idx] = Some(variant_key(v));
                    add_pattern(&v.value, sel_data, filter, variants, var_names)?;
                }
                filter[idx] = prev;
            }
            ast::Expression::Inline(inline) => {
                let expr = inline_expression(inline)?;
                if let Some(Value::Variable(v)) = &expr.arg
                    && !var_names.contains(&v.name)
                {
                    var_names.push(v.name.clone());
                }
                for (_, pattern) in matching(variants, filter) {
                    pattern.push(PatternElement::Expression(expr.clone()));
                }
            }
        }
    }
    Ok(())
}

/// The variants whose key tuple is consistent with every active filter.
fn matching<'v>(
    variants: &'v mut [(Vec<Key>, Pattern)],
    filter: &[Option<Key>],
) -> impl Iterator<Item = &'v mut (Vec<Key>, Pattern)> {
    let filter = filter.to_vec();
    variants.iter_mut().filter(move |(keys, _)| {
        keys.iter()
            .zip(&filter)
            .all(|(key, filt)| filt.as_ref().is_none_or(|f| key == f))
    })
}

fn variant_key(v: &ast::Variant<&str>) -> Key {
    match &v.key {
        ast::VariantKey::Identifier { name } => Key {
            name: (*name).to_string(),
            numeric: false,
            default: v.default,
        },
        ast::VariantKey::NumberLiteral { value } => Key {
            name: (*value).to_string(),
            numeric: true,
            default: v.default,
        },
    }
}

/// Lifts a select expression's selector. A variable selected over plural
/// categories or numeric keys annotates as `number`, other variables as
/// `string`.
fn select_expression(
    selector: &ast::InlineExpression<&str>,
    keys: &[Key],
) -> Result<Expression, Error> {
    match selector {
        ast::InlineExpression::VariableReference { id } => {
            let function = if keys
                .iter()
                .all(|k| k.numeric || PLURAL_CATEGORIES.contains(&k.name.as_str()))
            {
                "number"
            } else {
                "string"
            };
            Ok(Expression::variable(id.name).with_function(function))
        }
        ast::InlineExpression::StringLiteral { value } => {
            Ok(Expression::literal(unescape(value)).with_function("string"))
        }
        other => inline_expression(other),
    }
}

/// Lifts one inline expression. Message and term references annotate as
/// `message` with the term `-` sigil kept in the literal; function names
/// are lower-cased.
fn inline_expression(exp: &ast::InlineExpression<&str>) -> Result<Expression, Error> {
    match exp {
        ast::InlineExpression::NumberLiteral { value } => {
            Ok(Expression::literal(*value).with_function("number"))
        }
        ast::InlineExpression::StringLiteral { value } => Ok(Expression::literal(unescape(value))),
        ast::InlineExpression::MessageReference { id, attribute } => {
            let mut name = id.name.to_string();
            if let Some(attr) = attribute {
                name.push('.');
                name.push_str(attr.name);
            }
            Ok(Expression::literal(name).with_function("message"))
        }
        ast::InlineExpression::TermReference {
            id,
            attribute,
            arguments,
        } => {
            let mut name = format!("-{}", id.name);
            if let Some(attr) = attribute {
                name.push('.');
                name.push_str(attr.name);
            }
            let mut expr = Expression::literal(name).with_function("message");
            if let Some(args) = arguments {
                for opt in &args.named {
                    expr.options
                        .push((opt.name.name.to_string(), Value::Literal(literal_value(&opt.value)?)));
                }
            }
            Ok(expr)
        }
        ast::InlineExpression::VariableReference { id } => Ok(Expression::variable(id.name)),
        ast::InlineExpression::FunctionReference { id, arguments } => {
            let name = id.name.to_lowercase();
            if arguments.positional.len() > 1 {
                return Err(Error::format_error(format!(
                    "functions with more than one positional argument are not supported: {name}"
                )));
            }
            let mut ftl_arg = arguments.positional.first();
            while let Some(ast::InlineExpression::Placeable { expression }) = ftl_arg {
                match expression.as_ref() {
                    ast::Expression::Inline(inner) => ftl_arg = Some(inner),
                    ast::Expression::Select { .. } => {
                        return Err(Error::format_error(format!(
                            "unexpected value as {name}() argument"
                        )));
                    }
                }
            }
            let arg = match ftl_arg {
                None => None,
                Some(
                    lit @ (ast::InlineExpression::NumberLiteral { .. }
                    | ast::InlineExpression::StringLiteral { .. }),
                ) => Some(Value::Literal(literal_value(lit)?)),
                Some(ast::InlineExpression::VariableReference { id }) => {
                    Some(Value::Variable(VariableRef::new(id.name)))
                }
                Some(_) => {
                    return Err(Error::format_error(format!(
                        "unexpected value as {name}() argument"
                    )));
                }
            };
            let options = arguments
                .named
                .iter()
                .map(|opt| Ok((opt.name.name.to_string(), Value::Literal(literal_value(&opt.value)?))))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(Expression {
                arg,
                function: Some(name),
                options,
                attributes: Vec::new(),
            })
        }
        ast::InlineExpression::Placeable { expression } => match expression.as_ref() {
            ast::Expression::Inline(inner) => inline_expression(inner),
            ast::Expression::Select { .. } => {
                Err(Error::format_error("unexpected nested select expression"))
            }
        },
    }
}

/// The string value of a literal argument or option.
fn literal_value(exp: &ast::InlineExpression<&str>) -> Result<String, Error> {
    match exp {
        ast::InlineExpression::NumberLiteral { value } => Ok((*value).to_string()),
        ast::InlineExpression::StringLiteral { value } => Ok(unescape(value)),
        _ => Err(Error::format_error("expected a literal value")),
    }
}

fn unescape(value: &str) -> String {
    unescape_unicode_to_string(value).into_owned()
}

//! Repository calls, injections, imports and registrations → client API.
//!
//! | source method        | target            | arguments                                   |
//! |----------------------|-------------------|---------------------------------------------|
//! | `find`               | `findMany`        | unchanged                                   |
//! | `findOne`            | `findUnique`      | bare filters into `where`, `relations` → `include` |
//! | `findOneBy`          | `findUnique`      | `{ where: arg }`                            |
//! | `findBy`             | `findMany`        | `{ where: arg }`                            |
//! | `save`               | `update`/`create` | by presence of `id`                         |
//! | `update`             | `update`          | `(id, data)` → `{ where: { id }, data }`    |
//! | `delete`, `remove`   | `delete`          | `{ where: { id: arg } }` or `{ where: arg }` |
//! | `count`              | `count`           | `{ where: arg }` unless `where` is present  |
//!
//! `createQueryBuilder` is never rewritten; its statement gets an advisory.

pub mod advisory;
mod calls;
mod imports;

pub use self::calls::{CallRewrites, rewrite_calls};
pub use self::imports::rewrite_imports;

use swc_common::Spanned;
use swc_ecma_ast::{Expr, ExprOrSpread, ObjectLit, Prop, PropOrSpread};

use crate::ast::{ident_name, is_nullish, object, plain_args, prop_key, str_value, unparen};
use crate::edit::EditSet;
use crate::parser::ParsedSource;

/// Method that is flagged instead of rewritten.
pub const QUERY_BUILDER: &str = "createQueryBuilder";

/// Options of `findOne` passed through to the client call.
const FIND_OPTIONS: &[&str] = &["where", "relations", "select", "order", "skip", "take"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentTransform {
    Unchanged,
    FindOptions,
    WrapWhere,
    Save,
    UpdateById,
    DeleteBy,
    CountWhere,
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    pub source: &'static str,
    /// Target method; `save` picks `update` or `create` per call.
    pub target: &'static str,
    pub transform: ArgumentTransform,
}

pub const RULES: &[RewriteRule] = &[
    RewriteRule {
        source: "find",
        target: "findMany",
        transform: ArgumentTransform::Unchanged,
    },
    RewriteRule {
        source: "findOne",
        target: "findUnique",
        transform: ArgumentTransform::FindOptions,
    },
    RewriteRule {
        source: "findOneBy",
        target: "findUnique",
        transform: ArgumentTransform::WrapWhere,
    },
    RewriteRule {
        source: "findBy",
        target: "findMany",
        transform: ArgumentTransform::WrapWhere,
    },
    RewriteRule {
        source: "save",
        target: "create",
        transform: ArgumentTransform::Save,
    },
    RewriteRule {
        source: "update",
        target: "update",
        transform: ArgumentTransform::UpdateById,
    },
    RewriteRule {
        source: "delete",
        target: "delete",
        transform: ArgumentTransform::DeleteBy,
    },
    RewriteRule {
        source: "remove",
        target: "delete",
        transform: ArgumentTransform::DeleteBy,
    },
    RewriteRule {
        source: "count",
        target: "count",
        transform: ArgumentTransform::CountWhere,
    },
];

pub fn rule_for(method: &str) -> Option<&'static RewriteRule> {
    RULES.iter().find(|rule| rule.source == method)
}

/// Source text of nodes, with the edits already made inside them.
#[derive(Clone, Copy)]
pub struct Snippets<'a> {
    source: &'a ParsedSource,
    edits: &'a EditSet,
}

impl<'a> Snippets<'a> {
    pub fn new(source: &'a ParsedSource, edits: &'a EditSet) -> Self {
        Self { source, edits }
    }

    pub fn of(&self, node: &impl Spanned) -> String {
        self.edits.render(self.source.text(), self.source.range_of(node))
    }
}

/// Method name and argument text of a rewritten call.
#[derive(Debug, Clone, PartialEq)]
pub struct RewrittenCall {
    pub method: &'static str,
    /// Replacement for the argument list, `None` to keep it as written.
    pub args: Option<String>,
}

impl RewriteRule {
    /// Transform the arguments, or `None` when the call does not have the
    /// shape this rule understands and must be left alone.
    pub fn apply(&self, args: &[ExprOrSpread], text: &Snippets<'_>) -> Option<RewrittenCall> {
        let args = plain_args(args)?;
        let call = |args: Option<String>| {
            Some(RewrittenCall {
                method: self.target,
                args,
            })
        };
        match self.transform {
            ArgumentTransform::Unchanged => call(None),
            ArgumentTransform::FindOptions => match args[..] {
                [] => call(None),
                [options] => call(find_options(options, text)),
                _ => None,
            },
            ArgumentTransform::WrapWhere => match args[..] {
                [] => call(None),
                [filter] => call(Some(where_object(&text.of(unparen(filter))))),
                _ => None,
            },
            ArgumentTransform::Save => match args[..] {
                [entity] => Some(save(entity, text)),
                _ => None,
            },
            ArgumentTransform::UpdateById => match args[..] {
                [criteria, data] => call(Some(object_text(&[
                    format!("where: {}", criteria_object(criteria, text)),
                    format!("data: {}", text.of(unparen(data))),
                ]))),
                _ => None,
            },
            ArgumentTransform::DeleteBy => match args[..] {
                [criteria] => call(Some(where_object(&criteria_object(criteria, text)))),
                _ => None,
            },
            ArgumentTransform::CountWhere => match args[..] {
                [filter] => match object(filter) {
                    Some(props) if !has_key(props, "where") => {
                        call(Some(where_object(&text.of(unparen(filter)))))
                    }
                    _ => call(None),
                },
                _ => call(None),
            },
        }
    }
}

/// `{ a, b }`, or `{}` for no items.
fn object_text(items: &[String]) -> String {
    if items.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", items.join(", "))
    }
}

/// `{ where: filter }`
fn where_object(filter: &str) -> String {
    object_text(&[format!("where: {filter}")])
}

fn has_key(object: &ObjectLit, key: &str) -> bool {
    object.props.iter().any(|p| prop_key(p) == Some(key))
}

/// An object literal stays a filter; anything else is an id.
fn criteria_object(criteria: &Expr, text: &Snippets<'_>) -> String {
    match object(criteria) {
        Some(object) => text.of(object),
        None => object_text(&[id_prop(criteria, text)]),
    }
}

/// `id` as shorthand when the value is the identifier `id` itself.
fn id_prop(value: &Expr, text: &Snippets<'_>) -> String {
    match ident_name(value) {
        Some("id") => "id".to_string(),
        _ => format!("id: {}", text.of(unparen(value))),
    }
}

/// `findOne` options: known option keys pass through (`relations` becomes
/// `include`), every other key is a bare filter and moves into `where`.
/// Options that need neither stay as written.
fn find_options(options: &Expr, text: &Snippets<'_>) -> Option<String> {
    let Some(props) = object(options) else {
        // Legacy `findOne(id)`.
        return Some(where_object(&object_text(&[id_prop(options, text)])));
    };
    let mut filters = Vec::new();
    let mut explicit_where = None;
    let mut passthrough = Vec::new();
    let mut relations = false;
    for prop in &props.props {
        match (prop_key(prop), prop_value(prop)) {
            (Some("where"), Some(value)) => explicit_where = Some(value),
            (Some("relations"), Some(value)) => {
                relations = true;
                passthrough.push(format!("include: {}", relations_to_include(value, text)));
            }
            (Some(key), _) if FIND_OPTIONS.contains(&key) => passthrough.push(text.of(prop)),
            _ => filters.push(text.of(prop)),
        }
    }
    if filters.is_empty() && !relations {
        return None;
    }

    let mut out = Vec::new();
    match (explicit_where, filters.is_empty()) {
        (Some(existing), false) => match object(existing) {
            Some(existing) => {
                let mut merged: Vec<String> = existing.props.iter().map(|p| text.of(p)).collect();
                merged.extend(filters);
                out.push(format!("where: {}", object_text(&merged)));
            }
            None => {
                out.push(format!("where: {}", text.of(existing)));
                out.extend(filters);
            }
        },
        (Some(existing), true) => out.push(format!("where: {}", text.of(existing))),
        (None, false) => out.push(format!("where: {}", object_text(&filters))),
        (None, true) => {}
    }
    out.extend(passthrough);
    Some(object_text(&out))
}

/// Value of a `key: value` property.
fn prop_value(prop: &PropOrSpread) -> Option<&Expr> {
    match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(kv) => Some(&*kv.value),
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    }
}

/// `['posts', 'profile']` → `{ posts: true, profile: true }`; other shapes
/// are passed through as written.
fn relations_to_include(relations: &Expr, text: &Snippets<'_>) -> String {
    let names: Option<Vec<&str>> = match unparen(relations) {
        Expr::Array(array) => array
            .elems
            .iter()
            .map(|elem| {
                elem.as_ref()
                    .filter(|e| e.spread.is_none())
                    .and_then(|e| str_value(&e.expr))
            })
            .collect(),
        _ => None,
    };
    match names {
        Some(names) if names.iter().all(|n| is_plain_key(n)) => {
            object_text(&names.iter().map(|n| format!("{n}: true")).collect::<Vec<_>>())
        }
        _ => text.of(unparen(relations)),
    }
}

fn is_plain_key(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Update when the literal carries a non-null `id`, create otherwise.
fn save(entity: &Expr, text: &Snippets<'_>) -> RewrittenCall {
    let props = object(entity);
    let id = props.and_then(|props| {
        props.props.iter().find(|p| {
            prop_key(p) == Some("id")
                && match p {
                    PropOrSpread::Prop(prop) => match &**prop {
                        Prop::Shorthand(_) => true,
                        Prop::KeyValue(kv) => !is_nullish(&kv.value),
                        _ => false,
                    },
                    PropOrSpread::Spread(_) => false,
                }
        })
    });
    match (id, props) {
        (Some(id), Some(props)) => {
            let data: Vec<String> = props
                .props
                .iter()
                .filter(|p| !std::ptr::eq(*p, id))
                .map(|p| text.of(p))
                .collect();
            let where_id = match prop_value(id) {
                Some(value) => id_prop(value, text),
                None => "id".to_string(),
            };
            RewrittenCall {
                method: "update",
                args: Some(object_text(&[
                    format!("where: {}", object_text(&[where_id])),
                    format!("data: {}", object_text(&data)),
                ])),
            }
        }
        _ => RewrittenCall {
            method: "create",
            args: Some(object_text(&[format!("data: {}", text.of(unparen(entity)))])),
        },
    }
}

//! Comment blocks inserted above sites that need a human look.
//!
//! The first line of each block is fixed so insertion can tell whether
//! the block is already present.

use crate::edit::EditSet;
use crate::parser::ParsedSource;

const PREFIX: &str = "// ormlift:";

fn lines(text: &[&str]) -> Vec<String> {
    text.iter().map(|line| line.to_string()).collect()
}

/// Above every entity class the schema was extracted from.
pub fn entity() -> Vec<String> {
    lines(&[
        "// ormlift: reference only. This entity is now described in the Prisma schema.",
        "// Prefer `prisma db pull` against the live database as the source of truth.",
    ])
}

/// Above statements whose `save` call was split into create/update.
pub fn save() -> Vec<String> {
    lines(&[
        "// ormlift: `save` became update when the object has an `id`, create otherwise.",
        "// Verify the intended semantics; `upsert` may be the better fit.",
    ])
}

/// Above statements that use `createQueryBuilder`, with a worked example.
pub fn query_builder(client: &str, model: &str) -> Vec<String> {
    vec![
        "// ormlift: createQueryBuilder is not rewritten automatically. Port it by hand, e.g.".to_string(),
        format!(
            "//   before: repository.createQueryBuilder('{model}').where('{model}.id = :id', {{ id }}).getOne()"
        ),
        format!("//   after:  {client}.{model}.findUnique({{ where: {{ id }} }})"),
    ]
}

/// Above imports of entity classes.
pub fn entity_import() -> Vec<String> {
    lines(&["// ormlift: entity import; use the generated model types from '@prisma/client' instead."])
}

/// Whether a comment was written by ormlift.
pub fn is_advisory(comment: &str) -> bool {
    comment.starts_with(PREFIX)
}

/// Insert `block` above the line holding `at`, indented like that line.
/// Nothing happens when the block's first line is already there, in the
/// source or among this run's insertions.
pub fn annotate(source: &ParsedSource, edits: &mut EditSet, at: usize, block: &[String]) -> bool {
    let Some(first) = block.first() else {
        return false;
    };
    let line = source.line_start(at);
    if source.comments_above(at).iter().any(|(_, l)| *l == first.as_str()) || edits.inserted_at(line, first)
    {
        return false;
    }
    let indent = source.indent_at(at);
    let newline = source.newline();
    let text: String = block.iter().map(|l| format!("{indent}{l}{newline}")).collect();
    edits.insert(line, text)
}

/// Start of the advisory blocks directly above the line holding `at`,
/// or that line's start when there are none. Other comments above them
/// are not included.
pub fn block_start(source: &ParsedSource, at: usize) -> usize {
    source
        .comments_above(at)
        .into_iter()
        .find(|(_, line)| is_advisory(line))
        .map_or_else(|| source.line_start(at), |(start, _)| start)
}

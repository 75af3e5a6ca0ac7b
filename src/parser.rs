//! TypeScript parsing via swc.
//!
//! ```text
//! source ── strip BOM ── swc lexer/parser ──▶ Module
//!    │                                          │ spans
//!    └────────────── ParsedSource ◀─────────────┘
//! ```
//!
//! The tree is only ever read. Rewrites are recorded as byte-range edits
//! against the original text (see [`crate::edit`]), so everything a stage
//! does not touch comes back exactly as it was written.

use std::ops::Range;

use swc_common::{BytePos, FileName, SourceMap, Span, Spanned, sync::Lrc};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax, lexer::Lexer};
use tracing::debug;

use crate::edit::EditSet;
use crate::error::{CodemodError, CodemodResult};

const BOM: &str = "\u{feff}";

/// A parsed file together with the text its spans point into.
#[derive(Debug)]
pub struct ParsedSource {
    pub module: Module,
    /// Source text without the byte-order mark.
    text: String,
    bom: bool,
    /// Position of the first byte of `text` in the source map.
    base: BytePos,
    newline: &'static str,
}

/// Parse TypeScript with decorators enabled.
///
/// A leading byte-order mark is set aside before parsing and put back by
/// [`ParsedSource::original`] and [`ParsedSource::render`].
pub fn parse(source: &str) -> CodemodResult<ParsedSource> {
    let (bom, text) = match source.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, source),
    };

    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), text.to_string());
    let syntax = Syntax::Typescript(TsSyntax {
        decorators: true,
        ..Default::default()
    });
    let lexer = Lexer::new(syntax, Default::default(), StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| {
        let offset = e.span().lo.0.saturating_sub(fm.start_pos.0) as usize;
        let position = if bom { offset + BOM.len() } else { offset };
        CodemodError::parse(position, e.kind().msg())
    })?;
    for error in parser.take_errors() {
        debug!(message = %error.kind().msg(), "recovered syntax error");
    }

    Ok(ParsedSource {
        module,
        text: text.to_string(),
        bom,
        base: fm.start_pos,
        newline: if text.contains("\r\n") { "\r\n" } else { "\n" },
    })
}

impl ParsedSource {
    /// Text the spans point into (no byte-order mark).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The input exactly as it was handed to [`parse`].
    pub fn original(&self) -> String {
        self.with_bom(self.text.clone())
    }

    /// Apply `edits` to the text.
    pub fn render(&self, edits: &EditSet) -> String {
        self.with_bom(edits.apply(&self.text))
    }

    fn with_bom(&self, text: String) -> String {
        if self.bom { format!("{BOM}{text}") } else { text }
    }

    /// Line ending used for inserted lines: CRLF if the file has any.
    pub fn newline(&self) -> &'static str {
        self.newline
    }

    /// Byte offset of a source position within [`text`](Self::text).
    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0.saturating_sub(self.base.0) as usize).min(self.text.len())
    }

    pub fn range(&self, span: Span) -> Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }

    pub fn range_of(&self, node: &impl Spanned) -> Range<usize> {
        self.range(node.span())
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.text[self.range(span)]
    }

    /// Start of the line containing `offset`.
    pub fn line_start(&self, offset: usize) -> usize {
        self.text[..offset].rfind('\n').map_or(0, |i| i + 1)
    }

    /// Just past the line break ending the line containing `offset`.
    pub fn line_end(&self, offset: usize) -> usize {
        self.text[offset..]
            .find('\n')
            .map_or(self.text.len(), |i| offset + i + 1)
    }

    /// Leading whitespace of the line containing `offset`.
    pub fn indent_at(&self, offset: usize) -> &str {
        let start = self.line_start(offset);
        let line = &self.text[start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }

    /// `range` widened to the full lines it occupies, when nothing but
    /// whitespace and a `;` shares those lines. `None` otherwise.
    pub fn whole_lines(&self, range: Range<usize>) -> Option<Range<usize>> {
        let start = self.line_start(range.start);
        let end = self.line_end(range.end);
        let before = &self.text[start..range.start];
        let after = &self.text[range.end..end];
        let blank = |s: &str| s.trim_matches(|c: char| c.is_whitespace() || c == ';').is_empty();
        (blank(before) && blank(after)).then_some(start..end)
    }

    /// Separator for rebuilding a comma list found at `range`: a plain
    /// `, ` for a single-line list, otherwise one item per line at the
    /// indentation of the first item.
    pub fn list_separator(&self, range: Range<usize>) -> String {
        if self.text[range.clone()].contains('\n') {
            format!(",{}{}", self.newline, self.indent_at(range.start))
        } else {
            ", ".to_string()
        }
    }

    /// The run of `//` comment lines directly above the line holding
    /// `offset`, top line first.
    pub fn comments_above(&self, offset: usize) -> Vec<(usize, &str)> {
        let mut lines = Vec::new();
        let mut end = self.line_start(offset);
        while end > 0 {
            let start = self.line_start(end - 1);
            let line = self.text[start..end].trim();
            if !line.starts_with("//") {
                break;
            }
            lines.push((start, line));
            end = start;
        }
        lines.reverse();
        lines
    }
}

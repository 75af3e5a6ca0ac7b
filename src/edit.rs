//! Byte-range edits against the original source text.
//!
//! Stages never reprint the file. They record insertions and
//! replacements here; [`EditSet::apply`] splices them into the untouched
//! text at the end. Edits that contain earlier edits supersede them (the
//! outer one was built from [`EditSet::render`], which already includes
//! the inner ones). Partially overlapping edits are refused.

use std::ops::Range;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    range: Range<usize>,
    text: String,
    /// Lower goes first among insertions at the same offset.
    priority: u8,
}

impl Edit {
    fn is_insert(&self) -> bool {
        self.range.is_empty()
    }

    /// Whether a new edit over `range` makes this one redundant.
    fn within(&self, range: &Range<usize>) -> bool {
        if self.is_insert() {
            range.start < self.range.start && self.range.start < range.end
        } else {
            range.start <= self.range.start
                && self.range.end <= range.end
                && self.range != *range
        }
    }

    fn overlaps(&self, range: &Range<usize>) -> bool {
        if self.is_insert() {
            range.start < self.range.start && self.range.start < range.end
        } else if range.is_empty() {
            self.range.start < range.start && range.start < self.range.end
        } else {
            self.range.start < range.end && range.start < self.range.end
        }
    }
}

/// Pending edits for one file.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
    /// Source ranges whose content is gone from the output.
    dropped: Vec<Range<usize>>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Insert `text` at `at`, after earlier insertions at the same offset.
    pub fn insert(&mut self, at: usize, text: impl Into<String>) -> bool {
        self.push(at..at, text.into(), 1)
    }

    /// Insert `text` at `at`, ahead of every other insertion there.
    pub fn insert_first(&mut self, at: usize, text: impl Into<String>) -> bool {
        self.push(at..at, text.into(), 0)
    }

    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) -> bool {
        self.push(range, text.into(), 1)
    }

    /// Remove `range` and remember it as dropped.
    pub fn delete(&mut self, range: Range<usize>) -> bool {
        let applied = self.push(range.clone(), String::new(), 1);
        if applied {
            self.drop_range(range);
        }
        applied
    }

    /// Mark source text as gone without recording an edit for it, for
    /// content removed as part of a larger replacement.
    pub fn drop_range(&mut self, range: Range<usize>) {
        self.dropped.push(range);
    }

    pub fn is_dropped(&self, range: &Range<usize>) -> bool {
        self.dropped
            .iter()
            .any(|d| d.start <= range.start && range.end <= d.end)
    }

    /// Whether an insertion at `at` already carries `needle`.
    pub fn inserted_at(&self, at: usize, needle: &str) -> bool {
        self.edits
            .iter()
            .any(|e| e.is_insert() && e.range.start == at && e.text.contains(needle))
    }

    fn push(&mut self, range: Range<usize>, text: String, priority: u8) -> bool {
        if self.edits.iter().any(|e| !e.within(&range) && e.overlaps(&range)) {
            debug!(start = range.start, end = range.end, "overlapping edit skipped");
            return false;
        }
        if !range.is_empty() {
            self.edits.retain(|e| !e.within(&range));
        }
        self.edits.push(Edit {
            range,
            text,
            priority,
        });
        true
    }

    /// `source[range]` with the edits that fall inside it applied.
    pub fn render(&self, source: &str, range: Range<usize>) -> String {
        self.splice(source, range.clone(), |e| {
            if e.is_insert() {
                range.start < e.range.start && e.range.start < range.end
            } else {
                range.start <= e.range.start && e.range.end <= range.end
            }
        })
    }

    /// The whole of `source` with every edit applied.
    pub fn apply(&self, source: &str) -> String {
        self.splice(source, 0..source.len(), |_| true)
    }

    fn splice(&self, source: &str, range: Range<usize>, keep: impl Fn(&Edit) -> bool) -> String {
        let mut edits: Vec<&Edit> = self.edits.iter().filter(|e| keep(e)).collect();
        // Stable: insertions of equal priority keep their recording order.
        edits.sort_by_key(|e| (e.range.start, !e.is_insert(), e.priority));

        let mut output = String::with_capacity(range.len());
        let mut cursor = range.start;
        for edit in edits {
            if edit.range.start > cursor {
                output.push_str(&source[cursor..edit.range.start]);
            }
            output.push_str(&edit.text);
            cursor = cursor.max(edit.range.end);
        }
        output.push_str(&source[cursor..range.end]);
        output
    }
}

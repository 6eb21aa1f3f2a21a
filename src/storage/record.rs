//! Bounded views of a single top-level record.

use crate::storage::grammar::{collect_continuation, level_of, tag_and_value};

/// The half-open line interval `[start, end)` of one top-level record.
///
/// `start` is the record's level-0 line; `end` is the next level-0 line or the
/// end of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordRange {
    /// Index of the record's level-0 line.
    pub start: usize,
    /// Index one past the record's last line.
    pub end: usize,
}

impl RecordRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of lines, including the level-0 line.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    /// Whether the range covers no lines.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end <= self.start
    }
}

/// One parsed line of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    /// Index of the line in the document.
    pub index: usize,
    /// Nesting level, `None` for non-structural lines.
    pub level: Option<u32>,
    /// Tag.
    pub tag: &'a str,
    /// Value, untrimmed.
    pub value: &'a str,
}

impl Entry<'_> {
    /// Whether the line is nested deeper than `level`.
    #[must_use]
    pub fn is_below(&self, level: u32) -> bool {
        matches!(self.level, Some(l) if l > level)
    }
}

/// A record's lines, borrowed from the document.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    lines: &'a [String],
    range: RecordRange,
}

impl<'a> Record<'a> {
    /// Creates a view of `range` within `lines`.
    ///
    /// The range is clamped to the available lines.
    #[must_use]
    pub fn new(lines: &'a [String], range: RecordRange) -> Self {
        let end = range.end.min(lines.len());
        let start = range.start.min(end);
        Self {
            lines,
            range: RecordRange::new(start, end),
        }
    }

    /// The record's line range.
    #[must_use]
    pub const fn range(&self) -> RecordRange {
        self.range
    }

    /// Parses the line at `index`, if it lies within the record.
    #[must_use]
    pub fn entry(&self, index: usize) -> Option<Entry<'a>> {
        if index < self.range.start || index >= self.range.end {
            return None;
        }
        let line = self.lines[index].as_str();
        let (tag, value) = tag_and_value(line);
        Some(Entry {
            index,
            level: level_of(line),
            tag,
            value,
        })
    }

    /// Every line after the level-0 line.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'a>> + '_ {
        (self.range.start + 1..self.range.end).filter_map(|index| self.entry(index))
    }

    /// Level-1 lines, in order.
    pub fn children(&self) -> impl Iterator<Item = Entry<'a>> + '_ {
        self.entries().filter(|entry| entry.level == Some(1))
    }

    /// Level-1 lines with the given tag.
    pub fn children_tagged(&self, tag: &'a str) -> impl Iterator<Item = Entry<'a>> + '_ {
        self.children().filter(move |entry| entry.tag == tag)
    }

    /// Trimmed values of level-1 lines with the given tag.
    pub fn child_values(&self, tag: &'a str) -> impl Iterator<Item = &'a str> + '_ {
        self.children_tagged(tag).map(|entry| entry.value.trim())
    }

    /// The lines nested below `parent`, stopping at the first line that is not
    /// deeper (non-structural lines end the subtree too).
    pub fn subtree(&self, parent: Entry<'a>) -> impl Iterator<Item = Entry<'a>> + '_ {
        let level = parent.level.unwrap_or(0);
        (parent.index + 1..self.range.end)
            .map_while(|index| self.entry(index))
            .take_while(move |entry| entry.is_below(level))
    }

    /// The full value of `entry` including its continuation lines, and the
    /// index of the first line after them.
    #[must_use]
    pub fn full_value(&self, entry: Entry<'a>) -> (String, usize) {
        let lines = &self.lines[..self.range.end];
        let continuation = collect_continuation(lines, entry.index, entry.level.unwrap_or(0));
        (format!("{}{}", entry.value, continuation.text), continuation.next)
    }

    /// The first `DATE` directly below the first `event` (e.g. `BIRT`) that
    /// has one, with continuations.
    #[must_use]
    pub fn event_date(&self, event: &'a str) -> Option<String> {
        self.children_tagged(event).find_map(|found| {
            self.subtree(found)
                .find(|entry| entry.level == Some(2) && entry.tag == "DATE")
                .map(|date| self.full_value(date).0)
        })
    }
}

//! Locating top-level records.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::{
    domain::Xref,
    storage::{grammar::level_of, record::RecordRange},
};

/// The record types that are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// `0 @I..@ INDI`
    Individual,
    /// `0 @F..@ FAM`
    Family,
    /// `0 @N..@ NOTE`
    Note,
}

static INDIVIDUAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*0\s+(@I[^@]*@)\s+INDI\b").expect("valid regex"));
static FAMILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*0\s+(@F[^@]*@)\s+FAM\b").expect("valid regex"));
static NOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*0\s+(@N[^@]*@)\s+NOTE\b").expect("valid regex"));
static INDIVIDUAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@I(\d+)@").expect("valid regex"));

impl RecordKind {
    /// Pattern matching the level-0 line of this kind of record, capturing its
    /// cross-reference.
    fn pattern(self) -> &'static Regex {
        match self {
            Self::Individual => &INDIVIDUAL,
            Self::Family => &FAMILY,
            Self::Note => &NOTE,
        }
    }

    /// The cross-reference of `line` if it starts a record of this kind.
    #[must_use]
    pub fn header_xref(self, line: &str) -> Option<Xref> {
        self.pattern()
            .captures(line)
            .and_then(|caps| Xref::new(&caps[1]).ok())
    }
}

/// Finds every record of `kind`, in order of appearance.
///
/// A record runs from its matching level-0 line to the next level-0 line or
/// the end of the input.
#[must_use]
pub fn scan(lines: &[String], kind: RecordKind) -> Vec<(Xref, RecordRange)> {
    let mut records = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(xref) = kind.header_xref(&lines[i]) else {
            i += 1;
            continue;
        };
        let start = i;
        i += 1;
        while i < lines.len() && level_of(&lines[i]) != Some(0) {
            i += 1;
        }
        records.push((xref, RecordRange::new(start, i)));
    }
    records
}

/// Maps the digits of each `@I<digits>@` cross-reference to the
/// cross-reference.
#[must_use]
pub fn numeric_index<'a>(individuals: impl IntoIterator<Item = &'a Xref>) -> HashMap<String, Xref> {
    individuals
        .into_iter()
        .filter_map(|xref| {
            INDIVIDUAL_NUMBER
                .captures(xref)
                .map(|caps| (caps[1].to_string(), xref.clone()))
        })
        .collect()
}

//! The parsed file: lines plus record indices.
//!
//! A [`Document`] is built once and never changes. Everything else in the crate
//! reads from it by cross-reference. Lookups return `Option`: a cross-reference
//! is a key, not a pointer, and the record it names may be missing.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tracing::instrument;

use crate::{
    domain::{BirthKey, Gender, Xref, date::normalize_date, view::life_span},
    storage::{
        index::{RecordKind, numeric_index, scan},
        loader::{self, LoadError},
        record::{Record, RecordRange},
    },
};

static WHITESPACE_AROUND_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n\s*").expect("valid regex"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));

/// Tags whose text makes up a note record.
const NOTE_TEXT_TAGS: [&str; 3] = ["CONC", "CONT", "TEXT"];

/// An immutable, indexed interchange file.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<String>,
    individuals: HashMap<Xref, RecordRange>,
    families: HashMap<Xref, RecordRange>,
    notes: HashMap<Xref, String>,
    numbers: HashMap<String, Xref>,
}

/// The members of a family record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Family {
    /// `HUSB`
    pub husband: Option<Xref>,
    /// `WIFE`
    pub wife: Option<Xref>,
    /// `CHIL`, in source order.
    pub children: Vec<Xref>,
}

impl Family {
    /// The partner of `xref` in this family, if `xref` is one of the spouses.
    #[must_use]
    pub fn spouse_of(&self, xref: &str) -> Option<&Xref> {
        if self.husband.as_deref() == Some(xref) {
            self.wife.as_ref()
        } else if self.wife.as_deref() == Some(xref) {
            self.husband.as_ref()
        } else {
            None
        }
    }

    /// Husband then wife, whichever are present.
    pub fn spouses(&self) -> impl Iterator<Item = &Xref> {
        self.husband.iter().chain(self.wife.iter())
    }

    /// Whether the two spouses are exactly `a` and `b`, in either role.
    #[must_use]
    pub fn is_couple(&self, a: &str, b: &str) -> bool {
        let husband = self.husband.as_deref();
        let wife = self.wife.as_deref();
        (husband == Some(a) && wife == Some(b)) || (husband == Some(b) && wife == Some(a))
    }
}

/// Family memberships of an individual.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    /// `FAMC`: families the individual is a child of.
    pub child_of: Vec<Xref>,
    /// `FAMS`: families the individual is a spouse in.
    pub spouse_in: Vec<Xref>,
}

impl Document {
    /// Reads and indexes a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is empty.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        loader::read_lines(path).map(Self::from_lines)
    }

    /// Decodes and indexes raw file contents.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Empty`] if the bytes decode to nothing but
    /// whitespace.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, LoadError> {
        let lines = loader::decode(raw);
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(LoadError::Empty(PathBuf::from("<memory>")));
        }
        Ok(Self::from_lines(lines))
    }

    /// Indexes text that is already in memory.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.lines().map(str::to_string).collect())
    }

    /// Indexes decoded lines.
    #[must_use]
    pub fn from_lines(lines: Vec<String>) -> Self {
        let individuals: HashMap<_, _> = scan(&lines, RecordKind::Individual).into_iter().collect();
        let families: HashMap<_, _> = scan(&lines, RecordKind::Family).into_iter().collect();
        let notes = scan(&lines, RecordKind::Note)
            .into_iter()
            .map(|(xref, range)| {
                let text = note_text(Record::new(&lines, range));
                (xref, text)
            })
            .collect();
        let numbers = numeric_index(individuals.keys());

        tracing::debug!(
            individuals = individuals.len(),
            families = families.len(),
            "Indexed {} lines",
            lines.len()
        );

        Self {
            lines,
            individuals,
            families,
            notes,
            numbers,
        }
    }

    /// All lines of the file.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of individual records.
    #[must_use]
    pub fn individual_count(&self) -> usize {
        self.individuals.len()
    }

    /// Whether an individual record with this cross-reference exists.
    #[must_use]
    pub fn contains_individual(&self, xref: &str) -> bool {
        self.individuals.contains_key(xref)
    }

    /// The line range of an individual record.
    #[must_use]
    pub fn individual_range(&self, xref: &str) -> Option<RecordRange> {
        self.individuals.get(xref).copied()
    }

    /// The line range of a family record.
    #[must_use]
    pub fn family_range(&self, xref: &str) -> Option<RecordRange> {
        self.families.get(xref).copied()
    }

    /// A view of an individual record.
    #[must_use]
    pub fn individual(&self, xref: &str) -> Option<Record<'_>> {
        self.individual_range(xref)
            .map(|range| Record::new(&self.lines, range))
    }

    /// The stored cross-reference of an individual (useful to get an owned
    /// key from a borrowed one).
    #[must_use]
    pub fn individual_xref(&self, xref: &str) -> Option<&Xref> {
        self.individuals.get_key_value(xref).map(|(key, _)| key)
    }

    /// The resolved text of a note record.
    #[must_use]
    pub fn note(&self, xref: &str) -> Option<&str> {
        self.notes.get(xref).map(String::as_str)
    }

    /// Iterates over every family record, in no particular order.
    pub fn families(&self) -> impl Iterator<Item = (&Xref, Family)> + '_ {
        self.families
            .iter()
            .map(|(xref, &range)| (xref, read_family(Record::new(&self.lines, range))))
    }

    /// Iterates over every individual, ordered by the number in the
    /// cross-reference (then by the cross-reference itself).
    pub fn iter_individuals(&self) -> impl Iterator<Item = (&Xref, RecordRange)> + '_ {
        let mut order: Vec<_> = self
            .individuals
            .iter()
            .map(|(xref, &range)| (xref.ordinal(), xref, range))
            .collect();
        order.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        order.into_iter().map(|(_, xref, range)| (xref, range))
    }

    /// Resolves user input to an individual.
    ///
    /// Accepts a cross-reference (`@I12@`), a bare number (`12`), or anything
    /// whose digits name an `@I<digits>@` record.
    #[must_use]
    pub fn resolve_individual(&self, input: &str) -> Option<&Xref> {
        let input = input.trim();
        if input.starts_with('@') && input.ends_with('@') {
            return self.individual_xref(input);
        }
        if let Some(xref) = self.numbers.get(input) {
            return Some(xref);
        }
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }
        self.numbers
            .get(&digits)
            .or_else(|| self.individual_xref(&format!("@I{digits}@")))
    }

    /// Selects the root individual for numbering and connectivity.
    ///
    /// Without input, the first individual in [`Self::iter_individuals`]
    /// order is chosen.
    ///
    /// # Errors
    ///
    /// Returns an error if the input names no individual, or if there are no
    /// individuals at all.
    pub fn resolve_root(&self, input: Option<&str>) -> Result<Xref, ResolveError> {
        match input {
            Some(input) => self
                .resolve_individual(input)
                .cloned()
                .ok_or_else(|| ResolveError::NotFound(input.to_string())),
            None => self
                .iter_individuals()
                .next()
                .map(|(xref, _)| xref.clone())
                .ok_or(ResolveError::NoIndividuals),
        }
    }

    /// Reads a family record.
    #[must_use]
    pub fn family(&self, xref: &str) -> Option<Family> {
        self.family_range(xref)
            .map(|range| read_family(Record::new(&self.lines, range)))
    }

    /// The family memberships of an individual (empty if unknown).
    #[must_use]
    pub fn links(&self, xref: &str) -> Links {
        let Some(record) = self.individual(xref) else {
            return Links::default();
        };
        let mut links = Links::default();
        for entry in record.children() {
            let target = match entry.tag {
                "FAMC" => &mut links.child_of,
                "FAMS" => &mut links.spouse_in,
                _ => continue,
            };
            if let Ok(family) = Xref::new(entry.value.trim()) {
                target.push(family);
            }
        }
        links
    }

    /// The families in which the individual is a spouse, resolved.
    pub fn spouse_families(&self, xref: &str) -> impl Iterator<Item = Family> + '_ {
        self.links(xref)
            .spouse_in
            .into_iter()
            .filter_map(|family| self.family(&family))
    }

    /// Father then mother, from the first family the individual is a child of.
    #[must_use]
    pub fn parents_of(&self, xref: &str) -> Vec<Xref> {
        self.links(xref)
            .child_of
            .first()
            .and_then(|family| self.family(family))
            .map(|family| family.spouses().cloned().collect())
            .unwrap_or_default()
    }

    /// The recorded sex of an individual.
    ///
    /// Accepts a cross-reference or a bare number. Unknown individuals and
    /// missing or unrecognised values are [`Gender::Unknown`].
    #[must_use]
    pub fn gender(&self, id: &str) -> Gender {
        self.resolve_individual(id)
            .and_then(|xref| self.individual(xref))
            .and_then(|record| {
                record.children().find(|entry| {
                    entry.tag.eq_ignore_ascii_case("SEX") && !entry.value.trim().is_empty()
                })
            })
            .map_or(Gender::Unknown, |entry| Gender::parse(entry.value))
    }

    /// Whether the record only holds media: no name, no family links, and at
    /// least one `OBJE`.
    #[must_use]
    pub fn is_placeholder(&self, xref: &str) -> bool {
        let Some(record) = self.individual(xref) else {
            return false;
        };
        let (mut has_name, mut has_family, mut has_media) = (false, false, false);
        for entry in record.children() {
            match entry.tag {
                "NAME" if !entry.value.trim().is_empty() => has_name = true,
                "FAMC" | "FAMS" => has_family = true,
                "OBJE" => has_media = true,
                _ => {}
            }
        }
        !has_name && !has_family && has_media
    }

    /// Sort key for oldest-first ordering, from the first birth date.
    #[must_use]
    pub fn birth_key(&self, xref: &str) -> BirthKey {
        self.individual(xref)
            .and_then(|record| record.event_date("BIRT"))
            .map_or(BirthKey::MISSING, |date| BirthKey::parse(&normalize_date(&date)))
    }

    /// A short `Name YYYY-YYYY` label for diagnostics.
    ///
    /// Uses the raw `NAME` value with slashes removed, falling back to the
    /// cross-reference.
    #[must_use]
    pub fn person_summary(&self, xref: &str) -> String {
        let Some(record) = self.individual(xref) else {
            return xref.to_string();
        };
        let name = record
            .child_values("NAME")
            .next()
            .map(|raw| raw.replace('/', " ").split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| xref.to_string());
        let year = |event| {
            record
                .event_date(event)
                .and_then(|date| YEAR.find(&date).map(|m| m.as_str().to_string()))
                .unwrap_or_default()
        };
        let years = life_span(&year("BIRT"), &year("DEAT"));
        if years.is_empty() {
            name
        } else {
            format!("{name} {years}")
        }
    }
}

fn read_family(record: Record<'_>) -> Family {
    let mut family = Family::default();
    for entry in record.children() {
        let Ok(xref) = Xref::new(entry.value.trim()) else {
            continue;
        };
        match entry.tag {
            "HUSB" if family.husband.is_none() => family.husband = Some(xref),
            "WIFE" if family.wife.is_none() => family.wife = Some(xref),
            "CHIL" => family.children.push(xref),
            _ => {}
        }
    }
    family
}

/// Joins the text of a note record into a single line.
fn note_text(record: Record<'_>) -> String {
    let mut parts = Vec::new();
    let mut resume = record.range().start + 1;
    if let Some(head) = record.entry(record.range().start) {
        let (text, next) = record.full_value(head);
        parts.push(text);
        resume = next;
    }
    parts.extend(
        record
            .children()
            .filter(|entry| entry.index >= resume && NOTE_TEXT_TAGS.contains(&entry.tag))
            .map(|entry| record.full_value(entry).0),
    );
    let joined = parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    WHITESPACE_AROUND_BREAK.replace_all(&joined, " ").into_owned()
}

/// Errors that can occur when selecting the root individual.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The input does not name an individual.
    #[error("Root '{0}' not found in file")]
    NotFound(String),
    /// The file contains no individuals.
    #[error("No individuals found in file")]
    NoIndividuals,
}

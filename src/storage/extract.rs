//! Turning one individual record into an [`IndividualView`].
//!
//! Extraction never fails. Anything that is missing or points nowhere becomes
//! an empty string or is left out, with a warning for the cases that indicate
//! a problem in the data.

use std::sync::LazyLock;

use regex::Regex;
use tracing::instrument;

use crate::{
    domain::{
        Field, FieldKind, IndividualView, NameParts, Relation, RelationKind, Xref,
        date::{normalize_date, year_from},
        view::{format_header, strip_quotes},
    },
    domain::xref::is_pointer,
    storage::{
        Document, Family,
        record::{Entry, Record},
    },
};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*/([^/]*)/(\s*(.*))?$").expect("valid regex"));

/// Level-1 tags that are not emitted as fields.
const SKIPPED_TAGS: [&str; 8] = ["FAMC", "FAMS", "RIN", "_UID", "_UPD", "NAME", "SEX", "NOTE"];
/// Record-internal identifiers, skipped wherever they appear.
const ADMIN_TAGS: [&str; 3] = ["RIN", "_UID", "_UPD"];

/// Field id of a note attached directly to the individual.
pub const INDIVIDUAL_NOTE: &str = "INDI.NOTE";

/// Turns raw field text into the content stored on a [`Field`].
///
/// Implementations decide how much presentation cleanup to apply. An empty
/// result drops the field.
pub trait Normalize {
    /// Produces the content for a field of `kind` from its raw text.
    fn normalize(&self, kind: FieldKind, raw: &str) -> String;
}

/// Keeps content as close to the source as possible: dates are normalized,
/// everything else is only trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceText;

impl Normalize for SourceText {
    fn normalize(&self, kind: FieldKind, raw: &str) -> String {
        match kind {
            FieldKind::Date => normalize_date(raw),
            FieldKind::Place
            | FieldKind::Address
            | FieldKind::Note
            | FieldKind::Text
            | FieldKind::Generic => raw.trim().to_string(),
        }
    }
}

/// Builds per-individual views from a [`Document`].
pub struct Extractor<'a> {
    doc: &'a Document,
    normalizer: &'a dyn Normalize,
}

impl std::fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

impl<'a> Extractor<'a> {
    /// An extractor that keeps content close to the source.
    #[must_use]
    pub fn new(doc: &'a Document) -> Self {
        Self::with_normalizer(doc, &SourceText)
    }

    /// An extractor that passes field content through `normalizer`.
    #[must_use]
    pub fn with_normalizer(doc: &'a Document, normalizer: &'a dyn Normalize) -> Self {
        Self { doc, normalizer }
    }

    /// Extracts the view of one individual, or `None` if there is no such
    /// record.
    #[instrument(level = "trace", skip(self))]
    #[must_use]
    pub fn view(&self, xref: &str) -> Option<IndividualView> {
        let xref = self.doc.individual_xref(xref)?.clone();
        let record = self.doc.individual(&xref)?;
        let placeholder = self.doc.is_placeholder(&xref);

        let name = name_parts(record);
        if name.is_empty() && !placeholder {
            tracing::warn!("{xref} has no name");
        }
        let (birth_year, death_year) = years(record);
        let header = format_header(&name, &birth_year, &death_year, &xref.number());

        let mut fields = self.fields(record, &xref);
        fields.extend(self.individual_notes(record, &xref));
        let relations = self.relations(&xref);

        Some(IndividualView {
            xref,
            name,
            birth_year,
            death_year,
            header,
            fields,
            relations,
        })
    }

    /// Views of every individual, in [`Document::iter_individuals`] order.
    pub fn views(&self) -> impl Iterator<Item = IndividualView> + '_ {
        self.doc
            .iter_individuals()
            .filter_map(|(xref, _)| self.view(xref))
    }

    /// The header line (`Name YYYY-YYYY, id`) of an individual.
    #[must_use]
    pub fn header_for(&self, xref: &str) -> Option<String> {
        let xref = self.doc.individual_xref(xref)?;
        let record = self.doc.individual(xref)?;
        let (birth_year, death_year) = years(record);
        Some(format_header(
            &name_parts(record),
            &birth_year,
            &death_year,
            &xref.number(),
        ))
    }

    fn fields(&self, record: Record<'_>, xref: &Xref) -> Vec<Field> {
        let mut fields = Vec::new();
        for own in record.children() {
            if SKIPPED_TAGS.contains(&own.tag) {
                continue;
            }
            let (own_value, resume) = record.full_value(own);

            for child in record.subtree(own).filter(|entry| entry.index >= resume) {
                if ADMIN_TAGS.contains(&child.tag) || is_continuation(child.tag) {
                    continue;
                }
                let id = format!("{}.{}", own.tag, child.tag);
                if let Some(field) = self.field(record, child, id, xref) {
                    fields.push(field);
                }
            }

            let kind = FieldKind::of(own.tag);
            let content = self.normalizer.normalize(kind, &own_value);
            if !content.is_empty() {
                fields.push(Field::new(own.tag, kind, content));
            }
        }
        fields
    }

    /// A nested field, or `None` if it ends up empty.
    fn field(&self, record: Record<'_>, entry: Entry<'_>, id: String, owner: &Xref) -> Option<Field> {
        let kind = FieldKind::of(entry.tag);
        let content = match kind {
            FieldKind::Note => self.note_content(record, entry, owner)?,
            FieldKind::Date
            | FieldKind::Place
            | FieldKind::Address
            | FieldKind::Text
            | FieldKind::Generic => {
                let raw = record.full_value(entry).0;
                self.normalizer.normalize(kind, &raw)
            }
        };
        (!content.is_empty()).then(|| Field::new(id, kind, content))
    }

    /// Notes attached directly to the individual.
    fn individual_notes(&self, record: Record<'_>, xref: &Xref) -> Vec<Field> {
        record
            .children_tagged("NOTE")
            .filter_map(|entry| self.note_content(record, entry, xref))
            .filter(|content| !content.is_empty())
            .map(|content| Field {
                description: "individual note".to_string(),
                ..Field::new(INDIVIDUAL_NOTE, FieldKind::Note, content)
            })
            .collect()
    }

    /// The text of a `NOTE` line: the referenced note record's text if the
    /// value is a pointer, otherwise the literal text with continuations.
    fn note_content(&self, record: Record<'_>, entry: Entry<'_>, owner: &Xref) -> Option<String> {
        let value = entry.value.trim();
        if is_pointer(value) {
            let Some(text) = self.doc.note(value) else {
                tracing::warn!("{owner}: note {value} not found");
                return None;
            };
            Some(self.normalizer.normalize(FieldKind::Note, text))
        } else {
            let raw = record.full_value(entry).0;
            Some(self.normalizer.normalize(FieldKind::Note, &raw))
        }
    }

    fn relations(&self, xref: &Xref) -> Vec<Relation> {
        let links = self.doc.links(xref);
        let mut relations = Vec::new();

        for family_xref in &links.child_of {
            let Some(family) = self.family(family_xref, xref) else {
                continue;
            };
            for parent in family.spouses() {
                relations.extend(self.relation(RelationKind::Parent, parent, xref));
            }
        }

        for family_xref in &links.spouse_in {
            let Some(family) = self.family(family_xref, xref) else {
                continue;
            };
            if let Some(spouse) = family.spouse_of(xref) {
                relations.extend(self.relation(RelationKind::Spouse, spouse, xref));
            }
            for child in &family.children {
                relations.extend(self.relation(RelationKind::Child, child, xref));
            }
        }
        relations
    }

    fn family(&self, family: &Xref, owner: &Xref) -> Option<Family> {
        let found = self.doc.family(family);
        if found.is_none() {
            tracing::warn!("{owner}: family {family} not found");
        }
        found
    }

    fn relation(&self, kind: RelationKind, target: &Xref, owner: &Xref) -> Option<Relation> {
        let Some(header) = self.header_for(target) else {
            tracing::warn!("{owner}: {} {target} not found", kind.label());
            return None;
        };
        Some(Relation::new(kind, header))
    }
}

fn is_continuation(tag: &str) -> bool {
    matches!(tag, "CONC" | "CONT")
}

/// Parses the first `NAME` of a record, letting nested parts override the
/// `given /surname/ suffix` pattern.
fn name_parts(record: Record<'_>) -> NameParts {
    let mut parts = NameParts::default();
    let Some(name) = record.children_tagged("NAME").next() else {
        return parts;
    };

    let raw = record.full_value(name).0;
    let raw = raw.trim();
    if let Some(caps) = NAME_PATTERN.captures(raw) {
        parts.given = caps[1].trim().to_string();
        parts.surname = caps[2].trim().to_string();
        parts.suffix = caps.get(4).map_or("", |m| m.as_str().trim()).to_string();
    }

    for entry in record.subtree(name) {
        let value = entry.value.trim();
        match entry.tag {
            "GIVN" if !value.is_empty() => parts.given = value.to_string(),
            "SURN" if !value.is_empty() => parts.surname = value.to_string(),
            "NICK" => parts.nickname = strip_quotes(&record.full_value(entry).0).to_string(),
            "NPFX" => parts.prefix = value.to_string(),
            "NSFX" => parts.suffix = value.to_string(),
            _ => {}
        }
    }
    parts
}

/// Birth and death years from the first dated `BIRT` and `DEAT`.
fn years(record: Record<'_>) -> (String, String) {
    let year = |event| {
        record
            .event_date(event)
            .map(|date| year_from(&normalize_date(&date)))
            .unwrap_or_default()
    };
    (year("BIRT"), year("DEAT"))
}

//! Per-individual data derived from a document on demand.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::domain::Xref;

/// The parts of a person's name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameParts {
    /// Given name(s).
    pub given: String,
    /// Surname.
    pub surname: String,
    /// Nickname, with surrounding quotes removed.
    pub nickname: String,
    /// Name prefix (e.g. a title).
    pub prefix: String,
    /// Name suffix (e.g. `Jr.`).
    pub suffix: String,
}

impl NameParts {
    /// The display name: given name, nickname and surname, separated by
    /// single spaces, followed by the prefix/suffix symbols if any.
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut name = [
            self.given.trim(),
            strip_quotes(&self.nickname),
            self.surname.trim(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        let symbols: String = self
            .prefix
            .chars()
            .chain(self.suffix.chars())
            .filter(|c| !c.is_whitespace())
            .collect();
        if !symbols.is_empty() {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(&symbols);
        }
        name
    }

    /// Whether no name component is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name().is_empty()
    }
}

/// Removes surrounding whitespace and quote characters from a nickname.
#[must_use]
pub fn strip_quotes(nickname: &str) -> &str {
    nickname.trim().trim_matches(|c| c == '"' || c == '\'')
}

/// Formats birth/death years as `YYYY-YYYY`, `YYYY-`, `-YYYY` or nothing.
#[must_use]
pub fn life_span(birth_year: &str, death_year: &str) -> String {
    match (birth_year.is_empty(), death_year.is_empty()) {
        (false, false) => format!("{birth_year}-{death_year}"),
        (false, true) => format!("{birth_year}-"),
        (true, false) => format!("-{death_year}"),
        (true, true) => String::new(),
    }
}

/// Builds the header line `Name YYYY-YYYY, id`.
///
/// Empty components are left out together with their separating space.
///
/// ```
/// use genreport::domain::view::{format_header, NameParts};
///
/// let name = NameParts {
///     given: "Anna".into(),
///     surname: "Karlsson".into(),
///     ..NameParts::default()
/// };
/// assert_eq!(format_header(&name, "1850", "1920", "7"), "Anna Karlsson 1850-1920, 7");
/// ```
#[must_use]
pub fn format_header(name: &NameParts, birth_year: &str, death_year: &str, id: &str) -> String {
    let label = [name.display_name(), life_span(birth_year, death_year)]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{label}, {id}").trim().to_string()
}

/// The content handling a field receives, decided by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// `DATE`
    Date,
    /// `PLAC`
    Place,
    /// `ADDR` and its address-line parts.
    Address,
    /// `NOTE`: literal text or a pointer to a note record.
    Note,
    /// Free-text tags (`CAUS`, `TYPE`, `TEXT`).
    Text,
    /// Everything else.
    Generic,
}

impl FieldKind {
    /// Classifies a tag.
    #[must_use]
    pub fn of(tag: &str) -> Self {
        match tag {
            "DATE" => Self::Date,
            "PLAC" => Self::Place,
            "ADDR" | "ADR1" | "ADR2" | "ADR3" | "CITY" | "STAE" | "POST" | "POSTAL_CODE"
            | "CTRY" => Self::Address,
            "NOTE" => Self::Note,
            "CAUS" | "TYPE" | "TEXT" => Self::Text,
            _ => Self::Generic,
        }
    }
}

/// Human-readable label for a single tag, if it is a known one.
#[must_use]
pub fn tag_label(tag: &str) -> Option<&'static str> {
    Some(match tag {
        "NAME" => "name",
        "GIVN" => "given name",
        "SURN" => "surname",
        "NICK" => "nickname",
        "NPFX" => "name prefix",
        "NSFX" => "name suffix",
        "SEX" => "sex",
        "BIRT" => "birth",
        "DEAT" => "death",
        "BURI" => "burial",
        "RESI" => "residence",
        "OCCU" => "occupation",
        "EDUC" => "education",
        "MILI" => "military service",
        "EVEN" => "event",
        "TITL" => "title",
        "ALIA" => "alias",
        "FACT" => "fact",
        "DSCR" => "description",
        "RELI" => "religion",
        "NATI" => "nationality",
        "IMMI" => "immigration",
        "EMIG" => "emigration",
        "BAPM" => "baptism",
        "CHR" => "christening",
        "CONF" => "confirmation",
        "DATE" => "date",
        "PLAC" => "place",
        "ADDR" => "address",
        "ADR1" => "address line 1",
        "ADR2" => "address line 2",
        "ADR3" => "address line 3",
        "CITY" => "city",
        "STAE" => "state",
        "POST" | "POSTAL_CODE" => "postal code",
        "CTRY" => "country",
        "TYPE" => "type",
        "CAUS" => "cause",
        "NOTE" => "note",
        "TEXT" => "text",
        _ => return None,
    })
}

/// Describes a dotted field id such as `BIRT.DATE` ("birth date").
///
/// Unknown tags are described by their lowercase form.
#[must_use]
pub fn describe(field_id: &str) -> String {
    field_id
        .split('.')
        .take(2)
        .map(|tag| tag_label(tag).map_or_else(|| tag.to_lowercase(), str::to_string))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One extracted value of an individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Dotted tag path, e.g. `BIRT.DATE`, `SOUR.PAGE` or `OCCU`.
    pub id: String,
    /// Human-readable label.
    pub description: String,
    /// Extracted text, possibly spanning several lines.
    pub content: String,
    /// How the content was handled.
    pub kind: FieldKind,
}

impl Field {
    /// Creates a field, deriving the description from the id.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: FieldKind, content: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            description: describe(&id),
            id,
            content: content.into(),
            kind,
        }
    }
}

/// The relationship of a related person to the individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationKind {
    /// Father or mother (from a family the individual is a child of).
    Parent,
    /// The other partner of a family the individual is a spouse in.
    Spouse,
    /// A child of a family the individual is a spouse in.
    Child,
}

impl RelationKind {
    /// Short label: `parent`, `spouse` or `child`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Spouse => "spouse",
            Self::Child => "child",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Parent => "PARENT",
            Self::Spouse => "SPOUSE",
            Self::Child => "CHILD",
        })
    }
}

static TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*(\d+)\s*$").expect("valid regex"));

/// A link from an individual to a related person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// Relationship kind.
    pub kind: RelationKind,
    /// Human-readable label.
    pub description: String,
    /// Header line of the related person (`Name YYYY-YYYY, id`).
    pub target: String,
}

impl Relation {
    /// Creates a relation with the kind's default description.
    #[must_use]
    pub fn new(kind: RelationKind, target: String) -> Self {
        Self {
            kind,
            description: kind.label().to_string(),
            target,
        }
    }

    /// Recovers the related person's numeric id from the trailing `, id` of
    /// the target line.
    #[must_use]
    pub fn target_number(&self) -> Option<&str> {
        TRAILING_NUMBER
            .captures(&self.target)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Recorded sex of an individual.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    /// `SEX M`
    Male,
    /// `SEX F`
    Female,
    /// Absent or any other value.
    #[default]
    Unknown,
}

impl Gender {
    /// Parses a `SEX` value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "M" => Self::Male,
            "F" => Self::Female,
            _ => Self::Unknown,
        }
    }

    /// `M`, `F` or the empty string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Unknown => "",
        }
    }
}

/// Everything extracted for one individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndividualView {
    /// The individual's cross-reference.
    pub xref: Xref,
    /// Name components.
    pub name: NameParts,
    /// Birth year, or empty.
    pub birth_year: String,
    /// Death year, or empty.
    pub death_year: String,
    /// `Name YYYY-YYYY, id`
    pub header: String,
    /// Fields in source order.
    pub fields: Vec<Field>,
    /// Parents, then spouses and children, in source order.
    pub relations: Vec<Relation>,
}

impl IndividualView {
    /// Fields with the given id.
    pub fn fields_with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |field| field.id == id)
    }

    /// Relations of the given kind.
    pub fn relations_of(&self, kind: RelationKind) -> impl Iterator<Item = &Relation> + '_ {
        self.relations.iter().filter(move |relation| relation.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn name(given: &str, surname: &str) -> NameParts {
        NameParts {
            given: given.to_string(),
            surname: surname.to_string(),
            ..NameParts::default()
        }
    }

    #[test]
    fn header_with_full_life_span() {
        assert_eq!(
            format_header(&name("Anna", "Karlsson"), "1850", "1920", "7"),
            "Anna Karlsson 1850-1920, 7"
        );
    }

    #[test_case("1850", "", "1850-"; "birth only")]
    #[test_case("", "1920", "-1920"; "death only")]
    #[test_case("", "", ""; "neither")]
    fn life_span_shapes(birth: &str, death: &str, expected: &str) {
        assert_eq!(life_span(birth, death), expected);
    }

    #[test]
    fn header_without_years_has_no_gap() {
        assert_eq!(format_header(&name("Anna", "Karlsson"), "", "", "7"), "Anna Karlsson, 7");
    }

    #[test]
    fn header_without_name() {
        assert_eq!(format_header(&NameParts::default(), "1850", "", "7"), "1850-, 7");
        assert_eq!(format_header(&NameParts::default(), "", "", "7"), ", 7");
    }

    #[test]
    fn nickname_and_symbols() {
        let parts = NameParts {
            given: "Johan".into(),
            surname: "Berg".into(),
            nickname: "\"Jocke\"".into(),
            prefix: "Dr .".into(),
            suffix: "Jr.".into(),
        };
        assert_eq!(parts.display_name(), "Johan Jocke Berg Dr.Jr.");
    }

    #[test_case("BIRT.DATE", "birth date"; "known pair")]
    #[test_case("OCCU", "occupation"; "single")]
    #[test_case("SOUR.PAGE", "sour page"; "unknown tags")]
    #[test_case("_MILT", "_milt"; "custom tag")]
    fn descriptions(id: &str, expected: &str) {
        assert_eq!(describe(id), expected);
    }

    #[test_case("PLAC", FieldKind::Place)]
    #[test_case("CTRY", FieldKind::Address)]
    #[test_case("DATE", FieldKind::Date)]
    #[test_case("NOTE", FieldKind::Note)]
    #[test_case("CAUS", FieldKind::Text)]
    #[test_case("PAGE", FieldKind::Generic)]
    fn field_kinds(tag: &str, expected: FieldKind) {
        assert_eq!(FieldKind::of(tag), expected);
    }

    #[test]
    fn relation_target_number() {
        let relation = Relation::new(RelationKind::Parent, "Per Berg 1820-1890, 12".into());
        assert_eq!(relation.target_number(), Some("12"));

        let relation = Relation::new(RelationKind::Parent, "Per Berg".into());
        assert_eq!(relation.target_number(), None);
    }

    #[test]
    fn gender_codes() {
        assert_eq!(Gender::parse(" m "), Gender::Male);
        assert_eq!(Gender::parse("F"), Gender::Female);
        assert_eq!(Gender::parse("U"), Gender::Unknown);
        assert_eq!(Gender::Unknown.code(), "");
    }
}

//! Date handling for event values.
//!
//! Interchange files carry dates as free text (`12 MAR 1850`, `ABT 1850`,
//! `1850-03-12`, ...). Only two things are needed from them here: a best-effort
//! ISO rendering for display, and enough of a year/month/day to order people
//! by birth.

use std::sync::LazyLock;

use regex::Regex;

static ISO_FULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static ISO_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));
static SORTABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})(?:[- /.](\d{1,2}))?(?:[- /.](\d{1,2}))?").expect("valid regex")
});

/// Month names and abbreviations recognised in `DD MON YYYY` dates.
///
/// Covers the interchange-format abbreviations and full Swedish month names.
fn month_number(name: &str) -> Option<&'static str> {
    Some(match name.to_uppercase().as_str() {
        "JAN" | "JANUARI" => "01",
        "FEB" | "FEBRUARI" => "02",
        "MAR" | "MARS" => "03",
        "APR" | "APRIL" => "04",
        "MAY" | "MAJ" => "05",
        "JUN" | "JUNI" => "06",
        "JUL" | "JULI" => "07",
        "AUG" | "AUGUSTI" => "08",
        "SEP" | "SEPTEMBER" => "09",
        "OCT" | "OKTOBER" => "10",
        "NOV" | "NOVEMBER" => "11",
        "DEC" | "DECEMBER" => "12",
        _ => return None,
    })
}

/// Best-effort normalization of a date value.
///
/// - `YYYY-MM-DD` is returned unchanged.
/// - `DD MON YYYY` becomes `YYYY-MM-DD`; a missing day becomes `??`.
/// - Otherwise the first four-digit year is returned, or the trimmed input if
///   there is none.
///
/// ```
/// use genreport::domain::date::normalize_date;
///
/// assert_eq!(normalize_date("12 MAR 1850"), "1850-03-12");
/// assert_eq!(normalize_date("ABT 1850"), "1850");
/// assert_eq!(normalize_date("unknown"), "unknown");
/// ```
#[must_use]
pub fn normalize_date(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() || ISO_FULL.is_match(s) {
        return s.to_string();
    }

    let parts: Vec<&str> = s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() >= 3 {
        let day: String = parts[0].chars().filter(char::is_ascii_digit).collect();
        let month = month_number(parts[1]);
        let year = parts.last().and_then(|p| YEAR.find(p));
        if let (Some(month), Some(year)) = (month, year) {
            let day = if day.is_empty() {
                "??".to_string()
            } else {
                format!("{day:0>2}")
            };
            return format!("{}-{month}-{day}", year.as_str());
        }
    }

    YEAR.find(s)
        .map_or_else(|| s.to_string(), |m| m.as_str().to_string())
}

/// Extracts a four-digit year from a date-like string.
///
/// The year of an embedded `YYYY-MM-DD` wins; otherwise the first four-digit
/// run is used. Returns an empty string when there is none.
#[must_use]
pub fn year_from(date: &str) -> String {
    if let Some(caps) = ISO_ANYWHERE.captures(date) {
        return caps[1].to_string();
    }
    YEAR.find(date)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Sort key ordering individuals oldest-birth-first.
///
/// Missing components take the value [`BirthKey::UNKNOWN`], so partial and
/// absent dates sort after fully known ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BirthKey {
    year: u32,
    month: u32,
    day: u32,
}

impl BirthKey {
    /// Sentinel for an unknown component.
    pub const UNKNOWN: u32 = 9999;

    /// The key of an individual without a usable birth date.
    pub const MISSING: Self = Self {
        year: Self::UNKNOWN,
        month: Self::UNKNOWN,
        day: Self::UNKNOWN,
    };

    /// Parses a key from a (preferably normalized) date value.
    #[must_use]
    pub fn parse(date: &str) -> Self {
        let Some(caps) = SORTABLE.captures(date) else {
            return Self::MISSING;
        };
        let component = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(Self::UNKNOWN)
        };
        Self {
            year: component(1),
            month: component(2),
            day: component(3),
        }
    }

    /// Returns `(year, month, day)`.
    #[must_use]
    pub const fn as_tuple(self) -> (u32, u32, u32) {
        (self.year, self.month, self.day)
    }
}

impl Default for BirthKey {
    fn default() -> Self {
        Self::MISSING
    }
}

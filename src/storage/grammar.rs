//! Line-level grammar.
//!
//! Every structural line looks like `LEVEL [@XREF@] TAG [VALUE]`. A line
//! without a leading level number is not structural.

use crate::domain::xref::is_pointer;

/// Tag that appends its value verbatim to the preceding value.
pub const CONCATENATION: &str = "CONC";
/// Tag that appends its value after a line break.
pub const NEWLINE_CONTINUATION: &str = "CONT";

/// Returns the nesting level of a line.
///
/// The level is the leading integer, which must be followed by whitespace.
///
/// ```
/// use genreport::storage::grammar::level_of;
///
/// assert_eq!(level_of("1 NAME Anna /Berg/"), Some(1));
/// assert_eq!(level_of("  2 DATE 1850"), Some(2));
/// assert_eq!(level_of("continued text"), None);
/// ```
#[must_use]
pub fn level_of(line: &str) -> Option<u32> {
    let line = line.trim_start();
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    if digits_end == 0 {
        return None;
    }
    let rest = &line[digits_end..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    line[..digits_end].parse().ok()
}

/// Splits a line into its tag and value, skipping the level and any leading
/// cross-reference token.
///
/// Parts are separated by single spaces, so the value keeps any interior or
/// leading spacing. Missing parts are empty.
///
/// ```
/// use genreport::storage::grammar::tag_and_value;
///
/// assert_eq!(tag_and_value("1 NAME Anna /Berg/"), ("NAME", "Anna /Berg/"));
/// assert_eq!(tag_and_value("0 @I1@ INDI"), ("INDI", ""));
/// assert_eq!(tag_and_value("2 CONC  more"), ("CONC", " more"));
/// ```
#[must_use]
pub fn tag_and_value(line: &str) -> (&str, &str) {
    let line = line.trim_start().trim_end_matches(['\r', '\n']);
    let mut parts = line.splitn(3, ' ');
    let _level = parts.next();
    let Some(first) = parts.next() else {
        return ("", "");
    };
    let rest = parts.next().unwrap_or("");

    if is_pointer(first) {
        let mut parts = rest.splitn(2, ' ');
        let tag = parts.next().unwrap_or("");
        (tag, parts.next().unwrap_or(""))
    } else {
        (first, rest)
    }
}

/// Text reassembled from continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    /// The appended text (without the owner's own value).
    pub text: String,
    /// Index of the first line that is not part of the continuation.
    pub next: usize,
}

/// Collects the continuation lines following `lines[owner]`.
///
/// Consumes lines deeper than `owner_level` tagged `CONC` (appended verbatim)
/// or `CONT` (appended after a line break), stopping at the first line that is
/// neither or that is not deeper.
#[must_use]
pub fn collect_continuation(lines: &[String], owner: usize, owner_level: u32) -> Continuation {
    let mut text = String::new();
    let mut next = owner + 1;
    while let Some(line) = lines.get(next) {
        match level_of(line) {
            Some(level) if level > owner_level => {}
            _ => break,
        }
        match tag_and_value(line) {
            (CONCATENATION, value) => text.push_str(value),
            (NEWLINE_CONTINUATION, value) => {
                text.push('\n');
                text.push_str(value);
            }
            _ => break,
        }
        next += 1;
    }
    Continuation { text, next }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test_case("0 HEAD", Some(0); "record start")]
    #[test_case("12 TAG", Some(12); "multi digit")]
    #[test_case("\t3\tTAG", Some(3); "tabs")]
    #[test_case("0", None; "level only")]
    #[test_case("1A TAG", None; "digits run into text")]
    #[test_case("", None; "empty")]
    fn levels(line: &str, expected: Option<u32>) {
        assert_eq!(level_of(line), expected);
    }

    #[test_case("1 BIRT", ("BIRT", ""); "tag only")]
    #[test_case("1 SEX M", ("SEX", "M"); "simple value")]
    #[test_case("1 NOTE two  spaces", ("NOTE", "two  spaces"); "interior spacing kept")]
    #[test_case("0 @N1@ NOTE Some text", ("NOTE", "Some text"); "pointer then value")]
    #[test_case("1 FAMS @F2@", ("FAMS", "@F2@"); "pointer value")]
    #[test_case("1", ("", ""); "level only")]
    fn tags_and_values(line: &str, expected: (&str, &str)) {
        assert_eq!(tag_and_value(line), expected);
    }

    #[test]
    fn concatenation_reassembles_exactly() {
        let original = "This sentence was split in the middle of a word.";
        let doc = lines(
            "1 NOTE This sentence was split\n2 CONC  in the mid\n2 CONC dle of a word.\n1 SEX F",
        );
        let (_, head) = tag_and_value(&doc[0]);
        let continuation = collect_continuation(&doc, 0, 1);
        assert_eq!(format!("{head}{}", continuation.text), original);
        assert_eq!(continuation.next, 3);
    }

    #[test]
    fn newline_continuation_inserts_breaks() {
        let doc = lines("1 NOTE first\n2 CONT second\n2 CONT\n2 CONT fourth\n1 SEX F");
        let continuation = collect_continuation(&doc, 0, 1);
        assert_eq!(continuation.text, "\nsecond\n\nfourth");
        assert_eq!(continuation.next, 4);
    }

    #[test]
    fn stops_at_other_tags() {
        let doc = lines("1 BIRT\n2 DATE 1850\n2 CONC ignored");
        let continuation = collect_continuation(&doc, 0, 1);
        assert_eq!(continuation.text, "");
        assert_eq!(continuation.next, 1);
    }

    #[test]
    fn stops_at_shallower_level() {
        let doc = lines("2 PAGE a\n3 CONC b\n2 CONC c");
        let continuation = collect_continuation(&doc, 0, 2);
        assert_eq!(continuation.text, "b");
        assert_eq!(continuation.next, 2);
    }

    #[test]
    fn stops_at_end_of_input() {
        let doc = lines("1 NOTE a\n2 CONT b");
        let continuation = collect_continuation(&doc, 0, 1);
        assert_eq!(continuation.text, "\nb");
        assert_eq!(continuation.next, 2);
    }
}

//! Decoding raw file bytes into text lines.
//!
//! Files come in whatever encoding the exporting program chose. Decoding never
//! fails: the cascade below always produces some text, preferring UTF-16 and
//! UTF-8 and falling back to Latin-1 with repair of double-encoded UTF-8.

use std::{
    borrow::Cow,
    io,
    path::{Path, PathBuf},
};

const UTF16_LE_BOM: &[u8] = b"\xff\xfe";
const UTF16_BE_BOM: &[u8] = b"\xfe\xff";
const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Largest share of replacement characters tolerated in lossy UTF-8 before
/// falling back to Latin-1 (about one in 2000).
const MAX_REPLACEMENT_RATIO: f64 = 0.0005;

/// Reads a file and decodes it into lines.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, and
/// [`LoadError::Empty`] if it contains nothing but whitespace.
#[tracing::instrument(level = "debug")]
pub fn read_lines(path: &Path) -> Result<Vec<String>, LoadError> {
    let raw = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let lines = decode(&raw);
    if lines.iter().all(|line| line.trim().is_empty()) {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    tracing::debug!("Read {} lines from {}", lines.len(), path.display());
    Ok(lines)
}

/// Decodes raw bytes into lines without NUL characters or line terminators.
#[must_use]
pub fn decode(raw: &[u8]) -> Vec<String> {
    split_lines(&decode_text(raw))
}

fn decode_text(raw: &[u8]) -> String {
    if raw.starts_with(UTF16_LE_BOM) || raw.starts_with(UTF16_BE_BOM) {
        if let Some(text) = decode_utf16(raw) {
            tracing::debug!("Decoded as UTF-16");
            return text;
        }
    }

    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);

    if let Ok(text) = std::str::from_utf8(raw) {
        tracing::debug!("Decoded as UTF-8");
        return text.to_string();
    }

    let lossy = String::from_utf8_lossy(raw);
    let replaced = lossy.chars().filter(|&c| c == char::REPLACEMENT_CHARACTER).count();
    let total = lossy.chars().count().max(1);
    #[allow(clippy::cast_precision_loss)]
    let ratio = replaced as f64 / total as f64;
    if ratio < MAX_REPLACEMENT_RATIO {
        tracing::debug!("Decoded as UTF-8 with {replaced} replacement characters");
        return lossy.into_owned();
    }

    tracing::debug!("Decoded as Latin-1 ({replaced} invalid UTF-8 sequences)");
    let latin1 = decode_latin1(raw);
    let before = mojibake_score(&latin1);
    let text = match reencode(&latin1, false) {
        Some(fixed) if mojibake_score(&fixed) < before => fixed,
        _ => latin1,
    };
    if mojibake_score(&text) == 0 {
        return text;
    }
    split_terminators(&text)
        .into_iter()
        .map(|line| repair_double_encoding(line).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes UTF-16 with a byte-order mark, strictly.
fn decode_utf16(raw: &[u8]) -> Option<String> {
    let little_endian = raw.starts_with(UTF16_LE_BOM);
    let body = &raw[2..];
    if body.len() % 2 != 0 {
        return None;
    }
    let units = body.chunks_exact(2).map(|pair| {
        let bytes = [pair[0], pair[1]];
        if little_endian {
            u16::from_le_bytes(bytes)
        } else {
            u16::from_be_bytes(bytes)
        }
    });
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Every byte maps to the code point of the same value.
fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

/// Counts characters that typically appear when UTF-8 is read as Latin-1.
#[must_use]
pub fn mojibake_score(text: &str) -> usize {
    text.chars().filter(|c| matches!(c, 'Ã' | 'Â' | 'â')).count()
}

/// Undoes UTF-8 that was decoded as Latin-1, if that lowers the mojibake score.
///
/// Text is re-encoded as Latin-1 and decoded as UTF-8, strictly first and then
/// dropping invalid sequences. The original is returned when neither attempt
/// is an improvement.
#[must_use]
pub fn repair_double_encoding(text: &str) -> Cow<'_, str> {
    let before = mojibake_score(text);
    if before == 0 {
        return Cow::Borrowed(text);
    }

    [false, true]
        .into_iter()
        .filter_map(|lossy| reencode(text, lossy))
        .find(|fixed| mojibake_score(fixed) < before)
        .map_or(Cow::Borrowed(text), Cow::Owned)
}

/// Encodes `text` as Latin-1 and decodes the bytes as UTF-8.
///
/// Strict mode fails on any character outside Latin-1 or any invalid UTF-8;
/// lossy mode drops both.
fn reencode(text: &str, lossy: bool) -> Option<String> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match u8::try_from(u32::from(c)) {
            Ok(b) => bytes.push(b),
            Err(_) if lossy => {}
            Err(_) => return None,
        }
    }
    match String::from_utf8(bytes) {
        Ok(fixed) => Some(fixed),
        Err(err) if lossy => Some(
            String::from_utf8_lossy(err.as_bytes())
                .chars()
                .filter(|&c| c != char::REPLACEMENT_CHARACTER)
                .collect(),
        ),
        Err(_) => None,
    }
}

fn split_lines(text: &str) -> Vec<String> {
    split_terminators(text)
        .into_iter()
        .map(|line| line.replace('\0', ""))
        .collect()
}

/// Splits on `\r\n`, `\n` or a lone `\r`. A final terminator does not start
/// another line.
fn split_terminators(text: &str) -> Vec<&str> {
    let text = text
        .strip_suffix("\r\n")
        .or_else(|| text.strip_suffix(['\n', '\r']))
        .unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }
    text.split("\r\n")
        .flat_map(|line| line.split(['\n', '\r']))
        .collect()
}

/// Errors that can occur when loading a file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The file contains no text.
    #[error("{} is empty", .0.display())]
    Empty(PathBuf),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use test_case::test_case;

    use super::*;

    #[test]
    fn plain_utf8() {
        assert_eq!(decode(b"0 HEAD\r\n1 CHAR UTF-8\n"), vec!["0 HEAD", "1 CHAR UTF-8"]);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice("0 HEAD\n1 NAME Åsa\n".as_bytes());
        assert_eq!(decode(&raw), vec!["0 HEAD", "1 NAME Åsa"]);
    }

    #[test]
    fn utf16_little_endian() {
        let mut raw = UTF16_LE_BOM.to_vec();
        for unit in "0 HEAD\r\n1 NAME Öberg".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode(&raw), vec!["0 HEAD", "1 NAME Öberg"]);
    }

    #[test]
    fn utf16_big_endian() {
        let mut raw = UTF16_BE_BOM.to_vec();
        for unit in "0 TRLR".encode_utf16() {
            raw.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode(&raw), vec!["0 TRLR"]);
    }

    #[test_case(b"0 HEAD\r1 CHAR ANSEL\r" ; "carriage returns")]
    #[test_case(b"0 HEAD\r\n1 CHAR ANSEL\n" ; "mixed")]
    fn line_terminators(raw: &[u8]) {
        assert_eq!(decode(raw), vec!["0 HEAD", "1 CHAR ANSEL"]);
    }

    #[test]
    fn latin1_with_carriage_returns() {
        let raw = b"1 NAME \xd6berg\r1 PLAC Sm\xc3\xa5land\r";
        assert_eq!(decode(raw), vec!["1 NAME Öberg", "1 PLAC Småland"]);
    }

    #[test]
    fn nul_characters_removed() {
        assert_eq!(decode(b"0 H\0EAD\n"), vec!["0 HEAD"]);
    }

    #[test]
    fn rare_invalid_bytes_keep_utf8() {
        let mut raw = "1 NAME Åsa\n".repeat(400).into_bytes();
        raw.push(0xff);
        let lines = decode(&raw);
        assert_eq!(lines[0], "1 NAME Åsa");
        assert!(lines.last().unwrap().contains(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn latin1_fallback() {
        // "Åsa Öberg" in Latin-1
        let raw = b"1 NAME \xc5sa \xd6berg\n";
        assert_eq!(decode(raw), vec!["1 NAME Åsa Öberg"]);
    }

    #[test]
    fn repairs_double_encoded_text() {
        assert_eq!(repair_double_encoding("SmÃ¥land"), "Småland");
        assert_eq!(repair_double_encoding("Småland"), "Småland");
    }

    #[test]
    fn keeps_text_when_repair_does_not_help() {
        // Re-encoding "Ã\u{83}" decodes to a lone "Ã": no improvement.
        assert_eq!(repair_double_encoding("Ã\u{83}"), "Ã\u{83}");
    }

    #[test]
    fn latin1_file_with_double_encoded_line() {
        // A Latin-1 line next to a line carrying UTF-8 bytes.
        let mut raw = b"1 NAME \xd6berg\n".to_vec();
        raw.extend_from_slice(b"1 PLAC Sm\xc3\xa5land\n");
        let lines = decode(&raw);
        assert_eq!(lines, vec!["1 NAME Öberg", "1 PLAC Småland"]);
    }

    #[test]
    fn read_lines_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0 HEAD\n0 TRLR\n").unwrap();
        assert_eq!(read_lines(file.path()).unwrap(), vec!["0 HEAD", "0 TRLR"]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(read_lines(file.path()), Err(LoadError::Empty(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = read_lines(&tmp.path().join("missing.ged"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}

use std::{borrow::Borrow, fmt, ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};

/// A cross-reference token identifying a record within a document.
///
/// Format: `@{TOKEN}@`, where `TOKEN` is non-empty and contains no `@`.
///
/// Examples: `@I123@` (individual), `@F7@` (family), `@N2@` (note).
///
/// Cross-references are weak references: they are keys into the document's
/// indices, and resolving one may fail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Xref(String);

impl Xref {
    /// Creates a cross-reference from a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if the string is not wrapped in `@` markers,
    /// has an empty token, or contains an `@` inside the token.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        if is_pointer(&s) {
            Ok(Self(s))
        } else {
            Err(Error::Syntax(s))
        }
    }

    /// Returns the string slice, including the `@` markers.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the token between the `@` markers.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.0[1..self.0.len() - 1]
    }

    /// Returns the bare numeric id used in headers and for user lookup.
    ///
    /// `@I123@` yields `"123"`. Other shapes yield every digit in the token,
    /// and a token without digits is returned as-is.
    ///
    /// ```
    /// use genreport::Xref;
    ///
    /// assert_eq!(Xref::new("@I123@").unwrap().number(), "123");
    /// assert_eq!(Xref::new("@P-4-2@").unwrap().number(), "42");
    /// assert_eq!(Xref::new("@SUBM@").unwrap().number(), "SUBM");
    /// ```
    #[must_use]
    pub fn number(&self) -> String {
        let token = self.token();
        if let Some(digits) = token.strip_prefix('I') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return digits.to_string();
            }
        }
        let digits: String = token.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            token.to_string()
        } else {
            digits
        }
    }

    /// The numeric id as an integer, used for ordering individuals.
    ///
    /// Tokens without digits, or with more digits than fit, order as zero.
    #[must_use]
    pub fn ordinal(&self) -> u64 {
        let digits: String = self.token().chars().filter(char::is_ascii_digit).collect();
        digits.parse().unwrap_or(0)
    }
}

/// Returns `true` if `s` has the shape of a cross-reference (`@TOKEN@`).
#[must_use]
pub fn is_pointer(s: &str) -> bool {
    s.len() > 2
        && s.starts_with('@')
        && s.ends_with('@')
        && !s[1..s.len() - 1].contains('@')
}

impl Borrow<str> for Xref {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Xref {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Xref {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Xref {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Xref {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Xref {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Xref {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Xref> for String {
    fn from(xref: Xref) -> Self {
        xref.0
    }
}

/// Errors that can occur when parsing a cross-reference.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The text is not of the form `@TOKEN@`.
    #[error("Invalid cross-reference '{0}': expected a token wrapped in '@' markers")]
    Syntax(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;

    #[test_case("@I1@"; "individual")]
    #[test_case("@F12@"; "family")]
    #[test_case("@N3@"; "note")]
    #[test_case("@SUBM1@"; "submitter")]
    fn accepts_pointers(input: &str) {
        let xref = Xref::new(input).unwrap();
        assert_eq!(xref.as_str(), input);
    }

    #[test_case(""; "empty")]
    #[test_case("@@"; "empty token")]
    #[test_case("I1"; "no markers")]
    #[test_case("@I1"; "unterminated")]
    #[test_case("@I@1@"; "inner marker")]
    fn rejects_malformed(input: &str) {
        assert_eq!(Xref::new(input), Err(Error::Syntax(input.to_string())));
    }

    #[test_case("@I123@", "123"; "individual digits")]
    #[test_case("@I007@", "007"; "leading zeros kept")]
    #[test_case("@P12X3@", "123"; "scattered digits")]
    #[test_case("@SUBM@", "SUBM"; "no digits")]
    fn number_extraction(input: &str, expected: &str) {
        assert_eq!(Xref::new(input).unwrap().number(), expected);
    }

    #[test]
    fn ordinal_orders_numerically() {
        let a = Xref::new("@I9@").unwrap();
        let b = Xref::new("@I10@").unwrap();
        assert!(a.ordinal() < b.ordinal());
        assert_eq!(Xref::new("@SUBM@").unwrap().ordinal(), 0);
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(Xref::new("@I1@").unwrap(), 1);
        assert_eq!(map.get("@I1@"), Some(&1));
        assert_eq!(map.get("@I2@"), None);
    }

    #[test]
    fn serde_as_string() {
        let xref: Xref = toml::from_str::<HashMap<String, Xref>>("x = \"@I5@\"")
            .unwrap()
            .remove("x")
            .unwrap();
        assert_eq!(xref.as_str(), "@I5@");
        assert!(toml::from_str::<HashMap<String, Xref>>("x = \"I5\"").is_err());
    }
}

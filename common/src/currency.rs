//! Currency value object.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Code point of REGIONAL INDICATOR SYMBOL LETTER A.
const REGIONAL_INDICATOR_BASE: u32 = 0x1F1E6;

/// An ISO 4217 currency with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    code: String,
    name: String,
}

impl Currency {
    /// Create a new currency. The code is upper-cased.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_uppercase(),
            name: name.into(),
        }
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flag emoji for the country part of the code.
    ///
    /// The first two letters of an ISO 4217 code are the ISO 3166 country
    /// code (`USD` -> `US`), and each letter maps onto a regional indicator
    /// symbol. Codes that don't start with two ASCII letters get an empty glyph.
    pub fn flag_glyph(&self) -> String {
        flag_glyph(&self.code)
    }

    pub fn usd() -> Self {
        Self::new("USD", "United States Dollar")
    }

    pub fn eur() -> Self {
        Self::new("EUR", "Euro")
    }

    pub fn gbp() -> Self {
        Self::new("GBP", "British Pound")
    }

    pub fn jpy() -> Self {
        Self::new("JPY", "Japanese Yen")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl PartialOrd for Currency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Currency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code
            .cmp(&other.code)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Map the first two letters of `code` to regional indicator symbols.
pub fn flag_glyph(code: &str) -> String {
    let letters: Vec<char> = code.chars().take(2).collect();
    if letters.len() != 2 || !letters.iter().all(|c| c.is_ascii_alphabetic()) {
        return String::new();
    }

    letters
        .iter()
        .filter_map(|c| {
            let offset = c.to_ascii_uppercase() as u32 - 'A' as u32;
            char::from_u32(REGIONAL_INDICATOR_BASE + offset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_uppercased() {
        let currency = Currency::new("usd", "United States Dollar");
        assert_eq!(currency.code(), "USD");
        assert_eq!(currency.to_string(), "USD");
    }

    #[test]
    fn test_flag_glyph() {
        assert_eq!(Currency::usd().flag_glyph(), "\u{1F1FA}\u{1F1F8}");
        assert_eq!(Currency::jpy().flag_glyph(), "\u{1F1EF}\u{1F1F5}");
        assert_eq!(flag_glyph("gb"), "\u{1F1EC}\u{1F1E7}");
    }

    #[test]
    fn test_flag_glyph_rejects_non_letters() {
        assert_eq!(flag_glyph(""), "");
        assert_eq!(flag_glyph("U"), "");
        assert_eq!(flag_glyph("1A"), "");
        assert_eq!(flag_glyph("É€"), "");
    }

    #[test]
    fn test_ordering_by_code() {
        let mut currencies = vec![Currency::usd(), Currency::eur(), Currency::gbp()];
        currencies.sort();

        let codes: Vec<&str> = currencies.iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec!["EUR", "GBP", "USD"]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&Currency::eur()).unwrap();
        let back: Currency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Currency::eur());
    }
}

//! Trigger keywords whose presence in a caption marks a scene as a shop.
//!
//! A [`KeywordSet`] is ordered (matches are reported in set order), holds only
//! lower-cased entries and never contains duplicates.  It is built once at
//! startup, either from [`DEFAULT_KEYWORDS`] or from a comma-separated
//! override, and is read-only afterwards.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Built-in keywords
// ---------------------------------------------------------------------------

/// Keywords used when no override is configured.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "shop",
    "store",
    "market",
    "supermarket",
    "mall",
    "boutique",
    "grocery",
    "bakery",
    "pharmacy",
    "bookstore",
    "butcher",
    "retail",
    "convenience",
    "outlet",
    "storefront",
    "vendor",
    "deli",
];

// ---------------------------------------------------------------------------
// KeywordSet
// ---------------------------------------------------------------------------

/// Ordered, deduplicated, lower-case keyword collection.
///
/// ```
/// use shop_detector::classify::KeywordSet;
///
/// let set = KeywordSet::parse(" Bakery, deli,,BAKERY ");
/// assert_eq!(set.as_slice(), ["bakery", "deli"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    /// Build a set from arbitrary entries.
    ///
    /// Each entry is trimmed and lower-cased; empty entries are dropped and
    /// later duplicates are discarded so the first occurrence keeps its slot.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = Vec::new();
        for entry in entries {
            let word = entry.as_ref().trim().to_lowercase();
            if word.is_empty() || words.contains(&word) {
                continue;
            }
            words.push(word);
        }
        Self { words }
    }

    /// Parse a comma-separated override such as `"bakery,deli"`.
    ///
    /// The result replaces the default set wholesale; it is never merged.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Iterate keywords in set order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// `true` when every override entry was blank.  Classification against an
    /// empty set never matches.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl From<Vec<String>> for KeywordSet {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}

impl From<KeywordSet> for Vec<String> {
    fn from(set: KeywordSet) -> Self {
        set.words
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_keeps_builtin_order() {
        let set = KeywordSet::default();
        assert_eq!(set.len(), DEFAULT_KEYWORDS.len());
        assert_eq!(set.as_slice()[0], "shop");
        assert_eq!(set.as_slice()[1], "store");
        assert_eq!(set.as_slice().last().map(String::as_str), Some("deli"));
    }

    #[test]
    fn parse_trims_and_lowercases() {
        let set = KeywordSet::parse("  Bakery , DELI");
        assert_eq!(set.as_slice(), ["bakery", "deli"]);
    }

    #[test]
    fn parse_drops_blank_entries() {
        let set = KeywordSet::parse(",, bakery ,  ,");
        assert_eq!(set.as_slice(), ["bakery"]);
    }

    #[test]
    fn parse_deduplicates_keeping_first_position() {
        let set = KeywordSet::parse("deli,bakery,Deli");
        assert_eq!(set.as_slice(), ["deli", "bakery"]);
    }

    #[test]
    fn parse_of_only_separators_is_empty() {
        let set = KeywordSet::parse(" , ,");
        assert!(set.is_empty());
    }

    #[test]
    fn override_does_not_merge_defaults() {
        let set = KeywordSet::parse("bakery,deli");
        assert!(!set.iter().any(|w| w == "store"));
    }

    #[test]
    fn toml_round_trip_as_plain_list() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            keywords: KeywordSet,
        }

        let parsed: Wrapper = toml::from_str(r#"keywords = ["Mall", "mall", "kiosk"]"#).unwrap();
        assert_eq!(parsed.keywords.as_slice(), ["mall", "kiosk"]);

        let text = toml::to_string(&parsed).unwrap();
        assert!(text.contains("\"kiosk\""));
    }
}

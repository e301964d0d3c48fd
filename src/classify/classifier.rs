//! Caption → shop decision.
//!
//! [`classify`] is a pure function of `(caption, keywords)`: it lower-cases
//! the caption and tests every keyword for plain substring containment.
//! Punctuation is left alone, so a keyword can match inside a longer token
//! (`"deli"` matches `"delicious"`).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::KeywordSet;

// ---------------------------------------------------------------------------
// Score curve
// ---------------------------------------------------------------------------

/// Score awarded for the first matching keyword.
const FIRST_MATCH_SCORE: u8 = 70;

/// Upper bound of [`score_for`].
pub const MAX_SCORE: u8 = 100;

/// Map a distinct-match count to a 0–100 confidence score.
///
/// The first match yields 70; every further match closes half of the
/// remaining gap (85, 93, 97, 99, 100, …).
///
/// ```
/// use shop_detector::classify::score_for;
///
/// assert_eq!(score_for(0), 0);
/// assert_eq!(score_for(1), 70);
/// assert_eq!(score_for(2), 85);
/// assert_eq!(score_for(40), 100);
/// ```
pub fn score_for(matches: usize) -> u8 {
    if matches == 0 {
        return 0;
    }
    let headroom = u32::from(MAX_SCORE - FIRST_MATCH_SCORE);
    let shift = u32::try_from(matches - 1).unwrap_or(u32::MAX).min(31);
    let missing = headroom >> shift;
    MAX_SCORE - missing as u8
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Keyword matches for one caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Matching keywords in [`KeywordSet`] order.
    pub matched: Vec<String>,
    pub is_shop: bool,
    pub score: u8,
}

/// Classify `caption` against `keywords`.
///
/// Never fails: an empty caption or an empty keyword set simply produces no
/// match and a score of 0.
pub fn classify(caption: &str, keywords: &KeywordSet) -> Classification {
    let lowered = caption.to_lowercase();
    let matched: Vec<String> = if lowered.is_empty() {
        Vec::new()
    } else {
        keywords
            .iter()
            .filter(|word| lowered.contains(word))
            .map(str::to_string)
            .collect()
    };

    Classification {
        is_shop: !matched.is_empty(),
        score: score_for(matched.len()),
        matched,
    }
}

// ---------------------------------------------------------------------------
// DetectionResult
// ---------------------------------------------------------------------------

/// Outcome of one caption-and-classify pass over one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub caption: String,
    pub is_shop: bool,
    pub score: u8,
    pub matched_keywords: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl DetectionResult {
    /// Caption and classify in one step, stamping the result with `timestamp`.
    pub fn from_caption(
        caption: impl Into<String>,
        keywords: &KeywordSet,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let caption = caption.into();
        let Classification {
            matched,
            is_shop,
            score,
        } = classify(&caption, keywords);

        Self {
            caption,
            is_shop,
            score,
            matched_keywords: matched,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> KeywordSet {
        KeywordSet::default()
    }

    #[test]
    fn grocery_store_caption_matches_store_and_grocery() {
        let c = classify("a photo of a grocery store with shelves", &defaults());
        // "grocery" is also a default keyword; matches follow the list order.
        assert!(c.is_shop);
        assert_eq!(c.matched, ["store", "grocery"]);
        assert_eq!(c.score, 85);
    }

    #[test]
    fn mall_matches_inside_small() {
        let c = classify("a small boutique", &defaults());
        assert_eq!(c.matched, ["mall", "boutique"]);
    }

    #[test]
    fn grocery_store_matches_in_set_order() {
        let set = KeywordSet::parse("store,grocery");
        let c = classify("a photo of a grocery store with shelves", &set);
        assert_eq!(c.matched, ["store", "grocery"]);
    }

    #[test]
    fn store_only_caption_matches_only_store() {
        let c = classify("a photo of a store with shelves", &defaults());
        assert_eq!(c.matched, ["store"]);
        assert_eq!(c.score, 70);
    }

    #[test]
    fn dog_in_park_is_not_a_shop() {
        let c = classify("a dog running in a park", &defaults());
        assert!(!c.is_shop);
        assert!(c.matched.is_empty());
        assert_eq!(c.score, 0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let c = classify("A BAKERY on the corner", &defaults());
        assert_eq!(c.matched, ["bakery"]);
    }

    #[test]
    fn substring_matches_inside_longer_tokens() {
        let set = KeywordSet::parse("deli");
        assert!(classify("a delicious cake", &set).is_shop);
    }

    #[test]
    fn overlapping_keywords_all_count() {
        let c = classify("a bookstore", &defaults());
        assert_eq!(c.matched, ["store", "bookstore"]);
        assert_eq!(c.score, 85);
    }

    #[test]
    fn override_replaces_default_set() {
        let set = KeywordSet::parse("bakery,deli");
        let c = classify("a man standing in front of a store", &set);
        assert!(!c.is_shop);
        assert_eq!(c.score, 0);
    }

    #[test]
    fn empty_caption_never_matches() {
        let c = classify("", &defaults());
        assert!(!c.is_shop);
        assert_eq!(c.score, 0);
    }

    #[test]
    fn empty_keyword_set_never_matches() {
        let c = classify("a shop", &KeywordSet::parse(" , "));
        assert!(!c.is_shop);
        assert_eq!(c.score, 0);
    }

    #[test]
    fn is_shop_iff_some_keyword_is_substring() {
        let captions = [
            "a market stall",
            "an empty road",
            "people in a MALL",
            "shopping carts",
            "",
            "a vendors' row",
        ];
        let set = defaults();
        for caption in captions {
            let lower = caption.to_lowercase();
            let expected = set.iter().any(|w| lower.contains(w));
            let c = classify(caption, &set);
            assert_eq!(c.is_shop, expected, "caption {caption:?}");
            assert_eq!(c.score == 0, !c.is_shop, "caption {caption:?}");
        }
    }

    #[test]
    fn score_is_monotonic_and_capped() {
        let mut previous = 0;
        for n in 0..64 {
            let s = score_for(n);
            assert!(s >= previous, "score dropped at {n}");
            assert!(s <= MAX_SCORE);
            previous = s;
        }
        assert_eq!(score_for(6), 100);
    }

    #[test]
    fn score_zero_only_without_matches() {
        assert_eq!(score_for(0), 0);
        for n in 1..20 {
            assert!(score_for(n) > 0);
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let caption = "a supermarket and a pharmacy";
        assert_eq!(classify(caption, &defaults()), classify(caption, &defaults()));
    }

    #[test]
    fn detection_result_mirrors_classification() {
        let now = Utc::now();
        let r = DetectionResult::from_caption("a boutique window", &defaults(), now);
        assert!(r.is_shop);
        assert_eq!(r.matched_keywords, ["boutique"]);
        assert_eq!(r.caption, "a boutique window");
        assert_eq!(r.timestamp, now);
    }
}

//! Caption classification — turns free caption text into a shop decision.
//!
//! * [`KeywordSet`] — ordered, deduplicated, lower-case trigger words.
//! * [`classify`] — pure substring matcher producing a [`Classification`].
//! * [`DetectionResult`] — caption + decision + score + timestamp for one frame.
//!
//! # Quick start
//!
//! ```
//! use shop_detector::classify::{classify, KeywordSet};
//!
//! let keywords = KeywordSet::default();
//! let c = classify("a dog running in a park", &keywords);
//! assert!(!c.is_shop);
//! assert_eq!(c.score, 0);
//! ```

pub mod classifier;
pub mod keywords;

pub use classifier::{classify, score_for, Classification, DetectionResult, MAX_SCORE};
pub use keywords::{KeywordSet, DEFAULT_KEYWORDS};

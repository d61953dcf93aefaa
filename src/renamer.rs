//! Tag renaming: the pure mapping from one raw tag to its replacements.
//!
//! Renaming happens in two stages. Full-match rules are checked first and
//! win outright. Every other tag is normalized (lowercased, trimmed, stripped
//! of trailing dots and closing parentheses, spaces collapsed), split on
//! compound separators such as `" and "`, `" / "` or `" ("`, and filtered
//! against a set of noise words.
//!
//! # Examples
//!
//! ```
//! use zottag::renamer::{self, RenameRules};
//!
//! // Built-in tables
//! assert_eq!(
//!     renamer::rename("Neural and Evolutionary Computing"),
//!     Some(vec!["neural computing".to_string(), "evolutionary computing".to_string()])
//! );
//! assert_eq!(renamer::rename("Machine Learning"), None);
//!
//! // Custom tables
//! let rules = RenameRules::new(
//!     [("ML".to_string(), vec!["machine learning".to_string()])],
//!     ["misc"],
//! );
//! assert_eq!(rules.rename("ML"), Some(vec!["machine learning".to_string()]));
//! ```

use std::sync::LazyLock;

mod normalizer;
mod rules;

pub use normalizer::TagNormalizer;
pub use rules::{RenameRules, RulesError};

static DEFAULT_RULES: LazyLock<RenameRules> = LazyLock::new(RenameRules::default);

/// Renames a tag using the built-in rule tables.
#[must_use]
pub fn rename(tag: &str) -> Option<Vec<String>> {
    DEFAULT_RULES.rename(tag)
}

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Separators that split a compound tag into independent tags.
///
/// Alternation is leftmost-first, so `" - "` is tried before `" -- "` at
/// each position; the two never both match at the same offset because the
/// third character differs.
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r" and | / | - | -- | \(| \| | , |, | & | : ")
        .expect("separator pattern is valid")
});

static SPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("space pattern is valid"));

/// Trims leading whitespace and any trailing mix of dots and whitespace.
fn trim_edges(text: &str) -> &str {
    text.trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

/// String-level normalization used by the tag renamer.
///
/// Unlike a full-match rule, normalization never consults any table: it only
/// reshapes the text and cuts it at separators.
pub struct TagNormalizer;

impl TagNormalizer {
    /// Normalizes a raw tag before splitting.
    ///
    /// # Normalization rules
    ///
    /// - Converts to lowercase
    /// - Removes `)` characters, since splitting happens on `" ("`
    /// - Collapses runs of spaces into one
    /// - Trims leading whitespace and trailing dots and whitespace, in any mix
    ///
    /// # Examples
    ///
    /// ```
    /// use zottag::renamer::TagNormalizer;
    ///
    /// assert_eq!(TagNormalizer::normalize_tag("  Machine   Learning. "), "machine learning");
    /// assert_eq!(TagNormalizer::normalize_tag("Physics (General)"), "physics (general");
    /// assert_eq!(TagNormalizer::normalize_tag("Math. / General"), "math. / general");
    /// ```
    #[must_use]
    pub fn normalize_tag(tag: &str) -> String {
        let without_parens = tag.to_lowercase().replace(')', "");
        let collapsed = SPACE_RUNS.replace_all(&without_parens, " ");

        trim_edges(&collapsed).to_string()
    }

    /// Splits a normalized tag into distinct fragments.
    ///
    /// Each fragment is trimmed of whitespace and trailing dots, empty
    /// fragments are discarded and duplicates keep their first position.
    ///
    /// # Examples
    ///
    /// ```
    /// use zottag::renamer::TagNormalizer;
    ///
    /// assert_eq!(
    ///     TagNormalizer::split_fragments("neural and evolutionary computing"),
    ///     vec!["neural", "evolutionary computing"]
    /// );
    /// assert_eq!(
    ///     TagNormalizer::split_fragments("math. / general"),
    ///     vec!["math", "general"]
    /// );
    /// assert_eq!(TagNormalizer::split_fragments("a & b & a"), vec!["a", "b"]);
    /// ```
    #[must_use]
    pub fn split_fragments(normalized: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        SEPARATORS
            .split(normalized)
            .map(trim_edges)
            .filter(|fragment| !fragment.is_empty() && seen.insert(*fragment))
            .map(String::from)
            .collect()
    }
}

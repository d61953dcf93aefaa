use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::normalizer::TagNormalizer;

/// Errors that can occur while loading a rules file.
#[derive(Debug, Error)]
pub enum RulesError {
    /// The rules file could not be read
    #[error("Failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rules file is not valid JSON in the expected shape
    #[error("Invalid rules file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk shape of a rules file. Both fields may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RulesFile {
    #[serde(default)]
    replacements: HashMap<String, Vec<String>>,
    #[serde(default)]
    removals: Vec<String>,
}

/// The two tables driving tag renaming.
///
/// `replacements` maps an exact raw tag to the tags that replace it and is
/// consulted before any normalization. `removals` holds lowercase fragments
/// that are dropped after a tag has been split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRules {
    replacements: HashMap<String, Vec<String>>,
    removals: HashSet<String>,
}

impl Default for RenameRules {
    fn default() -> Self {
        let replacements = [
            (
                "Neural and Evolutionary Computing",
                &["neural computing", "evolutionary computing"][..],
            ),
            (
                "Picture and Image Generations",
                &["picture generation", "image generation"][..],
            ),
            ("Algebras, Linear", &["linear algebra"][..]),
            (
                "Mathematics / Linear & Nonlinear Programming",
                &["mathematics", "linear programming", "nonlinear programming"][..],
            ),
            ("Mathematics / Applied", &["mathematics applied"][..]),
            ("math", &["mathematics"][..]),
            ("math.", &["mathematics"][..]),
            ("Math.", &["mathematics"][..]),
        ];
        let removals = [
            "general",
            "etc",
            "technique",
            "general mathematics",
            "math",
            "math.",
        ];

        Self::new(
            replacements.iter().map(|(raw, new)| {
                (
                    raw.to_string(),
                    new.iter().map(|tag| tag.to_string()).collect(),
                )
            }),
            removals,
        )
    }
}

impl RenameRules {
    /// Builds rules from explicit tables.
    ///
    /// Removal words are lowercased since they are compared against
    /// normalized fragments.
    pub fn new<R, W, S>(replacements: R, removals: W) -> Self
    where
        R: IntoIterator<Item = (String, Vec<String>)>,
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            replacements: replacements.into_iter().collect(),
            removals: removals
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Loads rules from a JSON file.
    ///
    /// ```json
    /// {
    ///   "replacements": { "Algebras, Linear": ["linear algebra"] },
    ///   "removals": ["general", "etc"]
    /// }
    /// ```
    ///
    /// A replacement mapped to an empty list removes the tag without adding
    /// anything in its place.
    ///
    /// # Errors
    ///
    /// Returns `RulesError::Io` if the file cannot be read and
    /// `RulesError::Parse` if it does not match the format above.
    pub fn from_path(path: &Path) -> Result<Self, RulesError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RulesFile =
            serde_json::from_str(&contents).map_err(|source| RulesError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::new(file.replacements, file.removals))
    }

    /// Number of full-match rules.
    pub fn replacement_count(&self) -> usize {
        self.replacements.len()
    }

    /// Returns true if `fragment` is discarded after splitting.
    pub fn is_removal(&self, fragment: &str) -> bool {
        self.removals.contains(fragment)
    }

    /// Maps a raw tag to its replacement tags, or `None` if it stays as is.
    ///
    /// A full-match rule wins outright. Otherwise the tag is normalized,
    /// split into fragments and stripped of removal words. Two or more
    /// fragments are returned as is; a single fragment only when it differs
    /// from the normalized tag, so case or spacing differences alone never
    /// trigger a rewrite.
    ///
    /// # Examples
    ///
    /// ```
    /// use zottag::renamer::RenameRules;
    ///
    /// let rules = RenameRules::default();
    /// assert_eq!(rules.rename("Algebras, Linear"), Some(vec!["linear algebra".to_string()]));
    /// assert_eq!(
    ///     rules.rename("Physics (General)"),
    ///     Some(vec!["physics".to_string()])
    /// );
    /// assert_eq!(rules.rename("Machine Learning"), None);
    /// ```
    #[must_use]
    pub fn rename(&self, tag: &str) -> Option<Vec<String>> {
        if let Some(replacements) = self.replacements.get(tag) {
            return Some(replacements.clone());
        }

        let normalized = TagNormalizer::normalize_tag(tag);
        let fragments: Vec<String> = TagNormalizer::split_fragments(&normalized)
            .into_iter()
            .filter(|fragment| !self.is_removal(fragment))
            .collect();

        match fragments.as_slice() {
            [] => None,
            [single] if *single == normalized => None,
            _ => Some(fragments),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn tags(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn full_match_rules_return_configured_list_in_order() {
        let rules = RenameRules::default();

        assert_eq!(rules.rename("Algebras, Linear"), tags(&["linear algebra"]));
        assert_eq!(
            rules.rename("Neural and Evolutionary Computing"),
            tags(&["neural computing", "evolutionary computing"])
        );
        assert_eq!(
            rules.rename("Mathematics / Linear & Nonlinear Programming"),
            tags(&["mathematics", "linear programming", "nonlinear programming"])
        );
        assert_eq!(rules.rename("Math."), tags(&["mathematics"]));
    }

    #[test]
    fn full_match_is_case_sensitive() {
        let rules = RenameRules::default();
        // "ALGEBRAS, LINEAR" falls through to splitting
        assert_eq!(
            rules.rename("ALGEBRAS, LINEAR"),
            tags(&["algebras", "linear"])
        );
    }

    #[test]
    fn plain_tag_without_separators_is_unchanged() {
        let rules = RenameRules::default();
        assert_eq!(rules.rename("Machine Learning"), None);
        assert_eq!(rules.rename("machine learning"), None);
        assert_eq!(rules.rename("  Deep   Learning. "), None);
    }

    #[test]
    fn compound_tag_is_split_in_first_occurrence_order() {
        let rules = RenameRules::default();
        assert_eq!(
            rules.rename("Computer Vision and Pattern Recognition"),
            tags(&["computer vision", "pattern recognition"])
        );
        assert_eq!(
            rules.rename("Robotics / Control / Robotics"),
            tags(&["robotics", "control"])
        );
    }

    #[test]
    fn removal_words_are_dropped_after_splitting() {
        let rules = RenameRules::default();
        assert_eq!(rules.rename("Physics (General)"), tags(&["physics"]));
        assert_eq!(
            rules.rename("Statistics - Technique - Sampling"),
            tags(&["statistics", "sampling"])
        );
    }

    #[test]
    fn all_fragments_removed_means_no_change() {
        let rules = RenameRules::default();
        assert_eq!(rules.rename("Math. / General"), None);
        assert_eq!(rules.rename("General"), None);
        assert_eq!(rules.rename("etc."), None);
    }

    #[test]
    fn single_fragment_results_are_fixed_points() {
        let rules = RenameRules::default();
        for tag in [
            "Physics (General)",
            "Algebras, Linear",
            "Mathematics / Applied",
            "Chemistry, general",
            "Optics. (Technique)",
            "Number Theory / Etc.",
        ] {
            let renamed = rules.rename(tag).expect("tag should be rewritten");
            if let [single] = renamed.as_slice() {
                assert_eq!(rules.rename(single), None, "{tag} -> {single}");
            }
        }
    }

    #[test]
    fn split_results_are_fixed_points_too() {
        let rules = RenameRules::default();
        let renamed = rules.rename("Signal Processing & Control : Theory").unwrap();
        for tag in &renamed {
            assert_eq!(rules.rename(tag), None, "{tag}");
        }
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let rules = RenameRules::new(
            [("ML".to_string(), vec!["machine learning".to_string()])],
            ["Misc"],
        );

        assert_eq!(rules.rename("ML"), tags(&["machine learning"]));
        assert!(rules.is_removal("misc"));
        assert_eq!(rules.rename("Physics (Misc)"), tags(&["physics"]));
        // "general" is no longer a removal word
        assert_eq!(
            rules.rename("Physics (General)"),
            tags(&["physics", "general"])
        );
    }

    #[test]
    fn from_path_loads_json_rules() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"replacements": {{"AI": ["artificial intelligence"]}}, "removals": ["Misc"]}}"#
        )
        .unwrap();

        let rules = RenameRules::from_path(file.path()).unwrap();

        assert_eq!(rules.replacement_count(), 1);
        assert_eq!(rules.rename("AI"), tags(&["artificial intelligence"]));
        assert!(rules.is_removal("misc"));
    }

    #[test]
    fn from_path_allows_missing_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"removals": ["noise"]}}"#).unwrap();

        let rules = RenameRules::from_path(file.path()).unwrap();

        assert_eq!(rules.replacement_count(), 0);
        assert!(rules.is_removal("noise"));
    }

    #[test]
    fn from_path_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"replacements": ["not", "a", "map"]}}"#).unwrap();

        let result = RenameRules::from_path(file.path());

        assert!(matches!(result, Err(RulesError::Parse { .. })));
    }

    #[test]
    fn from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RenameRules::from_path(&dir.path().join("absent.json"));

        let err = result.unwrap_err();
        assert!(matches!(err, RulesError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}

use serde::{Deserialize, Serialize};

/// A single tag attached to an item.
///
/// Zotero distinguishes manual tags (`type` 0 or absent) from automatic ones
/// (`type` 1). The type is carried through untouched so that rewriting an
/// item's tag list never changes the kind of the tags it keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub tag: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
}

impl TagEntry {
    /// Creates a manual tag entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use zottag::TagEntry;
    ///
    /// let entry = TagEntry::new("linear algebra");
    /// assert_eq!(entry.tag, "linear algebra");
    /// assert!(entry.kind.is_none());
    /// ```
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            kind: None,
        }
    }
}

/// A bibliographic item from the remote library.
///
/// Only the fields tag rewriting needs are kept: the stable `key`, the
/// object `version` used for conditional writes, and the tag list in the
/// order the server returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    key: String,
    version: u64,
    #[serde(default)]
    tags: Vec<TagEntry>,
}

impl Item {
    /// Creates an item with the given key and tag names at version 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use zottag::Item;
    ///
    /// let item = Item::new("ABCD1234", ["math", "Algebras, Linear"]);
    /// assert_eq!(item.key(), "ABCD1234");
    /// assert_eq!(item.tag_names().collect::<Vec<_>>(), ["math", "Algebras, Linear"]);
    /// ```
    pub fn new<I, S>(key: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            version: 0,
            tags: tags.into_iter().map(TagEntry::new).collect(),
        }
    }

    /// Sets the remote object version.
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tags(&self) -> &[TagEntry] {
        &self.tags
    }

    /// Iterates over the literal tag strings.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|entry| entry.tag.as_str())
    }

    /// Returns the tag list the item would carry after attaching `new_tags`.
    ///
    /// Existing entries keep their position and type. New tags are appended
    /// as manual tags, skipping any the item already has.
    ///
    /// # Examples
    ///
    /// ```
    /// use zottag::Item;
    ///
    /// let item = Item::new("K1", ["math"]);
    /// let merged = item.merged_tags(&["mathematics".to_string(), "math".to_string()]);
    /// let names: Vec<_> = merged.iter().map(|t| t.tag.as_str()).collect();
    /// assert_eq!(names, ["math", "mathematics"]);
    /// ```
    pub fn merged_tags(&self, new_tags: &[String]) -> Vec<TagEntry> {
        let mut merged = self.tags.clone();
        for tag in new_tags {
            if !merged.iter().any(|entry| &entry.tag == tag) {
                merged.push(TagEntry::new(tag.clone()));
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_item_data_from_api_json() {
        let json = r#"{
            "key": "X42A7DEE",
            "version": 1179,
            "itemType": "journalArticle",
            "title": "Backpropagation",
            "tags": [
                {"tag": "Neural and Evolutionary Computing", "type": 1},
                {"tag": "math"}
            ]
        }"#;

        let item: Item = serde_json::from_str(json).unwrap();

        assert_eq!(item.key(), "X42A7DEE");
        assert_eq!(item.version(), 1179);
        assert_eq!(item.tags()[0].kind, Some(1));
        assert_eq!(item.tags()[1].kind, None);
        assert_eq!(
            item.tag_names().collect::<Vec<_>>(),
            ["Neural and Evolutionary Computing", "math"]
        );
    }

    #[test]
    fn missing_tags_field_defaults_to_empty() {
        let item: Item = serde_json::from_str(r#"{"key": "K", "version": 3}"#).unwrap();
        assert!(item.tags().is_empty());
    }

    #[test]
    fn missing_version_is_rejected() {
        let result = serde_json::from_str::<Item>(r#"{"key": "K", "tags": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serializing_tag_entry_omits_absent_type() {
        let manual = serde_json::to_value(TagEntry::new("rust")).unwrap();
        assert_eq!(manual, serde_json::json!({"tag": "rust"}));

        let automatic = TagEntry {
            tag: "auto".to_string(),
            kind: Some(1),
        };
        assert_eq!(
            serde_json::to_value(automatic).unwrap(),
            serde_json::json!({"tag": "auto", "type": 1})
        );
    }

    #[test]
    fn merged_tags_preserves_existing_entries_and_types() {
        let mut item = Item::new("K", ["a"]);
        item.tags[0].kind = Some(1);

        let merged = item.merged_tags(&["b".to_string(), "b".to_string()]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].kind, Some(1));
        assert_eq!(merged[1], TagEntry::new("b"));
    }
}

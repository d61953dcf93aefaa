//! Catalog-wide reconciliation of tag rewrites.
//!
//! Turns per-tag rename decisions into two aggregate plans: the tags each
//! item needs attached, and the raw tags to delete from the library once
//! every attachment succeeded.

use std::collections::{BTreeMap, BTreeSet};

use crate::Item;
use crate::renamer::RenameRules;

/// One rewritten tag on one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub key: String,
    pub tag: String,
    pub replacements: Vec<String>,
}

/// The outcome of reconciling a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Item key to the tags it needs attached. Never holds an empty list.
    pub tags_to_add: BTreeMap<String, Vec<String>>,
    /// Raw tags rewritten on at least one item.
    pub tags_to_delete: BTreeSet<String>,
    /// Every rewrite in catalog order, for reporting.
    pub rewrites: Vec<Rewrite>,
}

impl Reconciliation {
    /// Returns true if nothing needs to change.
    pub fn is_empty(&self) -> bool {
        self.tags_to_add.is_empty() && self.tags_to_delete.is_empty()
    }
}

/// Reconciles every tag of every item against `rules`.
///
/// Each item's add list is extended with the replacements of each of its
/// rewritten tags. A replacement already queued for that item is not queued
/// again, so two raw tags mapping to the same replacement yield one entry;
/// item tags are a set remotely, so the attached result is the same. The
/// raw tag goes into the delete set; the set is the same whatever order the
/// items come in.
///
/// # Examples
///
/// ```
/// use zottag::Item;
/// use zottag::reconcile::reconcile;
/// use zottag::renamer::RenameRules;
///
/// let items = vec![
///     Item::new("A", ["math", "Machine Learning"]),
///     Item::new("B", ["math"]),
/// ];
///
/// let plan = reconcile(&items, &RenameRules::default());
///
/// assert_eq!(plan.tags_to_add["A"], ["mathematics"]);
/// assert_eq!(plan.tags_to_add["B"], ["mathematics"]);
/// assert_eq!(plan.tags_to_delete.iter().collect::<Vec<_>>(), ["math"]);
/// ```
#[must_use]
pub fn reconcile(items: &[Item], rules: &RenameRules) -> Reconciliation {
    let mut plan = Reconciliation::default();

    for item in items {
        let mut additions: Vec<String> = Vec::new();

        for tag in item.tag_names() {
            let Some(replacements) = rules.rename(tag) else {
                continue;
            };

            plan.tags_to_delete.insert(tag.to_string());
            for replacement in &replacements {
                if !additions.contains(replacement) {
                    additions.push(replacement.clone());
                }
            }
            plan.rewrites.push(Rewrite {
                key: item.key().to_string(),
                tag: tag.to_string(),
                replacements,
            });
        }

        if !additions.is_empty() {
            plan.tags_to_add
                .entry(item.key().to_string())
                .or_default()
                .extend(additions);
        }
    }

    plan
}

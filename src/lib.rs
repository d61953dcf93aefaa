pub mod catalog;
pub mod driver;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod renamer;
pub mod writeback;
pub mod zotero;

pub use models::{Item, LibraryRef, LibraryType, TagEntry};
pub use reconcile::{Reconciliation, reconcile};
pub use renamer::{RenameRules, rename};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_accessible_from_crate_root() {
        let item = Item::new("K", ["Algebras, Linear"]);
        assert_eq!(item.key(), "K");

        let plan = reconcile(&[item], &RenameRules::default());
        assert_eq!(plan.tags_to_add["K"], ["linear algebra"]);

        assert_eq!(rename("math"), Some(vec!["mathematics".to_string()]));
        assert_eq!(LibraryType::Group.to_string(), "group");
    }
}

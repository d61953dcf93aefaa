use std::fmt;

use clap::ValueEnum;

/// The kind of Zotero library being addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LibraryType {
    /// A personal library, addressed as `/users/{id}`
    User,
    /// A shared group library, addressed as `/groups/{id}`
    Group,
}

impl LibraryType {
    /// Returns the URL path segment for this library type.
    pub fn path_segment(self) -> &'static str {
        match self {
            LibraryType::User => "users",
            LibraryType::Group => "groups",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryType::User => write!(f, "user"),
            LibraryType::Group => write!(f, "group"),
        }
    }
}

/// Identifies one remote library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRef {
    pub id: String,
    pub kind: LibraryType,
}

impl LibraryRef {
    pub fn new(id: impl Into<String>, kind: LibraryType) -> Self {
        Self { id: id.into(), kind }
    }

    /// Returns the path prefix every library-scoped endpoint starts with.
    ///
    /// # Examples
    ///
    /// ```
    /// use zottag::{LibraryRef, LibraryType};
    ///
    /// let library = LibraryRef::new("475425", LibraryType::User);
    /// assert_eq!(library.path_prefix(), "/users/475425");
    /// ```
    pub fn path_prefix(&self) -> String {
        format!("/{}/{}", self.kind.path_segment(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_library_uses_groups_segment() {
        let library = LibraryRef::new("12", LibraryType::Group);
        assert_eq!(library.path_prefix(), "/groups/12");
    }

    #[test]
    fn display_matches_cli_value_names() {
        assert_eq!(LibraryType::User.to_string(), "user");
        assert_eq!(LibraryType::Group.to_string(), "group");
        assert_eq!(
            LibraryType::from_str("group", false).unwrap(),
            LibraryType::Group
        );
    }

    #[test]
    fn unknown_library_type_is_rejected() {
        assert!(LibraryType::from_str("team", false).is_err());
    }
}

mod item;
mod library;

pub use item::{Item, TagEntry};
pub use library::{LibraryRef, LibraryType};

//! Pushing a reconciliation back to the remote library.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

use tracing::{debug, warn};

use crate::Item;
use crate::zotero::ZoteroApi;

/// Maximum number of tags the server accepts in one delete request.
pub const DEFAULT_DELETE_BATCH_SIZE: usize = 50;

/// An item whose new tags could not be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddFailure {
    pub key: String,
    pub reason: String,
}

/// The result of submitting one delete batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// 1-based batch number.
    pub batch: usize,
    pub tags: Vec<String>,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Attaches new tags to each item in `tags_to_add`.
///
/// Prints `KEY adding [..]. SUCCESS` or `FAILURE` per item and keeps going
/// after a failure, so the caller gets every failing key at once. A key not
/// present in `items` counts as a failure.
///
/// # Errors
///
/// Only fails if writing progress to `out` fails.
pub fn add_new_tags(
    api: &dyn ZoteroApi,
    tags_to_add: &BTreeMap<String, Vec<String>>,
    items: &[Item],
    out: &mut dyn Write,
) -> io::Result<Vec<AddFailure>> {
    writeln!(out, "Building index...")?;
    let index: HashMap<&str, &Item> = items.iter().map(|item| (item.key(), item)).collect();

    let mut failures = Vec::new();
    for (key, tags) in tags_to_add {
        write!(out, "{key} adding {tags:?}. ")?;

        let Some(item) = index.get(key.as_str()) else {
            writeln!(out, "FAILURE")?;
            warn!(%key, "item not found in loaded catalog");
            failures.push(AddFailure {
                key: key.clone(),
                reason: "item not found in loaded catalog".to_string(),
            });
            continue;
        };

        match api.add_tags(item, tags) {
            Ok(()) => writeln!(out, "SUCCESS")?,
            Err(e) => {
                writeln!(out, "FAILURE")?;
                warn!(%key, error = %e, "failed to add tags");
                failures.push(AddFailure {
                    key: key.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(failures)
}

/// Deletes `tags` from the library in chunks of at most `batch_size`.
///
/// Prints `Delete batch {n:3}/{total}: {first_tag}` before each chunk and
/// records every chunk's outcome; a failing chunk does not stop later ones.
///
/// # Errors
///
/// Only fails if writing progress to `out` fails.
pub fn delete_tags(
    api: &dyn ZoteroApi,
    tags: &[String],
    batch_size: usize,
    out: &mut dyn Write,
) -> io::Result<Vec<BatchOutcome>> {
    let batch_size = batch_size.max(1);
    let total = tags.len().div_ceil(batch_size);

    let mut outcomes = Vec::with_capacity(total);
    for (n, chunk) in tags.chunks(batch_size).enumerate() {
        let batch = n + 1;
        writeln!(out, "Delete batch {batch:3}/{total}: {}", chunk[0])?;
        debug!(batch, size = chunk.len(), "deleting tags");

        let error = match api.delete_tags(chunk) {
            Ok(()) => None,
            Err(e) => {
                warn!(batch, error = %e, "delete batch failed");
                Some(e.to_string())
            }
        };
        outcomes.push(BatchOutcome {
            batch,
            tags: chunk.to_vec(),
            error,
        });
    }

    Ok(outcomes)
}

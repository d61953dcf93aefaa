//! End-to-end orchestration of one tag clean-up run.
//!
//! The run is strictly linear: load items, load tags, reconcile, attach new
//! tags, then delete the old ones. Deletion only happens once every
//! attachment has been confirmed, otherwise an item could lose a tag
//! without gaining its replacement.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{self, Catalog, CatalogError, CatalogKind, DEFAULT_PAGE_SIZE};
use crate::reconcile::{Reconciliation, reconcile};
use crate::renamer::RenameRules;
use crate::writeback::{self, AddFailure, BatchOutcome, DEFAULT_DELETE_BATCH_SIZE};
use crate::zotero::ZoteroApi;

/// Knobs for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub page_size: usize,
    pub delete_batch_size: usize,
    /// Stop after reconciliation without writing anything.
    pub dry_run: bool,
    /// Carry on with a catalog shorter than the server reported.
    pub allow_partial: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            delete_batch_size: DEFAULT_DELETE_BATCH_SIZE,
            dry_run: false,
            allow_partial: false,
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub items_loaded: usize,
    pub tags_loaded: usize,
    pub plan: Reconciliation,
    pub delete_batches: Vec<BatchOutcome>,
    pub dry_run: bool,
}

/// Reasons a run stops short of a clean finish.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Catalog of {kind} is incomplete: loaded {loaded} of {expected}")]
    Incomplete {
        kind: CatalogKind,
        expected: usize,
        loaded: usize,
    },

    #[error("Failed to add tags to {} items: {}", .failures.len(), failed_keys(.failures))]
    AddTagsFailed { failures: Vec<AddFailure> },

    #[error("{} delete batches failed", .failed.len())]
    DeleteTagsFailed {
        failed: Vec<BatchOutcome>,
        report: Box<RunReport>,
    },

    #[error("Failed to write progress: {0}")]
    Output(#[from] io::Error),
}

impl RunError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Catalog(_) | RunError::Output(_) => 2,
            RunError::AddTagsFailed { .. } => 3,
            RunError::Incomplete { .. } => 4,
            RunError::DeleteTagsFailed { .. } => 5,
        }
    }
}

fn failed_keys(failures: &[AddFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs the whole load → reconcile → write-back sequence against `api`.
///
/// # Errors
///
/// - `RunError::Catalog` if a listing cannot be fetched
/// - `RunError::Incomplete` if a listing is short and partial catalogs are
///   not allowed
/// - `RunError::AddTagsFailed` if any item rejected its new tags; nothing
///   is deleted in that case
/// - `RunError::DeleteTagsFailed` if any delete batch failed
pub fn run(
    api: &dyn ZoteroApi,
    rules: &RenameRules,
    options: &RunOptions,
    out: &mut dyn Write,
) -> Result<RunReport, RunError> {
    writeln!(out, "Loading catalogs...")?;
    let items = catalog::load_items(api, options.page_size, out)?;
    ensure_complete(&items, options.allow_partial)?;

    writeln!(out, "Loading all tags...")?;
    let tags = catalog::load_tags(api, options.page_size, out)?;
    ensure_complete(&tags, options.allow_partial)?;

    let plan = reconcile(&items.entries, rules);
    print_rewrites(&plan, &tags.entries, out)?;
    writeln!(out, "{} items need new tags", plan.tags_to_add.len())?;
    writeln!(out, "{} tags need to be removed", plan.tags_to_delete.len())?;
    info!(
        items = plan.tags_to_add.len(),
        tags = plan.tags_to_delete.len(),
        "reconciliation complete"
    );

    let mut report = RunReport {
        items_loaded: items.loaded(),
        tags_loaded: tags.loaded(),
        plan,
        delete_batches: Vec::new(),
        dry_run: options.dry_run,
    };
    if options.dry_run {
        return Ok(report);
    }

    let failures =
        writeback::add_new_tags(api, &report.plan.tags_to_add, &items.entries, out)?;
    if !failures.is_empty() {
        warn!(count = failures.len(), "skipping tag deletion after failed additions");
        return Err(RunError::AddTagsFailed { failures });
    }

    let tags_to_delete: Vec<String> = report.plan.tags_to_delete.iter().cloned().collect();
    report.delete_batches =
        writeback::delete_tags(api, &tags_to_delete, options.delete_batch_size, out)?;

    let failed: Vec<BatchOutcome> = report
        .delete_batches
        .iter()
        .filter(|outcome| !outcome.is_success())
        .cloned()
        .collect();
    if !failed.is_empty() {
        return Err(RunError::DeleteTagsFailed {
            failed,
            report: Box::new(report),
        });
    }

    Ok(report)
}

fn ensure_complete<T>(catalog: &Catalog<T>, allow_partial: bool) -> Result<(), RunError> {
    if catalog.is_complete() {
        return Ok(());
    }
    if allow_partial {
        warn!(
            kind = %catalog.kind,
            missing = catalog.missing(),
            "continuing with partial catalog"
        );
        return Ok(());
    }

    Err(RunError::Incomplete {
        kind: catalog.kind,
        expected: catalog.expected,
        loaded: catalog.loaded(),
    })
}

/// Prints one `KEY: TAG --> [NEW, ...]` line per rewrite, tags right-aligned
/// to the longest tag in the library.
fn print_rewrites(
    plan: &Reconciliation,
    library_tags: &[String],
    out: &mut dyn Write,
) -> io::Result<()> {
    let width = library_tags
        .iter()
        .map(String::as_str)
        .chain(plan.rewrites.iter().map(|rewrite| rewrite.tag.as_str()))
        .map(|tag| tag.chars().count())
        .max()
        .unwrap_or(0);

    for rewrite in &plan.rewrites {
        writeln!(
            out,
            "{}: {:>width$} --> {:?}",
            rewrite.key, rewrite.tag, rewrite.replacements
        )?;
    }
    Ok(())
}

//! Paginated loading of the remote catalog.
//!
//! Both loaders walk the listing page by page until the total reported by
//! the server is reached, printing one progress line per page. A short
//! catalog is not an error at this level: the loaders report it and hand
//! back what they got, and the caller decides whether to go on.

use std::fmt;
use std::io::{self, Write};

use thiserror::Error;
use tracing::{info, warn};

use crate::Item;
use crate::zotero::{Page, ZoteroApi, ZoteroError};

/// Largest page the Zotero API serves.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Which listing a catalog was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Items,
    Tags,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Items => write!(f, "items"),
            CatalogKind::Tags => write!(f, "tags"),
        }
    }
}

/// Errors that stop a catalog from loading at all.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to fetch {kind}: {source}")]
    Api {
        kind: CatalogKind,
        #[source]
        source: ZoteroError,
    },

    #[error("Failed to write progress: {0}")]
    Output(#[from] io::Error),
}

/// A fully materialized listing together with the size the server reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog<T> {
    pub kind: CatalogKind,
    pub entries: Vec<T>,
    pub expected: usize,
}

impl<T> Catalog<T> {
    pub fn loaded(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries the server reported but never delivered.
    pub fn missing(&self) -> usize {
        self.expected.saturating_sub(self.loaded())
    }

    pub fn is_complete(&self) -> bool {
        self.missing() == 0
    }
}

/// Loads every item in the library, child notes and attachments included,
/// printing `{count:05}/{total:05} {last_key}` per page.
///
/// # Errors
///
/// Returns `CatalogError::Api` if any page request fails.
pub fn load_items(
    api: &dyn ZoteroApi,
    page_size: usize,
    out: &mut dyn Write,
) -> Result<Catalog<Item>, CatalogError> {
    load_paginated(
        CatalogKind::Items,
        |start, limit| api.fetch_items(start, limit),
        page_size,
        out,
        |count, total, last: &Item| format!("{count:05}/{total:05} {}", last.key()),
    )
}

/// Loads every tag name in the library, printing `{count:05} {last_tag}`
/// per page.
///
/// # Errors
///
/// Returns `CatalogError::Api` if any page request fails.
pub fn load_tags(
    api: &dyn ZoteroApi,
    page_size: usize,
    out: &mut dyn Write,
) -> Result<Catalog<String>, CatalogError> {
    load_paginated(
        CatalogKind::Tags,
        |start, limit| api.fetch_tags(start, limit),
        page_size,
        out,
        |count, _total, last: &String| format!("{count:05} {last}"),
    )
}

fn load_paginated<T, F, D>(
    kind: CatalogKind,
    mut fetch: F,
    page_size: usize,
    out: &mut dyn Write,
    describe: D,
) -> Result<Catalog<T>, CatalogError>
where
    F: FnMut(usize, usize) -> Result<Page<T>, ZoteroError>,
    D: Fn(usize, usize, &T) -> String,
{
    let page_size = page_size.max(1);
    let mut entries: Vec<T> = Vec::new();
    let mut expected: Option<usize> = None;

    loop {
        let page = fetch(entries.len(), page_size)
            .map_err(|source| CatalogError::Api { kind, source })?;
        // The first page's total is the reference; later pages may drift.
        let total = *expected.get_or_insert(page.total);

        if page.entries.is_empty() {
            break;
        }
        entries.extend(page.entries);

        if let Some(last) = entries.last() {
            writeln!(out, "{}", describe(entries.len(), total, last))?;
        }
        if entries.len() >= total {
            break;
        }
    }

    let catalog = Catalog {
        kind,
        entries,
        expected: expected.unwrap_or(0),
    };

    if catalog.is_complete() {
        writeln!(out, "Success: All {} {kind} loaded.", catalog.loaded())?;
        info!(%kind, loaded = catalog.loaded(), "catalog loaded");
    } else {
        writeln!(out, "ERROR: Missing {} {kind}.", catalog.missing())?;
        warn!(
            %kind,
            expected = catalog.expected,
            loaded = catalog.loaded(),
            "catalog is incomplete"
        );
    }

    Ok(catalog)
}

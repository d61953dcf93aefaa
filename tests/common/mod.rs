//! In-memory stand-in for a remote Zotero library.

use std::cell::RefCell;
use std::collections::HashSet;

use zottag::Item;
use zottag::zotero::{Page, ZoteroApi, ZoteroError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchItems(usize),
    FetchTags(usize),
    AddTags(String, Vec<String>),
    DeleteTags(Vec<String>),
}

/// A library that applies writes to its own item list, so a second run sees
/// the result of the first.
#[derive(Default)]
pub struct MockLibrary {
    items: RefCell<Vec<Item>>,
    pub calls: RefCell<Vec<Call>>,
    pub failing_keys: HashSet<String>,
    pub failing_delete_batches: HashSet<usize>,
    /// Pretend the server holds this many more items than it serves.
    pub hidden_items: usize,
}

impl MockLibrary {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: RefCell::new(items),
            ..Self::default()
        }
    }

    pub fn fail_add_for(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn fail_delete_batch(mut self, batch: usize) -> Self {
        self.failing_delete_batches.insert(batch);
        self
    }

    pub fn items(&self) -> Vec<Item> {
        self.items.borrow().clone()
    }

    pub fn tags_of(&self, key: &str) -> Vec<String> {
        self.items
            .borrow()
            .iter()
            .find(|item| item.key() == key)
            .map(|item| item.tag_names().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::DeleteTags(tags) => Some(tags.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn add_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, Call::AddTags(..)))
            .count()
    }

    fn distinct_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .borrow()
            .iter()
            .flat_map(|item| item.tag_names().map(String::from).collect::<Vec<_>>())
            .filter(|tag| seen.insert(tag.clone()))
            .collect()
    }
}

impl ZoteroApi for MockLibrary {
    fn fetch_items(&self, start: usize, limit: usize) -> Result<Page<Item>, ZoteroError> {
        self.calls.borrow_mut().push(Call::FetchItems(start));
        let items = self.items.borrow();
        Ok(Page {
            entries: items.iter().skip(start).take(limit).cloned().collect(),
            total: items.len() + self.hidden_items,
        })
    }

    fn fetch_tags(&self, start: usize, limit: usize) -> Result<Page<String>, ZoteroError> {
        self.calls.borrow_mut().push(Call::FetchTags(start));
        let tags = self.distinct_tags();
        Ok(Page {
            entries: tags.iter().skip(start).take(limit).cloned().collect(),
            total: tags.len(),
        })
    }

    fn add_tags(&self, item: &Item, tags: &[String]) -> Result<(), ZoteroError> {
        self.calls
            .borrow_mut()
            .push(Call::AddTags(item.key().to_string(), tags.to_vec()));
        if self.failing_keys.contains(item.key()) {
            return Err(ZoteroError::Http {
                status: 412,
                message: "Item has been modified since specified version".to_string(),
            });
        }

        let mut items = self.items.borrow_mut();
        if let Some(stored) = items.iter_mut().find(|stored| stored.key() == item.key()) {
            let merged = stored.merged_tags(tags);
            *stored = Item::new(
                stored.key().to_string(),
                merged.into_iter().map(|entry| entry.tag),
            )
            .with_version(stored.version() + 1);
        }
        Ok(())
    }

    fn delete_tags(&self, tags: &[String]) -> Result<(), ZoteroError> {
        let batch = {
            let mut calls = self.calls.borrow_mut();
            calls.push(Call::DeleteTags(tags.to_vec()));
            calls
                .iter()
                .filter(|call| matches!(call, Call::DeleteTags(_)))
                .count()
        };
        if self.failing_delete_batches.contains(&batch) {
            return Err(ZoteroError::Http {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }

        let mut items = self.items.borrow_mut();
        for stored in items.iter_mut() {
            let kept: Vec<String> = stored
                .tag_names()
                .filter(|tag| !tags.iter().any(|deleted| deleted.as_str() == *tag))
                .map(String::from)
                .collect();
            *stored = Item::new(stored.key().to_string(), kept).with_version(stored.version());
        }
        Ok(())
    }
}

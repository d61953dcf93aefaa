/// Zotero Web API client module.
///
/// This module provides a blocking HTTP client for the Zotero Web API v3,
/// the `ZoteroApi` trait the rest of the crate talks to, and its error type.
mod client;

pub use client::{
    DEFAULT_API_BASE, Page, ZoteroApi, ZoteroClient, ZoteroClientBuilder, ZoteroError,
};

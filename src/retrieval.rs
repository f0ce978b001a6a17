//! Retrieval collaborator: where raw page markup comes from.
//!
//! HTTP access to a live wiki lives outside this crate; implement
//! [`Retriever`] for it. Two local implementations are bundled.

use crate::error::RetrievalError;
use crate::record::Edition;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Maximum number of candidates returned by the bundled `search`
/// implementations
pub const SEARCH_LIMIT: usize = 10;

/// File extension used by [`DirectoryRetriever`]
pub const PAGE_EXTENSION: &str = "wiki";

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Raw markup of the page titled `title`, or `None` if there is no
    /// such page
    async fn fetch(&self, edition: Edition, title: &str) -> Result<Option<String>, RetrievalError>;

    /// Page titles starting with `prefix`, best candidates first
    async fn search(&self, edition: Edition, prefix: &str) -> Result<Vec<String>, RetrievalError>;
}

#[async_trait]
impl<R: Retriever + ?Sized> Retriever for Arc<R> {
    async fn fetch(&self, edition: Edition, title: &str) -> Result<Option<String>, RetrievalError> {
        (**self).fetch(edition, title).await
    }

    async fn search(&self, edition: Edition, prefix: &str) -> Result<Vec<String>, RetrievalError> {
        (**self).search(edition, prefix).await
    }
}

fn prefix_matches<'a>(titles: impl Iterator<Item = &'a str>, prefix: &str) -> Vec<String> {
    let mut matches: Vec<String> = titles
        .filter(|title| title.starts_with(prefix))
        .map(str::to_string)
        .collect();
    matches.sort();
    matches.truncate(SEARCH_LIMIT);
    matches
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory pages
// ─────────────────────────────────────────────────────────────────────────────

/// Pages held in memory. Counts `fetch` calls.
#[derive(Debug, Default)]
pub struct MemoryRetriever {
    pages: RwLock<HashMap<(Edition, String), String>>,
    fetches: AtomicUsize,
}

impl MemoryRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, edition: Edition, title: &str, markup: &str) -> Self {
        self.insert(edition, title, markup);
        self
    }

    pub fn insert(&self, edition: Edition, title: &str, markup: &str) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((edition, title.to_string()), markup.to_string());
    }

    /// Number of `fetch` calls so far, hits and misses alike
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MemoryRetriever {
    async fn fetch(&self, edition: Edition, title: &str) -> Result<Option<String>, RetrievalError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let pages = self.pages.read().unwrap_or_else(PoisonError::into_inner);
        Ok(pages.get(&(edition, title.to_string())).cloned())
    }

    async fn search(&self, edition: Edition, prefix: &str) -> Result<Vec<String>, RetrievalError> {
        let pages = self.pages.read().unwrap_or_else(PoisonError::into_inner);
        let titles = pages
            .keys()
            .filter(|(page_edition, _)| *page_edition == edition)
            .map(|(_, title)| title.as_str());
        Ok(prefix_matches(titles, prefix))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pages on disk
// ─────────────────────────────────────────────────────────────────────────────

/// Pages stored as `<root>/<edition>/<title>.wiki`
#[derive(Debug, Clone)]
pub struct DirectoryRetriever {
    root: PathBuf,
}

impl DirectoryRetriever {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryRetriever { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn edition_dir(&self, edition: Edition) -> PathBuf {
        self.root.join(edition.tag())
    }

    /// Path for `title`, or `None` if the title cannot name a file
    fn page_path(&self, edition: Edition, title: &str) -> Option<PathBuf> {
        if title.is_empty() || title.contains(['/', '\\']) || title.starts_with('.') {
            return None;
        }
        Some(self.edition_dir(edition).join(format!("{}.{}", title, PAGE_EXTENSION)))
    }
}

#[async_trait]
impl Retriever for DirectoryRetriever {
    async fn fetch(&self, edition: Edition, title: &str) -> Result<Option<String>, RetrievalError> {
        let Some(path) = self.page_path(edition, title) else {
            debug!(title, "title cannot be mapped to a page file");
            return Ok(None);
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(markup) => Ok(Some(markup)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RetrievalError::transport(format!("{}: {}", path.display(), e))),
        }
    }

    async fn search(&self, edition: Edition, prefix: &str) -> Result<Vec<String>, RetrievalError> {
        let dir = self.edition_dir(edition);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RetrievalError::transport(format!("{}: {}", dir.display(), e))),
        };

        let mut titles = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RetrievalError::transport(format!("{}: {}", dir.display(), e)))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                titles.push(stem.to_string());
            }
        }

        Ok(prefix_matches(titles.iter().map(String::as_str), prefix))
    }
}

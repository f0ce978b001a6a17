//! Lookup facade: retrieval + parsing + caching.

use crate::cache::{CacheKey, RecordCache};
use crate::config::ExtractionConfig;
use crate::error::{LookupError, LookupResult, RetrievalError};
use crate::page::parse_page;
use crate::record::{Edition, LexicalRecord};
use crate::retrieval::Retriever;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Dictionary lookups over a [`Retriever`].
///
/// Build one per process and share it; the cache lives as long as the
/// `Dictionary` does.
pub struct Dictionary<R> {
    retriever: R,
    cache: RecordCache,
    config: Arc<ExtractionConfig>,
    timeout: Option<Duration>,
}

impl<R: Retriever> Dictionary<R> {
    pub fn new(retriever: R) -> Self {
        Dictionary {
            retriever,
            cache: RecordCache::new(),
            config: Arc::new(ExtractionConfig::default()),
            timeout: None,
        }
    }

    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Bound every retrieval call; an expired call fails with
    /// [`RetrievalError::Timeout`] and is not cached.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    /// Parsed record for `word`, retrieved at most once per key.
    ///
    /// A record with missing sections still succeeds; check
    /// [`LexicalRecord::degraded`].
    pub async fn get_record(&self, edition: Edition, word: &str) -> LookupResult<Arc<LexicalRecord>> {
        let key = CacheKey::new(edition, word);
        self.cache
            .get_or_compute(&key, || self.retrieve_and_parse(&key))
            .await
    }

    /// Candidate titles starting with `prefix`, passed through unparsed
    pub async fn search(&self, edition: Edition, prefix: &str) -> LookupResult<Vec<String>> {
        let candidates = self
            .bounded(self.retriever.search(edition, prefix))
            .await
            .map_err(|e| {
                warn!(%edition, prefix, error = %e, "search failed");
                e
            })?;
        Ok(candidates)
    }

    async fn retrieve_and_parse(&self, key: &CacheKey) -> LookupResult<LexicalRecord> {
        let raw = self
            .bounded(self.retriever.fetch(key.edition, &key.word))
            .await
            .map_err(|e| {
                warn!(edition = %key.edition, word = %key.word, error = %e, "retrieval failed");
                e
            })?;

        let Some(raw) = raw else {
            debug!(edition = %key.edition, word = %key.word, "page not found");
            return Err(LookupError::NotFound {
                edition: key.edition,
                word: key.word.clone(),
            });
        };

        Ok(parse_page(key.edition, &key.word, &raw, &self.config))
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, RetrievalError>>) -> Result<T, RetrievalError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RetrievalError::Timeout(limit))?,
            None => call.await,
        }
    }
}

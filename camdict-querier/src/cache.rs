//! Memoizing [`Querier`] decorator.
//!
//! Searches are stored under `q:<query>`, entries under `l:<lemma id>`, each
//! as a small JSON envelope. Failures that describe the page (parse, protocol)
//! are stored too, with a shorter lifetime, and come back as
//! [`QueryError::Replayed`]. Suggestion lists share that shorter lifetime,
//! since the site may learn the word later. Transport failures and
//! cancellation are never stored.

use std::time::Duration;

use async_trait::async_trait;
use camdict_parser::Lemma;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_ERROR_TTL_SECS;
use crate::{CacheConfig, QueryError, Querier, SearchOutcome, Storage};

fn query_key(query: &str) -> String {
    format!("q:{query}")
}

fn lemma_key(lemma_id: &str) -> String {
    format!("l:{lemma_id}")
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedFailure {
    kind: String,
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<CachedFailure>,
    created_at: DateTime<Utc>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Option<Result<T, QueryError>> {
        match (self.value, self.error) {
            (_, Some(CachedFailure { kind, message })) => {
                Some(Err(QueryError::Replayed { kind, message }))
            }
            (Some(value), None) => Some(Ok(value)),
            (None, None) => None,
        }
    }
}

pub struct Cached<Q, S> {
    querier: Q,
    storage: S,
    ttl: Option<Duration>,
    error_ttl: Duration,
}

impl<Q: Querier, S: Storage> Cached<Q, S> {
    /// Successful results kept indefinitely, failures for a day.
    pub fn new(querier: Q, storage: S) -> Self {
        Self {
            querier,
            storage,
            ttl: None,
            error_ttl: Duration::from_secs(DEFAULT_ERROR_TTL_SECS),
        }
    }

    pub fn from_config(querier: Q, storage: S, config: &CacheConfig) -> Self {
        Self::new(querier, storage)
            .with_ttl(config.ttl())
            .with_error_ttl(config.error_ttl())
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = ttl;
        self
    }

    pub fn inner(&self) -> &Q {
        &self.querier
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<Result<T, QueryError>>, QueryError> {
        let Some(raw) = self.storage.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<Envelope<T>>(&raw) {
            Ok(envelope) => {
                tracing::debug!(key, created_at = %envelope.created_at, "querier.cache.hit");
                Ok(envelope.into_result())
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "querier.cache.corrupt_entry");
                Ok(None)
            }
        }
    }

    /// Store `result`; a success lives for `ttl`, a cacheable failure for the
    /// error TTL.
    async fn remember<T: Serialize>(
        &self,
        key: &str,
        result: &Result<T, QueryError>,
        ttl: Option<Duration>,
    ) {
        let (envelope, ttl) = match result {
            Ok(value) => (
                Envelope {
                    value: Some(value),
                    error: None,
                    created_at: Utc::now(),
                },
                ttl,
            ),
            Err(err) if err.is_cacheable() => (
                Envelope {
                    value: None,
                    error: Some(failure_of(err)),
                    created_at: Utc::now(),
                },
                Some(self.error_ttl),
            ),
            Err(_) => return,
        };

        let data = match serde_json::to_vec(&envelope) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(key, error = %e, "querier.cache.encode_failed");
                return;
            }
        };
        if let Err(e) = self.storage.put(key, data, ttl).await {
            tracing::warn!(key, error = %e, "querier.cache.store_failed");
        }
    }
}

/// A replayed failure keeps the kind it was first recorded with.
fn failure_of(err: &QueryError) -> CachedFailure {
    match err {
        QueryError::Replayed { kind, message } => CachedFailure {
            kind: kind.clone(),
            message: message.clone(),
        },
        other => CachedFailure {
            kind: other.kind().to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl<Q: Querier, S: Storage> Querier for Cached<Q, S> {
    async fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
    ) -> Result<SearchOutcome, QueryError> {
        let key = query_key(query);
        if let Some(hit) = self.lookup(&key).await? {
            return hit;
        }
        let result = self.querier.search(cancel, query).await;
        let ttl = match &result {
            Ok(SearchOutcome::Suggestions(_)) => Some(self.error_ttl),
            _ => self.ttl,
        };
        self.remember(&key, &result, ttl).await;
        result
    }

    async fn get_lemma(
        &self,
        cancel: &CancellationToken,
        lemma_id: &str,
    ) -> Result<Vec<Lemma>, QueryError> {
        let key = lemma_key(lemma_id);
        if let Some(hit) = self.lookup(&key).await? {
            return hit;
        }
        let result = self.querier.get_lemma(cancel, lemma_id).await;
        self.remember(&key, &result, self.ttl).await;
        result
    }

    async fn close(&self, cancel: &CancellationToken) -> Result<(), QueryError> {
        let mut reasons = Vec::new();
        if let Err(e) = self.querier.close(cancel).await {
            reasons.push(format!("querier close failed: {e}"));
        }
        if let Err(e) = self.storage.close().await {
            reasons.push(format!("storage close failed: {e}"));
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(QueryError::Close(reasons.join(" AND ")))
        }
    }
}

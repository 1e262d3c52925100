use async_trait::async_trait;
use camdict_parser::Lemma;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::QueryError;

/// What a search resolved to.
///
/// Finding suggestions instead of an entry is an ordinary answer, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Canonical id, usable with [`Querier::get_lemma`].
    Resolved(String),
    /// Headwords the site guesses were meant, best first.
    Suggestions(Vec<String>),
}

#[async_trait]
pub trait Querier: Send + Sync {
    /// Resolve a free-form query to an entry id or a list of suggestions.
    async fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
    ) -> Result<SearchOutcome, QueryError>;

    /// Fetch and extract every lemma of an entry, in page order.
    async fn get_lemma(
        &self,
        cancel: &CancellationToken,
        lemma_id: &str,
    ) -> Result<Vec<Lemma>, QueryError>;

    /// Release held resources. Calls made after this fail with
    /// [`QueryError::Closed`]; closing twice is harmless.
    async fn close(&self, cancel: &CancellationToken) -> Result<(), QueryError>;
}

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use camdict_parser::{Lemma, ParseError};
use camdict_querier::{
    Cached, MemoryStorage, ProtocolError, Querier, QueryError, SearchOutcome, Storage,
    StorageError,
};
use camdict_http::HttpError;
use tokio_util::sync::CancellationToken;

/// Answers from a script and counts how often it was asked.
#[derive(Default)]
struct Scripted {
    searches: AtomicUsize,
    lemmas: AtomicUsize,
    closes: AtomicUsize,
    search_answer: Mutex<Option<fn() -> Result<SearchOutcome, QueryError>>>,
    lemma_answer: Mutex<Option<fn() -> Result<Vec<Lemma>, QueryError>>>,
}

impl Scripted {
    fn searching(answer: fn() -> Result<SearchOutcome, QueryError>) -> Self {
        let s = Self::default();
        *s.search_answer.lock().unwrap() = Some(answer);
        s
    }

    fn fetching(answer: fn() -> Result<Vec<Lemma>, QueryError>) -> Self {
        let s = Self::default();
        *s.lemma_answer.lock().unwrap() = Some(answer);
        s
    }
}

#[async_trait]
impl Querier for Scripted {
    async fn search(
        &self,
        _cancel: &CancellationToken,
        _query: &str,
    ) -> Result<SearchOutcome, QueryError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let answer = self.search_answer.lock().unwrap().expect("search scripted");
        answer()
    }

    async fn get_lemma(
        &self,
        _cancel: &CancellationToken,
        _lemma_id: &str,
    ) -> Result<Vec<Lemma>, QueryError> {
        self.lemmas.fetch_add(1, Ordering::SeqCst);
        let answer = self.lemma_answer.lock().unwrap().expect("lemma scripted");
        answer()
    }

    async fn close(&self, _cancel: &CancellationToken) -> Result<(), QueryError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Storage whose writes always fail.
struct ReadOnly;

#[async_trait]
impl Storage for ReadOnly {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    async fn put(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        Err(StorageError::Backend("disk full".into()))
    }

    async fn close(&self) -> Result<(), StorageError> {
        Err(StorageError::Backend("already gone".into()))
    }
}

fn hello_lemma() -> Vec<Lemma> {
    vec![Lemma {
        headword: "hello".into(),
        definition: "used when meeting someone".into(),
        examples: vec!["Hello, Paul.".into()],
        ..Lemma::default()
    }]
}

#[tokio::test]
async fn resolved_search_is_served_from_cache() {
    common::init_test_tracing();
    let cached = Cached::new(
        Scripted::searching(|| Ok(SearchOutcome::Resolved("imhere".into()))),
        MemoryStorage::new(),
    );
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        let outcome = cached.search(&cancel, "hello").await.unwrap();
        assert_eq!(outcome, SearchOutcome::Resolved("imhere".into()));
    }
    assert_eq!(cached.inner().searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn suggestions_are_cached() {
    let cached = Cached::new(
        Scripted::searching(|| Ok(SearchOutcome::Suggestions(vec!["hello".into()]))),
        MemoryStorage::new(),
    );
    let cancel = CancellationToken::new();

    cached.search(&cancel, "helo").await.unwrap();
    let again = cached.search(&cancel, "helo").await.unwrap();
    assert_eq!(again, SearchOutcome::Suggestions(vec!["hello".into()]));
    assert_eq!(cached.inner().searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn suggestions_expire_with_the_error_ttl() {
    let cached = Cached::new(
        Scripted::searching(|| Ok(SearchOutcome::Suggestions(vec!["hello".into()]))),
        MemoryStorage::new(),
    )
    .with_ttl(None)
    .with_error_ttl(Duration::ZERO);
    let cancel = CancellationToken::new();

    cached.search(&cancel, "helo").await.unwrap();
    cached.search(&cancel, "helo").await.unwrap();
    assert_eq!(cached.inner().searches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn resolved_search_ignores_the_error_ttl() {
    let cached = Cached::new(
        Scripted::searching(|| Ok(SearchOutcome::Resolved("hello".into()))),
        MemoryStorage::new(),
    )
    .with_error_ttl(Duration::ZERO);
    let cancel = CancellationToken::new();

    cached.search(&cancel, "hello").await.unwrap();
    cached.search(&cancel, "hello").await.unwrap();
    assert_eq!(cached.inner().searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lemmas_round_trip_through_storage() {
    let cached = Cached::new(Scripted::fetching(|| Ok(hello_lemma())), MemoryStorage::new());
    let cancel = CancellationToken::new();

    let first = cached.get_lemma(&cancel, "hello").await.unwrap();
    let second = cached.get_lemma(&cancel, "hello").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(cached.inner().lemmas.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn protocol_failures_are_replayed() {
    let cached = Cached::new(
        Scripted::searching(|| Err(ProtocolError::EmptyLemmaId.into())),
        MemoryStorage::new(),
    );
    let cancel = CancellationToken::new();

    let first = cached.search(&cancel, "hello").await.unwrap_err();
    assert!(matches!(first, QueryError::Protocol(ProtocolError::EmptyLemmaId)));

    match cached.search(&cancel, "hello").await.unwrap_err() {
        QueryError::Replayed { kind, message } => {
            assert_eq!(kind, "protocol");
            assert_eq!(message, first.to_string());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(cached.inner().searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failures_expire_after_the_error_ttl() {
    let cached = Cached::new(
        Scripted::fetching(|| Err(ParseError::MissingDefinition.into())),
        MemoryStorage::new(),
    )
    .with_error_ttl(Duration::ZERO);
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        let err = cached.get_lemma(&cancel, "x").await.unwrap_err();
        assert!(matches!(err, QueryError::Parse(ParseError::MissingDefinition)));
    }
    assert_eq!(cached.inner().lemmas.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn transport_failures_are_not_cached() {
    let cached = Cached::new(
        Scripted::fetching(|| Err(HttpError::Network("connection reset".into()).into())),
        MemoryStorage::new(),
    );
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        assert!(cached.get_lemma(&cancel, "x").await.unwrap_err().is_transport());
    }
    assert_eq!(cached.inner().lemmas.load(Ordering::SeqCst), 2);
    assert!(cached.storage().is_empty());
}

#[tokio::test]
async fn cancellation_is_not_cached() {
    let cached = Cached::new(
        Scripted::searching(|| Err(QueryError::Cancelled)),
        MemoryStorage::new(),
    );
    let cancel = CancellationToken::new();

    cached.search(&cancel, "x").await.unwrap_err();
    assert!(cached.storage().is_empty());
}

#[tokio::test]
async fn successes_expire_after_the_ttl() {
    let cached = Cached::new(
        Scripted::searching(|| Ok(SearchOutcome::Resolved("a".into()))),
        MemoryStorage::new(),
    )
    .with_ttl(Some(Duration::ZERO));
    let cancel = CancellationToken::new();

    cached.search(&cancel, "a").await.unwrap();
    cached.search(&cancel, "a").await.unwrap();
    assert_eq!(cached.inner().searches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn storage_write_failure_does_not_change_the_result() {
    let cached = Cached::new(Scripted::fetching(|| Ok(hello_lemma())), ReadOnly);
    let cancel = CancellationToken::new();

    assert_eq!(cached.get_lemma(&cancel, "hello").await.unwrap(), hello_lemma());
}

#[tokio::test]
async fn close_reports_every_failure() {
    let cached = Cached::new(Scripted::default(), ReadOnly);
    let err = cached.close(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(&err, QueryError::Close(msg) if msg.contains("storage close failed")));
    assert_eq!(cached.inner().closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn close_closes_querier_and_storage() {
    let cached = Cached::new(Scripted::default(), MemoryStorage::new());
    let cancel = CancellationToken::new();
    cached.close(&cancel).await.unwrap();

    assert_eq!(cached.inner().closes.load(Ordering::SeqCst), 1);
    assert_eq!(
        cached.storage().get("q:x").await.unwrap_err(),
        StorageError::Closed
    );
}

#[tokio::test]
async fn queries_and_lemmas_do_not_collide() {
    let scripted = Scripted::searching(|| Ok(SearchOutcome::Resolved("same".into())));
    *scripted.lemma_answer.lock().unwrap() = Some(|| Ok(hello_lemma()));
    let cached = Cached::new(scripted, MemoryStorage::new());
    let cancel = CancellationToken::new();

    cached.search(&cancel, "same").await.unwrap();
    let lemmas = cached.get_lemma(&cancel, "same").await.unwrap();
    assert_eq!(lemmas, hello_lemma());
    assert_eq!(cached.storage().len(), 2);
}

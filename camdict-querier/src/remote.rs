//! The site's search protocol.
//!
//! A search is a GET that must come back as `302 Found`; the `Location` header
//! is the answer:
//!
//! - `/dictionary/english/<id>`: the query resolved to entry `<id>`
//! - `/spellcheck/english/?q=...`: no match, the target page lists suggestions
//! - anything else: the site changed and we do not understand it
//!
//! Redirects are therefore never followed by the client.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use camdict_http::{HttpClient, HttpError, HttpResponse, RequestOpts, StatusCode, Url};
use camdict_parser::Lemma;
use tokio_util::sync::CancellationToken;

use crate::page::{HtmlPageParser, PageParser};
use crate::{ParsePool, ProtocolError, QueryError, Querier, RemoteConfig, SearchOutcome};

pub const LEMMA_PATH: &str = "/dictionary/english/";
pub const SUGGESTION_PATH: &str = "/spellcheck/english/";
pub const SEARCH_PATH: &str = "/search/english/direct/";
const DATASET: &str = "english";

/// Where a search redirect points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Lemma(String),
    Suggestions(Url),
}

/// Classify a search redirect target by its path prefix.
///
/// ```
/// use camdict_http::Url;
/// use camdict_querier::remote::{classify_redirect, Redirect};
///
/// let url = Url::parse("https://example.test/dictionary/english/hello").unwrap();
/// assert_eq!(classify_redirect(&url).unwrap(), Redirect::Lemma("hello".into()));
/// ```
pub fn classify_redirect(location: &Url) -> Result<Redirect, ProtocolError> {
    let path = location.path();
    if let Some(rest) = path.strip_prefix(LEMMA_PATH) {
        let id = rest.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default();
        if id.is_empty() {
            return Err(ProtocolError::EmptyLemmaId);
        }
        let id = urlencoding::decode(id)
            .map(Cow::into_owned)
            .unwrap_or_else(|_| id.to_string());
        return Ok(Redirect::Lemma(id));
    }
    if path.starts_with(SUGGESTION_PATH) {
        return Ok(Redirect::Suggestions(location.clone()));
    }
    Err(ProtocolError::UnknownRedirect(path.to_string()))
}

/// [`Querier`] that talks to the site directly.
pub struct Remote<P = HtmlPageParser> {
    client: Mutex<Option<HttpClient>>,
    pool: ParsePool,
    parser: Arc<P>,
}

impl Remote<HtmlPageParser> {
    pub fn new(config: &RemoteConfig) -> Result<Self, QueryError> {
        Self::with_parser(config, HtmlPageParser)
    }
}

impl<P: PageParser> Remote<P> {
    pub fn with_parser(config: &RemoteConfig, parser: P) -> Result<Self, QueryError> {
        let mut client =
            HttpClient::new(&config.base_url())?.with_headers(&config.extra_headers)?;
        if let Some(timeout) = config.timeout() {
            client = client.with_timeout(timeout);
        }
        let pool = ParsePool::new(config.max_workers);
        tracing::debug!(
            base = %client.base(),
            workers = pool.capacity(),
            "querier.remote.created"
        );
        Ok(Self {
            client: Mutex::new(Some(client)),
            pool,
            parser: Arc::new(parser),
        })
    }

    fn client(&self) -> Result<HttpClient, QueryError> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(QueryError::Closed)
    }

    /// GET `url` and insist on `expected`.
    async fn get(
        &self,
        cancel: &CancellationToken,
        url: &Url,
        expected: StatusCode,
    ) -> Result<HttpResponse, QueryError> {
        let opts = RequestOpts {
            allow_absolute: true,
            ..RequestOpts::default()
        };
        let resp = self.client()?.get(url.as_str(), opts, cancel).await?;
        if resp.status != expected {
            return Err(ProtocolError::UnexpectedStatus {
                expected,
                actual: resp.status,
                url: resp.url.to_string(),
            }
            .into());
        }
        Ok(resp)
    }

    fn search_url(&self, query: &str) -> Result<Url, QueryError> {
        let mut url = self.client()?.url(SEARCH_PATH)?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("datasetsearch", DATASET);
        Ok(url)
    }

    fn lemma_url(&self, lemma_id: &str) -> Result<Url, QueryError> {
        let mut url = self.client()?.url(LEMMA_PATH)?;
        url.path_segments_mut()
            .map_err(|_| HttpError::Url(format!("cannot append to {LEMMA_PATH}")))?
            .pop_if_empty()
            .push(lemma_id);
        Ok(url)
    }

    async fn suggestions(
        &self,
        cancel: &CancellationToken,
        url: &Url,
    ) -> Result<Vec<String>, QueryError> {
        let resp = self.get(cancel, url, StatusCode::OK).await?;
        let parser = Arc::clone(&self.parser);
        let parsed = self
            .parse(cancel, resp.body, move |page| parser.parse_suggestions(page))
            .await;
        match parsed {
            Err(QueryError::Parse(e)) => Err(ProtocolError::NoSuggestions(e).into()),
            other => other,
        }
    }

    /// Download the raw entry page for `lemma_id` without extracting it.
    pub async fn entry_page(
        &self,
        cancel: &CancellationToken,
        lemma_id: &str,
    ) -> Result<Bytes, QueryError> {
        if lemma_id.is_empty() {
            return Err(ProtocolError::EmptyLemmaId.into());
        }
        let url = self.lemma_url(lemma_id)?;
        Ok(self.get(cancel, &url, StatusCode::OK).await?.body)
    }

    /// Hand a page body to the pool and wait for the parsed result.
    async fn parse<T, F>(
        &self,
        cancel: &CancellationToken,
        body: Bytes,
        f: F,
    ) -> Result<T, QueryError>
    where
        F: FnOnce(&str) -> Result<T, QueryError> + Send + 'static,
        T: Send + 'static,
    {
        self.pool
            .submit_wait(cancel, move || f(&String::from_utf8_lossy(&body)))
            .await?
    }
}

#[async_trait]
impl<P: PageParser> Querier for Remote<P> {
    async fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
    ) -> Result<SearchOutcome, QueryError> {
        let url = self.search_url(query)?;
        let resp = self.get(cancel, &url, StatusCode::FOUND).await?;
        let location = resp.location()?.ok_or(ProtocolError::MissingLocation)?;

        match classify_redirect(&location)? {
            Redirect::Lemma(id) => {
                tracing::debug!(query, lemma_id = %id, "querier.search.resolved");
                Ok(SearchOutcome::Resolved(id))
            }
            Redirect::Suggestions(target) => {
                let suggestions = self.suggestions(cancel, &target).await?;
                tracing::debug!(
                    query,
                    count = suggestions.len(),
                    "querier.search.suggestions"
                );
                Ok(SearchOutcome::Suggestions(suggestions))
            }
        }
    }

    async fn get_lemma(
        &self,
        cancel: &CancellationToken,
        lemma_id: &str,
    ) -> Result<Vec<Lemma>, QueryError> {
        let body = self.entry_page(cancel, lemma_id).await?;
        let parser = Arc::clone(&self.parser);
        let lemmas = self
            .parse(cancel, body, move |page| parser.parse_lemmas(page))
            .await?;
        tracing::debug!(lemma_id, count = lemmas.len(), "querier.lemma.fetched");
        Ok(lemmas)
    }

    async fn close(&self, _cancel: &CancellationToken) -> Result<(), QueryError> {
        // Dropping the last client handle releases its idle connections.
        let client = self
            .client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.pool.close().await;
        if client.is_some() {
            tracing::debug!("querier.remote.closed");
        }
        Ok(())
    }
}

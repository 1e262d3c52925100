//! Minimal HTTP client for scraping a single site, with safe logging.
//!
//! - Redirects are never followed: a 3xx comes back to the caller as-is, with
//!   its `Location` header, so the redirect target can be inspected
//! - Extra headers (e.g. a browser `User-Agent`) are attached to every request
//! - Every send and body read races a [`CancellationToken`]
//! - No retries: the caller owns the retry policy
//! - Optional *raw* request/response logging via `CAMDICT_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), camdict_http::HttpError> {
//! use tokio_util::sync::CancellationToken;
//!
//! let client = camdict_http::HttpClient::new("https://dictionary.cambridge.org")?;
//! let cancel = CancellationToken::new();
//! let resp = client
//!     .get("dictionary/english/hello", camdict_http::RequestOpts::default(), &cancel)
//!     .await?;
//! println!("{} ({} bytes)", resp.status, resp.body.len());
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`). Credentials in
//! `Authorization`/`Cookie` headers are never logged.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Client, Method, redirect};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use reqwest::{StatusCode, Url};

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "CAMDICT_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization" | "cookie" | "proxy-authorization"
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, value) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, value.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

/// Transport-level failures. Nothing here says anything about the remote
/// site's protocol; status codes are judged by the caller.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
}

// ==============================
// Request options / response
// ==============================

/// Per-request tuning knobs. Timeout and headers are client-wide.
///
/// ```
/// use camdict_http::RequestOpts;
/// use std::borrow::Cow;
///
/// let opts = RequestOpts {
///     query: Some(vec![("q", Cow::Borrowed("hello"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.query.unwrap().len(), 1);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// A fully buffered response. The status is not interpreted.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The URL that was requested (no redirect was followed).
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Resolve the `Location` header against the request URL.
    ///
    /// Returns `Ok(None)` when the header is absent.
    pub fn location(&self) -> Result<Option<Url>, HttpError> {
        let Some(raw) = self.headers.get(LOCATION) else {
            return Ok(None);
        };
        let raw = raw
            .to_str()
            .map_err(|e| HttpError::Url(format!("non-ascii Location header: {e}")))?;
        self.url
            .join(raw)
            .map(Some)
            .map_err(|e| HttpError::Url(format!("bad Location header {raw:?}: {e}")))
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    headers: HeaderMap,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use camdict_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://dictionary.cambridge.org")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            headers: HeaderMap::new(),
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Attach headers sent with every request. Later values replace earlier
    /// ones with the same name.
    ///
    /// ```no_run
    /// use camdict_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://dictionary.cambridge.org")?
    ///     .with_headers([("User-Agent", "Mozilla/5.0")])?;
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Result<Self, HttpError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_ref().as_bytes())
                .map_err(|e| HttpError::Build(format!("invalid header name: {e}")))?;
            let value = HeaderValue::from_str(value.as_ref())
                .map_err(|e| HttpError::Build(format!("invalid value for {name}: {e}")))?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET `path` (relative to the base, or absolute when
    /// `opts.allow_absolute` is set) and buffer the whole response.
    pub async fn get(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        let url = match Url::parse(path) {
            Ok(abs) if opts.allow_absolute => abs,
            _ => self.url(path)?,
        };
        self.request(Method::GET, url, opts, cancel).await
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn request(
        &self,
        method: Method,
        mut url: Url,
        opts: RequestOpts<'_>,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        if let Some(q) = &opts.query {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in q {
                pairs.append_pair(k, v);
            }
        }

        let headers = &self.headers;
        let timeout = self.default_timeout;
        let rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout)
            .headers(headers.clone());

        let req_id = uuid::Uuid::new_v4().simple().to_string();
        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=url.query().unwrap_or(""),
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&method, &url, headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        if cancel.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(req_id=%req_id, "http.cancelled.send");
                return Err(HttpError::Cancelled);
            }
            sent = rb.send() => sent,
        };
        let resp = sent.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.send");
            classify(err, timeout)
        })?;

        let status = resp.status();
        let resp_headers = resp.headers().clone();

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(req_id=%req_id, "http.cancelled.body");
                return Err(HttpError::Cancelled);
            }
            read = resp.bytes() => read,
        };
        let body = read.map_err(|err| {
            tracing::warn!(req_id=%req_id, message=%err, "http.network_error.body");
            match classify(err, timeout) {
                HttpError::Network(m) => HttpError::Body(m),
                other => other,
            }
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=body.len(),
            location=?resp_headers.get(LOCATION),
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&resp_headers);
            let truncated = body.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&body[..body.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(&body),
            "http.response.body_snippet"
        );

        Ok(HttpResponse {
            url,
            status,
            headers: resp_headers,
            body,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn classify(err: reqwest::Error, timeout: Duration) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout(timeout)
    } else if err.is_builder() {
        HttpError::Build(err.to_string())
    } else {
        HttpError::Network(err.to_string())
    }
}

/// First few hundred bytes of a body, for log lines and error messages.
pub fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

//! JSON front-end over a [`Querier`].
//!
//! ```text
//! GET /query?q=<query>  {"status":"ok","lemma_id":"..."}
//!                       {"status":"suggestions","suggestions":[...]}
//! GET /lemma?id=<id>    {"status":"ok","lemmas":[...]}
//! ```
//!
//! A missing parameter answers `400 {"status":"bad_request"}`, any lookup
//! failure `500 {"status":"error"}`.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use camdict_parser::Lemma;
use camdict_querier::{Querier, SearchOutcome};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    querier: Arc<dyn Querier>,
    /// Root token; each request runs under a child of it.
    cancel: CancellationToken,
}

impl AppState {
    pub fn new(querier: Arc<dyn Querier>, cancel: CancellationToken) -> Self {
        Self { querier, cancel }
    }
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LemmaParams {
    id: Option<String>,
}

enum Reply {
    Resolved(String),
    Suggestions(Vec<String>),
    Lemmas(Vec<Lemma>),
    BadRequest,
    Error,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Reply::Resolved(lemma_id) => {
                (StatusCode::OK, json!({ "status": "ok", "lemma_id": lemma_id }))
            }
            Reply::Suggestions(suggestions) => (
                StatusCode::OK,
                json!({ "status": "suggestions", "suggestions": suggestions }),
            ),
            Reply::Lemmas(lemmas) => (StatusCode::OK, json!({ "status": "ok", "lemmas": lemmas })),
            Reply::BadRequest => (StatusCode::BAD_REQUEST, json!({ "status": "bad_request" })),
            Reply::Error => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "status": "error" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/query", get(query))
        .route("/lemma", get(lemma))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn query(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Reply {
    let Some(q) = params.q else {
        return Reply::BadRequest;
    };
    let cancel = state.cancel.child_token();
    match state.querier.search(&cancel, &q).await {
        Ok(SearchOutcome::Resolved(id)) => Reply::Resolved(id),
        Ok(SearchOutcome::Suggestions(list)) => Reply::Suggestions(list),
        Err(e) => {
            tracing::error!(query = %q, kind = e.kind(), error = %e, "server.query.failed");
            Reply::Error
        }
    }
}

async fn lemma(State(state): State<AppState>, Query(params): Query<LemmaParams>) -> Reply {
    let Some(id) = params.id else {
        return Reply::BadRequest;
    };
    let cancel = state.cancel.child_token();
    match state.querier.get_lemma(&cancel, &id).await {
        Ok(lemmas) => Reply::Lemmas(lemmas),
        Err(e) => {
            tracing::error!(lemma_id = %id, kind = e.kind(), error = %e, "server.lemma.failed");
            Reply::Error
        }
    }
}

/// Serve until `cancel` fires, then close the querier.
pub async fn serve(listen: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    tracing::info!(addr = %listener.local_addr()?, "server.listening");

    let shutdown = state.cancel.clone();
    let querier = Arc::clone(&state.querier);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server failed")?;

    tracing::info!("server.stopped");
    // the root token is already cancelled here
    querier
        .close(&CancellationToken::new())
        .await
        .context("failed to close querier")
}

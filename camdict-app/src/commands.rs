use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use camdict_config::CamdictConfig;
use camdict_parser::{Lemma, parse_lemma_html};
use camdict_querier::{Cached, MemoryStorage, Querier, Remote, SearchOutcome};
use camdict_runtime::CamdictHandle;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::cli::Command;
use crate::server::{self, AppState};

/// The remote querier, behind the in-memory cache when it is enabled.
pub fn build_querier(config: &CamdictConfig) -> Result<Arc<dyn Querier>> {
    let remote = Remote::new(&config.remote).context("failed to build remote querier")?;
    if !config.cache.enabled {
        return Ok(Arc::new(remote));
    }
    Ok(Arc::new(Cached::from_config(
        remote,
        MemoryStorage::new(),
        &config.cache,
    )))
}

pub async fn run(command: Command, config: CamdictConfig, handle: CamdictHandle) -> Result<()> {
    match command {
        Command::Search { query } => {
            let query = query.join(" ");
            let querier = build_querier(&config)?;
            let outcome = querier.search(&handle.request_token(), &query).await;
            close(querier.as_ref()).await;
            print_json(&search_json(outcome.with_context(|| format!("search {query:?} failed"))?))
        }
        Command::Lemma { id } => {
            let querier = build_querier(&config)?;
            let lemmas = querier.get_lemma(&handle.request_token(), &id).await;
            close(querier.as_ref()).await;
            print_json(&lemmas.with_context(|| format!("lemma {id:?} failed"))?)
        }
        Command::Parse { file } => print_json(&parse_file(&file)?),
        Command::Fetch { word, save } => {
            let remote = Remote::new(&config.remote).context("failed to build remote querier")?;
            let page = remote.entry_page(&handle.request_token(), &word).await;
            close(&remote).await;
            let page = page.with_context(|| format!("fetching {word:?} failed"))?;

            if let Some(path) = save {
                tokio::fs::write(&path, &page)
                    .await
                    .with_context(|| format!("failed to save {}", path.display()))?;
                tracing::info!(path = %path.display(), bytes = page.len(), "app.fetch.saved");
            }
            let lemmas = parse_lemma_html(&String::from_utf8_lossy(&page))
                .with_context(|| format!("entry page for {word:?} did not parse"))?;
            print_json(&lemmas)
        }
        Command::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| config.listen.clone());
            let querier = build_querier(&config)?;
            server::serve(&listen, AppState::new(querier, handle.cancellation())).await
        }
    }
}

fn search_json(outcome: SearchOutcome) -> Value {
    match outcome {
        SearchOutcome::Resolved(lemma_id) => json!({ "lemma_id": lemma_id }),
        SearchOutcome::Suggestions(suggestions) => json!({ "suggestions": suggestions }),
    }
}

fn parse_file(path: &Path) -> Result<Vec<Lemma>> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_lemma_html(&html).with_context(|| format!("{} did not parse", path.display()))
}

/// Close failures only matter to the logs once the answer is in hand.
async fn close(querier: &dyn Querier) {
    if let Err(e) = querier.close(&CancellationToken::new()).await {
        tracing::warn!(error = %e, "app.querier.close_failed");
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Turning fetched page bodies into records.

use camdict_parser::{Lemma, ParseError, parse_lemma_html, parse_suggestion_html};

use crate::QueryError;

/// Decodes the two kinds of page the remote querier fetches.
///
/// Implementations run on the parse pool, so they must be cheap to share.
pub trait PageParser: Send + Sync + 'static {
    fn parse_lemmas(&self, page: &str) -> Result<Vec<Lemma>, QueryError>;
    fn parse_suggestions(&self, page: &str) -> Result<Vec<String>, QueryError>;
}

/// The site's own HTML.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlPageParser;

impl PageParser for HtmlPageParser {
    fn parse_lemmas(&self, page: &str) -> Result<Vec<Lemma>, QueryError> {
        Ok(parse_lemma_html(page)?)
    }

    fn parse_suggestions(&self, page: &str) -> Result<Vec<String>, QueryError> {
        Ok(parse_suggestion_html(page)?)
    }
}

/// Pre-extracted JSON: an array of lemmas, or an array of strings.
///
/// Used by mirrors that serve already parsed entries, and by tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPageParser;

impl PageParser for JsonPageParser {
    fn parse_lemmas(&self, page: &str) -> Result<Vec<Lemma>, QueryError> {
        Ok(serde_json::from_str(page)?)
    }

    fn parse_suggestions(&self, page: &str) -> Result<Vec<String>, QueryError> {
        let suggestions: Vec<String> = serde_json::from_str(page)?;
        if suggestions.is_empty() {
            return Err(ParseError::NoSuggestions.into());
        }
        Ok(suggestions)
    }
}

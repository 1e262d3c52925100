//! Spell-check page → suggested words.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::ParseError;
use crate::dom::{children, find, selector, text};

static SUGGESTION_LIST: LazyLock<Selector> = LazyLock::new(|| selector("h1 ~ ul.hul-u"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));

/// Trimmed text of each list item following the page title, in page order.
///
/// A page without any is [`ParseError::NoSuggestions`].
pub fn parse_suggestion_html(page: &str) -> Result<Vec<String>, ParseError> {
    parse_suggestion_document(&Html::parse_document(page))
}

pub fn parse_suggestion_document(doc: &Html) -> Result<Vec<String>, ParseError> {
    let lists = find(&[doc.root_element()], &SUGGESTION_LIST);
    let suggestions: Vec<String> = children(&lists, &ITEM)
        .iter()
        .map(|li| text(&[*li]).trim().to_string())
        .collect();

    if suggestions.is_empty() {
        return Err(ParseError::NoSuggestions);
    }
    tracing::debug!(count = suggestions.len(), "parser.suggestions.extracted");
    Ok(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_items_in_order() {
        let page = r#"<html><body>
            <h1>Did you mean?</h1>
            <ul class="hul-u hul-u0"><li><a href="/a"> hello </a></li><li>hell</li></ul>
        </body></html>"#;
        assert_eq!(parse_suggestion_html(page).unwrap(), vec!["hello", "hell"]);
    }

    #[test]
    fn list_before_the_title_is_ignored() {
        let page = r#"<html><body>
            <ul class="hul-u"><li>nav</li></ul>
            <h1>Title</h1>
        </body></html>"#;
        assert_eq!(
            parse_suggestion_html(page).unwrap_err(),
            ParseError::NoSuggestions
        );
    }

    #[test]
    fn empty_page_has_no_suggestions() {
        assert_eq!(
            parse_suggestion_html("").unwrap_err(),
            ParseError::NoSuggestions
        );
        assert_eq!(
            parse_suggestion_html("<h1>x</h1><ul class=\"hul-u\"></ul>").unwrap_err(),
            ParseError::NoSuggestions
        );
    }
}

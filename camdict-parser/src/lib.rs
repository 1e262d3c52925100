//! Extraction of dictionary records from entry and spell-check pages.
//!
//! - [`parse_lemma_html`] walks an entry page and yields one [`Lemma`] per
//!   definition block, in document order
//! - [`parse_suggestion_html`] reads the "did you mean" list of a spell-check page
//! - [`ipa_superscript`] renders superscript phonetic markers
//!
//! Both parsers are pure functions over the page text: no global state, so the
//! same input always gives the same output and they can run on any thread.
//!
//! ```rust
//! use camdict_parser::parse_suggestion_html;
//!
//! let page = r#"<html><body><h1>Spelling check</h1>
//!   <ul class="hul-u"><li> hello </li><li>hell</li></ul></body></html>"#;
//! assert_eq!(parse_suggestion_html(page).unwrap(), vec!["hello", "hell"]);
//! ```
mod dom;
pub mod error;
pub mod ipa;
pub mod lemma;
pub mod lemma_parser;
pub mod suggestion_parser;

pub use error::ParseError;
pub use ipa::ipa_superscript;
pub use lemma::{Language, Lemma};
pub use lemma_parser::{normalize_definition, parse_lemma_document, parse_lemma_html};
pub use suggestion_parser::{parse_suggestion_document, parse_suggestion_html};

use thiserror::Error;

/// The page does not have the shape the extractor expects at some node.
///
/// Either the input is not an entry page or the site layout changed; neither
/// is worth retrying. Variants carry the offending class name where there is one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("{block} has no headword")]
    MissingHeadword { block: &'static str },

    #[error("div.ddef_h has no div.def")]
    MissingDefinition,

    #[error("unknown dictionary entry shape: class={0:?}")]
    UnknownEntryShape(String),

    #[error("unknown dsense entry shape: class={0:?}")]
    UnknownSenseShape(String),

    #[error("div.dictionary has unknown data-id attr: {0}")]
    UnknownDictionaryId(String),

    #[error("no suggestions found")]
    NoSuggestions,
}

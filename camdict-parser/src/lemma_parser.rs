//! Entry page → [`Lemma`] records.
//!
//! The page is a tree of dictionary blocks, each holding entries of three
//! shapes (plain headword, phrasal verb, idiom), each holding senses, each
//! holding definition or phrase blocks. The walk carries a partially filled
//! `Lemma` down the tree; every step receives its own copy, fills in what its
//! node says (language, headword, guide word, ...) and hands copies on to its
//! children. A record is emitted only at a definition block, so what one
//! sibling writes is never seen by the next.
//!
//! Any node that does not fit stops the whole walk with a [`ParseError`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::dom::{self, children, find, outermost, selector, text};
use crate::ipa::ipa_superscript;
use crate::{Language, Lemma, ParseError};

type Lemmas = Result<Vec<Lemma>, ParseError>;

static DICTIONARY: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"div[class*="dictionary"][data-id]"#));
static DICTIONARY_ENTRY: LazyLock<Selector> = LazyLock::new(|| {
    selector(concat!(
        r#"div[class*="entry-body__el"] > div[class*="pos-header"], "#,
        r#"div[class="pv-block"], "#,
        r#"div[class^="idiom-block"]"#,
    ))
});

static DSENSE: LazyLock<Selector> = LazyLock::new(|| selector("div.dsense"));
static POS_HEADER: LazyLock<Selector> = LazyLock::new(|| selector("div.pos-header"));
static HEADWORD: LazyLock<Selector> = LazyLock::new(|| selector("span[class^=headword]"));
static POSGRAM: LazyLock<Selector> = LazyLock::new(|| selector("div[class^=posgram]"));
static GRAMMAR_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("span[class^=gram]"));
static GRAMMAR: LazyLock<Selector> = LazyLock::new(|| selector("span[class^=gc]"));
static PART_OF_SPEECH: LazyLock<Selector> = LazyLock::new(|| selector("span[class^=pos]"));

static PRONUNCIATION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"span[class*="dpron-i"]"#));
static REGION: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[class^="region"]"#));
static IPA: LazyLock<Selector> = LazyLock::new(|| selector(r#"span[class^="ipa"]"#));

static DSENSE_HEAD: LazyLock<Selector> = LazyLock::new(|| selector("h3.dsense_h"));
static GUIDEWORD: LazyLock<Selector> = LazyLock::new(|| selector("span.guideword"));
static DSENSE_ENTRY: LazyLock<Selector> =
    LazyLock::new(|| selector("div.def-block, div.phrase-block"));

static DEF_HEAD: LazyLock<Selector> = LazyLock::new(|| selector("div.ddef_h"));
static DEF: LazyLock<Selector> = LazyLock::new(|| selector("div.def"));
static DEF_INFO: LazyLock<Selector> = LazyLock::new(|| selector("span.def-info"));
static DEF_BODY: LazyLock<Selector> = LazyLock::new(|| selector("div.def-body"));
static ALTERNATIVE: LazyLock<Selector> = LazyLock::new(|| selector("span.v"));
static EXAMPLE: LazyLock<Selector> = LazyLock::new(|| selector("div.examp"));

static PHRASE_HEAD: LazyLock<Selector> = LazyLock::new(|| selector("div.phrase-head"));
static PHRASE_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("span.phrase-title"));
static PHRASE_BODY: LazyLock<Selector> = LazyLock::new(|| selector("div.phrase-body"));
static DEF_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div.def-block"));

static DI_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("div.di-title"));
static DI_INFO: LazyLock<Selector> = LazyLock::new(|| selector("span.di-info"));
static ANC_INFO_HEAD: LazyLock<Selector> = LazyLock::new(|| selector("span.anc-info-head"));
static PV_BODY: LazyLock<Selector> = LazyLock::new(|| selector("span.pv-body"));
static IDIOM_BODY: LazyLock<Selector> = LazyLock::new(|| selector("span.idiom-body"));

static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s\s+").unwrap_or_else(|e| panic!("invalid built-in regex: {e}"))
});

/// Parse an entry page into lemmas, in document order.
pub fn parse_lemma_html(page: &str) -> Lemmas {
    parse_lemma_document(&Html::parse_document(page))
}

/// Same as [`parse_lemma_html`] over an already parsed document.
pub fn parse_lemma_document(doc: &Html) -> Lemmas {
    let dictionaries = outermost(doc.root_element(), &DICTIONARY);
    tracing::trace!(dictionaries = dictionaries.len(), "parser.lemmas.start");
    let lemmas = enrich(&Lemma::default(), dictionaries, parse_dictionary)?;
    tracing::debug!(lemmas = lemmas.len(), "parser.lemmas.extracted");
    Ok(lemmas)
}

/// Run `f` on every node with its own copy of `ctx`; stop at the first error.
fn enrich<'a, F>(ctx: &Lemma, nodes: Vec<ElementRef<'a>>, f: F) -> Lemmas
where
    F: Fn(Lemma, ElementRef<'a>) -> Lemmas,
{
    let mut lemmas = Vec::with_capacity(nodes.len());
    for node in nodes {
        lemmas.extend(f(ctx.clone(), node)?);
    }
    Ok(lemmas)
}

// ==============================
// Dictionary → entries
// ==============================

/// The kinds of entry a dictionary block may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryShape {
    PosHeader,
    PhrasalVerb,
    Idiom,
}

impl EntryShape {
    fn of(el: ElementRef<'_>) -> Result<Self, ParseError> {
        if dom::has_class(el, "pos-header") {
            Ok(Self::PosHeader)
        } else if dom::has_class(el, "pv-block") {
            Ok(Self::PhrasalVerb)
        } else if dom::has_class(el, "idiom-block") {
            Ok(Self::Idiom)
        } else {
            Err(ParseError::UnknownEntryShape(dom::class_attr(el)))
        }
    }
}

fn parse_dictionary(mut ctx: Lemma, dictionary: ElementRef<'_>) -> Lemmas {
    let data_id = dictionary.value().attr("data-id").unwrap_or("unknown");
    ctx.language = Language::from_data_id(data_id)?;

    let entries = find(&[dictionary], &DICTIONARY_ENTRY);
    enrich(&ctx, entries, |ctx, entry| match EntryShape::of(entry)? {
        EntryShape::PosHeader => parse_pos_header(ctx, entry),
        EntryShape::PhrasalVerb => parse_pv_block(ctx, entry),
        EntryShape::Idiom => parse_idiom_block(ctx, entry),
    })
}

fn parse_pos_header(mut ctx: Lemma, header: ElementRef<'_>) -> Lemmas {
    let headword = find(&[header], &HEADWORD)
        .into_iter()
        .next()
        .ok_or(ParseError::MissingHeadword {
            block: "div.pos-header",
        })?;
    ctx.headword = text(&[headword]).trim().to_string();

    apply_posgram(&mut ctx, &children(&[header], &POSGRAM));
    ctx.transcriptions = transcriptions(&[header]);

    let dsenses = match dom::next_element(header) {
        Some(body) => children(&[body], &DSENSE),
        None => Vec::new(),
    };
    enrich(&ctx, dsenses, parse_dsense)
}

fn parse_pv_block(mut ctx: Lemma, pv_block: ElementRef<'_>) -> Lemmas {
    ctx.headword = title(pv_block, "div.pv-block")?;

    let pos_header = children(&children(&[pv_block], &DI_INFO), &POS_HEADER);
    apply_posgram(&mut ctx, &children(&pos_header, &ANC_INFO_HEAD));
    ctx.transcriptions = transcriptions(&pos_header);

    let dsenses = children(&children(&[pv_block], &PV_BODY), &DSENSE);
    enrich(&ctx, dsenses, parse_dsense)
}

fn parse_idiom_block(mut ctx: Lemma, idiom_block: ElementRef<'_>) -> Lemmas {
    ctx.headword = title(idiom_block, "div.idiom-block")?;
    ctx.part_of_speech = vec!["idiom".to_string()];

    let dsenses = children(&children(&[idiom_block], &IDIOM_BODY), &DSENSE);
    enrich(&ctx, dsenses, parse_dsense)
}

fn title(block: ElementRef<'_>, name: &'static str) -> Result<String, ParseError> {
    let title = text(&children(&[block], &DI_TITLE)).trim().to_string();
    if title.is_empty() {
        return Err(ParseError::MissingHeadword { block: name });
    }
    Ok(title)
}

// ==============================
// Header details
// ==============================

fn apply_posgram(ctx: &mut Lemma, posgram: &[ElementRef<'_>]) {
    ctx.part_of_speech = part_of_speech(posgram);
    ctx.grammar = grammar(posgram);
}

/// Sorted text of the `span.pos*` children.
fn part_of_speech(posgram: &[ElementRef<'_>]) -> Vec<String> {
    sorted_texts(&children(posgram, &PART_OF_SPEECH))
}

/// Sorted text of the grammar codes under the `span.gram*` children.
fn grammar(container: &[ElementRef<'_>]) -> Vec<String> {
    sorted_texts(&find(&children(container, &GRAMMAR_BLOCK), &GRAMMAR))
}

fn sorted_texts(els: &[ElementRef<'_>]) -> Vec<String> {
    let mut texts: Vec<String> = els
        .iter()
        .map(|el| text(&[*el]).trim().to_string())
        .collect();
    texts.sort();
    texts
}

/// Region label → phonetic spellings for every pronunciation block directly
/// under `headers`. A repeated region keeps the last block's spellings.
fn transcriptions(headers: &[ElementRef<'_>]) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    for pron in children(headers, &PRONUNCIATION) {
        let region = children(&[pron], &REGION)
            .first()
            .map(|r| text(&[*r]))
            .unwrap_or_default();
        let ipas = find(&[pron], &IPA).into_iter().map(render_ipa).collect();
        out.insert(region, ipas);
    }
    out
}

/// Text nodes verbatim, nested elements through [`ipa_superscript`].
fn render_ipa(ipa: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in ipa.children() {
        if let Some(t) = node.value().as_text() {
            out.push_str(t);
        } else if let Some(el) = ElementRef::wrap(node) {
            out.push_str(&ipa_superscript(&text(&[el])));
        }
    }
    out
}

// ==============================
// Senses
// ==============================

/// The kinds of block a sense may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SenseShape {
    Definition,
    Phrase,
}

impl SenseShape {
    fn of(el: ElementRef<'_>) -> Result<Self, ParseError> {
        if dom::has_class(el, "def-block") {
            Ok(Self::Definition)
        } else if dom::has_class(el, "phrase-block") {
            Ok(Self::Phrase)
        } else {
            Err(ParseError::UnknownSenseShape(dom::class_attr(el)))
        }
    }
}

fn parse_dsense(mut ctx: Lemma, dsense: ElementRef<'_>) -> Lemmas {
    ctx.guide_word = guide_word(&children(&[dsense], &DSENSE_HEAD));

    let entries = outermost(dsense, &DSENSE_ENTRY);
    enrich(&ctx, entries, |ctx, entry| match SenseShape::of(entry)? {
        SenseShape::Definition => parse_def_block(ctx, entry),
        SenseShape::Phrase => parse_phrase_block(ctx, entry),
    })
}

/// Lower-cased text of the guide word's inner elements (the surrounding
/// parentheses are bare text and are skipped). Empty when absent.
fn guide_word(dsense_head: &[ElementRef<'_>]) -> String {
    let inner: Vec<ElementRef<'_>> = find(dsense_head, &GUIDEWORD)
        .into_iter()
        .flat_map(dom::child_elements)
        .collect();
    text(&inner).to_lowercase()
}

fn parse_def_block(mut ctx: Lemma, def_block: ElementRef<'_>) -> Lemmas {
    let def_head = children(&[def_block], &DEF_HEAD);
    ctx.definition = definition(&def_head)?;

    let def_info = children(&def_head, &DEF_INFO);
    let grammar = grammar(&def_info);
    if !grammar.is_empty() {
        ctx.grammar = grammar;
    }
    let alternative = text(&find(&def_info, &ALTERNATIVE));
    if !alternative.is_empty() {
        ctx.alternative = alternative;
    }

    ctx.examples = children(&children(&[def_block], &DEF_BODY), &EXAMPLE)
        .iter()
        .map(|ex| text(&[*ex]).trim().to_string())
        .collect();
    Ok(vec![ctx])
}

fn definition(def_head: &[ElementRef<'_>]) -> Result<String, ParseError> {
    let def = children(def_head, &DEF);
    if def.is_empty() {
        return Err(ParseError::MissingDefinition);
    }
    Ok(normalize_definition(&text(&def)))
}

/// Collapse runs of two or more whitespace characters into one space, then
/// strip surrounding whitespace and colons.
///
/// ```
/// use camdict_parser::normalize_definition;
///
/// assert_eq!(normalize_definition("a   \n  b:"), "a b");
/// ```
pub fn normalize_definition(raw: &str) -> String {
    MULTI_SPACE
        .replace_all(raw, " ")
        .trim_matches(|c: char| c.is_whitespace() || c == ':')
        .to_string()
}

fn parse_phrase_block(mut ctx: Lemma, phrase_block: ElementRef<'_>) -> Lemmas {
    ctx.alternative = text(&children(
        &children(&[phrase_block], &PHRASE_HEAD),
        &PHRASE_TITLE,
    ));

    let def_blocks = children(&children(&[phrase_block], &PHRASE_BODY), &DEF_BLOCK);
    enrich(&ctx, def_blocks, parse_def_block)
}

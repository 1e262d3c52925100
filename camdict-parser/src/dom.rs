//! Selection helpers over `scraper` element trees.
//!
//! These mirror jQuery-style traversal (children/find/next/text) over a set of
//! elements, which is how the page structure is described in the parsers.
use scraper::{ElementRef, Selector};

/// Parse a built-in selector. Only called with string literals from this crate.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

pub(crate) fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Direct children of any of `parents` that match `sel`, in document order.
pub(crate) fn children<'a>(parents: &[ElementRef<'a>], sel: &Selector) -> Vec<ElementRef<'a>> {
    parents
        .iter()
        .flat_map(|p| child_elements(*p))
        .filter(|c| sel.matches(c))
        .collect()
}

/// All descendants of any of `parents` that match `sel`.
pub(crate) fn find<'a>(parents: &[ElementRef<'a>], sel: &Selector) -> Vec<ElementRef<'a>> {
    parents.iter().flat_map(|p| p.select(sel)).collect()
}

/// Descendants of `root` matching `sel` whose own ancestors (below `root`)
/// do not match. A match's subtree is not searched.
pub(crate) fn outermost<'a>(root: ElementRef<'a>, sel: &Selector) -> Vec<ElementRef<'a>> {
    let mut found = Vec::new();
    let mut stack: Vec<ElementRef<'a>> = child_elements(root).collect();
    stack.reverse();
    while let Some(el) = stack.pop() {
        if sel.matches(&el) {
            found.push(el);
            continue;
        }
        let mut kids: Vec<ElementRef<'a>> = child_elements(el).collect();
        kids.reverse();
        stack.extend(kids);
    }
    found
}

/// Concatenated text of all `els` and their descendants.
pub(crate) fn text(els: &[ElementRef<'_>]) -> String {
    els.iter().flat_map(|e| e.text()).collect()
}

pub(crate) fn next_element<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub(crate) fn class_attr(el: ElementRef<'_>) -> String {
    el.value().attr("class").unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn ids(els: &[ElementRef<'_>]) -> Vec<String> {
        els.iter()
            .map(|e| e.value().attr("id").unwrap_or("?").to_string())
            .collect()
    }

    #[test]
    fn outermost_skips_nested_matches() {
        let html = Html::parse_fragment(
            r#"<div id="root">
                 <div class="x" id="a"><div class="x" id="a1"></div></div>
                 <span><div class="x" id="b"></div></span>
               </div>"#,
        );
        let root = html.select(&selector("#root")).next().unwrap();
        let found = outermost(root, &selector("div.x"));
        assert_eq!(ids(&found), vec!["a", "b"]);
        // plain find sees the nested one too
        assert_eq!(ids(&find(&[root], &selector("div.x"))), vec!["a", "a1", "b"]);
    }

    #[test]
    fn children_only_looks_one_level_down() {
        let html = Html::parse_fragment(
            r#"<div id="root"><p id="p1"></p><span><p id="p2"></p></span><p id="p3"></p></div>"#,
        );
        let root = html.select(&selector("#root")).next().unwrap();
        assert_eq!(ids(&children(&[root], &selector("p"))), vec!["p1", "p3"]);
    }

    #[test]
    fn next_element_skips_text_nodes() {
        let html = Html::parse_fragment(r#"<div><b id="one"></b>  text  <i id="two"></i></div>"#);
        let one = html.select(&selector("#one")).next().unwrap();
        let next = next_element(one).unwrap();
        assert_eq!(next.value().attr("id"), Some("two"));
    }
}

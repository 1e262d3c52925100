//! Superscript rendering for phonetic transcriptions.
//!
//! The site marks optional sounds (a reduced schwa, a linking r) by wrapping
//! them in a nested span styled as superscript. Flattening the markup to plain
//! text loses that, so such spans are rewritten with the Unicode modifier
//! letters instead: `ˈhel.<span class="sp">ə</span>ʊ` becomes `ˈhel.ᵊʊ`.

/// Map one baseline character to its superscript form, if Unicode has one.
fn superscript(c: char) -> Option<char> {
    let s = match c {
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'f' => 'ᶠ',
        'g' => 'ᶢ',
        'h' => 'ʰ',
        'i' => 'ⁱ',
        'j' => 'ʲ',
        'k' => 'ᵏ',
        'l' => 'ˡ',
        'm' => 'ᵐ',
        'n' => 'ⁿ',
        'o' => 'ᵒ',
        'p' => 'ᵖ',
        'r' => 'ʳ',
        's' => 'ˢ',
        't' => 'ᵗ',
        'u' => 'ᵘ',
        'v' => 'ᵛ',
        'w' => 'ʷ',
        'x' => 'ˣ',
        'z' => 'ᶻ',
        'ə' => 'ᵊ',
        'ɪ' => 'ᶦ',
        'ʊ' => 'ᶷ',
        'ŋ' => 'ᵑ',
        'ʃ' => 'ᶴ',
        'ʒ' => 'ᶾ',
        'θ' => 'ᶿ',
        'ð' => 'ᶞ',
        'ɔ' => 'ᵓ',
        'ɛ' => 'ᵋ',
        'ɜ' => 'ᶟ',
        'ɑ' => 'ᵅ',
        'ʌ' => 'ᶺ',
        _ => return None,
    };
    Some(s)
}

/// Rewrite every character that has a superscript form; others pass through.
///
/// ```
/// use camdict_parser::ipa_superscript;
///
/// assert_eq!(ipa_superscript("ə"), "ᵊ");
/// assert_eq!(ipa_superscript("r"), "ʳ");
/// assert_eq!(ipa_superscript("ˌ"), "ˌ");
/// ```
pub fn ipa_superscript(s: &str) -> String {
    s.chars().map(|c| superscript(c).unwrap_or(c)).collect()
}

use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

/// Check if a character is a Unicode combining mark (diacritical mark).
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Orders strings the way a reader expects: accents and case are ignored first ("beyoncé" sorts
/// next to "Beyonce"), then the raw code points decide so that distinct strings never compare
/// equal.
pub fn compare(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| {
        s.nfkd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect::<Vec<char>>()
    };
    folded(a).cmp(&folded(b)).then_with(|| a.cmp(b))
}

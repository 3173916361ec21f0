//! # Text Normalization
//!
//! Canonicalizes free text so that catalog names and operator queries can be
//! compared without caring about case, accents, punctuation or plurals.
//!
//! ## Pipeline
//! ```text
//! "  Bases LÍQUIDAS (mate)! "
//!      │ lowercase
//!      ▼
//! "  bases líquidas (mate)! "
//!      │ NFD + strip combining marks
//!      ▼
//! "  bases liquidas (mate)! "
//!      │ anything outside [a-z0-9 ] → space, collapse, trim
//!      ▼
//! "bases liquidas mate"
//!      │ singularize each token
//!      ▼
//! "base liquida mate"
//! ```
//!
//! The singularization is a suffix heuristic aimed at Spanish product names,
//! not a grammatical analyzer. It will mis-stem some irregular words.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokens this short are never singularized ("mes", "gas", "tos").
const MIN_STEM_LEN: usize = 3;

/// Normalizes text for comparison.
///
/// Empty input yields an empty string. The function is idempotent:
/// `normalize(&normalize(s)) == normalize(s)`.
///
/// ```rust
/// use stockline_core::normalize;
///
/// assert_eq!(normalize("Productos"), normalize("producto"));
/// assert_eq!(normalize("Base Líquida"), "base liquida");
/// assert_eq!(normalize("Lápices"), "lapiz");
/// ```
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => ' ',
        })
        .collect();

    folded
        .split_whitespace()
        .map(singularize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips plural suffixes until the token is stable.
///
/// A single pass can leave a token that a second pass would shorten again
/// ("clases" → "clas" → "cla"); running to a fixed point keeps
/// [`normalize`] idempotent.
fn singularize(token: &str) -> String {
    let mut current = token.to_string();
    loop {
        let next = singularize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// One application of the suffix rules. Tokens are ASCII at this point.
fn singularize_once(token: &str) -> String {
    if token.len() <= MIN_STEM_LEN {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ces") {
        format!("{stem}z")
    } else if let Some(stem) = token.strip_suffix("es") {
        stem.to_string()
    } else if let Some(stem) = token.strip_suffix('s') {
        stem.to_string()
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("¡¿!?"), "");
    }

    #[test]
    fn test_accents_and_case() {
        assert_eq!(normalize("CREMA Renovadora"), "crema renovadora");
        assert_eq!(normalize("Delineador Líquido"), "delineador liquido");
        assert_eq!(normalize("Ñandú"), "nandu");
    }

    #[test]
    fn test_punctuation_becomes_space() {
        assert_eq!(normalize("Labial Gel Semi-Mate - Red"), "labial gel semi mate red");
        assert_eq!(normalize("crema\t\tde   noche"), "crema de noche");
    }

    #[test]
    fn test_singular_plural_equivalence() {
        assert_eq!(normalize("Productos"), normalize("producto"));
        assert_eq!(normalize("cremas"), "crema");
        assert_eq!(normalize("Colores"), "color");
        assert_eq!(normalize("luces"), "luz");
    }

    #[test]
    fn test_short_tokens_untouched() {
        assert_eq!(normalize("gas"), "gas");
        assert_eq!(normalize("mes"), "mes");
        assert_eq!(normalize("2 uds"), "2 uds");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Productos",
            "Base Líquida Mate TimeWise",
            "clases",
            "Lápices de colores",
            "Eau de Miefarran Climente",
            "crisis",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}

//! Group-label resolution against the static dashboard area table.
//!
//! The table maps normalized free-text labels (lowercase, no diacritics) to
//! the canonical area codes the downstream dashboard buckets by. Several keys
//! are synonyms for one code.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Label → area mapping in declaration order.
///
/// Declaration order is load-bearing: the fallback scan below matches on
/// substring containment in either direction, so more than one key can match a
/// given label. The tie-break is "first declared wins". That ambiguity is
/// inherited behavior and deliberately preserved; re-ranking by specificity
/// would silently reassign historical labels.
pub const AREA_TABLE: &[(&str, &str)] = &[
    ("rio / espirito santo", "RIO A / RIO B"),
    ("rio/espirito santo", "RIO A / RIO B"),
    ("bahia / sergipe", "NE/BA"),
    ("bahia/sergipe", "NE/BA"),
    ("centro oeste", "CO/NO"),
    ("centro-oeste", "CO/NO"),
    ("centrooeste", "CO/NO"),
    ("norte", "CO/NO"),
    ("minas gerais", "MG"),
    ("minas", "MG"),
    ("mg", "MG"),
    ("nordeste", "CO/NO"),
    ("ne", "CO/NO"),
];

/// Normalize a label for table lookup: lowercase, strip diacritics, trim.
pub fn normalize_label(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Resolve a free-text group label to a canonical area code.
///
/// Resolution order: exact match of the normalized label, then a declaration-
/// order scan testing bidirectional substring containment (label contains key,
/// or key contains label). `None` means no match; an empty label
/// short-circuits without normalization.
pub fn resolve_group(raw_label: &str) -> Option<&'static str> {
    if raw_label.trim().is_empty() {
        return None;
    }

    let normalized = normalize_label(raw_label);
    if normalized.is_empty() {
        return None;
    }

    for (key, area) in AREA_TABLE {
        if *key == normalized {
            return Some(area);
        }
    }

    for (key, area) in AREA_TABLE {
        if normalized.contains(key) || key.contains(normalized.as_str()) {
            return Some(area);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics_and_case() {
        assert_eq!(normalize_label("Espírito Santo"), "espirito santo");
        assert_eq!(normalize_label("  MINAS GERAIS  "), "minas gerais");
        assert_eq!(normalize_label("São Paulo"), "sao paulo");
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(resolve_group("minas gerais"), Some("MG"));
        assert_eq!(resolve_group("norte"), Some("CO/NO"));
    }

    #[test]
    fn test_diacritic_and_case_invariance() {
        let a = resolve_group("Rio / Espírito Santo");
        let b = resolve_group("RIO/ESPIRITO SANTO");
        assert_eq!(a, Some("RIO A / RIO B"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_partial_containment_both_directions() {
        // label contains a table key
        assert_eq!(resolve_group("grupo minas gerais - plantao"), Some("MG"));
        // table key contains the label
        assert_eq!(resolve_group("centro"), Some("CO/NO"));
    }

    #[test]
    fn test_declaration_order_tie_break() {
        // "minas gerais" is declared before "minas"; exact scan order keeps
        // the earliest declared match for overlapping keys
        assert_eq!(resolve_group("Minas"), Some("MG"));
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(resolve_group("grupo totalmente desconhecido"), None);
    }

    #[test]
    fn test_empty_short_circuits() {
        assert_eq!(resolve_group(""), None);
        assert_eq!(resolve_group("   "), None);
    }
}

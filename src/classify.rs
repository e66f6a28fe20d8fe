use std::sync::LazyLock;

use regex::{RegexSet, RegexSetBuilder};

use crate::flatten::FlatPropertyRow;

/// Named experimental/computed properties worth surfacing on their own.
static NAMED_PROPERTIES: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(&[
        r"\bmelting point\b",
        r"\bboiling point\b",
        r"\bsolubilit(?:y|ies)\b",
        r"\bpka\b",
        r"\bph\b",
        r"\blog\s*p\b",
        r"\bx?logp",
        r"\bdensity\b",
        r"\bvapou?r pressure\b",
        r"\bflash point\b",
        r"\bappearance\b",
        r"\bcolor/?form\b",
    ])
});

/// Broader section-heading categories, matched against provenance only.
static CATEGORY_HEADINGS: LazyLock<RegexSet> = LazyLock::new(|| {
    build_set(&[
        r"\bdescriptor\b",
        r"\bphysical\b",
        r"\bchemical\b",
        r"\bpartition\b",
        r"\bacid dissociation\b",
    ])
});

fn build_set(patterns: &[&str]) -> RegexSet {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .expect("static pattern set compiles")
}

/// Selects the relevant subset of a flat property table. Tiers are tried in
/// order and the first non-empty subset wins; when neither tier matches
/// anything, the whole table is returned so a non-empty input never
/// classifies to nothing.
pub fn classify(rows: &[FlatPropertyRow]) -> Vec<FlatPropertyRow> {
    let tiers: [fn(&[FlatPropertyRow]) -> Vec<FlatPropertyRow>; 2] =
        [tier_named_properties, tier_category_headings];
    tiers
        .iter()
        .map(|tier| tier(rows))
        .find(|subset| !subset.is_empty())
        .unwrap_or_else(|| rows.to_vec())
}

fn tier_named_properties(rows: &[FlatPropertyRow]) -> Vec<FlatPropertyRow> {
    rows.iter()
        .filter(|row| NAMED_PROPERTIES.is_match(&row.property) || NAMED_PROPERTIES.is_match(&row.source))
        .cloned()
        .collect()
}

fn tier_category_headings(rows: &[FlatPropertyRow]) -> Vec<FlatPropertyRow> {
    rows.iter()
        .filter(|row| CATEGORY_HEADINGS.is_match(&row.source))
        .cloned()
        .collect()
}

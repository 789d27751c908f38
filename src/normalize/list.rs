use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

/// Separator of the canonical stored form
pub const CANONICAL_SEPARATOR: &str = ", ";

/// Display priority of award levels, broadest first
pub const LEVEL_ORDER: [&str; 6] = [
    "International",
    "National",
    "Local",
    "University",
    "College",
    "Department",
];

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(.*?\)\s*").expect("parenthetical pattern is valid"));

/// Normalizes a multi-valued category cell to its canonical form.
///
/// Pieces are split on `split_on`, trimmed and stripped of parenthetical
/// annotations. Empty pieces are dropped and repeated pieces keep their
/// first position only, so
/// `"Research (any field); Teaching; Research (any field)"` becomes
/// `"Research, Teaching"`.
pub fn normalize_list(raw: &str, split_on: char) -> String {
    let mut values: Vec<String> = Vec::new();

    for piece in raw.split(split_on) {
        let value = strip_annotations(piece);
        if !value.is_empty() && !values.contains(&value) {
            values.push(value);
        }
    }

    values.join(CANONICAL_SEPARATOR)
}

fn strip_annotations(piece: &str) -> String {
    PARENTHETICAL.replace_all(piece.trim(), " ").trim().to_string()
}

/// Splits a stored comma-joined value into its trimmed, non-empty parts
pub fn split_values(canonical: &str) -> Vec<&str> {
    canonical
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect()
}

/// Orders level values by `LEVEL_ORDER`, unknown levels after known ones
/// in alphabetical order.
pub fn compare_levels(a: &str, b: &str) -> Ordering {
    let rank = |level: &str| LEVEL_ORDER.iter().position(|known| *known == level);

    match (rank(a), rank(b)) {
        (Some(a_rank), Some(b_rank)) => a_rank.cmp(&b_rank),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

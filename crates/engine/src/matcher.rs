//! Fuzzy string similarity for name-based joins.
//!
//! Token-set ratio over normalized strings on a 0-100 scale: order and
//! duplication of tokens don't matter, so "Miami-Dade" scores 100 against
//! "Miami-Dade County" (the shared tokens fully cover the shorter side).

use std::collections::BTreeSet;

/// Minimum similarity for a fuzzy match to be accepted.
pub const DEFAULT_THRESHOLD: u32 = 80;

/// Lowercase and reduce to alphanumeric tokens.
fn tokens(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Edit-distance similarity of two raw strings, 0-100.
fn ratio(a: &str, b: &str) -> u32 {
    let len_sum = a.chars().count() + b.chars().count();
    if len_sum == 0 {
        return 100;
    }
    let dist = levenshtein(a, b);
    (((len_sum - dist.min(len_sum)) * 100) / len_sum) as u32
}

/// Token-set ratio: compare the shared-token core against each side's full
/// token set and take the best score. A side with no tokens scores 0.
pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0;
    }

    let inter: Vec<&str> = ta.intersection(&tb).map(String::as_str).collect();
    let only_a: Vec<&str> = ta.difference(&tb).map(String::as_str).collect();
    let only_b: Vec<&str> = tb.difference(&ta).map(String::as_str).collect();

    let core = inter.join(" ");
    let full_a = join_parts(&inter, &only_a);
    let full_b = join_parts(&inter, &only_b);

    ratio(&core, &full_a)
        .max(ratio(&core, &full_b))
        .max(ratio(&full_a, &full_b))
}

fn join_parts(head: &[&str], tail: &[&str]) -> String {
    head.iter()
        .chain(tail.iter())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-scoring target for `query`, as (index, score). Ties resolve to the
/// first target encountered, which keeps fixture runs reproducible.
pub fn best_match(query: &str, targets: &[String]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, target) in targets.iter().enumerate() {
        let score = token_set_ratio(query, target);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best
}

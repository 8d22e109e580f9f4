//! Token-set similarity.
//!
//! Order-insensitive name similarity: both names are split into token sets,
//! and the shared tokens are compared against each side's leftovers so that
//! extra or missing tokens (middle names, initials) cost little. Scores are
//! integers in `[0, 100]`.

use std::collections::BTreeSet;

/// Length of the longest common subsequence of two char sequences.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Indel similarity ratio: `100 * 2 * lcs / (len(a) + len(b))`, truncated.
///
/// Two empty strings are identical (100).
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let score = 200 * lcs_len(&a, &b) / total;
    score.min(100) as u8
}

fn join_sorted<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<&str>>().join(" ")
}

fn with_prefix(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{} {}", prefix, rest),
    }
}

/// Token-set ratio of two (already normalized) names.
///
/// With `S` the sorted shared tokens and `A`, `B` each side's sorted
/// leftovers, the score is the best of `ratio(S, S+A)`, `ratio(S, S+B)` and
/// `ratio(S+A, S+B)`. A name whose tokens are a subset of the other's scores
/// 100. Either side having no tokens scores 0.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let shared = join_sorted(tokens_a.intersection(&tokens_b));
    let only_a = join_sorted(tokens_a.difference(&tokens_b));
    let only_b = join_sorted(tokens_b.difference(&tokens_a));

    let combined_a = with_prefix(&shared, &only_a);
    let combined_b = with_prefix(&shared, &only_b);

    let pairwise = ratio(&combined_a, &combined_b);
    if shared.is_empty() {
        return pairwise;
    }

    pairwise
        .max(ratio(&shared, &combined_a))
        .max(ratio(&shared, &combined_b))
}

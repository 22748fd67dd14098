use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").unwrap();
}

pub const MAX_SCORE: f64 = 100.0;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub num_weight: f64,
    pub text_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            num_weight: 1.5,
            text_weight: 1.0,
        }
    }
}

///
/// Similarity of two normalized addresses on a 0-100 scale.
///
/// The digit runs and the remaining text are compared separately with
/// [`token_sort_ratio`] and combined as a weighted average. If either side has
/// no digits at all the numeric part scores 0: a missing house or unit
/// number never counts as agreement.
///
/// ## Arguments
///
/// * `a`, `b` - Addresses already passed through the normalizer.
/// * `weights` - Relative weights of the numeric and text sub-scores.
///
pub fn score(a: &str, b: &str, weights: ScoreWeights) -> f64 {
    if a == b {
        return MAX_SCORE;
    }
    let text_score = token_sort_ratio(&strip_digits(a), &strip_digits(b));
    let (nums_a, nums_b) = (digit_runs(a), digit_runs(b));
    let num_score = if nums_a.is_empty() || nums_b.is_empty() {
        0.0
    } else {
        token_sort_ratio(&nums_a.join(" "), &nums_b.join(" "))
    };
    (weights.num_weight * num_score + weights.text_weight * text_score)
        / (weights.num_weight + weights.text_weight)
}

///
/// Order-insensitive similarity ratio, 0-100, rounded to an integer.
///
/// Both strings are lowercased, every non-alphanumeric character becomes a
/// separator, and the tokens are sorted and rejoined with single spaces. The
/// rejoined forms are then compared by indel similarity:
///
/// `100 * (1 - (len_a + len_b - 2 * lcs) / (len_a + len_b))`
///
/// where lengths count chars and `lcs` is the longest common subsequence.
/// The result is rounded half to even. Two strings without any tokens are
/// identical (100); one empty side against a non-empty one scores 0.
///
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let (a, b) = (sorted_tokens(a), sorted_tokens(b));
    if a.is_empty() && b.is_empty() {
        return MAX_SCORE;
    }
    (MAX_SCORE * indel_similarity(&a, &b)).round_ties_even()
}

fn sorted_tokens(text: &str) -> Vec<char> {
    let lowered = text.to_lowercase();
    let mut tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ").chars().collect()
}

fn indel_similarity(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let distance = total - 2 * lcs_len(a, b);
    1.0 - distance as f64 / total as f64
}

/// Two-row dynamic program over the shorter string.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &lc in long {
        for (j, &sc) in short.iter().enumerate() {
            curr[j + 1] = if lc == sc {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

fn digit_runs(text: &str) -> Vec<&str> {
    DIGIT_RUN.find_iter(text).map(|m| m.as_str()).collect()
}

fn strip_digits(text: &str) -> String {
    DIGIT_RUN.replace_all(text, "").trim().to_string()
}

//! Token-sort string similarity.
//!
//! Both strings are lower-cased, split on whitespace, and their words sorted
//! before comparison, so word order and letter case never affect the score.
//! The comparison itself is the normalized indel ratio:
//!
//! ratio = 100 * 2 * LCS(a, b) / (|a| + |b|)
//!
//! where LCS is the longest common subsequence over characters.

/// Score how close `a` is to `b` on a 0–100 scale.
///
/// Text with no words (empty or whitespace-only) scores 0 against any text
/// that has words, and 100 against other text with no words.
pub fn score(a: &str, b: &str) -> u8 {
    let a = token_sort(a);
    let b = token_sort(b);
    indel_ratio(&a, &b)
}

/// Lower-case, split on whitespace, sort the words, and re-join them with
/// single spaces.
pub fn token_sort(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Normalized indel similarity of two strings, rounded to an integer.
pub fn indel_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 100,
        (true, false) | (false, true) => return 0,
        (false, false) => {}
    }

    let total = (a.len() + b.len()) as f64;
    let lcs = lcs_len(&a, &b) as f64;
    let ratio = 100.0 * 2.0 * lcs / total;
    ratio.round().clamp(0.0, 100.0) as u8
}

/// Length of the longest common subsequence, using a single rolling row.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Keep the row sized to the shorter input.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; inner.len() + 1];

    for &oc in outer {
        let mut diag = 0usize;
        for (j, &ic) in inner.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if oc == ic {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }

    row[inner.len()]
}

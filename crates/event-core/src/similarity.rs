//! String similarity for matching OCR readings against known labels.

/// Length of the longest common subsequence, counted in chars.
pub fn lcs_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let n = b.len();

    let mut prev = vec![0usize; n + 1];
    let mut curr = vec![0usize; n + 1];

    for ca in &a {
        for j in 1..=n {
            curr[j] = if *ca == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Similarity in `[0, 1]`: `2 * LCS / (|a| + |b|)`.
///
/// This is one minus the insertion/deletion edit distance over the total
/// length. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

/// `ratio` divided by the longer length, used to rank candidates so that
/// a close match against a short name does not beat an equally close
/// match against a long one.
pub fn normalized_ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    ratio(a, b) / longest as f64
}

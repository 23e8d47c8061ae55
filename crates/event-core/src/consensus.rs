//! Majority-vote reducers over noisy per-frame readings.
//!
//! Ties are always broken by first-seen order, so results are
//! deterministic for a given input order.

/// Most frequent value, ignoring `None`. Returns `None` when no value
/// was observed.
pub fn likely_value<V, I>(values: I) -> Option<V>
where
    V: PartialEq,
    I: IntoIterator<Item = Option<V>>,
{
    let mut counts: Vec<(V, usize)> = Vec::new();
    for value in values.into_iter().flatten() {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    first_max(counts)
}

/// Most frequent float reading. Floats are compared by bit pattern.
pub fn likely_float<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    likely_value(values.into_iter().map(|v| v.map(f64::to_bits))).map(f64::from_bits)
}

/// Consensus text of several readings of the same string.
///
/// Keeps the readings with the most frequent length, then takes the most
/// frequent char at each position.
pub fn likely_text<S: AsRef<str>>(readings: &[S]) -> String {
    let readings: Vec<Vec<char>> = readings
        .iter()
        .map(|s| s.as_ref().chars().collect())
        .collect();

    let Some(len) = likely_value(readings.iter().map(|r| Some(r.len()))) else {
        return String::new();
    };
    let kept: Vec<&Vec<char>> = readings.iter().filter(|r| r.len() == len).collect();

    (0..len)
        .filter_map(|i| likely_value(kept.iter().map(|r| Some(r[i]))))
        .collect()
}

fn first_max<V>(counts: Vec<(V, usize)>) -> Option<V> {
    let mut best: Option<(V, usize)> = None;
    for (value, n) in counts {
        match &best {
            Some((_, best_n)) if n <= *best_n => {}
            _ => best = Some((value, n)),
        }
    }
    best.map(|(v, _)| v)
}

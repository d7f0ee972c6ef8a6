/// Levenshtein distance between two strings, counted in chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein(&a, &b, usize::MAX).unwrap_or(usize::MAX)
}

/// Levenshtein distance, or `None` once it is known to exceed `max`.
pub fn edit_distance_within(a: &str, b: &str, max: usize) -> Option<usize> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein(&a, &b, max)
}

/// Normalized similarity in [0, 1]: `(max_len - distance) / max_len`.
/// Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let distance = levenshtein(&a, &b, usize::MAX).unwrap_or(usize::MAX);
    score(distance, a.len().max(b.len()))
}

pub(crate) fn score(distance: usize, max_len: usize) -> f64 {
    if max_len == 0 {
        return 1.0;
    }
    max_len.saturating_sub(distance) as f64 / max_len as f64
}

/// Rolling-row Levenshtein over char slices.
///
/// Only two rows the length of the shorter input are kept. Row minima never
/// decrease, so the scan stops as soon as a whole row exceeds `max`.
pub(crate) fn levenshtein(a: &[char], b: &[char], max: usize) -> Option<usize> {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if long.len() - short.len() > max {
        return None;
    }
    if short.is_empty() {
        return Some(long.len());
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0; short.len() + 1];

    for (i, &lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for (j, &sc) in short.iter().enumerate() {
            let cost = usize::from(lc != sc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }

        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[short.len()];
    (distance <= max).then_some(distance)
}

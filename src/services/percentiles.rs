/// Percentile helpers for already-sorted slices.
///
/// - Empty input => `None` (or `0.0` for the f64 convenience wrapper).
/// - `percentile <= 0` => first element.
/// - Otherwise the index is `floor(len * percentile / 100)`, clamped to the
///   last element.

/// Returns the percentile value from a slice that is already sorted in
/// ascending order.
pub fn value_sorted<T: Copy>(sorted_values: &[T], percentile: f64) -> Option<T> {
    if sorted_values.is_empty() {
        return None;
    }

    let last = sorted_values.len() - 1;
    let index = if percentile <= 0.0 {
        0
    } else {
        let position = (sorted_values.len() as f64 * percentile / 100.0).floor();
        (position as usize).min(last)
    };

    sorted_values.get(index).copied()
}

/// Convenience wrapper for `f64` results.
pub fn value_f64_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    value_sorted(sorted_values, percentile).unwrap_or(0.0)
}

//! Deterministic stride sampling
//!
//! Positional down-sampling used to bound the record sets handed to the
//! dashboard and to the summarizer. Each consumer calls [`sample`] with its
//! own maximum.

/// Return `items` unchanged if it fits in `max`, otherwise exactly `max`
/// items taken at a uniform stride of `len / max` (index `floor(i * len / max)`).
pub fn sample<T>(items: &[T], max: usize) -> Vec<&T> {
    let len = items.len();
    if len <= max {
        return items.iter().collect();
    }

    (0..max).map(|i| &items[i * len / max]).collect()
}

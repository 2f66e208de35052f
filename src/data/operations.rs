//! Summary statistics used when aggregating count vectors.

use num_traits::ToPrimitive;

/// Calculate the mean of a slice of numbers, as an `f64`.
///
/// Returns `None` for an empty slice or if any value cannot be represented
/// as an `f64`.
pub fn mean<T: ToPrimitive + Copy>(numbers: &[T]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    let mut sum = 0.0;
    for value in numbers {
        sum += value.to_f64()?;
    }
    Some(sum / numbers.len() as f64)
}

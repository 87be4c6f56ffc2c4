use serde::Serialize;

use crate::error::{MetricsError, Result};

/// Element at index `min(n - 1, floor(n * q))` of an ascending slice.
///
/// Returns `Ok(None)` for an empty slice. Fails if `q` is outside `[0, 1]`.
pub fn quantile<T: Copy>(sorted: &[T], q: f64) -> Result<Option<T>> {
    if !(0.0..=1.0).contains(&q) {
        return Err(MetricsError::QuantileOutOfRange(q));
    }
    if sorted.is_empty() {
        return Ok(None);
    }
    let n = sorted.len();
    let index = ((n as f64 * q).floor() as usize).min(n - 1);
    Ok(Some(sorted[index]))
}

/// A percentile breakdown of one window's sample.
/// Serialized straight into reports for dashboards and logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub p50: i64,
    pub p95: i64,
    pub p99: i64,
    pub p999: i64,
    pub count: usize,
}

impl PercentileSet {
    /// Extract a full percentile set from an ascending sample.
    /// Returns zeroed values if the sample is empty.
    pub fn from_sorted(sorted: &[i64]) -> Self {
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Self::empty();
        };
        let at = |q: f64| {
            // q values here are constants inside [0, 1]
            quantile(sorted, q).ok().flatten().unwrap_or_default()
        };
        let sum: i128 = sorted.iter().map(|&v| v as i128).sum();

        Self {
            min,
            max,
            mean: sum as f64 / sorted.len() as f64,
            p50: at(0.5),
            p95: at(0.95),
            p99: at(0.99),
            p999: at(0.999),
            count: sorted.len(),
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p95: 0,
            p99: 0,
            p999: 0,
            count: 0,
        }
    }

    /// Convenience: is this set backed by at least one observation?
    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_has_no_quantile() {
        let empty: [i64; 0] = [];
        for q in [0.0, 0.5, 1.0] {
            assert_eq!(quantile(&empty, q).unwrap(), None);
        }
    }

    #[test]
    fn bounds_pick_first_and_last() {
        let values = [3, 8, 13, 21];
        assert_eq!(quantile(&values, 0.0).unwrap(), Some(3));
        assert_eq!(quantile(&values, 1.0).unwrap(), Some(21));
    }

    #[test]
    fn floors_rather_than_rounds() {
        let values = [10, 20, 30, 40];
        // 4 * 0.49 = 1.96 -> index 1
        assert_eq!(quantile(&values, 0.49).unwrap(), Some(20));
        assert_eq!(quantile(&values, 0.5).unwrap(), Some(30));
        // 4 * 0.99 = 3.96 -> index 3
        assert_eq!(quantile(&values, 0.99).unwrap(), Some(40));
    }

    #[test]
    fn single_element() {
        assert_eq!(quantile(&[7], 0.3).unwrap(), Some(7));
    }

    #[test]
    fn out_of_range_quantile_is_an_error() {
        let values = [1, 2, 3];
        assert_eq!(quantile(&values, 1.5), Err(MetricsError::QuantileOutOfRange(1.5)));
        assert!(quantile(&values, -0.1).is_err());
        assert!(quantile(&values, f64::NAN).is_err());
        // checked even when there is nothing to pick from
        assert!(quantile::<i64>(&[], 2.0).is_err());
    }

    #[test]
    fn percentile_set_summarises_sample() {
        let values: Vec<i64> = (1..=1_000).collect();
        let set = PercentileSet::from_sorted(&values);
        assert_eq!(set.min, 1);
        assert_eq!(set.max, 1_000);
        assert_eq!(set.count, 1_000);
        assert_eq!(set.mean, 500.5);
        assert_eq!(set.p50, 501);
        assert_eq!(set.p99, 991);
        assert_eq!(set.p999, 1_000);
        assert!(set.has_data());
    }

    #[test]
    fn empty_percentile_set() {
        let set = PercentileSet::from_sorted(&[]);
        assert_eq!(set, PercentileSet::empty());
        assert!(!set.has_data());
    }
}

//! Linear-interpolation percentile, matching the numpy `"linear"`
//! convention the source analytics relied on: no stats crate in the
//! ecosystem stack covers this one formula, so it's hand-rolled.

/// The `p`-th percentile (0..=100) of `samples` by linear interpolation
/// between order statistics. `None` if `samples` is empty. Does not
/// require `samples` to be pre-sorted.
pub fn linear(samples: &[f64], p: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    if samples.len() == 1 {
        return Some(samples[0]);
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;

    if lower == upper {
        Some(sorted[lower])
    } else {
        Some(sorted[lower] + frac * (sorted[upper] - sorted[lower]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_is_none() {
        assert_eq!(linear(&[], 50.0), None);
    }

    #[test]
    fn single_sample_is_itself_for_any_percentile() {
        assert_eq!(linear(&[42.0], 99.0), Some(42.0));
    }

    #[test]
    fn ten_point_series_matches_numpy_linear_convention() {
        let samples: Vec<f64> = (100..=190).step_by(10).map(|v| v as f64).collect();
        assert!((linear(&samples, 50.0).unwrap() - 145.0).abs() < 1e-9);
        assert!((linear(&samples, 90.0).unwrap() - 181.0).abs() < 1e-9);
        assert!((linear(&samples, 95.0).unwrap() - 185.5).abs() < 1e-9);
        assert!((linear(&samples, 99.0).unwrap() - 189.1).abs() < 1e-9);
    }

    #[test]
    fn unsorted_input_is_sorted_internally() {
        let samples = vec![30.0, 10.0, 20.0];
        assert_eq!(linear(&samples, 50.0), Some(20.0));
    }
}

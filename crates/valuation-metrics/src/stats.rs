//! Small aggregate-statistic helpers shared across the calculator families.

use statrs::statistics::Statistics;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Population standard deviation (divide by N, not N-1). `None` with fewer
/// than two values; dispersion of a single observation is undefined here.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().population_std_dev())
}

/// Standard median: middle element for odd counts, average of the two middle
/// elements for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_population_std_dev_two_points() {
        // mean 0.15, deviations ±0.05, population std exactly 0.05
        let std = population_std_dev(&[0.10, 0.20]).unwrap();
        assert_relative_eq!(std, 0.05, epsilon = 1e-12);
        assert_relative_eq!(mean(&[0.10, 0.20]).unwrap(), 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_population_std_dev_single_value_is_none() {
        assert_eq!(population_std_dev(&[0.10]), None);
        assert_eq!(population_std_dev(&[]), None);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_eq!(median(&[]), None);
    }
}

//! Contour level sets for triage plots.
//!
//! Two level families are drawn over the zoomed emission: fractions of the
//! peak intensity, and multiples of a sigma threshold derived from the noise
//! floor. Levels that are not positive and finite are dropped so the result
//! is always a strictly increasing sequence.

/// Number of peak-relative levels (10%, 20%, ... 100%).
pub const PEAK_LEVEL_COUNT: usize = 10;

/// Number of sigma-relative levels.
pub const SIGMA_LEVEL_COUNT: usize = 4;

fn usable(levels: impl Iterator<Item = f64>) -> Vec<f64> {
    levels.filter(|l| l.is_finite() && *l > 0.0).collect()
}

/// Levels at 10%, 20%, ... 100% of `max_value`.
pub fn peak_levels(max_value: f64) -> Vec<f64> {
    usable((1..=PEAK_LEVEL_COUNT).map(|k| max_value * 0.1 * k as f64))
}

/// Levels at `sigma * std * k` for `k = 1..=4`, where `std = 2 * rms`.
pub fn sigma_levels(sigma: f64, rms: f64) -> Vec<f64> {
    let std = 2.0 * rms;
    usable((1..=SIGMA_LEVEL_COUNT).map(|k| sigma * std * k as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_peak_levels() {
        let levels = peak_levels(2.0);
        assert_eq!(levels.len(), 10);
        assert_relative_eq!(levels[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(levels[9], 2.0, epsilon = 1e-12);
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sigma_levels() {
        let levels = sigma_levels(3.0, 1e-4);
        assert_eq!(levels.len(), 4);
        assert_relative_eq!(levels[0], 6e-4, epsilon = 1e-15);
        assert_relative_eq!(levels[3], 2.4e-3, epsilon = 1e-15);
    }

    #[test]
    fn test_non_positive_levels_dropped() {
        assert!(peak_levels(-1.0).is_empty());
        assert!(peak_levels(f64::NAN).is_empty());
        assert!(sigma_levels(3.0, 0.0).is_empty());
    }
}

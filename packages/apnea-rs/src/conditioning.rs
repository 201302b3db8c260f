//! Per-channel signal conditioning
//!
//! Pure functions over one 1-D series: Butterworth low-pass filtering applied
//! once at load time, and robust rescaling applied to each emitted window.
//! Neither introduces NaN/Inf for finite input.

use crate::error::{DatasetError, Result};
use crate::filters::ButterworthFilter;

/// Filter order used for load-time conditioning
pub const DEFAULT_FILTER_ORDER: usize = 5;

/// Cutoff factors are given relative to the sample rate
pub const NORMALIZED_SAMPLE_RATE: f64 = 1.0;

/// Spread below which robust normalization only centres the series
pub const MIN_ROBUST_SPREAD: f64 = 1e-12;

const MAX_FILTER_ORDER: usize = 16;

/// Check low-pass parameters without filtering anything
pub fn validate_lowpass(cutoff: f64, sample_rate: f64, order: usize) -> Result<()> {
    let nyquist = sample_rate / 2.0;
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(DatasetError::Configuration(format!(
            "Sample rate must be positive, got {}",
            sample_rate
        )));
    }
    if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= nyquist {
        return Err(DatasetError::Configuration(format!(
            "Cutoff ({}) must lie in (0, {}) for sample rate {}",
            cutoff, nyquist, sample_rate
        )));
    }
    validate_filter_order(order)
}

pub fn validate_filter_order(order: usize) -> Result<()> {
    if order == 0 || order > MAX_FILTER_ORDER {
        return Err(DatasetError::Configuration(format!(
            "Filter order must be in 1..={}, got {}",
            MAX_FILTER_ORDER, order
        )));
    }
    Ok(())
}

/// Zero-phase Butterworth low-pass. `None` leaves the series untouched.
pub fn lowpass(
    series: &[f64],
    cutoff_factor: Option<f64>,
    sample_rate: f64,
    order: usize,
) -> Result<Vec<f64>> {
    let Some(cutoff) = cutoff_factor else {
        return Ok(series.to_vec());
    };
    validate_lowpass(cutoff, sample_rate, order)?;

    let filter = ButterworthFilter::lowpass(cutoff, sample_rate, order);
    Ok(filter.filtfilt(series, 3 * (order + 1)))
}

/// Rescale by median and interquartile range
pub fn normalize_robust(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }

    let mut sorted = series.to_vec();
    sorted.sort_by(f64::total_cmp);

    let median = quantile(&sorted, 0.5);
    let spread = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);

    if spread < MIN_ROBUST_SPREAD {
        series.iter().map(|&x| x - median).collect()
    } else {
        series.iter().map(|&x| (x - median) / spread).collect()
    }
}

/// Linearly interpolated quantile of an ascending, non-empty slice
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Position of the first NaN or infinite value
pub fn first_non_finite<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter().position(|value| !value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowpass_none_is_identity() {
        let series: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).sin() * 3.0).collect();
        let filtered = lowpass(&series, None, NORMALIZED_SAMPLE_RATE, DEFAULT_FILTER_ORDER).unwrap();
        assert_eq!(filtered, series);
    }

    #[test]
    fn test_lowpass_smooths_alternating_signal() {
        let series: Vec<f64> = (0..400).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let filtered = lowpass(&series, Some(0.1), NORMALIZED_SAMPLE_RATE, DEFAULT_FILTER_ORDER).unwrap();
        assert_eq!(filtered.len(), series.len());
        assert!(filtered[100..300].iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_lowpass_rejects_cutoff_above_nyquist() {
        let err = lowpass(&[1.0, 2.0], Some(0.5), NORMALIZED_SAMPLE_RATE, 5).unwrap_err();
        assert!(matches!(err, DatasetError::Configuration(_)));

        let err = lowpass(&[1.0, 2.0], Some(-0.1), NORMALIZED_SAMPLE_RATE, 5).unwrap_err();
        assert!(matches!(err, DatasetError::Configuration(_)));
    }

    #[test]
    fn test_lowpass_rejects_zero_order() {
        assert!(validate_lowpass(0.2, 1.0, 0).is_err());
        assert!(validate_lowpass(0.2, 1.0, 5).is_ok());
    }

    #[test]
    fn test_normalize_robust_uses_median_and_iqr() {
        let normalized = normalize_robust(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        // median 3, q25 2, q75 4
        assert_eq!(normalized, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_normalize_robust_resists_outliers() {
        let normalized = normalize_robust(&[1.0, 2.0, 3.0, 4.0, 1e9]);
        assert_eq!(normalized[2], 0.0);
        assert_eq!(normalized[1], -0.5);
    }

    #[test]
    fn test_normalize_robust_constant_input() {
        let normalized = normalize_robust(&[7.0; 10]);
        assert!(normalized.iter().all(|&v| v == 0.0));

        let near_constant = normalize_robust(&[1.0, 1.0, 1.0, 1.0, 5.0]);
        assert!(first_non_finite(near_constant.iter().copied()).is_none());
        assert_eq!(near_constant[4], 4.0);
    }

    #[test]
    fn test_normalize_robust_empty() {
        assert!(normalize_robust(&[]).is_empty());
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [0.0, 10.0];
        assert_eq!(quantile(&sorted, 0.25), 2.5);
        assert_eq!(quantile(&[4.0], 0.75), 4.0);
    }

    #[test]
    fn test_first_non_finite() {
        assert_eq!(first_non_finite([1.0, 2.0]), None);
        assert_eq!(first_non_finite([1.0, f64::NAN, f64::INFINITY]), Some(1));
    }
}

//! Robust severity combination
//!
//! Severity is the field most exposed to adversarial or simply wrong sources,
//! so the estimator is built from robust pieces: a confidence-weighted median
//! for the center, a weighted MAD for spread, and Huber-style winsorization
//! to cap (not discard) outlier votes before the final weighted mean.

use crate::types::clamp_score;

/// Default Huber multiplier on the weighted MAD.
pub const DEFAULT_HUBER_K: f64 = 1.5;

/// Default floor on the winsorization half-width. Keeps the clipping window
/// from collapsing to near-zero when sources agree almost perfectly.
pub const DEFAULT_MAD_FLOOR: f64 = 10.0;

/// Weighted median: scanning values in ascending order, returns the first
/// value whose cumulative weight reaches half the total weight.
///
/// Precondition (fatal): `values` non-empty and the same length as `weights`.
pub fn weighted_median(values: &[f64], weights: &[f64]) -> f64 {
    assert!(
        !values.is_empty() && values.len() == weights.len(),
        "weighted_median: values/weights must be non-empty and equal length"
    );

    let mut pairs: Vec<(f64, f64)> = values.iter().copied().zip(weights.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total: f64 = weights.iter().sum();
    let mut acc = 0.0;
    for &(value, weight) in &pairs {
        acc += weight;
        if acc >= total / 2.0 {
            return value;
        }
    }
    // Unreachable for finite positive weights; keep the last value as fallback.
    pairs[pairs.len() - 1].0
}

/// Robust, confidence-weighted combination of severities into [1,100].
///
/// Steps: clamp -> weighted median -> weighted MAD -> winsorize into
/// `median ± max(mad_floor, huber_k * MAD)` -> confidence-weighted mean ->
/// round and clamp. Exact .5 rounding ties resolve to the even integer.
/// A single-element batch returns that element clamped.
///
/// Precondition (fatal): non-empty, equal-length inputs.
pub fn combine_severity(severities: &[i64], confidences: &[i64], huber_k: f64, mad_floor: f64) -> u8 {
    assert!(
        !severities.is_empty() && severities.len() == confidences.len(),
        "combine_severity: severities/confidences must be non-empty and equal length"
    );

    let s: Vec<f64> = severities.iter().map(|&x| f64::from(clamp_score(x))).collect();
    let w: Vec<f64> = confidences.iter().map(|&x| f64::from(clamp_score(x))).collect();

    let center = weighted_median(&s, &w);
    let abs_dev: Vec<f64> = s.iter().map(|&x| (x - center).abs()).collect();
    let mad = weighted_median(&abs_dev, &w);
    let half_width = mad_floor.max(huber_k * mad);

    let (low, high) = (center - half_width, center + half_width);
    let winsorized = s.iter().map(|&x| x.clamp(low, high));

    let numerator: f64 = winsorized.zip(w.iter()).map(|(x, &wi)| x * wi).sum();
    let denom: f64 = w.iter().sum();
    clamp_score((numerator / denom).round_ties_even() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combine(severities: &[i64], confidences: &[i64]) -> u8 {
        combine_severity(severities, confidences, DEFAULT_HUBER_K, DEFAULT_MAD_FLOOR)
    }

    #[test]
    fn weighted_median_equal_weights_is_plain_median() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        let weights = [1.0; 5];
        assert_eq!(weighted_median(&values, &weights), 30.0);
    }

    #[test]
    fn weighted_median_first_reach_rule() {
        // Cumulative weight hits exactly half the total at 10, so 10 wins
        // under ascending accumulation.
        assert_eq!(weighted_median(&[10.0, 20.0], &[1.0, 1.0]), 10.0);
        // A heavier upper vote drags the crossing point up.
        assert_eq!(weighted_median(&[10.0, 20.0], &[1.0, 3.0]), 20.0);
    }

    #[test]
    fn weighted_median_respects_weights() {
        // 90 carries most of the mass despite being a single value.
        let values = [10.0, 20.0, 90.0];
        let weights = [1.0, 1.0, 10.0];
        assert_eq!(weighted_median(&values, &weights), 90.0);
    }

    #[test]
    fn single_element_returns_itself_clamped() {
        assert_eq!(combine(&[42], &[77]), 42);
        assert_eq!(combine(&[999], &[10]), 100);
        assert_eq!(combine(&[-7], &[10]), 1);
    }

    #[test]
    fn identical_inputs_are_idempotent() {
        assert_eq!(combine(&[60, 60, 60], &[80, 80, 80]), 60);
        assert_eq!(combine(&[1, 1], &[100, 100]), 1);
    }

    #[test]
    fn equal_confidences_reduce_to_unweighted_estimator() {
        let severities = [30, 40, 50, 60, 70];
        let equal = combine(&severities, &[50; 5]);
        let also_equal = combine(&severities, &[90; 5]);
        // The weight scale cancels in both the median and the mean.
        assert_eq!(equal, also_equal);
        assert_eq!(equal, 50);
    }

    #[test]
    fn outlier_is_winsorized_not_followed() {
        // Three sources at 50, one adversarial source at 99, all equally
        // confident. Median 50, MAD 0, so the window is 50 ± mad_floor and
        // the result must stay inside it.
        let result = combine(&[50, 50, 50, 99], &[80, 80, 80, 80]);
        assert!(
            (40..=60).contains(&result),
            "outlier pulled severity to {result}, outside the winsorization window"
        );
        // Plain mean would have been ~62; robust estimate stays near 50.
        assert!(result <= 53, "expected near-50 result, got {result}");
    }

    #[test]
    fn halfway_results_round_to_even() {
        // Winsorized values 50, 50, 50, 60 with equal weights average to
        // exactly 52.5, which rounds to the even neighbor 52.
        assert_eq!(combine(&[50, 50, 50, 99], &[80, 80, 80, 80]), 52);
    }

    #[test]
    fn low_confidence_outlier_moves_result_less() {
        let confident_outlier = combine(&[50, 50, 50, 90], &[80, 80, 80, 80]);
        let doubted_outlier = combine(&[50, 50, 50, 90], &[80, 80, 80, 5]);
        assert!(doubted_outlier <= confident_outlier);
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn empty_input_is_a_contract_violation() {
        combine(&[], &[]);
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn mismatched_lengths_are_a_contract_violation() {
        combine(&[50, 60], &[80]);
    }
}

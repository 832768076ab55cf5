//! Combined-judgment confidence
//!
//! Confidence is deliberately NOT weighted by itself. It is the arithmetic
//! mean of source confidences, discounted by how much the sources disagree
//! on severity. Disagreement is measured as the plain (unweighted) MAD of
//! severities around their plain median: raw observable disagreement, not
//! the already-smoothed robust center from severity combination.

use crate::types::clamp_score;
use statrs::statistics::{Data, Median, Statistics};

/// Dispersion (severity MAD) at which agreement bottoms out at zero.
pub const DEFAULT_DISAGREEMENT_NORM: f64 = 20.0;

/// Weak-link penalty coefficient. 0.0 disables the penalty; the surrounding
/// system opts in with 0.3.
pub const DEFAULT_MIN_PENALTY_K: f64 = 0.0;

/// Confidence a source must reach before the weak-link penalty stops
/// applying to it.
const WEAK_LINK_THRESHOLD: f64 = 60.0;

/// Combine per-source confidences into one trust score in [1,100].
///
/// `base = mean(confidences) * agreement`, where agreement decays linearly
/// from 1.0 (severity MAD of 0) to 0.0 (MAD at `disagreement_norm`). When
/// `min_penalty_k > 0`, the weakest source additionally costs
/// `min_penalty_k * max(0, 60 - min(confidences))`. Exact .5 rounding ties
/// resolve to the even integer.
///
/// Precondition (fatal): non-empty, equal-length inputs.
pub fn combine_confidence(
    confidences: &[i64],
    severities: &[i64],
    disagreement_norm: f64,
    min_penalty_k: f64,
) -> u8 {
    assert!(
        !confidences.is_empty() && confidences.len() == severities.len(),
        "combine_confidence: confidences/severities must be non-empty and equal length"
    );

    let c: Vec<f64> = confidences.iter().map(|&x| f64::from(clamp_score(x))).collect();
    let s: Vec<f64> = severities.iter().map(|&x| f64::from(clamp_score(x))).collect();

    let c_bar = (&c).mean();

    let center = Data::new(s.clone()).median();
    let abs_dev: Vec<f64> = s.iter().map(|&x| (x - center).abs()).collect();
    let dispersion = Data::new(abs_dev).median();
    let agreement = (1.0 - (dispersion / disagreement_norm).min(1.0)).max(0.0);

    let mut base = c_bar * agreement;

    if min_penalty_k > 0.0 {
        let weakest = (&c).min();
        base -= min_penalty_k * (WEAK_LINK_THRESHOLD - weakest).max(0.0);
    }

    clamp_score(base.round_ties_even() as i64)
}

//! Batch orchestration
//!
//! Sequences the three aggregators over one batch of raw source
//! observations plus the reporter's prior vote, and assembles the final
//! [`Consensus`]. This is the only place that filters malformed records and
//! the only place that guards the degenerate (zero-survivor) batch.

use tracing::{debug, warn};

use crate::aggregation::confidence::combine_confidence;
use crate::aggregation::robust::combine_severity;
use crate::aggregation::voter::{combine_labels, vote_language};
use crate::config::AggregationConfig;
use crate::types::{Consensus, HazardType, Observation, PriorVote, RawObservation};

/// Aggregate one batch of raw observations into a single consensus.
///
/// Records missing any required field (or carrying a hazard code outside the
/// taxonomy) are dropped whole; out-of-range scores are clamped. A batch
/// with zero surviving records returns [`Consensus::fallback`], the
/// documented neutral result, never a panic or a division by zero.
///
/// Pure apart from logging: no shared state, safe to call concurrently for
/// different batches.
pub fn aggregate(
    raw: &[RawObservation],
    prior: Option<PriorVote>,
    config: &AggregationConfig,
) -> Consensus {
    let observations: Vec<Observation> = raw.iter().filter_map(RawObservation::coerce).collect();
    let dropped = raw.len() - observations.len();
    if dropped > 0 {
        warn!(dropped, total = raw.len(), "Dropped malformed observations");
    }

    aggregate_observations(&observations, prior, config)
}

/// Aggregate already-validated observations. Same degenerate-batch guard as
/// [`aggregate`].
pub fn aggregate_observations(
    observations: &[Observation],
    prior: Option<PriorVote>,
    config: &AggregationConfig,
) -> Consensus {
    if observations.is_empty() {
        warn!("Degenerate batch: no valid observations, returning fallback consensus");
        return Consensus::fallback();
    }

    let hazards: Vec<HazardType> = observations.iter().map(|o| o.hazard).collect();
    let severities: Vec<i64> = observations.iter().map(|o| i64::from(o.severity)).collect();
    let confidences: Vec<i64> = observations.iter().map(|o| i64::from(o.confidence)).collect();
    let languages: Vec<String> = observations.iter().map(|o| o.language.clone()).collect();

    let hazard = combine_labels(
        &hazards,
        &confidences,
        Some(&severities),
        prior.map(|p| (p.hazard, p.weight)),
        Some(HazardType::Unknown),
    );
    let severity = combine_severity(&severities, &confidences, config.huber_k, config.mad_floor);
    let confidence = combine_confidence(
        &confidences,
        &severities,
        config.disagreement_norm,
        config.min_penalty_k,
    );
    let language = vote_language(&languages, &confidences);

    debug!(
        sources = observations.len(),
        %hazard,
        severity,
        confidence,
        language,
        "Consensus assembled"
    );

    Consensus {
        hazard,
        severity,
        confidence,
        language,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obs(hazard: HazardType, severity: i64, confidence: i64, language: &str) -> Observation {
        Observation::new(hazard, severity, confidence, language)
    }

    #[test]
    fn identical_observations_are_returned_unchanged() {
        let batch = vec![obs(HazardType::Storm, 70, 85, "en"); 4];
        let result = aggregate_observations(&batch, None, &AggregationConfig::default());
        assert_eq!(result.hazard, HazardType::Storm);
        assert_eq!(result.severity, 70);
        assert_eq!(result.confidence, 85);
        assert_eq!(result.language, "en");
    }

    #[test]
    fn empty_batch_returns_fallback() {
        let result = aggregate_observations(&[], None, &AggregationConfig::default());
        assert_eq!(result, Consensus::fallback());

        // Same guard applies after filtering drops everything.
        let all_malformed = vec![RawObservation::default(), RawObservation::default()];
        let result = aggregate(
            &all_malformed,
            Some(PriorVote { hazard: HazardType::Storm, weight: 80 }),
            &AggregationConfig::default(),
        );
        assert_eq!(result, Consensus::fallback());
    }

    #[test]
    fn malformed_records_are_dropped_not_partially_used() {
        let raw = vec![
            // Valid
            RawObservation {
                hazard: Some(json!(8)),
                severity: Some(json!(90)),
                confidence: Some(json!(80)),
                input_language: Some(json!("en")),
                notes: None,
            },
            // Missing language: the severity 10 must not influence the result
            RawObservation {
                hazard: Some(json!(8)),
                severity: Some(json!(10)),
                confidence: Some(json!(99)),
                input_language: None,
                notes: None,
            },
        ];
        let result = aggregate(&raw, None, &AggregationConfig::default());
        assert_eq!(result.hazard, HazardType::Tsunami);
        assert_eq!(result.severity, 90);
    }

    #[test]
    fn reporter_prior_can_flip_a_narrow_vote() {
        let batch = vec![
            obs(HazardType::Tide, 40, 25, "en"),
            obs(HazardType::Tide, 45, 25, "en"),
            obs(HazardType::Tide, 42, 25, "en"),
        ];
        let prior = PriorVote { hazard: HazardType::Flooding, weight: 80 };
        let result = aggregate_observations(&batch, Some(prior), &AggregationConfig::default());
        assert_eq!(result.hazard, HazardType::Flooding);

        // Without the prior the sources' own vote stands.
        let result = aggregate_observations(&batch, None, &AggregationConfig::default());
        assert_eq!(result.hazard, HazardType::Tide);
    }

    #[test]
    fn outlier_source_does_not_drag_severity() {
        let batch = vec![
            obs(HazardType::Waves, 50, 80, "en"),
            obs(HazardType::Waves, 50, 80, "en"),
            obs(HazardType::Waves, 50, 80, "en"),
            obs(HazardType::Waves, 99, 80, "en"),
        ];
        let cfg = AggregationConfig::default();
        let result = aggregate_observations(&batch, None, &cfg);
        // Winsorization window is median ± mad_floor here (weighted MAD is 0).
        assert!((40..=60).contains(&result.severity), "severity {}", result.severity);
    }

    #[test]
    fn disagreeing_sources_lower_confidence() {
        let agreeing = vec![
            obs(HazardType::Surge, 60, 90, "en"),
            obs(HazardType::Surge, 62, 90, "en"),
            obs(HazardType::Surge, 58, 90, "en"),
        ];
        let disagreeing = vec![
            obs(HazardType::Surge, 20, 90, "en"),
            obs(HazardType::Surge, 60, 90, "en"),
            obs(HazardType::Surge, 95, 90, "en"),
        ];
        let cfg = AggregationConfig::default();
        let high = aggregate_observations(&agreeing, None, &cfg).confidence;
        let low = aggregate_observations(&disagreeing, None, &cfg).confidence;
        assert!(high > low, "agreeing {high} should beat disagreeing {low}");
    }

    #[test]
    fn language_consensus_is_confidence_weighted() {
        let batch = vec![
            obs(HazardType::Flooding, 50, 30, "EN"),
            obs(HazardType::Flooding, 50, 30, "pt"),
            obs(HazardType::Flooding, 50, 90, "en"),
        ];
        let result = aggregate_observations(&batch, None, &AggregationConfig::default());
        assert_eq!(result.language, "en");
    }
}

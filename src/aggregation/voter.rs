//! Confidence-weighted plurality voting
//!
//! One generic voter covers both label domains: the closed hazard taxonomy
//! and the open, per-call set of observed language tags (remapped to dense
//! ids). The voter is duck-typed over any hashable, orderable label rather
//! than tied to an enum.
//!
//! ## Tie-breaking
//!
//! 1. Unique argmax wins outright.
//! 2. Tied with tie-break severities: rank tied candidates by mean
//!    confidence of their contributing votes, then by severity tightness
//!    (negative mean absolute deviation); top of the ranking wins.
//! 3. Tied without tie-break data: the smallest label by `Ord` wins. For
//!    hazards that is the lowest enum code; for language ids it is the
//!    first-seen tag. Stable and documented, if arbitrary.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::types::clamp_score;

/// Weight multiplier for votes on the weak ("unknown") label.
const WEAK_VOTE_FACTOR: f64 = 0.5;

/// Weight multiplier for a prior ballot on the weak label.
const WEAK_PRIOR_FACTOR: f64 = 0.3;

/// Confidence-weighted plurality over an arbitrary label domain.
///
/// Each vote contributes its clamped confidence as weight, halved when the
/// label equals `weak_label` ("I don't know" should rarely win outright).
/// An optional `prior` ballot of `(label, weight)` joins the tally with
/// weight `max(1, weight)`, discounted to 30% (floored at 1) when the prior
/// is for the weak label; a prior with weight 0 is ignored.
///
/// Precondition (fatal): `labels`/`confidences` non-empty and equal length;
/// `tie_break_severities`, when supplied, the same length again.
pub fn combine_labels<L>(
    labels: &[L],
    confidences: &[i64],
    tie_break_severities: Option<&[i64]>,
    prior: Option<(L, u32)>,
    weak_label: Option<L>,
) -> L
where
    L: Copy + Eq + Hash + Ord,
{
    assert!(
        !labels.is_empty() && labels.len() == confidences.len(),
        "combine_labels: labels/confidences must be non-empty and equal length"
    );
    if let Some(severities) = tie_break_severities {
        assert!(
            severities.len() == labels.len(),
            "combine_labels: tie_break_severities must match labels in length"
        );
    }

    let mut tally: HashMap<L, f64> = HashMap::new();
    for (&label, &confidence) in labels.iter().zip(confidences.iter()) {
        let factor = if weak_label == Some(label) { WEAK_VOTE_FACTOR } else { 1.0 };
        *tally.entry(label).or_insert(0.0) += factor * f64::from(clamp_score(confidence));
    }

    if let Some((prior_label, prior_weight)) = prior {
        if prior_weight > 0 {
            let mut ballot = f64::from(prior_weight.max(1));
            if weak_label == Some(prior_label) {
                ballot = (ballot * WEAK_PRIOR_FACTOR).floor().max(1.0);
            }
            *tally.entry(prior_label).or_insert(0.0) += ballot;
        }
    }

    let top_weight = tally.values().fold(f64::MIN, |a, &b| a.max(b));
    let mut candidates: Vec<L> = tally
        .iter()
        .filter(|(_, &weight)| weight == top_weight)
        .map(|(&label, _)| label)
        .collect();
    candidates.sort_unstable();
    debug!(candidates = candidates.len(), top_weight, "plurality tally complete");

    if candidates.len() == 1 {
        return candidates[0];
    }
    let Some(severities) = tie_break_severities else {
        // Documented stable rule: smallest label wins an unresolved tie.
        return candidates[0];
    };

    // Rank tied candidates by (mean confidence, severity tightness), both
    // over their contributing non-prior votes. Iterating in sorted order and
    // requiring a strictly better key keeps the result deterministic.
    let mut best = candidates[0];
    let mut best_key = (f64::MIN, f64::MIN);
    for &candidate in &candidates {
        let indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == candidate)
            .map(|(i, _)| i)
            .collect();

        let (avg_conf, tightness) = if indices.is_empty() {
            // Prior-only candidate: no contributing votes to judge it by.
            (0.0, f64::NEG_INFINITY)
        } else {
            let n = indices.len() as f64;
            let avg_conf = indices.iter().map(|&i| confidences[i] as f64).sum::<f64>() / n;
            let mean_sev = indices.iter().map(|&i| severities[i] as f64).sum::<f64>() / n;
            let spread = indices
                .iter()
                .map(|&i| (severities[i] as f64 - mean_sev).abs())
                .sum::<f64>()
                / n;
            (avg_conf, -spread)
        };

        if (avg_conf, tightness) > best_key {
            best_key = (avg_conf, tightness);
            best = candidate;
        }
    }
    best
}

/// Language consensus: case-normalize tags, map them to dense per-call ids,
/// run the same plurality vote, and map the winner back.
///
/// The id mapping lives and dies inside this call; nothing is shared or
/// persisted across batches. No weak label: the unknown-downweighting
/// asymmetry belongs to the hazard taxonomy, not to arbitrary tags.
///
/// Precondition (fatal): non-empty, equal-length inputs.
pub fn vote_language(languages: &[String], confidences: &[i64]) -> String {
    assert!(
        !languages.is_empty() && languages.len() == confidences.len(),
        "vote_language: languages/confidences must be non-empty and equal length"
    );

    let mut tag_to_id: HashMap<String, usize> = HashMap::new();
    let mut id_to_tag: Vec<String> = Vec::new();
    let ids: Vec<usize> = languages
        .iter()
        .map(|tag| {
            let normalized = tag.trim().to_lowercase();
            *tag_to_id.entry(normalized.clone()).or_insert_with(|| {
                id_to_tag.push(normalized);
                id_to_tag.len() - 1
            })
        })
        .collect();

    let winner = combine_labels(&ids, confidences, None, None, None);
    id_to_tag[winner].clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HazardType;

    fn vote_hazards(
        labels: &[HazardType],
        confidences: &[i64],
        tie_break: Option<&[i64]>,
        prior: Option<(HazardType, u32)>,
    ) -> HazardType {
        combine_labels(labels, confidences, tie_break, prior, Some(HazardType::Unknown))
    }

    #[test]
    fn plurality_follows_confidence_weight() {
        use HazardType::{Flooding, Storm};
        let winner = vote_hazards(&[Flooding, Storm, Storm], &[95, 40, 40], None, None);
        // 95 > 40 + 40 is false; Storm's 80 < Flooding's 95.
        assert_eq!(winner, Flooding);
    }

    #[test]
    fn unknown_votes_count_at_half_strength() {
        use HazardType::{Tsunami, Unknown};
        // Two UNKNOWN at 60 tally 60 total; one Tsunami at 100 tallies 100.
        let winner = vote_hazards(&[Unknown, Unknown, Tsunami], &[60, 60, 100], None, None);
        assert_eq!(winner, Tsunami);
    }

    #[test]
    fn unresolved_tie_returns_smallest_label() {
        use HazardType::{Storm, Tide};
        let winner = vote_hazards(&[Tide, Storm], &[80, 80], None, None);
        assert_eq!(winner, Tide);
    }

    #[test]
    fn tie_break_prefers_higher_mean_confidence() {
        use HazardType::{Storm, Tide};
        // Equal totals: Tide 60+20 = 80, Storm 80. Tide's mean confidence is
        // 40, Storm's is 80, so Storm takes the tie.
        let winner = vote_hazards(
            &[Tide, Tide, Storm],
            &[60, 20, 80],
            Some(&[50, 50, 50]),
            None,
        );
        assert_eq!(winner, Storm);
    }

    #[test]
    fn tie_break_prefers_tighter_severity_spread() {
        use HazardType::{Storm, Tide};
        // Equal totals and equal mean confidence; Tide's severities are
        // spread (20/80), Storm's are tight (50/50), so Storm wins.
        let winner = vote_hazards(
            &[Tide, Tide, Storm, Storm],
            &[70, 70, 70, 70],
            Some(&[20, 80, 50, 50]),
            None,
        );
        assert_eq!(winner, Storm);
    }

    #[test]
    fn prior_vote_can_flip_the_outcome() {
        use HazardType::{Flooding, Tide};
        // Three sources narrowly favor Tide (total 75); reporter prior of 80
        // for Flooding outweighs them.
        let winner = vote_hazards(
            &[Tide, Tide, Tide],
            &[25, 25, 25],
            Some(&[50, 50, 50]),
            Some((Flooding, 80)),
        );
        assert_eq!(winner, Flooding);
    }

    #[test]
    fn unknown_prior_is_heavily_discounted() {
        use HazardType::{Tide, Unknown};
        // Prior of 80 for Unknown becomes floor(80 * 0.3) = 24, losing to a
        // single Tide vote at 30.
        let winner = vote_hazards(&[Tide], &[30], None, Some((Unknown, 80)));
        assert_eq!(winner, Tide);
    }

    #[test]
    fn zero_weight_prior_is_ignored() {
        use HazardType::{Storm, Tide};
        let winner = vote_hazards(&[Tide], &[50], None, Some((Storm, 0)));
        assert_eq!(winner, Tide);
    }

    #[test]
    fn language_vote_is_case_insensitive() {
        let languages = vec!["EN".to_string(), "en".to_string(), "fr".to_string()];
        assert_eq!(vote_language(&languages, &[40, 40, 70]), "en");
    }

    #[test]
    fn language_vote_follows_confidence() {
        let languages = vec!["en".to_string(), "fr".to_string()];
        assert_eq!(vote_language(&languages, &[30, 90]), "fr");
    }

    #[test]
    fn language_tie_goes_to_first_seen_tag() {
        let languages = vec!["pt".to_string(), "es".to_string()];
        assert_eq!(vote_language(&languages, &[50, 50]), "pt");
    }

    #[test]
    #[should_panic(expected = "must match labels")]
    fn mismatched_tie_break_is_a_contract_violation() {
        combine_labels(&[1usize, 2], &[50, 50], Some(&[10]), None, None);
    }
}

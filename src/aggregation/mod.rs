//! Robust multi-source aggregation engine
//!
//! Turns a batch of heterogeneous, partially-unreliable observations into a
//! single (hazard, severity, confidence, language) consensus. Three
//! independent aggregators compose into one pipeline:
//!
//! - `robust`: confidence-weighted, winsorized severity combination
//! - `confidence`: mean confidence discounted by raw severity disagreement
//! - `voter`: generic confidence-weighted plurality with prior ballots and
//!   deterministic tie-breaks (reused for hazard type and language)
//! - `consensus`: the orchestrator that filters, sequences, and assembles
//!
//! Everything here is synchronous and pure: no I/O, no locks, no shared
//! state between calls. Malformed input is dropped or clamped per the
//! leniency policy; only mismatched-length misuse by a caller panics.

pub mod confidence;
pub mod consensus;
pub mod robust;
pub mod voter;

pub use confidence::{combine_confidence, DEFAULT_DISAGREEMENT_NORM, DEFAULT_MIN_PENALTY_K};
pub use consensus::{aggregate, aggregate_observations};
pub use robust::{combine_severity, weighted_median, DEFAULT_HUBER_K, DEFAULT_MAD_FLOOR};
pub use voter::{combine_labels, vote_language};

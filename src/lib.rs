//! Tidewatch: Ocean Hazard Report Consensus
//!
//! Robust multi-source aggregation for user-reported ocean disasters.
//! Several independent, noisy, possibly-adversarial classification sources
//! judge the same report; this crate reduces their observations, plus the
//! reporter's own self-declared category as a weighted prior, into one
//! trustworthy (hazard, severity, confidence, language) consensus.
//!
//! ## Architecture
//!
//! - **Aggregation Engine**: pure, synchronous robust statistics (weighted
//!   median, MAD, Huber winsorization) and confidence-weighted voting
//! - **Sources**: the I/O boundary. Concurrent fan-out to classification
//!   backends, each failure surfaced as a typed per-source outcome
//! - **Config**: TOML-tunable aggregation constants and source settings,
//!   always passed explicitly (no process-wide state)

pub mod aggregation;
pub mod config;
pub mod sources;
pub mod types;

// Re-export configuration
pub use config::{AggregationConfig, SourcesConfig, TidewatchConfig};

// Re-export commonly used types
pub use types::{Consensus, HazardType, Observation, PriorVote, RawObservation, ReportInput};

// Re-export the engine entry points
pub use aggregation::{
    aggregate, aggregate_observations, combine_confidence, combine_labels, combine_severity,
    vote_language, weighted_median,
};

// Re-export the collector boundary
pub use sources::{
    collect_observations, ObservationSource, OpenRouterSource, SourceError, SourceOutcome,
};

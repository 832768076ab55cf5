//! Classification source boundary
//!
//! The aggregation engine never performs I/O; this module owns the boundary
//! to the external classification backends. Each backend implements
//! [`ObservationSource`], and [`collect_observations`] fans one report out
//! to every configured source concurrently.
//!
//! A failed source yields a typed [`SourceError`] outcome rather than being
//! swallowed, so callers can tell "source declined to answer" apart from
//! "no sources configured". Failures never abort the batch.

pub mod openrouter;

pub use openrouter::OpenRouterSource;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{RawObservation, ReportInput};

/// Errors a classification source can produce for one report.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure reaching the backend
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered, but the payload was not a classification object
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Backend answered with no content at all
    #[error("empty response")]
    EmptyResponse,

    /// Source cannot run because its credentials are missing
    #[error("missing API key (set {0})")]
    MissingApiKey(&'static str),
}

/// One independent classification backend.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Source name for logging and audit (e.g., the model slug).
    fn name(&self) -> &str;

    /// Classify one report, producing a single raw observation.
    async fn classify(&self, report: &ReportInput) -> Result<RawObservation, SourceError>;
}

/// Per-source result of one fan-out round.
#[derive(Debug)]
pub struct SourceOutcome {
    /// Name of the source that produced this outcome
    pub source: String,
    /// The observation, or why this source failed
    pub result: Result<RawObservation, SourceError>,
}

/// Query every source with the same report, concurrently.
///
/// Completion order is undefined; outcomes are returned in source order.
/// Failures are logged and carried as outcomes, never propagated.
pub async fn collect_observations(
    sources: &[Box<dyn ObservationSource>],
    report: &ReportInput,
) -> Vec<SourceOutcome> {
    let futures = sources.iter().map(|source| async {
        let result = source.classify(report).await;
        SourceOutcome {
            source: source.name().to_string(),
            result,
        }
    });

    let outcomes = join_all(futures).await;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(_) => debug!(source = %outcome.source, "Source produced an observation"),
            Err(e) => warn!(source = %outcome.source, error = %e, "Source failed"),
        }
    }
    outcomes
}

/// Extract the surviving observations from a fan-out round, dropping
/// failed sources.
pub fn surviving(outcomes: Vec<SourceOutcome>) -> Vec<RawObservation> {
    outcomes
        .into_iter()
        .filter_map(|outcome| outcome.result.ok())
        .collect()
}

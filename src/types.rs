//! Shared data structures for hazard report consensus
//!
//! This module defines the core types for the aggregation pipeline:
//! the closed hazard taxonomy, per-source observations (both the loose
//! wire shape and the validated form), the reporter's prior vote, and
//! the final consensus tuple.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Hazard taxonomy
// ============================================================================

/// Closed 10-value hazard taxonomy shared by every classification source
/// and the reporter's own submission. Serialized as its integer code.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum HazardType {
    #[default]
    Unknown = 0,
    Tide = 1,
    CoastalDamage = 2,
    Flooding = 3,
    Waves = 4,
    Swell = 5,
    Surge = 6,
    Storm = 7,
    Tsunami = 8,
    Other = 9,
}

impl HazardType {
    /// Map an integer code to its hazard. Codes outside 0-9 are rejected,
    /// not coerced: the taxonomy is closed.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Tide),
            2 => Some(Self::CoastalDamage),
            3 => Some(Self::Flooding),
            4 => Some(Self::Waves),
            5 => Some(Self::Swell),
            6 => Some(Self::Surge),
            7 => Some(Self::Storm),
            8 => Some(Self::Tsunami),
            9 => Some(Self::Other),
            _ => None,
        }
    }

    /// Integer code used on the wire and in vote tallies.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for HazardType {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("hazard code out of range: {code}"))
    }
}

impl From<HazardType> for i64 {
    fn from(hazard: HazardType) -> Self {
        Self::from(hazard.code())
    }
}

impl std::fmt::Display for HazardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Tide => write!(f, "TIDE"),
            Self::CoastalDamage => write!(f, "COASTAL_DAMAGE"),
            Self::Flooding => write!(f, "FLOODING"),
            Self::Waves => write!(f, "WAVES"),
            Self::Swell => write!(f, "SWELL"),
            Self::Surge => write!(f, "SURGE"),
            Self::Storm => write!(f, "STORM"),
            Self::Tsunami => write!(f, "TSUNAMI"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

// ============================================================================
// Observations
// ============================================================================

/// Clamp a severity or confidence value into the 1-100 scale.
///
/// Out-of-range numeric input is coerced, never rejected (leniency policy:
/// a source that says 0 or 250 still gets a vote, just a bounded one).
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(1, 100) as u8
}

/// One classification source's raw judgment as it arrives off the wire.
///
/// Every field is optional and loosely typed. Sources are noisy and
/// occasionally adversarial; validation happens in [`RawObservation::coerce`],
/// which drops the whole record if any required field is missing or
/// uncoercible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawObservation {
    /// Hazard code, 0-9
    #[serde(rename = "type", default)]
    pub hazard: Option<Value>,
    /// Severity, nominally 1-100
    #[serde(default)]
    pub severity: Option<Value>,
    /// Confidence, nominally 1-100
    #[serde(default)]
    pub confidence: Option<Value>,
    /// Detected language of the report text (ISO 639-1)
    #[serde(default)]
    pub input_language: Option<Value>,
    /// Free-form source notes; carried for audit, ignored by aggregation
    #[serde(default)]
    pub notes: Option<String>,
}

/// Best-effort integer coercion: accepts integers, finite floats (rounded),
/// and numeric strings.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    }
}

/// String coercion for the language tag: non-empty strings only.
fn coerce_language(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

impl RawObservation {
    /// Validate and coerce into an [`Observation`].
    ///
    /// Returns `None` (drop the whole record, never partial use) when any of
    /// the four required fields is missing or uncoercible, or when the hazard
    /// code falls outside the closed taxonomy. Severity and confidence are
    /// clamped into [1,100] rather than rejected.
    pub fn coerce(&self) -> Option<Observation> {
        let hazard = HazardType::from_code(coerce_int(self.hazard.as_ref()?)?)?;
        let severity = clamp_score(coerce_int(self.severity.as_ref()?)?);
        let confidence = clamp_score(coerce_int(self.confidence.as_ref()?)?);
        let language = coerce_language(self.input_language.as_ref()?)?;
        Some(Observation {
            hazard,
            severity,
            confidence,
            language,
        })
    }
}

/// One source's validated judgment about one report.
///
/// Immutable once constructed; severity and confidence are already clamped
/// into [1,100]. Observations are consumed by one aggregation call and
/// never persisted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Observation {
    pub hazard: HazardType,
    /// Severity on the 1-100 scale
    pub severity: u8,
    /// Source self-assessed confidence on the 1-100 scale
    pub confidence: u8,
    /// Detected report language (free text, case-insensitive)
    pub language: String,
}

impl Observation {
    /// Build an observation from unclamped inputs.
    pub fn new(hazard: HazardType, severity: i64, confidence: i64, language: &str) -> Self {
        Self {
            hazard,
            severity: clamp_score(severity),
            confidence: clamp_score(confidence),
            language: language.to_string(),
        }
    }
}

// ============================================================================
// Prior vote & consensus
// ============================================================================

/// The reporter's self-declared hazard category, cast as an extra weighted
/// ballot rather than an equal peer vote.
///
/// A prior for [`HazardType::Unknown`] is discounted to 30% of its weight
/// before tallying: "I don't know" is a weak signal regardless of who says it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorVote {
    pub hazard: HazardType,
    /// Ballot weight on the same notional scale as source confidences
    pub weight: u32,
}

/// Language tag reported when no valid observation carried one
/// (ISO 639-3 "undetermined").
pub const LANGUAGE_UNDETERMINED: &str = "und";

/// Neutral floor for severity and confidence when a batch yields nothing.
pub const DEGENERATE_FLOOR: u8 = 1;

/// The engine's single aggregated output for one report batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Consensus {
    pub hazard: HazardType,
    /// Consensus severity in [1,100]
    pub severity: u8,
    /// Trust in the combined judgment, in [1,100]
    pub confidence: u8,
    /// Winning language tag (lowercased)
    pub language: String,
}

impl Consensus {
    /// Documented fallback for a degenerate batch (zero valid observations):
    /// nothing was learned, so report Unknown at the neutral floor with an
    /// undetermined language. Never panics, never divides by zero.
    pub fn fallback() -> Self {
        Self {
            hazard: HazardType::Unknown,
            severity: DEGENERATE_FLOOR,
            confidence: DEGENERATE_FLOOR,
            language: LANGUAGE_UNDETERMINED.to_string(),
        }
    }
}

// ============================================================================
// Collector input
// ============================================================================

/// The report handed to every classification source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInput {
    /// Hazard category the reporter selected themselves
    pub reporter_hazard: HazardType,
    /// Free-text description of what the reporter saw
    pub description: String,
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key/value bag attached to a point or row.
///
/// The schema is caller-defined and varies per collection, so payloads are
/// an ordered map of scalar variants rather than a typed struct.
pub type Payload = IndexMap<String, PayloadValue>;

/// Scalar values a payload field can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl PayloadValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PayloadValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::String(value.to_string())
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        PayloadValue::Number(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Number(value as f64)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

/// Identifier of a stored point / row candidate.
///
/// Comparable and totally ordered so downstream ranking can break ties
/// deterministically. Integer ids order numerically and sort before
/// string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateId {
    Int(i64),
    Str(String),
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateId::Int(n) => write!(f, "{n}"),
            CandidateId::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for CandidateId {
    fn from(value: i64) -> Self {
        CandidateId::Int(value)
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        CandidateId::Str(value.to_string())
    }
}

/// A single nearest-neighbor hit returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointHit {
    /// Identifier of the matched point
    pub id: CandidateId,

    /// Raw similarity score from the backend (higher is better). Only
    /// comparable within one result list.
    pub score: f32,

    /// Payload carried through unchanged
    pub payload: Payload,
}

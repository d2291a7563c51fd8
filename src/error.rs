//! Error types for the allophone graph engine and its file formats.
//!
//! Two failure classes are kept apart:
//! - `EngineError`: an internal invariant was violated. The input dataset or
//!   the engine itself is buggy and the run stops without a result.
//! - `DatasetError`: a file handed to the serialization layer could not be
//!   read or does not contain score data.
//!
//! A pair of phones with no connecting path is neither: it is simply absent
//! from the result map.

use thiserror::Error;

use crate::types::Phone;

/// Result type alias for engine computations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for dataset and configuration I/O.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Internal consistency violations detected while computing scores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// `allophone` is listed under `phone` but not the other way around.
    #[error("asymmetric inventory `{language}`: {allophone:?} is an allophone of {phone:?} but not vice versa")]
    AsymmetricInventory {
        language: String,
        phone: Phone,
        allophone: Phone,
    },

    /// A phone's allophone set does not contain the phone itself.
    #[error("inventory `{language}`: {phone:?} is missing from its own allophone set")]
    MissingSelfAllophone { language: String, phone: Phone },

    /// Self-allophone count and language count disagree for a phone.
    #[error("counter mismatch for {phone:?}: {allophones} self-allophone languages vs {cooccurrences} languages")]
    CounterMismatch {
        phone: Phone,
        allophones: u32,
        cooccurrences: u32,
    },

    /// A derived edge weight left the unit interval.
    #[error("edge weight {weight} for ({first:?}, {second:?}) is outside [0, 1]")]
    WeightOutOfRange {
        first: Phone,
        second: Phone,
        weight: f64,
    },

    /// A graph node has no incident edge.
    #[error("phone {0:?} has no incident edge")]
    IsolatedNode(Phone),

    /// An edge connects a phone to itself.
    #[error("self-loop on phone {0:?}")]
    SelfLoop(Phone),

    /// Normalizing distances needs at least one positive distance.
    #[error("cannot normalize distances: no positive distance (maximum is {max})")]
    NoPositiveDistance { max: f64 },
}

/// Failures reading or writing score data, inventories and configuration.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The file does not hold the expected rows.
    #[error("malformed dataset at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// Invalid argument to a formatting helper.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DatasetError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

//! Crate-level error types.

use thiserror::Error;

/// Fatal errors surfaced to the caller. Everything that happens once
/// stage 1 (graph construction) begins is contained inside its own
/// detector and never reaches this type — see [`crate::detectors::PartialReason`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MuleDetectionError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("unparseable timestamp in record {record_index}: {value}")]
    InvalidTimestamp { record_index: usize, value: String },

    #[error("non-numeric amount in record {record_index}: {value}")]
    InvalidAmount { record_index: usize, value: String },
}

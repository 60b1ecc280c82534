//! Error types shared across the comparison pipeline.
//!
//! Validation errors are raised when a data entity is constructed with
//! values that break its invariants. Provider errors come from the read and
//! region sources. `CompareError` is what a comparison run returns.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::GenomicPos;

/// Invariant violations raised while constructing data entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity}: end {end} is before start {start}")]
    NegativeLength {
        entity: &'static str,
        start: GenomicPos,
        end: GenomicPos,
    },

    #[error("edit distance is negative: {0}")]
    NegativeDistance(i64),

    #[error("compared length is negative: {0}")]
    NegativeComparedLength(i64),

    #[error("region {gene} on {chromosome}: sequence has {actual} bases but window spans {expected}")]
    SequenceLengthMismatch {
        chromosome: String,
        gene: String,
        expected: usize,
        actual: usize,
    },

    #[error("region {region} does not belong to feature {feature}")]
    RegionMismatch { region: String, feature: String },

    #[error("invalid repeat motif '{pattern}': {message}")]
    InvalidMotif { pattern: String, message: String },

    #[error("feature {gene} on {chromosome} carries no repeat motif")]
    MissingMotif { chromosome: String, gene: String },
}

/// Errors raised by read and region providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        file: String,
        line: usize,
        message: String,
    },

    #[error("Invalid alignment record {record} in {file}: {message}")]
    Record {
        file: String,
        record: usize,
        message: String,
    },

    #[error("Unsupported input file: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),
}

impl ProviderError {
    pub fn parse<S: Into<String>>(file: S, line: usize, message: S) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// `record` counts alignment records from 1, header excluded.
    pub fn record<S: Into<String>>(file: S, record: usize, message: S) -> Self {
        Self::Record {
            file: file.into(),
            record,
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Run-level failure of a comparison.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Input provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Worker task interrupted: {0}")]
    Interrupted(String),

    #[error("Worker pool unavailable: {0}")]
    Pool(String),
}

impl From<rayon::ThreadPoolBuildError> for CompareError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::Pool(err.to_string())
    }
}

pub type CompareResult<T> = Result<T, CompareError>;

//! Outcomes of comparing one region pair.

use serde::{Deserialize, Serialize};

use crate::align::{similarity_percent, PairwiseAlignment};
use crate::error::ValidationError;
use crate::types::{Feature, GenomicPos};

/// Which comparator produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorKind {
    EditDistance,
    RepeatCount,
}

/// Edit distance over the columns both regions know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditDistanceResult {
    chromosome: String,
    gene: String,
    window: Option<(GenomicPos, GenomicPos)>,
    distance: u64,
    /// Length of the shorter compared sequence; the similarity denominator.
    compared_len: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alignment: Option<PairwiseAlignment>,
}

impl EditDistanceResult {
    pub fn new<S: Into<String>>(
        chromosome: S,
        gene: S,
        distance: i64,
        compared_len: i64,
    ) -> Result<Self, ValidationError> {
        if distance < 0 {
            return Err(ValidationError::NegativeDistance(distance));
        }
        if compared_len < 0 {
            return Err(ValidationError::NegativeComparedLength(compared_len));
        }
        Ok(Self {
            chromosome: chromosome.into(),
            gene: gene.into(),
            window: None,
            distance: distance as u64,
            compared_len: compared_len as u64,
            alignment: None,
        })
    }

    pub fn with_window(mut self, start: GenomicPos, end: GenomicPos) -> Self {
        self.window = Some((start, end));
        self
    }

    pub fn with_alignment(mut self, alignment: PairwiseAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn window(&self) -> Option<(GenomicPos, GenomicPos)> {
        self.window
    }

    pub fn distance(&self) -> u64 {
        self.distance
    }

    pub fn compared_len(&self) -> u64 {
        self.compared_len
    }

    pub fn alignment(&self) -> Option<&PairwiseAlignment> {
        self.alignment.as_ref()
    }

    /// `None` when only unknown nucleotides were compared.
    pub fn similarity(&self) -> Option<f64> {
        similarity_percent(self.distance, self.compared_len)
    }

    pub fn is_unknown_only(&self) -> bool {
        self.compared_len == 0
    }
}

/// Repeat counts of an STR marker in both samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatCountResult {
    feature: Feature,
    count_a: usize,
    count_b: usize,
}

impl RepeatCountResult {
    pub fn new(feature: Feature, count_a: usize, count_b: usize) -> Self {
        Self {
            feature,
            count_a,
            count_b,
        }
    }

    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    pub fn count_a(&self) -> usize {
        self.count_a
    }

    pub fn count_b(&self) -> usize {
        self.count_b
    }

    pub fn counts_match(&self) -> bool {
        self.count_a == self.count_b
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonResult {
    EditDistance(EditDistanceResult),
    RepeatCount(RepeatCountResult),
}

impl ComparisonResult {
    pub fn kind(&self) -> ComparatorKind {
        match self {
            Self::EditDistance(_) => ComparatorKind::EditDistance,
            Self::RepeatCount(_) => ComparatorKind::RepeatCount,
        }
    }

    pub fn gene(&self) -> &str {
        match self {
            Self::EditDistance(r) => r.gene(),
            Self::RepeatCount(r) => r.feature().gene(),
        }
    }

    pub fn chromosome(&self) -> &str {
        match self {
            Self::EditDistance(r) => r.chromosome(),
            Self::RepeatCount(r) => r.feature().chromosome(),
        }
    }

    pub fn as_edit_distance(&self) -> Option<&EditDistanceResult> {
        match self {
            Self::EditDistance(r) => Some(r),
            Self::RepeatCount(_) => None,
        }
    }

    pub fn as_repeat_count(&self) -> Option<&RepeatCountResult> {
        match self {
            Self::RepeatCount(r) => Some(r),
            Self::EditDistance(_) => None,
        }
    }
}

impl From<EditDistanceResult> for ComparisonResult {
    fn from(result: EditDistanceResult) -> Self {
        Self::EditDistance(result)
    }
}

impl From<RepeatCountResult> for ComparisonResult {
    fn from(result: RepeatCountResult) -> Self {
        Self::RepeatCount(result)
    }
}

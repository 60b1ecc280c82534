//! Region comparators.
//!
//! Non-marker features are compared by edit distance over the columns both
//! regions know: a position UNKNOWN in either sample is left out of both. STR markers are compared by counting their repeat motif
//! in each region independently.

use crate::align::{edit_distance, EditTable};
use crate::error::ValidationError;
use crate::result::{ComparatorKind, ComparisonResult, EditDistanceResult, RepeatCountResult};
use crate::types::{Feature, GenomeRegion};

pub trait RegionComparator: Send + Sync {
    fn compare(
        &self,
        first: &GenomeRegion,
        second: &GenomeRegion,
        feature: &Feature,
    ) -> Result<ComparisonResult, ValidationError>;

    fn kind(&self) -> ComparatorKind;
}

fn check_region(region: &GenomeRegion, feature: &Feature) -> Result<(), ValidationError> {
    if region.belongs_to(feature) {
        Ok(())
    } else {
        Err(ValidationError::RegionMismatch {
            region: region.to_string(),
            feature: feature.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistanceComparator {
    traceback: bool,
}

impl EditDistanceComparator {
    pub fn new(traceback: bool) -> Self {
        Self { traceback }
    }
}

impl RegionComparator for EditDistanceComparator {
    fn compare(
        &self,
        first: &GenomeRegion,
        second: &GenomeRegion,
        feature: &Feature,
    ) -> Result<ComparisonResult, ValidationError> {
        check_region(first, feature)?;
        check_region(second, feature)?;

        let (a, b) = first.known_columns(second);
        let compared_len = a.len().min(b.len());

        let (distance, alignment) = if self.traceback {
            let table = EditTable::build(&a, &b);
            (table.distance(), Some(table.traceback(&a, &b)))
        } else {
            (edit_distance(&a, &b), None)
        };

        let mut result = EditDistanceResult::new(
            first.chromosome(),
            first.gene(),
            distance as i64,
            compared_len as i64,
        )?
        .with_window(first.start(), first.end());
        if let Some(alignment) = alignment {
            result = result.with_alignment(alignment);
        }
        Ok(result.into())
    }

    fn kind(&self) -> ComparatorKind {
        ComparatorKind::EditDistance
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RepeatCountComparator;

impl RegionComparator for RepeatCountComparator {
    fn compare(
        &self,
        first: &GenomeRegion,
        second: &GenomeRegion,
        feature: &Feature,
    ) -> Result<ComparisonResult, ValidationError> {
        check_region(first, feature)?;
        check_region(second, feature)?;

        let motif = feature.motif().ok_or_else(|| ValidationError::MissingMotif {
            chromosome: feature.chromosome().to_string(),
            gene: feature.gene().to_string(),
        })?;

        let count_a = motif.count_in(first.sequence());
        let count_b = motif.count_in(second.sequence());
        Ok(RepeatCountResult::new(feature.clone(), count_a, count_b).into())
    }

    fn kind(&self) -> ComparatorKind {
        ComparatorKind::RepeatCount
    }
}

/// Picks the comparator a feature calls for.
pub fn comparator_for(feature: &Feature, traceback: bool) -> Box<dyn RegionComparator> {
    if feature.is_marker() {
        Box::new(RepeatCountComparator)
    } else {
        Box::new(EditDistanceComparator::new(traceback))
    }
}

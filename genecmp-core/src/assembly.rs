//! Reconstructs a sample's sequence over a feature window.

use crate::error::{CompareResult, ValidationError};
use crate::index::IntervalIndex;
use crate::io::ReadSource;
use crate::types::{Feature, GenomeRegion, GenomicPos, UNKNOWN_NUCLEOTIDE};

/// Assembles `[start, end)` from the index.
///
/// Each position takes its base from the covering read with the lowest
/// start (earliest inserted on ties); uncovered positions become
/// [`UNKNOWN_NUCLEOTIDE`].
pub fn assemble_window(
    index: &IntervalIndex,
    feature: &Feature,
    start: GenomicPos,
    end: GenomicPos,
) -> Result<GenomeRegion, ValidationError> {
    let sequence: Vec<u8> = (start..end)
        .map(|pos| {
            index
                .first_covering(pos)
                .and_then(|read| read.base_at(pos))
                .unwrap_or(UNKNOWN_NUCLEOTIDE)
        })
        .collect();
    GenomeRegion::new(feature.chromosome(), feature.gene(), start, end, sequence)
}

/// Assembles the whole feature window.
pub fn assemble(index: &IntervalIndex, feature: &Feature) -> Result<GenomeRegion, ValidationError> {
    assemble_window(index, feature, feature.start(), feature.end())
}

/// Consecutive sub-windows of at most `max_len` positions covering
/// `[start, end)`. An empty window yields itself.
pub fn split_window(start: GenomicPos, end: GenomicPos, max_len: Option<usize>) -> Vec<(GenomicPos, GenomicPos)> {
    let step = match max_len {
        Some(len) if len > 0 && end > start => len as GenomicPos,
        _ => return vec![(start, end)],
    };
    let mut windows = Vec::with_capacity(((end - start) / step + 1) as usize);
    let mut lo = start;
    while lo < end {
        let hi = (lo + step).min(end);
        windows.push((lo, hi));
        lo = hi;
    }
    windows
}

/// Builds the regions of one sample for one feature.
pub struct RegionAssembler<'a> {
    source: &'a dyn ReadSource,
    max_region_len: Option<usize>,
}

impl<'a> RegionAssembler<'a> {
    pub fn new(source: &'a dyn ReadSource, max_region_len: Option<usize>) -> Self {
        Self {
            source,
            max_region_len,
        }
    }

    /// Returns no regions when the sample lacks the feature's chromosome.
    pub fn assemble_feature(&self, feature: &Feature) -> CompareResult<Vec<GenomeRegion>> {
        if !self.source.has_chromosome(feature.chromosome()) {
            log::debug!(
                "Sample '{}' has no {}; nothing assembled for {}",
                self.source.name(),
                feature.chromosome(),
                feature
            );
            return Ok(Vec::new());
        }

        let reads = self
            .source
            .reads_overlapping(feature.chromosome(), feature.start(), feature.end())?;
        let index = IntervalIndex::from_reads(reads);
        log::trace!(
            "Sample '{}': {} reads indexed for {}",
            self.source.name(),
            index.len(),
            feature
        );

        let regions = split_window(feature.start(), feature.end(), self.max_region_len)
            .into_iter()
            .map(|(start, end)| assemble_window(&index, feature, start, end))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(regions)
    }
}

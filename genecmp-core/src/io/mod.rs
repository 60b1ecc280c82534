//! Read and region providers.
//!
//! The pipeline consumes samples through [`ReadSource`] and regions of
//! interest through [`FeatureSource`]. File-backed implementations for
//! SAM/BAM samples and BED-like region files live in the submodules.

pub mod bed;
pub mod sam;

pub use bed::BedReader;
pub use sam::SamReader;

use flate2::read::MultiGzDecoder;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ProviderError, ProviderResult};
use crate::types::{AlignedRead, FeatureMap, GenomicPos};

/// Aligned reads of one sample.
pub trait ReadSource: Send + Sync {
    /// Reads intersecting the half-open window `[start, end)`.
    fn reads_overlapping(
        &self,
        chromosome: &str,
        start: GenomicPos,
        end: GenomicPos,
    ) -> ProviderResult<Vec<AlignedRead>>;

    /// Whether the sample carries the chromosome at all.
    fn has_chromosome(&self, chromosome: &str) -> bool;

    fn name(&self) -> &str;
}

/// Regions of interest grouped by gene.
pub trait FeatureSource {
    fn features_by_gene(&self) -> ProviderResult<FeatureMap>;
}

impl FeatureSource for FeatureMap {
    fn features_by_gene(&self) -> ProviderResult<FeatureMap> {
        Ok(self.clone())
    }
}

#[derive(Debug, Default)]
struct ChromosomeReads {
    // Sorted by start.
    reads: Vec<AlignedRead>,
    max_span: GenomicPos,
}

/// Reads held in memory, per chromosome, sorted by start.
#[derive(Debug, Default)]
pub struct InMemoryReadSource {
    name: String,
    chromosomes: HashMap<String, ChromosomeReads>,
    declared: HashSet<String>,
}

impl InMemoryReadSource {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_reads<S, I>(name: S, reads: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = AlignedRead>,
    {
        let mut source = Self::new(name);
        for read in reads {
            source.add_read(read);
        }
        source
    }

    /// Registers a chromosome even if no read lands on it.
    pub fn declare_chromosome<S: Into<String>>(&mut self, chromosome: S) {
        self.declared.insert(chromosome.into());
    }

    /// Coordinate-sorted input appends in constant time.
    pub fn add_read(&mut self, read: AlignedRead) {
        let entry = self
            .chromosomes
            .entry(read.chromosome().to_string())
            .or_default();
        entry.max_span = entry.max_span.max(read.end() - read.start());
        let at = entry.reads.partition_point(|r| r.start() <= read.start());
        entry.reads.insert(at, read);
    }

    pub fn read_count(&self) -> usize {
        self.chromosomes.values().map(|c| c.reads.len()).sum()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.declared
            .iter()
            .map(String::as_str)
            .chain(
                self.chromosomes
                    .keys()
                    .filter(|c| !self.declared.contains(*c))
                    .map(String::as_str),
            )
    }
}

impl ReadSource for InMemoryReadSource {
    fn reads_overlapping(
        &self,
        chromosome: &str,
        start: GenomicPos,
        end: GenomicPos,
    ) -> ProviderResult<Vec<AlignedRead>> {
        let Some(entry) = self.chromosomes.get(chromosome) else {
            return Ok(Vec::new());
        };
        // No read starting before this can reach `start`.
        let earliest = start.saturating_sub(entry.max_span);
        let lo = entry.reads.partition_point(|r| r.start() < earliest);
        let hi = entry.reads.partition_point(|r| r.start() < end);
        Ok(entry.reads[lo..hi]
            .iter()
            .filter(|r| r.overlaps(start, end))
            .cloned()
            .collect())
    }

    fn has_chromosome(&self, chromosome: &str) -> bool {
        self.declared.contains(chromosome) || self.chromosomes.contains_key(chromosome)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Opens a text input, transparently decompressing `.gz` files.
///
/// BGZF output is a series of gzip members, so every member is decoded.
pub(crate) fn open_text<P: AsRef<Path>>(path: P) -> ProviderResult<Box<dyn BufRead>> {
    let file = File::open(&path)?;
    let path_str = path.as_ref().to_string_lossy();

    if path_str.ends_with(".gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Loads a sample, choosing the reader from the file extension.
pub fn load_reads<P: AsRef<Path>>(path: P) -> ProviderResult<InMemoryReadSource> {
    let path_str = path.as_ref().to_string_lossy().to_lowercase();

    if path_str.ends_with(".sam") || path_str.ends_with(".sam.gz") || path_str.ends_with(".bam") {
        return SamReader::read_file(path);
    }
    Err(ProviderError::UnsupportedFormat(path.as_ref().to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(chrom: &str, start: GenomicPos, end: GenomicPos) -> AlignedRead {
        let len = (end - start + 1) as usize;
        AlignedRead::new(chrom, start, end, vec![b'A'; len]).unwrap()
    }

    #[test]
    fn test_overlap_query() {
        let source = InMemoryReadSource::from_reads(
            "mother",
            vec![read("chr1", 1, 100), read("chr1", 150, 160), read("chr1", 90, 95), read("chr2", 1, 10)],
        );
        assert_eq!(source.read_count(), 4);

        let hits = source.reads_overlapping("chr1", 95, 151).unwrap();
        let coords: Vec<_> = hits.iter().map(|r| (r.start(), r.end())).collect();
        assert_eq!(coords, vec![(1, 100), (90, 95), (150, 160)]);

        // Half-open: a read starting at `end` is outside.
        assert!(source.reads_overlapping("chr1", 101, 150).unwrap().is_empty());
        assert!(source.reads_overlapping("chr9", 1, 10).unwrap().is_empty());
    }

    #[test]
    fn test_declared_chromosomes() {
        let mut source = InMemoryReadSource::new("father");
        assert!(!source.has_chromosome("chrY"));
        source.declare_chromosome("chrY");
        assert!(source.has_chromosome("chrY"));
        source.add_read(read("chr1", 5, 10));
        assert!(source.has_chromosome("chr1"));
        let mut names: Vec<_> = source.chromosomes().collect();
        names.sort();
        assert_eq!(names, vec!["chr1", "chrY"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_reads("sample.vcf").unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedFormat(_)));

        // BAM is accepted, so a missing file fails on open instead.
        let err = load_reads("/nonexistent/sample.bam").unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
    }
}

//! Genomic data types used throughout the pipeline.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValidationError;

/// 1-based genomic coordinate.
pub type GenomicPos = u64;

/// Marker emitted for positions no read covers.
pub const UNKNOWN_NUCLEOTIDE: u8 = b'N';

/// Gene name → features of that gene, in input order.
pub type FeatureMap = BTreeMap<String, Vec<Feature>>;

/// A sequenced fragment placed on a chromosome.
///
/// The interval is closed, `[start, end]`, and the sequence is projected
/// onto reference coordinates so `sequence[pos - start]` is the base at
/// `pos`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignedRead {
    name: Option<String>,
    chromosome: String,
    start: GenomicPos,
    end: GenomicPos,
    sequence: Vec<u8>,
}

impl AlignedRead {
    pub fn new<S: Into<String>>(
        chromosome: S,
        start: GenomicPos,
        end: GenomicPos,
        sequence: impl Into<Vec<u8>>,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::NegativeLength {
                entity: "aligned read",
                start,
                end,
            });
        }
        let mut sequence = sequence.into();
        sequence.make_ascii_uppercase();
        Ok(Self {
            name: None,
            chromosome: chromosome.into(),
            start,
            end,
            sequence,
        })
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn start(&self) -> GenomicPos {
        self.start
    }

    pub fn end(&self) -> GenomicPos {
        self.end
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn contains(&self, position: GenomicPos) -> bool {
        position >= self.start && position <= self.end
    }

    /// Whether the read intersects the half-open window `[start, end)`.
    pub fn overlaps(&self, start: GenomicPos, end: GenomicPos) -> bool {
        self.start < end && start <= self.end
    }

    /// Base at a reference position, `None` outside the read or past the
    /// end of a short sequence.
    pub fn base_at(&self, position: GenomicPos) -> Option<u8> {
        if !self.contains(position) {
            return None;
        }
        self.sequence.get((position - self.start) as usize).copied()
    }
}

/// Compiled repeat motif of an STR marker.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepeatMotif {
    regex: Regex,
}

impl RepeatMotif {
    pub fn new(pattern: &str) -> Result<Self, ValidationError> {
        let regex = Regex::new(pattern).map_err(|e| ValidationError::InvalidMotif {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Non-overlapping, leftmost-first match count.
    pub fn count_in(&self, sequence: &[u8]) -> usize {
        let text = String::from_utf8_lossy(sequence);
        self.regex.find_iter(&text).count()
    }
}

impl fmt::Debug for RepeatMotif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RepeatMotif").field(&self.as_str()).finish()
    }
}

impl PartialEq for RepeatMotif {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for RepeatMotif {}

impl TryFrom<String> for RepeatMotif {
    type Error = ValidationError;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        Self::new(&pattern)
    }
}

impl From<RepeatMotif> for String {
    fn from(motif: RepeatMotif) -> Self {
        motif.as_str().to_string()
    }
}

/// A region of interest: a gene window, optionally an STR marker.
///
/// The window is half-open, `[start, end)`, in the same 1-based system as
/// [`AlignedRead`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    chromosome: String,
    gene: String,
    start: GenomicPos,
    end: GenomicPos,
    motif: Option<RepeatMotif>,
}

impl Feature {
    pub fn new<S: Into<String>>(
        chromosome: S,
        gene: S,
        start: GenomicPos,
        end: GenomicPos,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::NegativeLength {
                entity: "feature",
                start,
                end,
            });
        }
        Ok(Self {
            chromosome: chromosome.into(),
            gene: gene.into(),
            start,
            end,
            motif: None,
        })
    }

    /// Marks the feature as an STR marker.
    pub fn with_motif(mut self, pattern: &str) -> Result<Self, ValidationError> {
        self.motif = Some(RepeatMotif::new(pattern)?);
        Ok(self)
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn start(&self) -> GenomicPos {
        self.start
    }

    pub fn end(&self) -> GenomicPos {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn motif(&self) -> Option<&RepeatMotif> {
        self.motif.as_ref()
    }

    pub fn is_marker(&self) -> bool {
        self.motif.is_some()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}-{}", self.gene, self.chromosome, self.start, self.end)
    }
}

/// One sample's assembled sequence over a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeRegion {
    chromosome: String,
    gene: String,
    start: GenomicPos,
    end: GenomicPos,
    sequence: Vec<u8>,
}

impl GenomeRegion {
    /// Fails when `end < start` or when the sequence does not span the
    /// window exactly.
    pub fn new<S: Into<String>>(
        chromosome: S,
        gene: S,
        start: GenomicPos,
        end: GenomicPos,
        sequence: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        let chromosome = chromosome.into();
        let gene = gene.into();
        let expected = end.checked_sub(start).ok_or(ValidationError::NegativeLength {
            entity: "genome region",
            start,
            end,
        })? as usize;
        if sequence.len() != expected {
            return Err(ValidationError::SequenceLengthMismatch {
                chromosome,
                gene,
                expected,
                actual: sequence.len(),
            });
        }
        Ok(Self {
            chromosome,
            gene,
            start,
            end,
            sequence,
        })
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn start(&self) -> GenomicPos {
        self.start
    }

    pub fn end(&self) -> GenomicPos {
        self.end
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn sequence_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.sequence)
    }

    /// Bases of both regions over their shared window, keeping only the
    /// columns where neither side is UNKNOWN. Both vectors have equal length.
    pub fn known_columns(&self, other: &GenomeRegion) -> (Vec<u8>, Vec<u8>) {
        let lo = self.start.max(other.start);
        let hi = self.end.min(other.end);
        if hi <= lo {
            return (Vec::new(), Vec::new());
        }
        let ours = &self.sequence[(lo - self.start) as usize..(hi - self.start) as usize];
        let theirs = &other.sequence[(lo - other.start) as usize..(hi - other.start) as usize];
        ours.iter()
            .zip(theirs)
            .filter(|&(&a, &b)| a != UNKNOWN_NUCLEOTIDE && b != UNKNOWN_NUCLEOTIDE)
            .map(|(&a, &b)| (a, b))
            .unzip()
    }

    pub fn unknown_count(&self) -> usize {
        self.sequence.iter().filter(|&&b| b == UNKNOWN_NUCLEOTIDE).count()
    }

    /// Whether the region lies on the feature's chromosome, gene and window.
    pub fn belongs_to(&self, feature: &Feature) -> bool {
        self.chromosome == feature.chromosome()
            && self.gene == feature.gene()
            && self.start >= feature.start()
            && self.end <= feature.end()
    }
}

impl fmt::Display for GenomeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}-{}", self.gene, self.chromosome, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rejects_reversed_interval() {
        let err = AlignedRead::new("chr1", 10, 5, "ACGT").unwrap_err();
        assert!(matches!(err, ValidationError::NegativeLength { .. }));
    }

    #[test]
    fn test_read_base_lookup() {
        let read = AlignedRead::new("chr1", 100, 103, "acgt").unwrap();
        assert_eq!(read.base_at(100), Some(b'A'));
        assert_eq!(read.base_at(103), Some(b'T'));
        assert_eq!(read.base_at(104), None);
        assert_eq!(read.base_at(99), None);
    }

    #[test]
    fn test_read_short_sequence_yields_none() {
        let read = AlignedRead::new("chr1", 1, 10, "AC").unwrap();
        assert_eq!(read.base_at(2), Some(b'C'));
        assert_eq!(read.base_at(3), None);
    }

    #[test]
    fn test_feature_window() {
        let feature = Feature::new("chrY", "DYS391", 100, 140).unwrap();
        assert_eq!(feature.len(), 40);
        assert!(!feature.is_marker());
        let marker = feature.with_motif("TCTA").unwrap();
        assert!(marker.is_marker());
        assert_eq!(marker.motif().unwrap().as_str(), "TCTA");
    }

    #[test]
    fn test_feature_rejects_bad_motif() {
        let feature = Feature::new("chrY", "DYS19", 1, 10).unwrap();
        let err = feature.with_motif("(TAGA").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidMotif { .. }));
    }

    #[test]
    fn test_region_length_invariant() {
        let region = GenomeRegion::new("chr1", "BRCA1", 10, 14, b"ACGT".to_vec()).unwrap();
        assert_eq!(region.len(), 4);

        let err = GenomeRegion::new("chr1", "BRCA1", 10, 15, b"ACGT".to_vec()).unwrap_err();
        assert!(matches!(err, ValidationError::SequenceLengthMismatch { expected: 5, actual: 4, .. }));

        let err = GenomeRegion::new("chr1", "BRCA1", 15, 10, Vec::new()).unwrap_err();
        assert!(matches!(err, ValidationError::NegativeLength { .. }));
    }

    #[test]
    fn test_known_columns_mask_both_sides() {
        let a = GenomeRegion::new("chr1", "TP53", 1, 7, b"ANCNGT".to_vec()).unwrap();
        let b = GenomeRegion::new("chr1", "TP53", 1, 7, b"AGNNTT".to_vec()).unwrap();
        assert_eq!(a.unknown_count(), 2);
        let (x, y) = a.known_columns(&b);
        assert_eq!(x, b"AGT".to_vec());
        assert_eq!(y, b"ATT".to_vec());
    }

    #[test]
    fn test_known_columns_follow_coordinates() {
        let a = GenomeRegion::new("chr1", "TP53", 1, 9, b"ACGTACGT".to_vec()).unwrap();
        let b = GenomeRegion::new("chr1", "TP53", 5, 9, b"ACGT".to_vec()).unwrap();
        let (x, y) = a.known_columns(&b);
        assert_eq!(x, b"ACGT".to_vec());
        assert_eq!(y, b"ACGT".to_vec());

        let c = GenomeRegion::new("chr1", "TP53", 20, 22, b"AC".to_vec()).unwrap();
        assert_eq!(a.known_columns(&c), (Vec::new(), Vec::new()));
    }

    #[test]
    fn test_motif_counts_non_overlapping() {
        let motif = RepeatMotif::new("CA").unwrap();
        assert_eq!(motif.count_in(b"CACACAG"), 3);
        let motif = RepeatMotif::new("AA").unwrap();
        assert_eq!(motif.count_in(b"AAAA"), 2);
    }

    #[test]
    fn test_motif_serde_roundtrip() {
        let feature = Feature::new("chrY", "DYS390", 5, 50)
            .unwrap()
            .with_motif("(TCTA)")
            .unwrap();
        let json = serde_json::to_string(&feature).unwrap();
        assert!(json.contains("(TCTA)"));
        let back: Feature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, feature);
    }
}

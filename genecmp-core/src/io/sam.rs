//! SAM and BAM sample reader.
//!
//! Mapped records are turned into [`AlignedRead`]s whose bases are laid out
//! on reference coordinates: the CIGAR is walked so that deletions and
//! skipped regions become UNKNOWN positions while insertions and soft clips
//! are dropped.

use std::fs::File;
use std::io::{BufRead, Read};
use std::path::Path;

use noodles::bam;
use noodles::sam::{self as sam, alignment::Record, Header};
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::Cigar;

use crate::error::{ProviderError, ProviderResult};
use crate::io::{open_text, InMemoryReadSource};
use crate::types::{AlignedRead, GenomicPos, UNKNOWN_NUCLEOTIDE};

/// Lays read bases out on the reference span described by the CIGAR.
pub fn project_to_reference(seq: &[u8], cigar: &dyn Cigar) -> Result<Vec<u8>, String> {
    let mut projected = Vec::new();
    let mut qi = 0usize;

    for op in cigar.iter() {
        let op = op.map_err(|e| format!("invalid CIGAR: {e}"))?;
        let len = op.len();

        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                let bases = qi
                    .checked_add(len)
                    .and_then(|end| seq.get(qi..end))
                    .ok_or_else(|| "CIGAR consumes more bases than SEQ holds".to_string())?;
                projected.extend_from_slice(bases);
                qi += len;
            }
            Kind::Insertion | Kind::SoftClip => qi = qi.saturating_add(len),
            Kind::Deletion | Kind::Skip => {
                projected.resize(projected.len() + len, UNKNOWN_NUCLEOTIDE);
            }
            Kind::HardClip | Kind::Pad => {}
        }
    }
    Ok(projected)
}

/// `Ok(None)` for records that carry no placed bases.
pub fn record_to_read(record: &dyn Record, header: &Header) -> Result<Option<AlignedRead>, String> {
    let flags = record.flags().map_err(|e| format!("invalid FLAG: {e}"))?;
    if flags.is_unmapped() {
        return Ok(None);
    }

    let Some(id) = record
        .reference_sequence_id(header)
        .transpose()
        .map_err(|e| format!("invalid RNAME: {e}"))?
    else {
        return Ok(None);
    };
    let chromosome = header
        .reference_sequences()
        .get_index(id)
        .map(|(name, _)| name.to_string())
        .ok_or_else(|| format!("reference sequence {id} is not in the header"))?;

    let Some(start) = record
        .alignment_start()
        .transpose()
        .map_err(|e| format!("invalid POS: {e}"))?
    else {
        return Ok(None);
    };

    let bases: Vec<u8> = record.sequence().iter().collect();
    if bases.is_empty() {
        return Ok(None);
    }

    let cigar = record.cigar();
    let projected = if cigar.is_empty() {
        bases
    } else {
        project_to_reference(&bases, &*cigar)?
    };
    if projected.is_empty() {
        return Ok(None);
    }

    let start = start.get() as GenomicPos;
    let end = start
        .checked_add(projected.len() as GenomicPos - 1)
        .ok_or_else(|| format!("alignment at {start} spanning {} bases overflows", projected.len()))?;

    let mut read = AlignedRead::new(chromosome, start, end, projected).map_err(|e| e.to_string())?;
    if let Some(name) = record.name() {
        read = read.with_name(name.to_string());
    }
    Ok(Some(read))
}

pub struct SamReader;

impl SamReader {
    /// Reads `.bam` as BAM and anything else as SAM text, gzipped or not.
    pub fn read_file<P: AsRef<Path>>(path: P) -> ProviderResult<InMemoryReadSource> {
        let path = path.as_ref();
        let name = sample_name(path);
        let origin = path.display().to_string();

        let source = if is_bam(path) {
            Self::read_bam(File::open(path)?, &name, &origin)?
        } else {
            Self::read(open_text(path)?, &name, &origin)?
        };
        log::info!(
            "Loaded {} reads for sample '{}' from {}",
            source.read_count(),
            name,
            path.display()
        );
        Ok(source)
    }

    /// Reads SAM text from any buffered source.
    pub fn read<R: BufRead>(reader: R, name: &str, origin: &str) -> ProviderResult<InMemoryReadSource> {
        let mut reader = sam::io::Reader::new(reader);
        let header = reader.read_header()?;
        let mut source = source_for(name, &header);

        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(|e| ProviderError::record(origin.to_string(), i + 1, e.to_string()))?;
            if let Some(read) = record_to_read(&record, &header)
                .map_err(|message| ProviderError::record(origin.to_string(), i + 1, message))?
            {
                source.add_read(read);
            }
        }
        Ok(source)
    }

    /// Reads BGZF-compressed BAM.
    pub fn read_bam<R: Read>(reader: R, name: &str, origin: &str) -> ProviderResult<InMemoryReadSource> {
        let mut reader = bam::io::Reader::new(reader);
        let header = reader.read_header()?;
        let mut source = source_for(name, &header);

        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(|e| ProviderError::record(origin.to_string(), i + 1, e.to_string()))?;
            if let Some(read) = record_to_read(&record, &header)
                .map_err(|message| ProviderError::record(origin.to_string(), i + 1, message))?
            {
                source.add_read(read);
            }
        }
        Ok(source)
    }
}

fn source_for(name: &str, header: &Header) -> InMemoryReadSource {
    let mut source = InMemoryReadSource::new(name);
    for chromosome in header.reference_sequences().keys() {
        source.declare_chromosome(chromosome.to_string());
    }
    source
}

fn is_bam(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("bam"))
        .unwrap_or(false)
}

fn sample_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string());
    ["gz", "sam", "bam"]
        .iter()
        .fold(file_name, |name, ext| {
            match name.strip_suffix(*ext).and_then(|n| n.strip_suffix('.')) {
                Some(stem) if !stem.is_empty() => stem.to_string(),
                _ => name,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ReadSource;
    use std::io::Cursor;

    const HEADER: &str = "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:1000\n@SQ\tSN:chrY\tLN:500\n";

    fn read_sam(records: &str) -> ProviderResult<InMemoryReadSource> {
        SamReader::read(Cursor::new(format!("{HEADER}{records}")), "son", "inline")
    }

    fn only_read(source: &InMemoryReadSource) -> AlignedRead {
        let mut reads = source.reads_overlapping("chr1", 1, 1000).unwrap();
        assert_eq!(reads.len(), 1);
        reads.remove(0)
    }

    #[test]
    fn test_projection_handles_indels() {
        let source = read_sam("r1\t0\tchr1\t101\t60\t2S3M1I2M2D1M\t*\t0\t0\tTTACGGCAT\t*\n").unwrap();
        let read = only_read(&source);
        // clip TT, ACG, skip G, CA, two deleted, T
        assert_eq!(read.sequence(), b"ACGCANNT");
        assert_eq!(read.start(), 101);
        assert_eq!(read.end(), 108);
    }

    #[test]
    fn test_hard_clips_and_skips() {
        let source = read_sam("r1\t0\tchr1\t10\t60\t3H2M3N2=1X5H\t*\t0\t0\tACGTA\t*\n").unwrap();
        let read = only_read(&source);
        assert_eq!(read.sequence(), b"ACNNNGTA");
        assert_eq!(read.end(), 17);
    }

    #[test]
    fn test_short_seq_is_rejected() {
        let err = read_sam("r1\t0\tchr1\t10\t60\t10M\t*\t0\t0\tACGT\t*\n").unwrap_err();
        assert!(matches!(err, ProviderError::Record { record: 1, .. }));
    }

    #[test]
    fn test_record_fields() {
        let source = read_sam("r1\t0\tchr1\t101\t60\t4M1D2M\t*\t0\t0\tACGTAC\t*\n").unwrap();
        let read = only_read(&source);
        assert_eq!(read.chromosome(), "chr1");
        assert_eq!(read.start(), 101);
        assert_eq!(read.end(), 107);
        assert_eq!(read.sequence(), b"ACGTNAC");
        assert_eq!(read.name(), Some("r1"));
    }

    #[test]
    fn test_missing_cigar_places_bases_contiguously() {
        let source = read_sam("r1\t0\tchr1\t5\t60\t*\t*\t0\t0\tACGT\t*\n").unwrap();
        let read = only_read(&source);
        assert_eq!((read.start(), read.end()), (5, 8));
    }

    #[test]
    fn test_unplaced_records_skipped() {
        let source = read_sam(
            "r2\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\t*\n\
             r3\t0\tchr1\t10\t60\t4M\t*\t0\t0\t*\t*\n",
        )
        .unwrap();
        assert_eq!(source.read_count(), 0);
    }

    #[test]
    fn test_read_with_header() {
        let source = read_sam(
            "r1\t0\tchr1\t10\t60\t5M\t*\t0\t0\tACGTA\t*\n\
             r2\t0\tchr1\t12\t60\t5M\t*\t0\t0\tGTACC\t*\n",
        )
        .unwrap();
        assert_eq!(source.read_count(), 2);
        assert!(source.has_chromosome("chrY"));
        assert!(!source.has_chromosome("chrX"));
        assert_eq!(source.reads_overlapping("chr1", 14, 20).unwrap().len(), 2);
    }

    #[test]
    fn test_bad_record_reports_its_number() {
        let err = read_sam(
            "r1\t0\tchr1\t10\t60\t5M\t*\t0\t0\tACGTA\t*\n\
             r2\tzero\tchr1\t10\t60\t5M\t*\t0\t0\tACGTA\t*\n",
        )
        .unwrap_err();
        match err {
            ProviderError::Record { record, .. } => assert_eq!(record, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_alignment_end_overflow_is_an_error() {
        let err = read_sam("r1\t0\tchr1\t18446744073709551615\t60\t4M\t*\t0\t0\tACGT\t*\n").unwrap_err();
        assert!(matches!(err, ProviderError::Record { record: 1, .. }));
    }

    #[test]
    fn test_sample_name_strips_extensions() {
        assert_eq!(sample_name(Path::new("/data/father.sam.gz")), "father");
        assert_eq!(sample_name(Path::new("son.bam")), "son");
        assert_eq!(sample_name(Path::new("mother.reads")), "mother.reads");
        assert!(is_bam(Path::new("x.BAM")));
        assert!(!is_bam(Path::new("x.sam")));
    }
}

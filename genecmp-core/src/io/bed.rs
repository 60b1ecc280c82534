//! Region-of-interest file reader.
//!
//! Tab-separated, BED-like: `chrom  start  end  gene  [motif]`, with 0-based
//! half-open coordinates. A fifth column marks the region as an STR marker
//! and holds its repeat motif as a regular expression.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use noodles::bed;

use crate::error::{ProviderError, ProviderResult};
use crate::io::{open_text, FeatureSource};
use crate::types::{Feature, FeatureMap, GenomicPos};

/// Reads a region file lazily, on `features_by_gene`.
#[derive(Debug, Clone)]
pub struct BedReader {
    path: PathBuf,
}

impl BedReader {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read<R: BufRead>(reader: R, origin: &str) -> ProviderResult<FeatureMap> {
        let mut features = FeatureMap::new();
        let mut count = 0usize;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }
            let feature = Self::parse_line(line)
                .map_err(|message| ProviderError::parse(origin.to_string(), line_num + 1, message))?;
            features
                .entry(feature.gene().to_string())
                .or_insert_with(Vec::new)
                .push(feature);
            count += 1;
        }

        log::debug!("Parsed {} regions across {} genes from {}", count, features.len(), origin);
        Ok(features)
    }

    /// Parses one line, shifting coordinates to the 1-based system.
    pub fn parse_line(line: &str) -> Result<Feature, String> {
        let mut reader = bed::io::Reader::<3, _>::new(line.as_bytes());
        let mut record = bed::Record::<3>::default();
        if reader.read_record(&mut record).map_err(|e| e.to_string())? == 0 {
            return Err("empty record".to_string());
        }
        Self::feature_from_record(&record)
    }

    fn feature_from_record(record: &bed::Record<3>) -> Result<Feature, String> {
        let chrom = std::str::from_utf8(record.reference_sequence_name())
            .map_err(|e| format!("invalid chromosome name: {e}"))?;
        let start = record
            .feature_start()
            .map_err(|e| format!("invalid start: {e}"))?;
        let end = record
            .feature_end()
            .ok_or_else(|| "missing end".to_string())?
            .map_err(|e| format!("invalid end: {e}"))?;

        // noodles reports the last base, 1-based; windows are half-open.
        let start = start.get() as GenomicPos;
        let end = (end.get() as GenomicPos)
            .checked_add(1)
            .ok_or_else(|| format!("end {} is out of range", end.get()))?;

        let other_fields = record.other_fields();
        let mut extra = other_fields.iter().map(|field| String::from_utf8_lossy(field).trim().to_string());
        let gene = extra
            .next()
            .filter(|gene| !gene.is_empty())
            .ok_or_else(|| "missing gene name".to_string())?;

        let feature = Feature::new(chrom.to_string(), gene, start, end).map_err(|e| e.to_string())?;
        match extra.next().filter(|motif| !motif.is_empty()) {
            Some(motif) => feature.with_motif(&motif).map_err(|e| e.to_string()),
            None => Ok(feature),
        }
    }
}

impl FeatureSource for BedReader {
    fn features_by_gene(&self) -> ProviderResult<FeatureMap> {
        let reader = open_text(&self.path)?;
        Self::read(reader, &self.path.display().to_string())
    }
}

//! Text and JSON rendering of comparison results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use crate::align::similarity_percent;
use crate::result::ComparisonResult;
use crate::sink::{ResultSink, RunStatsSnapshot, SkippedFeature};

/// One line describing a single region result.
pub fn render_result(result: &ComparisonResult) -> String {
    match result {
        ComparisonResult::EditDistance(r) => {
            let location = match r.window() {
                Some((start, end)) => format!("{}:{}-{}", r.chromosome(), start, end),
                None => r.chromosome().to_string(),
            };
            match r.similarity() {
                Some(similarity) => format!(
                    "Gene {} at {}: compared length {}, differences {}, similarity {:.2}%",
                    r.gene(),
                    location,
                    r.compared_len(),
                    r.distance(),
                    similarity
                ),
                None => format!(
                    "Gene {} at {}: nucleotide sequence consists of only UNKNOWN nucleotides",
                    r.gene(),
                    location
                ),
            }
        }
        ComparisonResult::RepeatCount(r) => {
            let feature = r.feature();
            let motif = feature.motif().map(|m| m.as_str()).unwrap_or("?");
            format!(
                "Marker {} at {}:{}-{}: motif {} repeats {} vs {} ({})",
                feature.gene(),
                feature.chromosome(),
                feature.start(),
                feature.end(),
                motif,
                r.count_a(),
                r.count_b(),
                if r.counts_match() { "match" } else { "mismatch" }
            )
        }
    }
}

/// Aggregate over every result of one gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSummary {
    pub gene: String,
    pub regions_compared: usize,
    pub total_distance: u64,
    pub total_compared_len: u64,
    /// `None` when every compared region was unknown-only.
    pub similarity: Option<f64>,
    pub markers_compared: usize,
    pub markers_matching: usize,
}

impl GeneSummary {
    pub fn from_results(gene: &str, results: &[ComparisonResult]) -> Self {
        let mut summary = GeneSummary {
            gene: gene.to_string(),
            regions_compared: 0,
            total_distance: 0,
            total_compared_len: 0,
            similarity: None,
            markers_compared: 0,
            markers_matching: 0,
        };

        for result in results {
            match result {
                ComparisonResult::EditDistance(r) => {
                    summary.regions_compared += 1;
                    summary.total_distance += r.distance();
                    summary.total_compared_len += r.compared_len();
                }
                ComparisonResult::RepeatCount(r) => {
                    summary.markers_compared += 1;
                    if r.counts_match() {
                        summary.markers_matching += 1;
                    }
                }
            }
        }
        summary.similarity = similarity_percent(summary.total_distance, summary.total_compared_len);
        summary
    }
}

impl fmt::Display for GeneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gene {}:", self.gene)?;
        if self.regions_compared > 0 {
            write!(
                f,
                " {} regions, {} differences over {} bases",
                self.regions_compared, self.total_distance, self.total_compared_len
            )?;
            match self.similarity {
                Some(similarity) => write!(f, ", similarity {:.2}%", similarity)?,
                None => write!(f, ", only UNKNOWN nucleotides")?,
            }
        }
        if self.markers_compared > 0 {
            if self.regions_compared > 0 {
                f.write_str(";")?;
            }
            write!(
                f,
                " {} STR markers, {} matching",
                self.markers_compared, self.markers_matching
            )?;
        }
        Ok(())
    }
}

pub fn summarize(snapshot: &BTreeMap<String, Vec<ComparisonResult>>) -> Vec<GeneSummary> {
    snapshot
        .iter()
        .map(|(gene, results)| GeneSummary::from_results(gene, results))
        .collect()
}

/// Renders per-gene summaries, with per-region lines when `verbose` is set.
pub fn render_report(
    snapshot: &BTreeMap<String, Vec<ComparisonResult>>,
    skipped: &[SkippedFeature],
    verbose: bool,
) -> String {
    let mut out = String::new();

    for (gene, results) in snapshot {
        let _ = writeln!(out, "{}", GeneSummary::from_results(gene, results));
        if verbose {
            for result in results {
                let _ = writeln!(out, "  {}", render_result(result));
            }
        }
    }

    if !skipped.is_empty() {
        let _ = writeln!(out, "Skipped {} features with differing region counts:", skipped.len());
        for skip in skipped {
            let _ = writeln!(
                out,
                "  {} at {}:{}-{} ({} vs {} regions)",
                skip.gene, skip.chromosome, skip.start, skip.end, skip.regions_first, skip.regions_second
            );
        }
    }

    if out.is_empty() {
        out.push_str("No comparable regions\n");
    }
    out
}

/// Everything a run produced, ready for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub first: String,
    pub second: String,
    pub summaries: Vec<GeneSummary>,
    pub results: BTreeMap<String, Vec<ComparisonResult>>,
    pub skipped: Vec<SkippedFeature>,
    pub stats: RunStatsSnapshot,
}

impl RunReport {
    pub fn from_sink(first: &str, second: &str, sink: &ResultSink) -> Self {
        let results = sink.snapshot();
        Self {
            first: first.to_string(),
            second: second.to_string(),
            summaries: summarize(&results),
            results,
            skipped: sink.skipped(),
            stats: sink.stats().snapshot(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self, verbose: bool) -> String {
        render_report(&self.results, &self.skipped, verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{EditDistanceResult, RepeatCountResult};
    use crate::types::Feature;

    fn edit(gene: &str, distance: i64, len: i64) -> ComparisonResult {
        EditDistanceResult::new("chr1", gene, distance, len)
            .unwrap()
            .with_window(1, 5)
            .into()
    }

    fn marker(count_a: usize, count_b: usize) -> ComparisonResult {
        let feature = Feature::new("chrY", "DYS19", 10, 40).unwrap().with_motif("TAGA").unwrap();
        RepeatCountResult::new(feature, count_a, count_b).into()
    }

    #[test]
    fn test_render_edit_distance() {
        let line = render_result(&edit("GENE1", 1, 4));
        assert_eq!(
            line,
            "Gene GENE1 at chr1:1-5: compared length 4, differences 1, similarity 75.00%"
        );
    }

    #[test]
    fn test_render_unknown_only() {
        let line = render_result(&edit("GENE1", 0, 0));
        assert!(line.contains("only UNKNOWN nucleotides"));
        assert!(!line.contains('%'));
    }

    #[test]
    fn test_render_marker() {
        let line = render_result(&marker(12, 12));
        assert_eq!(line, "Marker DYS19 at chrY:10-40: motif TAGA repeats 12 vs 12 (match)");
        assert!(render_result(&marker(12, 13)).ends_with("(mismatch)"));
    }

    #[test]
    fn test_gene_summary() {
        let results = vec![edit("G", 1, 4), edit("G", 0, 0), edit("G", 3, 6), marker(2, 2), marker(2, 3)];
        let summary = GeneSummary::from_results("G", &results);
        assert_eq!(summary.regions_compared, 3);
        assert_eq!(summary.total_distance, 4);
        assert_eq!(summary.total_compared_len, 10);
        assert_eq!(summary.similarity, Some(60.0));
        assert_eq!(summary.markers_compared, 2);
        assert_eq!(summary.markers_matching, 1);
        assert_eq!(
            summary.to_string(),
            "Gene G: 3 regions, 4 differences over 10 bases, similarity 60.00%; 2 STR markers, 1 matching"
        );
    }

    #[test]
    fn test_report_verbosity() {
        let mut snapshot = BTreeMap::new();
        snapshot.insert("GENE1".to_string(), vec![edit("GENE1", 1, 4)]);

        let terse = render_report(&snapshot, &[], false);
        assert_eq!(terse.lines().count(), 1);
        let verbose = render_report(&snapshot, &[], true);
        assert_eq!(verbose.lines().count(), 2);
        assert!(verbose.contains("similarity 75.00%"));
    }

    #[test]
    fn test_report_lists_skips() {
        let feature = Feature::new("chrY", "SRY", 100, 200).unwrap();
        let skipped = vec![SkippedFeature::new(&feature, 1, 0)];
        let report = render_report(&BTreeMap::new(), &skipped, false);
        assert!(report.contains("SRY at chrY:100-200 (1 vs 0 regions)"));
        assert_eq!(render_report(&BTreeMap::new(), &[], true), "No comparable regions\n");
    }

    #[test]
    fn test_run_report_json() {
        let sink = ResultSink::new();
        sink.append("GENE1", edit("GENE1", 1, 4));
        sink.append("DYS19", marker(5, 5));
        let report = RunReport::from_sink("father", "son", &sink);
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["first"], "father");
        assert_eq!(value["results"]["GENE1"][0]["kind"], "edit_distance");
        assert_eq!(value["results"]["DYS19"][0]["kind"], "repeat_count");
        assert_eq!(value["summaries"].as_array().unwrap().len(), 2);
    }
}

//! Shared result store for one comparison run.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::result::ComparisonResult;
use crate::types::{Feature, GenomicPos};

/// A feature left out because the samples produced different region counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFeature {
    pub chromosome: String,
    pub gene: String,
    pub start: GenomicPos,
    pub end: GenomicPos,
    pub regions_first: usize,
    pub regions_second: usize,
}

impl SkippedFeature {
    pub fn new(feature: &Feature, regions_first: usize, regions_second: usize) -> Self {
        Self {
            chromosome: feature.chromosome().to_string(),
            gene: feature.gene().to_string(),
            start: feature.start(),
            end: feature.end(),
            regions_first,
            regions_second,
        }
    }
}

/// Task counters, updated lock-free while the pipeline runs.
#[derive(Debug, Default)]
pub struct RunStats {
    genes: AtomicUsize,
    features: AtomicUsize,
    regions_compared: AtomicUsize,
    features_skipped: AtomicUsize,
    tasks_failed: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatsSnapshot {
    pub genes: usize,
    pub features: usize,
    pub regions_compared: usize,
    pub features_skipped: usize,
    pub tasks_failed: usize,
}

impl RunStats {
    pub fn gene_done(&self) {
        self.genes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn feature_done(&self) {
        self.features.fetch_add(1, Ordering::Relaxed);
    }

    pub fn region_compared(&self) {
        self.regions_compared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn feature_skipped(&self) {
        self.features_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            genes: self.genes.load(Ordering::Relaxed),
            features: self.features.load(Ordering::Relaxed),
            regions_compared: self.regions_compared.load(Ordering::Relaxed),
            features_skipped: self.features_skipped.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
        }
    }
}

/// Gene name to results, in the order appends completed.
///
/// Appends only; nothing is ever removed during a run.
#[derive(Debug, Default)]
pub struct ResultSink {
    results: DashMap<String, Vec<ComparisonResult>>,
    skipped: Mutex<Vec<SkippedFeature>>,
    stats: RunStats,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shard lock held by the entry makes the push atomic.
    pub fn append(&self, gene: &str, result: ComparisonResult) {
        self.results
            .entry(gene.to_string())
            .or_default()
            .push(result);
    }

    pub fn record_skip(&self, skip: SkippedFeature) {
        self.skipped.lock().push(skip);
    }

    pub fn results_for(&self, gene: &str) -> Vec<ComparisonResult> {
        self.results
            .get(gene)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Vec<ComparisonResult>> {
        self.results
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn skipped(&self) -> Vec<SkippedFeature> {
        self.skipped.lock().clone()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Total results across all genes.
    pub fn len(&self) -> usize {
        self.results.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn gene_count(&self) -> usize {
        self.results.len()
    }
}

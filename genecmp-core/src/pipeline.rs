//! Concurrent comparison pipeline.
//!
//! A run fans out in four levels: the run spawns one task per gene, a gene
//! task spawns one task per feature, a feature task assembles both samples
//! side by side and then spawns one comparison task per region pair. Every
//! level waits for its whole cohort before reporting back, so a failing
//! task never cancels siblings that are already running.
//!
//! All tasks execute on a dedicated rayon pool owned by the run.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use crate::assembly::RegionAssembler;
use crate::compare::{comparator_for, RegionComparator};
use crate::error::{CompareError, CompareResult};
use crate::io::{FeatureSource, ReadSource};
use crate::report::render_result;
use crate::sink::{ResultSink, SkippedFeature};
use crate::types::{Feature, FeatureMap, GenomeRegion};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Worker count; `None` or 0 uses every CPU.
    pub threads: Option<usize>,
    /// Keep the gapped alignment on edit-distance results.
    pub traceback: bool,
    /// Split feature windows into sub-regions of at most this many bases.
    pub max_region_len: Option<usize>,
    /// Log every region result as it completes and render it in reports.
    pub verbose_intermediate: bool,
}

impl CompareOptions {
    pub fn effective_threads(&self) -> usize {
        let max_threads = num_cpus::get() * 2;
        match self.threads {
            None | Some(0) => num_cpus::get(),
            Some(n) if n > max_threads => {
                log::warn!(
                    "Thread count {} exceeds recommended maximum {}, capping at {}",
                    n,
                    max_threads,
                    max_threads
                );
                max_threads
            }
            Some(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Spawned,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Spawned => "spawned",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn log_state(task: &str, subject: &dyn fmt::Display, state: TaskState) {
    log::trace!("{} task {}: {}", task, subject, state);
}

/// Waits on a finished cohort and surfaces the first failure.
///
/// Callers collect every sibling's outcome before calling this, so all
/// siblings have run to completion by the time an error is returned.
pub fn join_cohort<I>(outcomes: I) -> CompareResult<()>
where
    I: IntoIterator<Item = CompareResult<()>>,
{
    outcomes.into_iter().collect()
}

/// Compares two samples over every feature of a feature source.
pub struct GenomeComparator<'a> {
    first: &'a dyn ReadSource,
    second: &'a dyn ReadSource,
    options: CompareOptions,
}

impl<'a> GenomeComparator<'a> {
    pub fn new(first: &'a dyn ReadSource, second: &'a dyn ReadSource) -> Self {
        Self {
            first,
            second,
            options: CompareOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompareOptions {
        &self.options
    }

    pub fn run<F: FeatureSource + ?Sized>(&self, features: &F) -> CompareResult<ResultSink> {
        let features = features.features_by_gene()?;
        let pool = self.build_pool()?;
        let sink = ResultSink::new();

        log::info!(
            "Comparing '{}' against '{}': {} genes, {} threads",
            self.first.name(),
            self.second.name(),
            features.len(),
            pool.current_num_threads()
        );
        let started = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| self.compare_genes(&features, &sink))
        }));
        match outcome {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(payload);
                log::error!("Comparison interrupted: {}", message);
                return Err(CompareError::Interrupted(message));
            }
        }

        let stats = sink.stats().snapshot();
        log::info!(
            "Compared {} regions in {} features across {} genes ({} skipped) in {:.2?}",
            stats.regions_compared,
            stats.features,
            stats.genes,
            stats.features_skipped,
            started.elapsed()
        );
        Ok(sink)
    }

    fn build_pool(&self) -> CompareResult<ThreadPool> {
        let threads = self.options.effective_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("genecmp-worker-{i}"))
            .build()?;
        log::debug!("Built worker pool with {} threads", threads);
        Ok(pool)
    }

    fn compare_genes(&self, features: &FeatureMap, sink: &ResultSink) -> CompareResult<()> {
        for gene in features.keys() {
            log_state("gene", gene, TaskState::Spawned);
        }
        let outcomes: Vec<_> = features
            .par_iter()
            .map(|(gene, gene_features)| self.compare_gene(gene, gene_features, sink))
            .collect();
        join_cohort(outcomes)
    }

    fn compare_gene(&self, gene: &str, features: &[Feature], sink: &ResultSink) -> CompareResult<()> {
        let gene = gene.to_string();
        log_state("gene", &gene, TaskState::Running);
        log::debug!("Gene {}: {} features", gene, features.len());

        let outcomes: Vec<_> = features
            .par_iter()
            .map(|feature| {
                log_state("feature", feature, TaskState::Spawned);
                self.compare_feature(feature, sink)
            })
            .collect();
        let outcome = join_cohort(outcomes);
        self.finish("gene", &gene, &outcome, sink);
        if outcome.is_ok() {
            sink.stats().gene_done();
        }
        outcome
    }

    fn compare_feature(&self, feature: &Feature, sink: &ResultSink) -> CompareResult<()> {
        log_state("feature", feature, TaskState::Running);
        let outcome = self.assemble_and_compare(feature, sink);
        self.finish("feature", feature, &outcome, sink);
        outcome
    }

    fn assemble_and_compare(&self, feature: &Feature, sink: &ResultSink) -> CompareResult<()> {
        let first = RegionAssembler::new(self.first, self.options.max_region_len);
        let second = RegionAssembler::new(self.second, self.options.max_region_len);
        let (regions_first, regions_second) = rayon::join(
            || first.assemble_feature(feature),
            || second.assemble_feature(feature),
        );
        let (regions_first, regions_second) = (regions_first?, regions_second?);

        if regions_first.len() != regions_second.len() {
            log::warn!(
                "Skipping {}: '{}' yields {} regions, '{}' yields {}",
                feature,
                self.first.name(),
                regions_first.len(),
                self.second.name(),
                regions_second.len()
            );
            sink.record_skip(SkippedFeature::new(
                feature,
                regions_first.len(),
                regions_second.len(),
            ));
            sink.stats().feature_skipped();
            return Ok(());
        }

        let comparator = comparator_for(feature, self.options.traceback);
        let outcomes: Vec<_> = regions_first
            .par_iter()
            .zip(regions_second.par_iter())
            .map(|(a, b)| self.compare_regions(comparator.as_ref(), a, b, feature, sink))
            .collect();
        join_cohort(outcomes)?;
        sink.stats().feature_done();
        Ok(())
    }

    fn compare_regions(
        &self,
        comparator: &dyn RegionComparator,
        first: &GenomeRegion,
        second: &GenomeRegion,
        feature: &Feature,
        sink: &ResultSink,
    ) -> CompareResult<()> {
        log_state("region", first, TaskState::Running);
        let outcome = comparator.compare(first, second, feature);
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                log_state("region", first, TaskState::Failed);
                sink.stats().task_failed();
                return Err(e.into());
            }
        };

        if self.options.verbose_intermediate {
            log::info!("{}", render_result(&result));
        }
        sink.append(feature.gene(), result);
        sink.stats().region_compared();
        log_state("region", first, TaskState::Completed);
        Ok(())
    }

    fn finish(&self, task: &str, subject: &dyn fmt::Display, outcome: &CompareResult<()>, sink: &ResultSink) {
        match outcome {
            Ok(()) => log_state(task, subject, TaskState::Completed),
            Err(e) => {
                log_state(task, subject, TaskState::Failed);
                log::debug!("{} task {} failed: {}", task, subject, e);
                sink.stats().task_failed();
            }
        }
    }
}

/// Runs a comparison with default options.
///
/// `verbose_intermediate` only changes what gets rendered; the returned
/// sink always holds every result.
pub fn run_comparison<F: FeatureSource + ?Sized>(
    sample_a: &dyn ReadSource,
    sample_b: &dyn ReadSource,
    features: &F,
    verbose_intermediate: bool,
) -> CompareResult<ResultSink> {
    let options = CompareOptions {
        verbose_intermediate,
        ..CompareOptions::default()
    };
    GenomeComparator::new(sample_a, sample_b)
        .with_options(options)
        .run(features)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

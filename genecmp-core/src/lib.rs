//! GeneCmp Core Library
//!
//! Region-restricted comparison of two genomes: read indexing, region
//! assembly, edit-distance and STR comparators, and the concurrent pipeline
//! that drives them.

pub mod types;
pub mod error;
pub mod io;
pub mod index;
pub mod assembly;
pub mod align;
pub mod result;
pub mod compare;
pub mod sink;
pub mod pipeline;
pub mod report;

// Re-export commonly used types and functions
pub use types::{AlignedRead, Feature, FeatureMap, GenomeRegion, GenomicPos, RepeatMotif, UNKNOWN_NUCLEOTIDE};
pub use error::{CompareError, CompareResult, ProviderError, ProviderResult, ValidationError};
pub use io::{load_reads, BedReader, FeatureSource, InMemoryReadSource, ReadSource, SamReader};
pub use index::IntervalIndex;
pub use assembly::{assemble, RegionAssembler};
pub use align::{align, edit_distance, EditTable, PairwiseAlignment};
pub use result::{ComparatorKind, ComparisonResult, EditDistanceResult, RepeatCountResult};
pub use compare::{comparator_for, EditDistanceComparator, RegionComparator, RepeatCountComparator};
pub use sink::{ResultSink, RunStats, RunStatsSnapshot, SkippedFeature};
pub use pipeline::{run_comparison, CompareOptions, GenomeComparator};
pub use report::{render_report, render_result, GeneSummary, RunReport};

/// Version information for the GeneCmp core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

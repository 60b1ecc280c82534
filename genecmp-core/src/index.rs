//! Sorted interval index over aligned reads.
//!
//! Reads are kept ordered by `(start, end)`; reads with equal coordinates
//! keep their insertion order. Alongside the reads the index maintains the
//! running maximum of read ends, which is monotone and therefore lets a
//! containment query locate its first candidate by binary search even
//! though the ends themselves are not sorted.

use std::cmp::max;

use crate::types::{AlignedRead, GenomicPos};

#[derive(Debug, Clone)]
struct Entry {
    read: AlignedRead,
    order: u64,
}

/// Ordered container of reads supporting containment queries.
#[derive(Debug, Clone, Default)]
pub struct IntervalIndex {
    entries: Vec<Entry>,
    // prefix_max_end[i] == max(end of entries[0..=i])
    prefix_max_end: Vec<GenomicPos>,
    next_order: u64,
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            prefix_max_end: Vec::with_capacity(capacity),
            next_order: 0,
        }
    }

    /// Builds an index from reads in arbitrary order, dropping duplicates.
    pub fn from_reads<I: IntoIterator<Item = AlignedRead>>(reads: I) -> Self {
        let iter = reads.into_iter();
        let mut index = Self::with_capacity(iter.size_hint().0);
        for read in iter {
            index.insert(read);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a read at its sorted position.
    ///
    /// Returns `false` without inserting if an identical read is already
    /// stored.
    pub fn insert(&mut self, read: AlignedRead) -> bool {
        let key = (read.start(), read.end());
        let lower = self
            .entries
            .partition_point(|e| (e.read.start(), e.read.end()) < key);
        let upper = lower
            + self.entries[lower..]
                .partition_point(|e| (e.read.start(), e.read.end()) == key);

        if self.entries[lower..upper].iter().any(|e| e.read == read) {
            return false;
        }

        let order = self.next_order;
        self.next_order += 1;
        self.entries.insert(upper, Entry { read, order });
        self.prefix_max_end.insert(upper, 0);
        self.refresh_prefix_max(upper);
        true
    }

    fn refresh_prefix_max(&mut self, from: usize) {
        let mut running = if from == 0 {
            0
        } else {
            self.prefix_max_end[from - 1]
        };
        for i in from..self.entries.len() {
            running = max(running, self.entries[i].read.end());
            self.prefix_max_end[i] = running;
        }
    }

    /// Index range that can hold reads covering `position`.
    fn candidate_range(&self, position: GenomicPos) -> (usize, usize) {
        // Everything at or past `hi` starts after `position`.
        let hi = self.entries.partition_point(|e| e.read.start() <= position);
        // Everything before `lo` ends before `position`.
        let lo = self.prefix_max_end[..hi].partition_point(|&end| end < position);
        (lo, hi)
    }

    /// All reads whose closed interval contains `position`, in sorted order.
    pub fn query(&self, position: GenomicPos) -> Vec<&AlignedRead> {
        let (lo, hi) = self.candidate_range(position);
        self.entries[lo..hi]
            .iter()
            .filter(|e| e.read.end() >= position)
            .map(|e| &e.read)
            .collect()
    }

    /// The covering read with the lowest start, ties going to the read that
    /// was inserted first.
    pub fn first_covering(&self, position: GenomicPos) -> Option<&AlignedRead> {
        let (lo, hi) = self.candidate_range(position);
        let mut covering = self.entries[lo..hi]
            .iter()
            .filter(|e| e.read.end() >= position);
        let first = covering.next()?;
        let best = covering
            .take_while(|e| e.read.start() == first.read.start())
            .fold(first, |best, e| if e.order < best.order { e } else { best });
        Some(&best.read)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlignedRead> {
        self.entries.iter().map(|e| &e.read)
    }

    /// Smallest start and largest end over all stored reads.
    pub fn span(&self) -> Option<(GenomicPos, GenomicPos)> {
        let first = self.entries.first()?;
        let last_max = *self.prefix_max_end.last()?;
        Some((first.read.start(), last_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read(start: GenomicPos, end: GenomicPos, seq: &str) -> AlignedRead {
        AlignedRead::new("chr1", start, end, seq).unwrap()
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut index = IntervalIndex::new();
        assert!(index.insert(read(10, 20, "A")));
        assert!(index.insert(read(5, 30, "C")));
        assert!(index.insert(read(10, 15, "G")));
        assert!(index.insert(read(1, 2, "T")));

        let coords: Vec<_> = index.iter().map(|r| (r.start(), r.end())).collect();
        assert_eq!(coords, vec![(1, 2), (5, 30), (10, 15), (10, 20)]);
    }

    #[test]
    fn test_insert_rejects_identical_read() {
        let mut index = IntervalIndex::new();
        assert!(index.insert(read(10, 20, "ACGT")));
        assert!(!index.insert(read(10, 20, "ACGT")));
        // Same interval, different content is a different read.
        assert!(index.insert(read(10, 20, "TTTT")));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_query_boundaries() {
        let index = IntervalIndex::from_reads(vec![read(10, 20, "A"), read(15, 25, "C")]);
        assert!(index.query(9).is_empty());
        assert!(index.query(26).is_empty());
        assert_eq!(index.query(10).len(), 1);
        assert_eq!(index.query(20).len(), 2);
        assert_eq!(index.query(25).len(), 1);
        assert!(IntervalIndex::new().query(1).is_empty());
    }

    #[test]
    fn test_query_skips_nested_gap() {
        // [2,3] sits between two reads covering 5 but does not cover it.
        let index = IntervalIndex::from_reads(vec![read(1, 10, "A"), read(2, 3, "C"), read(4, 12, "G")]);
        let hits: Vec<_> = index.query(5).iter().map(|r| (r.start(), r.end())).collect();
        assert_eq!(hits, vec![(1, 10), (4, 12)]);
    }

    #[test]
    fn test_first_covering_prefers_earliest_insertion() {
        let mut index = IntervalIndex::new();
        index.insert(read(5, 30, "TTTTT"));
        index.insert(read(5, 10, "GGGGG"));
        index.insert(read(1, 3, "CCC"));
        // (5,10) sorts before (5,30) but (5,30) was inserted first.
        let best = index.first_covering(6).unwrap();
        assert_eq!(best.end(), 30);
        assert_eq!(index.first_covering(2).unwrap().start(), 1);
        assert!(index.first_covering(4).is_none());
    }

    #[test]
    fn test_span() {
        let index = IntervalIndex::from_reads(vec![read(3, 50, "A"), read(10, 20, "C")]);
        assert_eq!(index.span(), Some((3, 50)));
        assert_eq!(IntervalIndex::new().span(), None);
    }

    proptest! {
        #[test]
        fn prop_sorted_and_query_matches_scan(
            intervals in prop::collection::vec((1u64..200, 0u64..40), 0..60),
            probes in prop::collection::vec(0u64..260, 1..20),
        ) {
            let reads: Vec<AlignedRead> = intervals
                .iter()
                .enumerate()
                .map(|(i, &(s, len))| read(s, s + len, &format!("R{i}")))
                .collect();
            let index = IntervalIndex::from_reads(reads.clone());

            let stored: Vec<_> = index.iter().map(|r| (r.start(), r.end())).collect();
            let mut sorted = stored.clone();
            sorted.sort();
            prop_assert_eq!(&stored, &sorted);
            prop_assert_eq!(index.len(), reads.len());

            for p in probes {
                let mut expected: Vec<&AlignedRead> = reads.iter().filter(|r| r.contains(p)).collect();
                let mut got = index.query(p);
                // Equal-coordinate reads may appear in any relative order here.
                got.sort_by_key(|r| (r.start(), r.end(), r.sequence().to_vec()));
                expected.sort_by_key(|r| (r.start(), r.end(), r.sequence().to_vec()));
                prop_assert_eq!(got, expected);
            }
        }
    }
}

// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Temporal memory
//!
//! Bounded store of summarized past sequences. Each entry keeps a compact
//! fingerprint of the reservoir state it ended in plus output statistics.
//! Capacity is enforced on every insert; consolidation merges near-duplicate
//! entries and evicts the weakest ones through a pluggable
//! [`ConsolidationStrategy`].

use std::fmt;

use kraken_field::numeric::cosine_similarity;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{ConsolidationKind, MemoryConfig};
use crate::error::{KrakenError, Result};

/// Number of pooled reservoir buckets in a fingerprint.
pub const FINGERPRINT_DIM: usize = 16;
/// Strength added to an entry each time it is recalled.
pub const REHEARSAL_BOOST: f32 = 0.5;

/// Summary statistics of one sequence's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputSummary {
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
    pub last: f32,
}

impl OutputSummary {
    /// All zeros for an empty slice.
    pub fn from_outputs(outputs: &[f32]) -> Self {
        let Some(&last) = outputs.last() else {
            return Self::default();
        };
        let n = outputs.len() as f32;
        let mean = outputs.iter().sum::<f32>() / n;
        let var = outputs.iter().map(|y| (y - mean) * (y - mean)).sum::<f32>() / n;
        let (min, max) = outputs
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &y| {
                (lo.min(y), hi.max(y))
            });
        Self {
            mean,
            std: var.sqrt(),
            min,
            max,
            last,
        }
    }
}

/// One remembered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Assigned by the store on insert
    pub id: u64,
    /// Store clock at insert
    pub created_at: u64,
    /// Store clock at insert or most recent recall
    pub last_seen: u64,
    /// Pooled reservoir state followed by output mean and std
    pub fingerprint: Vec<f32>,
    pub summary: OutputSummary,
    /// Inputs represented, summed over merges
    pub sequence_len: usize,
    pub strength: f32,
    pub merge_count: u32,
}

impl MemoryEntry {
    pub fn from_sequence(outputs: &[f32], reservoir_state: &[f32]) -> Self {
        let summary = OutputSummary::from_outputs(outputs);
        Self {
            id: 0,
            created_at: 0,
            last_seen: 0,
            fingerprint: fingerprint_of(reservoir_state, &summary),
            summary,
            sequence_len: outputs.len(),
            strength: 1.0,
            merge_count: 0,
        }
    }

    pub fn similarity(&self, other: &MemoryEntry) -> f32 {
        cosine_similarity(&self.fingerprint, &other.fingerprint)
    }

    /// Strength decayed by the ticks since the entry was last seen.
    pub fn retention_score(&self, clock: u64, recency_decay: f32) -> f64 {
        let age = clock.saturating_sub(self.last_seen) as f64;
        self.strength as f64 * (recency_decay as f64).powf(age)
    }

    /// Fold `other` into `self`, weighting by strength.
    fn absorb(&mut self, other: MemoryEntry) {
        let total = self.strength + other.strength;
        let (wa, wb) = if total > 0.0 {
            (self.strength / total, other.strength / total)
        } else {
            (0.5, 0.5)
        };

        for (a, &b) in self.fingerprint.iter_mut().zip(&other.fingerprint) {
            *a = wa * *a + wb * b;
        }
        let newer_last = if other.last_seen >= self.last_seen {
            other.summary.last
        } else {
            self.summary.last
        };
        self.summary = OutputSummary {
            mean: wa * self.summary.mean + wb * other.summary.mean,
            std: wa * self.summary.std + wb * other.summary.std,
            min: self.summary.min.min(other.summary.min),
            max: self.summary.max.max(other.summary.max),
            last: newer_last,
        };
        self.sequence_len += other.sequence_len;
        self.strength = total;
        self.merge_count += other.merge_count + 1;
        self.created_at = self.created_at.min(other.created_at);
        self.last_seen = self.last_seen.max(other.last_seen);
    }
}

/// Pool `state` into [`FINGERPRINT_DIM`] contiguous bucket means, then append
/// the output mean and std.
pub fn fingerprint_of(state: &[f32], summary: &OutputSummary) -> Vec<f32> {
    let n = state.len();
    let mut fp = Vec::with_capacity(FINGERPRINT_DIM + 2);
    for b in 0..FINGERPRINT_DIM {
        let lo = b * n / FINGERPRINT_DIM;
        let hi = (b + 1) * n / FINGERPRINT_DIM;
        let bucket = &state[lo..hi];
        fp.push(if bucket.is_empty() {
            0.0
        } else {
            bucket.iter().sum::<f32>() / bucket.len() as f32
        });
    }
    fp.push(summary.mean);
    fp.push(summary.std);
    fp
}

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub merged: usize,
    pub evicted: usize,
}

/// Policy that shrinks a memory store to capacity.
///
/// Implementations must leave at most `max_entries` entries, must not grow
/// the store, and must keep surviving entries in their original order.
pub trait ConsolidationStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn consolidate(
        &self,
        entries: &mut Vec<MemoryEntry>,
        max_entries: usize,
        clock: u64,
    ) -> ConsolidationReport;
}

/// Merge entries whose fingerprints are at least `similarity_threshold`
/// cosine-similar, then evict the lowest retention scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityMerge {
    pub similarity_threshold: f32,
    pub recency_decay: f32,
}

impl Default for SimilarityMerge {
    fn default() -> Self {
        let config = MemoryConfig::default();
        Self {
            similarity_threshold: config.similarity_threshold,
            recency_decay: config.recency_decay,
        }
    }
}

impl ConsolidationStrategy for SimilarityMerge {
    fn name(&self) -> &str {
        "similarity_merge"
    }

    fn consolidate(
        &self,
        entries: &mut Vec<MemoryEntry>,
        max_entries: usize,
        clock: u64,
    ) -> ConsolidationReport {
        let mut report = ConsolidationReport::default();

        // Earlier entries absorb later ones; the survivor keeps its position.
        let mut i = 0;
        while i < entries.len() {
            let mut j = i + 1;
            while j < entries.len() {
                if entries[i].similarity(&entries[j]) >= self.similarity_threshold {
                    let absorbed = entries.remove(j);
                    entries[i].absorb(absorbed);
                    report.merged += 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        let decay = self.recency_decay;
        report.evicted = evict_lowest(entries, max_entries, |e| e.retention_score(clock, decay));
        report
    }
}

/// Evict the least recently seen entries. Never merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeastRecent;

impl ConsolidationStrategy for LeastRecent {
    fn name(&self) -> &str {
        "least_recent"
    }

    fn consolidate(
        &self,
        entries: &mut Vec<MemoryEntry>,
        max_entries: usize,
        _clock: u64,
    ) -> ConsolidationReport {
        ConsolidationReport {
            merged: 0,
            evicted: evict_lowest(entries, max_entries, |e| e.last_seen as f64),
        }
    }
}

/// Remove the lowest-scoring entries until `max_entries` remain. Ties go to
/// the earlier position. Survivors keep their order.
fn evict_lowest<F>(entries: &mut Vec<MemoryEntry>, max_entries: usize, score: F) -> usize
where
    F: Fn(&MemoryEntry) -> f64,
{
    if entries.len() <= max_entries {
        return 0;
    }
    let excess = entries.len() - max_entries;

    let mut ranked: Vec<(usize, f64)> = entries.iter().map(&score).enumerate().collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut doomed = vec![false; entries.len()];
    for &(idx, _) in ranked.iter().take(excess) {
        doomed[idx] = true;
    }
    let mut idx = 0;
    entries.retain(|_| {
        let keep = !doomed[idx];
        idx += 1;
        keep
    });
    excess
}

/// Store-level counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub count: usize,
    pub capacity: usize,
    pub total_strength: f32,
    pub merges: u64,
    pub evictions: u64,
}

#[derive(Debug)]
pub struct TemporalMemory {
    entries: Vec<MemoryEntry>,
    max_entries: usize,
    strategy: Box<dyn ConsolidationStrategy>,
    clock: u64,
    next_id: u64,
    merges: u64,
    evictions: u64,
}

impl TemporalMemory {
    /// Store with the default [`SimilarityMerge`] policy.
    pub fn new(max_entries: usize) -> Result<Self> {
        Self::with_strategy(max_entries, Box::new(SimilarityMerge::default()))
    }

    pub fn from_config(config: &MemoryConfig) -> Result<Self> {
        config.validate()?;
        let strategy: Box<dyn ConsolidationStrategy> = match config.strategy {
            ConsolidationKind::SimilarityMerge => Box::new(SimilarityMerge {
                similarity_threshold: config.similarity_threshold,
                recency_decay: config.recency_decay,
            }),
            ConsolidationKind::LeastRecent => Box::new(LeastRecent),
        };
        Self::with_strategy(config.max_entries, strategy)
    }

    pub fn with_strategy(
        max_entries: usize,
        strategy: Box<dyn ConsolidationStrategy>,
    ) -> Result<Self> {
        if max_entries == 0 {
            return Err(KrakenError::InvalidMemoryCapacity(max_entries));
        }
        Ok(Self {
            entries: Vec::new(),
            max_entries,
            strategy,
            clock: 0,
            next_id: 0,
            merges: 0,
            evictions: 0,
        })
    }

    /// Insert an entry, consolidating if the store goes over capacity.
    /// Returns the assigned id.
    pub fn add(&mut self, mut entry: MemoryEntry) -> u64 {
        self.clock += 1;
        entry.id = self.next_id;
        entry.created_at = self.clock;
        entry.last_seen = self.clock;
        self.next_id += 1;

        let id = entry.id;
        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            self.consolidate();
        }
        id
    }

    /// Run the strategy. Afterwards the store holds no more entries than
    /// before and no more than `max_entries`.
    pub fn consolidate(&mut self) -> ConsolidationReport {
        let before = self.entries.len();
        let mut report = self
            .strategy
            .consolidate(&mut self.entries, self.max_entries, self.clock);

        let limit = before.min(self.max_entries);
        if self.entries.len() > limit {
            warn!(
                strategy = self.strategy.name(),
                len = self.entries.len(),
                limit,
                "strategy left memory over capacity, evicting least recent"
            );
            report.evicted += evict_lowest(&mut self.entries, limit, |e| e.last_seen as f64);
        }

        self.merges += report.merged as u64;
        self.evictions += report.evicted as u64;
        if report.merged + report.evicted > 0 {
            debug!(
                strategy = self.strategy.name(),
                merged = report.merged,
                evicted = report.evicted,
                remaining = self.entries.len(),
                "temporal memory consolidated"
            );
        }
        report
    }

    /// Index and L2 distance of the entry whose fingerprint is closest.
    /// Entries with a different fingerprint length are skipped.
    pub fn find_nearest(&self, fingerprint: &[f32]) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.fingerprint.len() != fingerprint.len() {
                continue;
            }
            let dist = entry
                .fingerprint
                .iter()
                .zip(fingerprint)
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f32>()
                .sqrt();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((idx, dist));
            }
        }
        best
    }

    /// Nearest entry, rehearsed: its recency is refreshed and strength boosted.
    pub fn recall(&mut self, fingerprint: &[f32]) -> Option<&MemoryEntry> {
        let (idx, _) = self.find_nearest(fingerprint)?;
        self.clock += 1;
        let entry = &mut self.entries[idx];
        entry.last_seen = self.clock;
        entry.strength += REHEARSAL_BOOST;
        Some(&self.entries[idx])
    }

    /// Change capacity; shrinking below the current size consolidates at once.
    pub fn set_max_entries(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(KrakenError::InvalidMemoryCapacity(max_entries));
        }
        self.max_entries = max_entries;
        if self.entries.len() > max_entries {
            self.consolidate();
        }
        Ok(())
    }

    /// Drop all entries. Clock and ids keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn memories(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: u64) -> Option<&MemoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            count: self.entries.len(),
            capacity: self.max_entries,
            total_strength: self.entries.iter().map(|e| e.strength).sum(),
            merges: self.merges,
            evictions: self.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Entry whose fingerprint points along axis `axis`.
    fn axis_entry(axis: usize) -> MemoryEntry {
        let mut state = vec![0.0; FINGERPRINT_DIM];
        state[axis % FINGERPRINT_DIM] = 1.0;
        MemoryEntry::from_sequence(&[], &state)
    }

    #[test]
    fn summary_statistics() {
        let s = OutputSummary::from_outputs(&[1.0, 2.0, 3.0, 4.0]);
        assert!((s.mean - 2.5).abs() < 1e-6);
        assert!((s.std - 1.25f32.sqrt()).abs() < 1e-6);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.last, 4.0);
        assert_eq!(OutputSummary::from_outputs(&[]), OutputSummary::default());
    }

    #[test]
    fn fingerprint_pools_state() {
        let state: Vec<f32> = (0..32).map(|i| i as f32).collect();
        let summary = OutputSummary::from_outputs(&[0.5, 0.5]);
        let fp = fingerprint_of(&state, &summary);
        assert_eq!(fp.len(), FINGERPRINT_DIM + 2);
        assert!((fp[0] - 0.5).abs() < 1e-6);
        assert!((fp[15] - 30.5).abs() < 1e-6);
        assert_eq!(fp[16], 0.5);
        assert_eq!(fp[17], 0.0);
    }

    #[test]
    fn fingerprint_of_tiny_state_has_empty_buckets() {
        let fp = fingerprint_of(&[2.0, 4.0], &OutputSummary::default());
        assert_eq!(fp.len(), FINGERPRINT_DIM + 2);
        assert_eq!(fp.iter().filter(|&&v| v != 0.0).count(), 2);
    }

    #[test]
    fn add_assigns_ids_and_clock() {
        let mut mem = TemporalMemory::new(10).unwrap();
        let a = mem.add(axis_entry(0));
        let b = mem.add(axis_entry(1));
        assert_eq!((a, b), (0, 1));
        assert_eq!(mem.len(), 2);
        assert_eq!(mem.memories()[1].created_at, 2);
        assert_eq!(mem.get(1).unwrap().last_seen, 2);
        assert_eq!(mem.clock(), 2);
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            TemporalMemory::new(0),
            Err(KrakenError::InvalidMemoryCapacity(0))
        ));
        let mut mem = TemporalMemory::new(3).unwrap();
        assert!(mem.set_max_entries(0).is_err());
        assert_eq!(mem.max_entries(), 3);
    }

    #[test]
    fn capacity_holds_on_every_add() {
        let mut mem = TemporalMemory::new(5).unwrap();
        for i in 0..40 {
            mem.add(axis_entry(i));
            assert!(mem.len() <= 5);
        }
        assert_eq!(mem.len(), 5);
    }

    #[test]
    fn no_consolidation_below_capacity() {
        let mut mem = TemporalMemory::new(10).unwrap();
        for _ in 0..5 {
            mem.add(axis_entry(3));
        }
        assert_eq!(mem.len(), 5);
        assert_eq!(mem.stats().merges, 0);
    }

    #[test]
    fn similarity_merge_folds_duplicates() {
        let mut mem = TemporalMemory::new(10).unwrap();
        for _ in 0..4 {
            mem.add(axis_entry(2));
        }
        mem.add(axis_entry(5));
        let report = mem.consolidate();
        assert_eq!(report, ConsolidationReport { merged: 3, evicted: 0 });
        assert_eq!(mem.len(), 2);

        let merged = &mem.memories()[0];
        assert_eq!(merged.id, 0);
        assert_eq!(merged.merge_count, 3);
        assert!((merged.strength - 4.0).abs() < 1e-6);
        assert_eq!(merged.created_at, 1);
        assert_eq!(merged.last_seen, 4);
        assert_eq!(mem.memories()[1].id, 4);
        assert_eq!(mem.stats().merges, 3);
    }

    #[test]
    fn consolidation_never_grows_store() {
        let mut mem = TemporalMemory::new(50).unwrap();
        for i in 0..30 {
            mem.add(axis_entry(i));
        }
        let before = mem.len();
        mem.consolidate();
        assert!(mem.len() <= before);
        assert!(mem.len() <= 50);
    }

    #[test]
    fn eviction_prefers_weak_then_old() {
        let strategy = SimilarityMerge {
            similarity_threshold: 1.1,
            recency_decay: 1.0,
        };
        let mut mem = TemporalMemory::with_strategy(3, Box::new(strategy)).unwrap();
        mem.add(axis_entry(0));
        mem.add(axis_entry(1));
        mem.add(axis_entry(2));
        mem.recall(&axis_entry(0).fingerprint);
        mem.add(axis_entry(3));

        let ids: Vec<u64> = mem.memories().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
        assert_eq!(mem.stats().evictions, 1);
    }

    #[test]
    fn least_recent_evicts_oldest_and_never_merges() {
        let mut mem = TemporalMemory::with_strategy(3, Box::new(LeastRecent)).unwrap();
        for _ in 0..3 {
            mem.add(axis_entry(7));
        }
        mem.recall(&axis_entry(7).fingerprint);
        mem.add(axis_entry(7));

        let ids: Vec<u64> = mem.memories().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
        assert_eq!(mem.stats().merges, 0);
        assert_eq!(mem.strategy_name(), "least_recent");
    }

    #[test]
    fn from_config_selects_strategy() {
        let config = MemoryConfig {
            strategy: ConsolidationKind::LeastRecent,
            ..MemoryConfig::default()
        };
        let mem = TemporalMemory::from_config(&config).unwrap();
        assert_eq!(mem.strategy_name(), "least_recent");
        assert_eq!(mem.max_entries(), 1000);
        let mem = TemporalMemory::from_config(&MemoryConfig::default()).unwrap();
        assert_eq!(mem.strategy_name(), "similarity_merge");
    }

    #[derive(Debug)]
    struct Hoarder;

    impl ConsolidationStrategy for Hoarder {
        fn name(&self) -> &str {
            "hoarder"
        }

        fn consolidate(&self, _: &mut Vec<MemoryEntry>, _: usize, _: u64) -> ConsolidationReport {
            ConsolidationReport::default()
        }
    }

    #[test]
    fn capacity_enforced_even_if_strategy_does_nothing() {
        let mut mem = TemporalMemory::with_strategy(4, Box::new(Hoarder)).unwrap();
        for i in 0..10 {
            mem.add(axis_entry(i));
        }
        assert_eq!(mem.len(), 4);
        let ids: Vec<u64> = mem.memories().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![6, 7, 8, 9]);
    }

    #[test]
    fn set_max_entries_shrinks_store() {
        let mut mem = TemporalMemory::new(20).unwrap();
        for i in 0..12 {
            mem.add(axis_entry(i));
        }
        mem.set_max_entries(4).unwrap();
        assert_eq!(mem.max_entries(), 4);
        assert!(mem.len() <= 4);

        mem.set_max_entries(100).unwrap();
        assert!(mem.len() <= 4);
    }

    #[test]
    fn find_nearest_and_recall() {
        let mut mem = TemporalMemory::new(10).unwrap();
        assert!(mem.find_nearest(&axis_entry(0).fingerprint).is_none());

        mem.add(axis_entry(0));
        mem.add(axis_entry(1));
        let (idx, dist) = mem.find_nearest(&axis_entry(1).fingerprint).unwrap();
        assert_eq!(idx, 1);
        assert!(dist < 1e-6);
        assert!(mem.find_nearest(&[1.0, 2.0]).is_none());

        let recalled = mem.recall(&axis_entry(1).fingerprint).unwrap();
        assert_eq!(recalled.id, 1);
        assert_eq!(recalled.last_seen, 3);
        assert!((recalled.strength - (1.0 + REHEARSAL_BOOST)).abs() < 1e-6);
    }

    #[test]
    fn clear_keeps_ids_monotonic() {
        let mut mem = TemporalMemory::new(10).unwrap();
        mem.add(axis_entry(0));
        mem.add(axis_entry(1));
        mem.clear();
        assert!(mem.is_empty());
        assert_eq!(mem.add(axis_entry(2)), 2);
    }

    #[test]
    fn stats_report_strength() {
        let mut mem = TemporalMemory::new(10).unwrap();
        mem.add(axis_entry(0));
        mem.add(axis_entry(1));
        let stats = mem.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.capacity, 10);
        assert!((stats.total_strength - 2.0).abs() < 1e-6);
    }
}

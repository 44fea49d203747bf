use log::debug;

use crate::config::LayoutOptions;
use crate::graph::{DeltaOutcome, GraphStore, ScanEntry};
use crate::layout::{
    LayoutSnapshot, compute_full_layout, try_append, try_partition,
};

/// Strategy usage counters. Part of the observable contract: tests and the
/// instrumentation collaborator assert against these, they are not debug
/// output.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    pub cycles: u64,
    pub fast_appends: u64,
    pub partitions_applied: u64,
    pub partitions_skipped: u64,
    pub last_partition_skip: Option<String>,
}

type DiagSink = Box<dyn FnMut(&str, &str)>;

/// Owns the graph store and the previous layout baseline, and picks the
/// cheapest safe recompute strategy each cycle: incremental append, then
/// partitioned recompute, then full layout. First success wins; the full
/// layout is the always-correct fallback.
///
/// Single-writer discipline: callers serialize `apply_delta` and
/// `run_cycle`, there is no interior locking.
pub struct LayoutEngine {
    store: GraphStore,
    options: LayoutOptions,
    previous: Option<LayoutSnapshot>,
    stats: EngineStats,
    diag: Option<DiagSink>,
}

impl LayoutEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            store: GraphStore::new(),
            options,
            previous: None,
            stats: EngineStats::default(),
            diag: None,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn previous(&self) -> Option<&LayoutSnapshot> {
        self.previous.as_ref()
    }

    /// Install a sink for fast-path diagnostics (stage name + context).
    pub fn set_diagnostics(&mut self, sink: impl FnMut(&str, &str) + 'static) {
        self.diag = Some(Box::new(sink));
    }

    /// Replace the expanded-aggregate set. Drops the baseline: expansion
    /// changes placement globally, so the next cycle is a full layout.
    pub fn set_expanded(&mut self, expanded: std::collections::HashSet<String>) {
        self.options.expanded = expanded;
        self.previous = None;
    }

    /// Absorb one delta batch into the graph store.
    pub fn apply_delta(&mut self, entries: &[ScanEntry]) -> DeltaOutcome {
        self.store.apply_delta(entries)
    }

    /// Run one layout cycle for the given batch outcome.
    pub fn run_cycle(&mut self, outcome: &DeltaOutcome) -> &LayoutSnapshot {
        self.stats.cycles += 1;
        let next = match self.previous.take() {
            Some(previous) => self.incremental_cycle(outcome, previous),
            None => {
                debug!("full layout over {} nodes (no baseline)", self.store.len());
                compute_full_layout(&self.store, &self.options)
            }
        };
        self.previous.insert(next)
    }

    fn incremental_cycle(
        &mut self,
        outcome: &DeltaOutcome,
        previous: LayoutSnapshot,
    ) -> LayoutSnapshot {
        if outcome.is_empty() {
            return previous;
        }

        if outcome.updated.is_empty() && outcome.hydrated.is_empty() {
            match try_append(&self.store, &self.options, &outcome.added, &previous) {
                Ok(snapshot) => {
                    self.stats.fast_appends += 1;
                    debug!("fast append placed {} new points", outcome.added.len());
                    return snapshot;
                }
                Err(skip) => debug!("fast append skipped ({}): {skip}", skip.code()),
            }
        }

        let dirty = outcome.dirty_paths();
        let mut sink = self.diag.take();
        let result = {
            let mut forward = |stage: &str, context: &str| {
                debug!("partition {stage}: {context}");
                if let Some(sink) = sink.as_mut() {
                    sink(stage, context);
                }
            };
            try_partition(&self.store, &self.options, &dirty, &previous, &mut forward)
        };
        self.diag = sink;
        match result {
            Ok(snapshot) => {
                self.stats.partitions_applied += 1;
                return snapshot;
            }
            Err(skip) => {
                self.stats.partitions_skipped += 1;
                self.stats.last_partition_skip = Some(skip.code().to_string());
                debug!("partition skipped ({}): {skip}", skip.code());
            }
        }

        debug!("full layout over {} nodes", self.store.len());
        compute_full_layout(&self.store, &self.options)
    }
}

//! Incremental hierarchical layout engine for directory-tree "metro map"
//! visualizations.
//!
//! Delta batches from a filesystem scanner arrive in arbitrary order; the
//! [`GraphStore`] keeps the tree structurally sound by synthesizing
//! placeholder ancestors, and the [`LayoutEngine`] turns each batch into a
//! positioned point list, preferring cheap tail-append or subtree-bounded
//! recomputes and falling back to the deterministic full layout whenever a
//! guard fails.

pub mod config;
pub mod engine;
pub mod graph;
pub mod ident;
pub mod layout;

pub use config::{LayoutOptions, load_options};
pub use engine::{EngineStats, LayoutEngine};
pub use graph::{DeltaOutcome, FileNode, GraphStore, NodeKind, ScanEntry};
pub use layout::{
    AppendSkip, BoundingBox, ConnectorRoute, LayoutPoint, LayoutSnapshot, PartitionSkip,
    PathCommand, compute_full_layout, route_connector, try_append, try_partition,
};

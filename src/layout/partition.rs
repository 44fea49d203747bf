use thiserror::Error;

use super::full::{Walker, sorted_group};
use super::types::LayoutSnapshot;
use crate::config::LayoutOptions;
use crate::graph::{GraphStore, parent_path};

/// Why the subtree-bounded recompute declined a dirty set. Stable reason
/// codes, mirrored through the diagnostic callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionSkip {
    #[error("dirty set is empty")]
    EmptyDirty,
    #[error("dirty paths share no common subtree")]
    DisjointRoots,
    #[error("subtree root {0} is unknown to the graph store")]
    UnknownRoot(String),
    #[error("subtree root {0} is absent from the previous layout")]
    RootNotPlaced(String),
    #[error("subtree root {0} is not the last sibling of its group")]
    NotLastSibling(String),
    #[error("a group inside subtree {0} requires aggregation")]
    AggregationInside(String),
    #[error("subtree points are not contiguous in the previous layout")]
    FragmentedRange,
}

impl PartitionSkip {
    pub fn code(&self) -> &'static str {
        match self {
            PartitionSkip::EmptyDirty => "empty-dirty",
            PartitionSkip::DisjointRoots => "disjoint-roots",
            PartitionSkip::UnknownRoot(_) => "unknown-root",
            PartitionSkip::RootNotPlaced(_) => "root-not-placed",
            PartitionSkip::NotLastSibling(_) => "not-last-sibling",
            PartitionSkip::AggregationInside(_) => "aggregation-inside",
            PartitionSkip::FragmentedRange => "fragmented-range",
        }
    }
}

fn in_subtree(path: &str, root: &str, prefix: &str) -> bool {
    path == root || path.starts_with(prefix)
}

/// Subtree-bounded fast path for edits deeper than a simple tail append.
/// Every abort and every success reports (stage, context) through `diag`,
/// so callers and tests can assert why an optimization fired or didn't.
pub fn try_partition(
    store: &GraphStore,
    options: &LayoutOptions,
    dirty: &[String],
    previous: &LayoutSnapshot,
    diag: &mut dyn FnMut(&str, &str),
) -> Result<LayoutSnapshot, PartitionSkip> {
    if dirty.is_empty() {
        diag("prefix", "empty dirty set");
        return Err(PartitionSkip::EmptyDirty);
    }

    // Stage 1: deepest common path prefix across all dirty paths, lifted to
    // the nearest ancestor the previous layout actually placed (fresh paths
    // have no baseline point of their own).
    let Some(mut root) = common_prefix(dirty) else {
        diag("prefix", "no common subtree for dirty paths");
        return Err(PartitionSkip::DisjointRoots);
    };
    while !previous.index.contains_key(&root) {
        match parent_path(&root) {
            Some(parent) => root = parent,
            None => {
                diag("prefix", &format!("no placed ancestor for {root}"));
                return Err(PartitionSkip::RootNotPlaced(root));
            }
        }
    }
    let prefix = format!("{root}/");

    // Stage 2: pure metadata updates with an unchanged descendant count
    // reuse the previous layout verbatim.
    let all_leaves = dirty
        .iter()
        .all(|path| store.node(path).is_some_and(|node| node.children.is_empty()));
    if all_leaves {
        let prior_count = previous
            .points
            .iter()
            .filter(|point| in_subtree(&point.path, &root, &prefix))
            .count();
        if prior_count == 1 + store.descendant_count(&root) {
            diag("metadata", &format!("subtree {root} position-preserving"));
            return Ok(previous.clone());
        }
    }

    // Stage 3: the subtree root must be the last of its own siblings, so
    // recomputing its interior cannot shift anything outside it.
    let root_node = store.node(&root).ok_or_else(|| {
        diag("tail", &format!("subtree root {root} unknown"));
        PartitionSkip::UnknownRoot(root.clone())
    })?;
    let sibling_paths = match &root_node.parent {
        Some(parent) => store
            .node(parent)
            .map(|node| node.children.clone())
            .unwrap_or_default(),
        None => store.roots().to_vec(),
    };
    let siblings = sorted_group(store, &sibling_paths);
    let is_last = siblings.last().is_some_and(|last| last.path == root_node.path);
    if !is_last {
        diag("tail", &format!("subtree root {root} is not last among siblings"));
        return Err(PartitionSkip::NotLastSibling(root));
    }

    // Stage 4: synthetic-node regeneration is not handled here.
    if let Some(wide) = find_wide_group(store, &root, options.aggregation_threshold) {
        diag("aggregation", &format!("group under {wide} exceeds threshold"));
        return Err(PartitionSkip::AggregationInside(root));
    }

    // Stage 5: recompute the subtree interior with the reference placement
    // logic, resuming the position counter just past the root's slot.
    let root_idx = *previous.index.get(&root).ok_or_else(|| {
        diag("splice", &format!("subtree root {root} absent from baseline"));
        PartitionSkip::RootNotPlaced(root.clone())
    })?;
    let mut end = root_idx + 1;
    while end < previous.points.len() && previous.points[end].path.starts_with(&prefix) {
        end += 1;
    }
    if previous.points[end..]
        .iter()
        .any(|point| point.path.starts_with(&prefix))
    {
        diag("splice", &format!("subtree {root} fragmented in baseline"));
        return Err(PartitionSkip::FragmentedRange);
    }

    let root_point = &previous.points[root_idx];
    let mut walker = Walker::new(store, options, root_point.slot + 1);
    let children = sorted_group(store, &root_node.children);
    walker.place_group(&children, root_point.depth + 1);
    let interior = walker.into_points();

    let mut points = Vec::with_capacity(root_idx + 1 + interior.len() + previous.points.len() - end);
    points.extend_from_slice(&previous.points[..=root_idx]);
    points.extend(interior);
    points.extend_from_slice(&previous.points[end..]);
    diag(
        "splice",
        &format!("subtree {root} recomputed, {} points", points.len()),
    );
    Ok(LayoutSnapshot::from_points(points))
}

/// Deepest path that is an ancestor-or-self of every dirty path.
fn common_prefix(dirty: &[String]) -> Option<String> {
    let mut candidate = dirty[0].clone();
    loop {
        let prefix = format!("{candidate}/");
        if dirty
            .iter()
            .all(|path| in_subtree(path, &candidate, &prefix))
        {
            return Some(candidate);
        }
        candidate = parent_path(&candidate)?;
    }
}

/// First node at or below `root` whose child group exceeds the threshold.
fn find_wide_group(store: &GraphStore, root: &str, threshold: usize) -> Option<String> {
    let node = store.node(root)?;
    if node.children.len() > threshold {
        return Some(root.to_string());
    }
    for child in &node.children {
        if let Some(wide) = find_wide_group(store, child, threshold) {
            return Some(wide);
        }
    }
    None
}

use thiserror::Error;

use super::types::LayoutSnapshot;
use crate::config::LayoutOptions;
use crate::graph::{FileNode, GraphStore};
use crate::ident::sibling_cmp;

/// Why the tail-append fast path declined a batch. Stable reason codes;
/// the orchestrator falls back and reports them, nothing fails silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendSkip {
    #[error("no added paths to append")]
    EmptyBatch,
    #[error("added path {0} is unknown to the graph store")]
    UnknownPath(String),
    #[error("added paths are top-level roots")]
    TopLevel,
    #[error("added paths span multiple parents")]
    MixedParents,
    #[error("added path {0} already has children")]
    HasChildren(String),
    #[error("parent {0} is missing from the previous layout")]
    UnknownParent(String),
    #[error("parent subtree is not the tail of the previous ordering")]
    NotTail,
    #[error("sibling group would cross the aggregation threshold")]
    CrossesAggregation,
    #[error("effective spacing changed for the sibling group")]
    SpacingChanged,
    #[error("added paths do not sort strictly after existing siblings")]
    OrderingViolation,
}

impl AppendSkip {
    pub fn code(&self) -> &'static str {
        match self {
            AppendSkip::EmptyBatch => "empty-batch",
            AppendSkip::UnknownPath(_) => "unknown-path",
            AppendSkip::TopLevel => "top-level",
            AppendSkip::MixedParents => "mixed-parents",
            AppendSkip::HasChildren(_) => "has-children",
            AppendSkip::UnknownParent(_) => "unknown-parent",
            AppendSkip::NotTail => "not-tail",
            AppendSkip::CrossesAggregation => "crosses-aggregation",
            AppendSkip::SpacingChanged => "spacing-changed",
            AppendSkip::OrderingViolation => "ordering-violation",
        }
    }
}

/// Tail-only fast path: place freshly added leaf siblings by continuing the
/// previous layout's position counter, without revisiting any prior point.
/// Succeeds only when every guard holds; correctness always wins over speed.
pub fn try_append(
    store: &GraphStore,
    options: &LayoutOptions,
    added: &[String],
    previous: &LayoutSnapshot,
) -> Result<LayoutSnapshot, AppendSkip> {
    if added.is_empty() {
        return Err(AppendSkip::EmptyBatch);
    }

    // Guard 1: one shared parent, no children of their own.
    let mut nodes: Vec<&FileNode> = Vec::with_capacity(added.len());
    for path in added {
        let node = store
            .node(path)
            .ok_or_else(|| AppendSkip::UnknownPath(path.clone()))?;
        if !node.children.is_empty() {
            return Err(AppendSkip::HasChildren(path.clone()));
        }
        nodes.push(node);
    }
    let parent = match &nodes[0].parent {
        Some(parent) => parent.clone(),
        None => return Err(AppendSkip::TopLevel),
    };
    if nodes.iter().any(|node| node.parent.as_deref() != Some(parent.as_str())) {
        return Err(AppendSkip::MixedParents);
    }
    let parent_node = store
        .node(&parent)
        .ok_or_else(|| AppendSkip::UnknownParent(parent.clone()))?;

    // Guard 2: the parent's prior subtree must be the suffix of the previous
    // global ordering, otherwise new tail slots would collide with points
    // placed after it.
    let parent_idx = *previous
        .index
        .get(&parent)
        .ok_or_else(|| AppendSkip::UnknownParent(parent.clone()))?;
    let subtree_prefix = format!("{parent}/");
    if !previous.points[parent_idx + 1..]
        .iter()
        .all(|point| point.path.starts_with(&subtree_prefix))
    {
        return Err(AppendSkip::NotTail);
    }

    // Guard 3: sibling count stays under the aggregation threshold.
    let new_total = parent_node.children.len();
    if new_total > options.aggregation_threshold {
        return Err(AppendSkip::CrossesAggregation);
    }

    // Guard 4: the grown group's effective spacing must match the spacing
    // the baseline siblings were actually placed with, otherwise the prior
    // points would need to move.
    let existing: Vec<&FileNode> = parent_node
        .children
        .iter()
        .filter(|path| !added.contains(*path))
        .filter_map(|path| store.node(path))
        .collect();
    let spacing = options.effective_spacing(new_total);
    if let Some(first_existing) = existing.first() {
        let placed = previous
            .point(&first_existing.path)
            .ok_or(AppendSkip::NotTail)?;
        if spacing != placed.spacing {
            return Err(AppendSkip::SpacingChanged);
        }
    }

    // Guard 5: every added node sorts strictly after every pre-existing
    // sibling, so no mid-sequence insertion is required.
    let mut ordered = nodes.clone();
    ordered.sort_by(|a, b| sibling_cmp(a, b));
    for existing_node in &existing {
        if sibling_cmp(existing_node, ordered[0]) != std::cmp::Ordering::Less {
            return Err(AppendSkip::OrderingViolation);
        }
    }

    // All guards hold: merge new tail points into a copy of the baseline.
    let last_slot = previous
        .points
        .last()
        .map(|point| point.slot)
        .unwrap_or(0);
    let depth = previous.points[parent_idx].depth + 1;
    let mut snapshot = previous.clone();
    for (offset, node) in ordered.iter().enumerate() {
        let slot = last_slot + 1 + offset as u32;
        let x = slot as f32 * spacing;
        let y = depth as f32 * options.vertical_spacing;
        snapshot.index.insert(node.path.clone(), snapshot.points.len());
        snapshot.points.push(super::types::LayoutPoint {
            path: node.path.clone(),
            x,
            y,
            depth,
            aggregated: false,
            member_count: 0,
            members: Vec::new(),
            expanded: false,
            slot,
            spacing,
        });
        snapshot.bounds.include(x, y);
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, ScanEntry};
    use crate::layout::full::compute_full_layout;

    fn entry(path: &str, kind: NodeKind, depth: usize) -> ScanEntry {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        ScanEntry {
            path: path.to_string(),
            name,
            kind,
            depth,
            size: None,
            modified: None,
            error: None,
        }
    }

    fn seeded() -> (GraphStore, LayoutOptions, LayoutSnapshot) {
        let mut store = GraphStore::new();
        store.apply_delta(&[
            entry("/root", NodeKind::Directory, 0),
            entry("/root/files", NodeKind::Directory, 1),
            entry("/root/files/f00", NodeKind::File, 2),
            entry("/root/files/f01", NodeKind::File, 2),
        ]);
        let options = LayoutOptions::default();
        let previous = compute_full_layout(&store, &options);
        (store, options, previous)
    }

    #[test]
    fn tail_append_matches_full_recompute() {
        let (mut store, options, previous) = seeded();
        let added = vec![
            "/root/files/f02".to_string(),
            "/root/files/f03".to_string(),
        ];
        store.apply_delta(&[
            entry("/root/files/f02", NodeKind::File, 2),
            entry("/root/files/f03", NodeKind::File, 2),
        ]);

        let fast = try_append(&store, &options, &added, &previous).unwrap();
        let full = compute_full_layout(&store, &options);
        assert_eq!(fast.len(), full.len());
        for (a, b) in fast.points.iter().zip(full.points.iter()) {
            assert_eq!(a.path, b.path);
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
            assert_eq!(a.slot, b.slot);
        }
        assert_eq!(fast.bounds, full.bounds);
    }

    #[test]
    fn prior_points_are_not_revisited() {
        let (mut store, options, previous) = seeded();
        store.apply_delta(&[entry("/root/files/f02", NodeKind::File, 2)]);
        let fast =
            try_append(&store, &options, &["/root/files/f02".to_string()], &previous).unwrap();
        for (idx, point) in previous.points.iter().enumerate() {
            assert_eq!(fast.points[idx].path, point.path);
            assert_eq!(fast.points[idx].x.to_bits(), point.x.to_bits());
        }
    }

    #[test]
    fn mixed_parents_are_rejected() {
        let (mut store, options, previous) = seeded();
        store.apply_delta(&[
            entry("/root/files/f02", NodeKind::File, 2),
            entry("/root/other", NodeKind::File, 1),
        ]);
        let added = vec!["/root/files/f02".to_string(), "/root/other".to_string()];
        assert_eq!(
            try_append(&store, &options, &added, &previous).unwrap_err(),
            AppendSkip::MixedParents
        );
    }

    #[test]
    fn non_tail_parent_is_rejected() {
        let mut store = GraphStore::new();
        store.apply_delta(&[
            entry("/root", NodeKind::Directory, 0),
            entry("/root/alpha", NodeKind::Directory, 1),
            entry("/root/alpha/a0", NodeKind::File, 2),
            entry("/root/beta", NodeKind::Directory, 1),
            entry("/root/beta/b0", NodeKind::File, 2),
        ]);
        let options = LayoutOptions::default();
        let previous = compute_full_layout(&store, &options);
        // alpha sorts before beta, so its subtree is not the global suffix.
        store.apply_delta(&[entry("/root/alpha/a1", NodeKind::File, 2)]);
        assert_eq!(
            try_append(
                &store,
                &options,
                &["/root/alpha/a1".to_string()],
                &previous
            )
            .unwrap_err(),
            AppendSkip::NotTail
        );
    }

    #[test]
    fn crossing_the_aggregation_threshold_is_rejected() {
        let (mut store, mut options, _) = seeded();
        options.aggregation_threshold = 3;
        let previous = compute_full_layout(&store, &options);
        store.apply_delta(&[
            entry("/root/files/f02", NodeKind::File, 2),
            entry("/root/files/f03", NodeKind::File, 2),
        ]);
        let added = vec![
            "/root/files/f02".to_string(),
            "/root/files/f03".to_string(),
        ];
        assert_eq!(
            try_append(&store, &options, &added, &previous).unwrap_err(),
            AppendSkip::CrossesAggregation
        );
    }

    #[test]
    fn spacing_change_is_rejected() {
        let mut store = GraphStore::new();
        let mut batch = vec![
            entry("/root", NodeKind::Directory, 0),
            entry("/root/files", NodeKind::Directory, 1),
        ];
        for i in 0..6 {
            batch.push(entry(&format!("/root/files/f{i:02}"), NodeKind::File, 2));
        }
        store.apply_delta(&batch);
        let options = LayoutOptions::default();
        let previous = compute_full_layout(&store, &options);
        // 6 -> 7 siblings crosses the spacing threshold of 6.
        store.apply_delta(&[entry("/root/files/f06", NodeKind::File, 2)]);
        assert_eq!(
            try_append(
                &store,
                &options,
                &["/root/files/f06".to_string()],
                &previous
            )
            .unwrap_err(),
            AppendSkip::SpacingChanged
        );
    }

    #[test]
    fn spacing_drift_from_the_baseline_is_rejected() {
        // The baseline was placed under different options; appending with
        // the new spacing would put the tail on a different grid than the
        // untouched siblings.
        let (mut store, _, previous) = seeded();
        let options = LayoutOptions {
            base_spacing: 200.0,
            ..LayoutOptions::default()
        };
        store.apply_delta(&[entry("/root/files/f02", NodeKind::File, 2)]);
        assert_eq!(
            try_append(
                &store,
                &options,
                &["/root/files/f02".to_string()],
                &previous
            )
            .unwrap_err(),
            AppendSkip::SpacingChanged
        );
    }

    #[test]
    fn mid_sequence_insertion_is_rejected() {
        let (mut store, options, previous) = seeded();
        // "a-first" sorts before the existing f00/f01 siblings.
        store.apply_delta(&[entry("/root/files/a-first", NodeKind::File, 2)]);
        assert_eq!(
            try_append(
                &store,
                &options,
                &["/root/files/a-first".to_string()],
                &previous
            )
            .unwrap_err(),
            AppendSkip::OrderingViolation
        );
    }
}

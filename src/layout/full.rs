use super::types::{LayoutPoint, LayoutSnapshot};
use crate::config::LayoutOptions;
use crate::graph::{FileNode, GraphStore};
use crate::ident::{aggregate_path, sibling_cmp};

/// Reference placement: pre-order depth-first walk over the whole graph
/// with a single global position counter. Identical graph snapshot plus
/// identical options yields bit-identical output; every fast path must
/// reproduce these coordinates exactly or abort.
pub fn compute_full_layout(store: &GraphStore, options: &LayoutOptions) -> LayoutSnapshot {
    let mut walker = Walker::new(store, options, 0);
    let roots = sorted_group(store, store.roots());
    walker.place_group(&roots, 0);
    LayoutSnapshot::from_points(walker.into_points())
}

/// Resolve a sibling path list against the store and apply the total
/// sibling ordering.
pub(crate) fn sorted_group<'a>(store: &'a GraphStore, paths: &[String]) -> Vec<&'a FileNode> {
    let mut group: Vec<&FileNode> = paths.iter().filter_map(|path| store.node(path)).collect();
    group.sort_by(|a, b| sibling_cmp(a, b));
    group
}

/// Depth-first placement cursor. Shared between the full layout and the
/// partitioned recompute, which resumes it mid-tree.
pub(crate) struct Walker<'a> {
    store: &'a GraphStore,
    options: &'a LayoutOptions,
    cursor: u32,
    points: Vec<LayoutPoint>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(store: &'a GraphStore, options: &'a LayoutOptions, cursor: u32) -> Self {
        Self {
            store,
            options,
            cursor,
            points: Vec::new(),
        }
    }

    pub(crate) fn into_points(self) -> Vec<LayoutPoint> {
        self.points
    }

    /// Place one sorted sibling group. Spacing adapts to the REAL group
    /// size even when the group collapses into an aggregate, so collapsing
    /// and expanding never changes the spacing regime.
    pub(crate) fn place_group(&mut self, group: &[&FileNode], depth: usize) {
        if group.is_empty() {
            return;
        }
        let spacing = self.options.effective_spacing(group.len());
        if group.len() > self.options.aggregation_threshold {
            let members: Vec<String> = group.iter().map(|node| node.path.clone()).collect();
            let path = aggregate_path(&members);
            let expanded = self.options.expanded.contains(&path);
            self.push_aggregate(path, depth, spacing, members, expanded);
            if expanded {
                for node in group {
                    self.place_node(node, depth, spacing);
                }
            }
            // Collapsed members and their descendants consume no positions.
            return;
        }
        for node in group {
            self.place_node(node, depth, spacing);
        }
    }

    fn place_node(&mut self, node: &FileNode, depth: usize, spacing: f32) {
        self.push_point(&node.path, depth, spacing);
        if !node.children.is_empty() {
            let children = sorted_group(self.store, &node.children);
            self.place_group(&children, depth + 1);
        }
    }

    fn push_point(&mut self, path: &str, depth: usize, spacing: f32) {
        let slot = self.take_slot();
        self.points.push(LayoutPoint {
            path: path.to_string(),
            x: slot as f32 * spacing,
            y: depth as f32 * self.options.vertical_spacing,
            depth,
            aggregated: false,
            member_count: 0,
            members: Vec::new(),
            expanded: false,
            slot,
            spacing,
        });
    }

    fn push_aggregate(
        &mut self,
        path: String,
        depth: usize,
        spacing: f32,
        members: Vec<String>,
        expanded: bool,
    ) {
        let slot = self.take_slot();
        self.points.push(LayoutPoint {
            path,
            x: slot as f32 * spacing,
            y: depth as f32 * self.options.vertical_spacing,
            depth,
            aggregated: true,
            member_count: members.len(),
            members,
            expanded,
            slot,
            spacing,
        });
    }

    fn take_slot(&mut self) -> u32 {
        let slot = self.cursor;
        self.cursor += 1;
        slot
    }
}

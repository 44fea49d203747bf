use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Kind of a filesystem entry. Synthesized placeholders are always
/// directories until hydrated by a real scan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry from the scanning collaborator. Batches arrive unordered:
/// descendants may be seen before their ancestors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEntry {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    #[serde(default)]
    pub size: Option<u64>,
    /// Modification time, unix millis.
    #[serde(default)]
    pub modified: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Path-keyed node record. Child references are path strings, so the store
/// is an arena rather than a pointer graph.
#[derive(Debug, Clone, Serialize)]
pub struct FileNode {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub size: Option<u64>,
    pub modified: Option<i64>,
    pub error: Option<String>,
    /// Set while the node exists only because a descendant arrived first.
    /// Transitions true -> false exactly once, never back.
    pub placeholder: bool,
}

/// What a delta batch actually did to the store.
#[derive(Debug, Clone, Default)]
pub struct DeltaOutcome {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub hydrated: Vec<String>,
}

impl DeltaOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.hydrated.is_empty()
    }

    /// All paths touched by the batch, deduplicated and sorted so the
    /// downstream fast paths see a deterministic dirty set.
    pub fn dirty_paths(&self) -> Vec<String> {
        let mut dirty: Vec<String> = self
            .added
            .iter()
            .chain(self.updated.iter())
            .chain(self.hydrated.iter())
            .cloned()
            .collect();
        dirty.sort();
        dirty.dedup();
        dirty
    }
}

/// Normalize to forward slashes and strip trailing separators. Mixed
/// separator conventions inside one tree are folded here, at ingestion.
pub(crate) fn normalize_path(path: &str) -> String {
    let mut out = path.replace('\\', "/");
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Everything before the final separator; `None` for top-level paths.
pub(crate) fn parent_path(path: &str) -> Option<String> {
    match path.rfind('/') {
        None | Some(0) => None,
        Some(idx) => Some(path[..idx].to_string()),
    }
}

fn leaf_name(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) if idx + 1 < path.len() => path[idx + 1..].to_string(),
        _ => path.to_string(),
    }
}

/// In-memory graph of everything the scanner has reported so far, plus any
/// placeholder ancestors synthesized to keep the tree structurally sound.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: HashMap<String, FileNode>,
    roots: Vec<String>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, path: &str) -> Option<&FileNode> {
        self.nodes.get(path)
    }

    /// Top-level paths in first-seen order. Layout sorts them per cycle.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes strictly below `path`.
    pub fn descendant_count(&self, path: &str) -> usize {
        let Some(node) = self.nodes.get(path) else {
            return 0;
        };
        let mut count = 0;
        let mut stack: Vec<&String> = node.children.iter().collect();
        while let Some(child) = stack.pop() {
            count += 1;
            if let Some(child_node) = self.nodes.get(child) {
                stack.extend(child_node.children.iter());
            }
        }
        count
    }

    /// Absorb one delta batch. Unknown paths get their ancestor chain
    /// synthesized bottom-up from the path string alone, which is what makes
    /// arrival order irrelevant. Re-submitting an identical entry is a no-op.
    pub fn apply_delta(&mut self, entries: &[ScanEntry]) -> DeltaOutcome {
        let mut outcome = DeltaOutcome::default();
        for entry in entries {
            let path = normalize_path(&entry.path);
            if self.nodes.contains_key(&path) {
                self.refresh_node(&path, entry, &mut outcome);
                continue;
            }
            self.ensure_ancestors(&path, &mut outcome);
            let node = FileNode {
                path: path.clone(),
                name: entry.name.clone(),
                kind: entry.kind,
                depth: entry.depth,
                parent: parent_path(&path),
                children: Vec::new(),
                size: entry.size,
                modified: entry.modified,
                error: entry.error.clone(),
                placeholder: false,
            };
            self.attach(node);
            outcome.added.push(path);
        }
        outcome
    }

    fn refresh_node(&mut self, path: &str, entry: &ScanEntry, outcome: &mut DeltaOutcome) {
        let Some(node) = self.nodes.get_mut(path) else {
            return;
        };
        if node.placeholder {
            node.placeholder = false;
            node.kind = entry.kind;
            node.name = entry.name.clone();
            outcome.hydrated.push(path.to_string());
        }
        let mut changed = false;
        if node.size != entry.size {
            node.size = entry.size;
            changed = true;
        }
        if node.modified != entry.modified {
            node.modified = entry.modified;
            changed = true;
        }
        if node.error != entry.error {
            node.error = entry.error.clone();
            changed = true;
        }
        if changed {
            outcome.updated.push(path.to_string());
        }
    }

    /// Create placeholder directories for every missing ancestor segment,
    /// shallowest first, with depth derived from segment position.
    fn ensure_ancestors(&mut self, path: &str, outcome: &mut DeltaOutcome) {
        let mut chain = Vec::new();
        let mut current = parent_path(path);
        while let Some(ancestor) = current {
            current = parent_path(&ancestor);
            chain.push(ancestor);
        }
        chain.reverse();
        for (depth, ancestor) in chain.into_iter().enumerate() {
            if self.nodes.contains_key(&ancestor) {
                continue;
            }
            let node = FileNode {
                path: ancestor.clone(),
                name: leaf_name(&ancestor),
                kind: NodeKind::Directory,
                depth,
                parent: parent_path(&ancestor),
                children: Vec::new(),
                size: None,
                modified: None,
                error: None,
                placeholder: true,
            };
            self.attach(node);
            outcome.added.push(ancestor);
        }
    }

    fn attach(&mut self, node: FileNode) {
        match &node.parent {
            Some(parent) => {
                // Ancestors are guaranteed to exist by ensure_ancestors.
                if let Some(parent_node) = self.nodes.get_mut(parent)
                    && !parent_node.children.contains(&node.path)
                {
                    parent_node.children.push(node.path.clone());
                }
            }
            None => self.roots.push(node.path.clone()),
        }
        self.nodes.insert(node.path.clone(), node);
    }
}

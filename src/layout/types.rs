use std::collections::HashMap;

use serde::Serialize;

/// One positioned station. Aggregate stand-ins carry their member list;
/// ordinary stations keep the member fields empty.
///
/// `slot` and `spacing` are traversal bookkeeping: the position-counter
/// value this point consumed and the sibling-group spacing in force when it
/// was placed. The fast paths resume placement from them without replaying
/// the surrounding traversal.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutPoint {
    pub path: String,
    pub x: f32,
    pub y: f32,
    pub depth: usize,
    pub aggregated: bool,
    pub member_count: usize,
    pub members: Vec<String>,
    pub expanded: bool,
    #[serde(skip)]
    pub(crate) slot: u32,
    #[serde(skip)]
    pub(crate) spacing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub(crate) fn empty() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    pub(crate) fn from_points(points: &[LayoutPoint]) -> Self {
        let Some(first) = points.first() else {
            return Self::empty();
        };
        let mut bounds = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
            width: 0.0,
            height: 0.0,
        };
        for point in &points[1..] {
            bounds.include(point.x, point.y);
        }
        bounds.width = bounds.max_x - bounds.min_x;
        bounds.height = bounds.max_y - bounds.min_y;
        bounds
    }

    pub(crate) fn include(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.width = self.max_x - self.min_x;
        self.height = self.max_y - self.min_y;
    }
}

/// One layout cycle's output: the ordered point list, a path lookup into
/// it, and the overall extent. The previous cycle's snapshot is the
/// baseline every fast path diffs against.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutSnapshot {
    pub points: Vec<LayoutPoint>,
    #[serde(skip)]
    pub index: HashMap<String, usize>,
    pub bounds: BoundingBox,
}

impl LayoutSnapshot {
    pub(crate) fn from_points(points: Vec<LayoutPoint>) -> Self {
        let index = points
            .iter()
            .enumerate()
            .map(|(idx, point)| (point.path.clone(), idx))
            .collect();
        let bounds = BoundingBox::from_points(&points);
        Self {
            points,
            index,
            bounds,
        }
    }

    pub fn point(&self, path: &str) -> Option<&LayoutPoint> {
        self.index.get(path).map(|&idx| &self.points[idx])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

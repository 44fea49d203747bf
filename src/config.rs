use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Layout tunables. Every field has a default; callers typically override
/// only the aggregation threshold (observed call sites range 28-200) and
/// the expanded set as the user toggles aggregate stations open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Base horizontal spacing between consecutive position slots.
    pub base_spacing: f32,
    /// Vertical spacing per depth level.
    pub vertical_spacing: f32,
    /// Sibling-group size at or below which base spacing applies unchanged.
    pub spacing_threshold: usize,
    /// How quickly spacing grows past the threshold.
    pub spacing_growth: f32,
    /// Cap on the adaptive spacing multiplier.
    pub max_spacing_factor: f32,
    /// Sibling groups strictly wider than this collapse into one synthetic
    /// stand-in station.
    pub aggregation_threshold: usize,
    /// Synthetic aggregate paths the user currently has expanded.
    pub expanded: HashSet<String>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            base_spacing: 140.0,
            vertical_spacing: 90.0,
            spacing_threshold: 6,
            spacing_growth: 0.5,
            max_spacing_factor: 3.0,
            aggregation_threshold: 64,
            expanded: HashSet::new(),
        }
    }
}

impl LayoutOptions {
    /// Horizontal spacing in force for one sibling group. Groups wider than
    /// the threshold spread out linearly, capped at the max factor.
    pub fn effective_spacing(&self, group_size: usize) -> f32 {
        let threshold = self.spacing_threshold.max(1);
        if group_size <= threshold {
            return self.base_spacing;
        }
        let over = (group_size - threshold) as f32 / threshold as f32;
        let factor = (1.0 + over * self.spacing_growth).min(self.max_spacing_factor);
        self.base_spacing * factor
    }
}

/// Load options from a JSON file, or defaults when no path is given.
pub fn load_options(path: Option<&Path>) -> anyhow::Result<LayoutOptions> {
    let Some(path) = path else {
        return Ok(LayoutOptions::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options file {}", path.display()))?;
    let options: LayoutOptions = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse options file {}", path.display()))?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_is_flat_at_or_below_threshold() {
        let options = LayoutOptions::default();
        assert_eq!(options.effective_spacing(1), 140.0);
        assert_eq!(options.effective_spacing(6), 140.0);
    }

    #[test]
    fn spacing_grows_past_threshold() {
        let options = LayoutOptions::default();
        // 12 siblings: 1 + (6/6) * 0.5 = 1.5x
        assert_eq!(options.effective_spacing(12), 210.0);
    }

    #[test]
    fn spacing_caps_at_max_factor() {
        let options = LayoutOptions::default();
        assert_eq!(options.effective_spacing(10_000), 420.0);
    }

    #[test]
    fn options_parse_from_partial_json() {
        let options: LayoutOptions =
            serde_json::from_str(r#"{"base_spacing": 100.0, "aggregation_threshold": 28}"#)
                .unwrap();
        assert_eq!(options.base_spacing, 100.0);
        assert_eq!(options.aggregation_threshold, 28);
        assert_eq!(options.vertical_spacing, 90.0);
    }
}

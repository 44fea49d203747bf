use std::cmp::Ordering;

use crate::graph::{FileNode, parent_path};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Stable 32-bit rolling hash of a path, rendered in base36.
///
/// The exact algorithm (31x multiply over UTF-16 code units, wrapping i32,
/// absolute value) is a wire-level contract: synthetic aggregate paths are
/// seeded from it, and swapping it would rename every aggregate node across
/// runs on identical input.
pub fn node_ident(path: &str) -> String {
    let mut hash: i32 = 0;
    for unit in path.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    // u32::MAX is 7 base36 digits.
    let mut buf = [0u8; 7];
    let mut pos = buf.len();
    while value > 0 {
        pos -= 1;
        buf[pos] = BASE36[(value % 36) as usize];
        value /= 36;
    }
    String::from_utf8_lossy(&buf[pos..]).into_owned()
}

/// Deterministic path for the synthetic stand-in that replaces an over-wide
/// sibling group. Seeded by member count plus first member path so identical
/// snapshots reproduce identical aggregate identities regardless of arrival
/// order.
pub fn aggregate_path(members: &[String]) -> String {
    let first = members.first().map(String::as_str).unwrap_or("");
    let token = node_ident(&format!("{}:{}", members.len(), first));
    match parent_path(first) {
        Some(parent) => format!("{parent}/@agg-{token}"),
        None => format!("@agg-{token}"),
    }
}

/// Total sibling ordering used everywhere layout needs a stable sequence:
/// case-insensitive name ascending, size descending when both sides define
/// it, then ident ascending. Path is the final backstop so no two distinct
/// nodes ever compare equal, even on an ident collision.
pub fn sibling_cmp(a: &FileNode, b: &FileNode) -> Ordering {
    let by_name = a.name.to_lowercase().cmp(&b.name.to_lowercase());
    if by_name != Ordering::Equal {
        return by_name;
    }
    if let (Some(size_a), Some(size_b)) = (a.size, b.size) {
        let by_size = size_b.cmp(&size_a);
        if by_size != Ordering::Equal {
            return by_size;
        }
    }
    node_ident(&a.path)
        .cmp(&node_ident(&b.path))
        .then_with(|| a.path.cmp(&b.path))
}

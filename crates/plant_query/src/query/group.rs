//! Flattened group addressing over the template tree.
//!
//! Groups are numbered by a pre-order walk of the tree. The plant base never gets a number,
//! and when dummies are disabled neither do nodes flagged dummy. Numbering is positional,
//! so it must be recomputed with the same dummies setting by every consumer.
//!
//! Resolution is a decrement-then-compare walk: starting from `index + 2`, the plant base
//! and every qualifying node decrement the remaining count, and the node that brings it to
//! exactly zero is the answer. One of the two extra steps is consumed by the plant base,
//! the other by the decrement that happens *on* the matching node. The plant base always
//! decrements, consistent with [`count_qualifying`] counting it unconditionally.
use crate::error::{Error, Result};
use crate::model::BranchModel;

/// Whether `node` consumes a group number (the plant base aside).
#[inline]
pub fn is_qualifying(node: &BranchModel, dummies_enabled: bool) -> bool {
    dummies_enabled || !node.is_dummy()
}

/// Qualifying nodes in the subtree rooted at `node`, `node` included.
pub fn count_qualifying(node: &BranchModel, dummies_enabled: bool) -> usize {
    usize::from(is_qualifying(node, dummies_enabled))
        + node
            .children
            .iter()
            .map(|c| count_qualifying(c, dummies_enabled))
            .sum::<usize>()
}

/// Number of addressable groups under the plant base `base`.
pub fn group_count(base: &BranchModel, dummies_enabled: bool) -> usize {
    // the plant base always counts once and is removed again
    base.children
        .iter()
        .map(|c| count_qualifying(c, dummies_enabled))
        .sum()
}

/// Resolves group `index` to its node.
pub fn resolve_group(base: &BranchModel, dummies_enabled: bool, index: usize) -> Result<&BranchModel> {
    let out_of_range = || Error::GroupIndexOutOfRange {
        index,
        group_count: group_count(base, dummies_enabled),
    };

    let mut remaining = index.checked_add(2).ok_or_else(out_of_range)?;
    remaining -= 1;

    base.children
        .iter()
        .find_map(|child| resolve_in(child, dummies_enabled, &mut remaining))
        .ok_or_else(out_of_range)
}

fn resolve_in<'m>(node: &'m BranchModel, dummies_enabled: bool, remaining: &mut usize) -> Option<&'m BranchModel> {
    if is_qualifying(node, dummies_enabled) {
        *remaining -= 1;
    }
    if *remaining == 0 {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| resolve_in(child, dummies_enabled, remaining))
}

/// All groups in index order.
pub fn groups(base: &BranchModel, dummies_enabled: bool) -> Vec<&BranchModel> {
    fn walk<'m>(node: &'m BranchModel, dummies_enabled: bool, out: &mut Vec<&'m BranchModel>) {
        if is_qualifying(node, dummies_enabled) {
            out.push(node);
        }
        for child in &node.children {
            walk(child, dummies_enabled, out);
        }
    }

    let mut out = Vec::with_capacity(group_count(base, dummies_enabled));
    for child in &base.children {
        walk(child, dummies_enabled, &mut out);
    }
    out
}

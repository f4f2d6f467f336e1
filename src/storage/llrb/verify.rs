use std::cmp::Ordering;

use serde::Serialize;

use super::node::{self, Link, Node};
use crate::storage::record::Record;
use crate::types::{Result, StoreError};

/// Shape summary produced by a successful invariant check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TreeShape {
    /// Number of records.
    pub len: usize,
    /// Longest root-to-leaf path, in nodes.
    pub height: usize,
    /// Black nodes on every root-to-leaf path.
    pub black_height: usize,
}

pub(crate) fn check<R: Record>(root: &Link<R>) -> Result<TreeShape> {
    let Some(h) = root.as_deref() else {
        return Ok(TreeShape::default());
    };
    if h.is_red() {
        return Err(violation("root is red"));
    }
    let shape = check_node(h, 1)?;
    check_order(root)?;
    Ok(shape)
}

fn check_node<R>(h: &Node<R>, depth: usize) -> Result<TreeShape> {
    if node::is_red(&h.right) {
        return Err(violation(format!("red right link at depth {depth}")));
    }
    if h.is_red() && node::is_red(&h.left) {
        return Err(violation(format!("consecutive red links at depth {depth}")));
    }
    let left = match h.left.as_deref() {
        Some(l) => check_node(l, depth + 1)?,
        None => TreeShape::default(),
    };
    let right = match h.right.as_deref() {
        Some(r) => check_node(r, depth + 1)?,
        None => TreeShape::default(),
    };
    if left.black_height != right.black_height {
        return Err(violation(format!(
            "black height mismatch at depth {depth}: left {} right {}",
            left.black_height, right.black_height
        )));
    }
    Ok(TreeShape {
        len: left.len + right.len + 1,
        height: 1 + left.height.max(right.height),
        black_height: left.black_height + usize::from(!h.is_red()),
    })
}

fn check_order<R: Record>(root: &Link<R>) -> Result<()> {
    let mut prev: Option<&R> = None;
    let mut position = 0usize;
    let mut failed_at = None;
    node::for_each(root, |record| {
        if failed_at.is_none() {
            if let Some(p) = prev {
                if p.compare(record) != Ordering::Less {
                    failed_at = Some(position);
                }
            }
        }
        prev = Some(record);
        position += 1;
    });
    match failed_at {
        Some(at) => Err(violation(format!("records out of order at position {at}"))),
        None => Ok(()),
    }
}

fn violation(msg: impl Into<String>) -> StoreError {
    StoreError::InvariantViolation(msg.into())
}

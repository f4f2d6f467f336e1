//! Recursive left-leaning red-black algorithms over owned subtrees.
//!
//! Nodes carry no parent pointer. Every restructuring step takes a subtree
//! root by value and returns the (possibly different) new root, which the
//! caller stores back into its own child slot.

use std::cmp::Ordering;
use std::io::{Read, Write};

use crate::primitives::bytes::{Reader, Writer};
use crate::storage::record::{Record, RecordFactory};
use crate::types::{Result, StoreError};

/// Colour bit of a node, persisted as `0` (black) or `1` (red).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Colour {
    /// Black node.
    Black,
    /// Red node; the link from its parent is red.
    Red,
}

impl Colour {
    fn flipped(self) -> Self {
        match self {
            Colour::Black => Colour::Red,
            Colour::Red => Colour::Black,
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Colour::Black => 0,
            Colour::Red => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Colour::Black),
            1 => Ok(Colour::Red),
            other => Err(StoreError::corrupt(format!("invalid colour byte {other}"))),
        }
    }
}

pub(crate) type Link<R> = Option<Box<Node<R>>>;

pub(crate) struct Node<R> {
    pub(crate) record: R,
    pub(crate) colour: Colour,
    pub(crate) left: Link<R>,
    pub(crate) right: Link<R>,
}

impl<R> Node<R> {
    fn new_red(record: R) -> Box<Self> {
        Box::new(Node {
            record,
            colour: Colour::Red,
            left: None,
            right: None,
        })
    }

    pub(crate) fn is_red(&self) -> bool {
        self.colour == Colour::Red
    }
}

/// Absent links count as black.
pub(crate) fn is_red<R>(link: &Link<R>) -> bool {
    link.as_ref().is_some_and(|n| n.is_red())
}

fn left_left_red<R>(h: &Node<R>) -> bool {
    h.left.as_ref().is_some_and(|l| l.is_red() && is_red(&l.left))
}

// A child that is black with a black left child is a 2-node; deletion must
// not descend into one.
fn is_two_node<R>(link: &Link<R>) -> bool {
    link.as_ref().is_some_and(|n| !n.is_red() && !is_red(&n.left))
}

//          h                  x
//         / \                / \
//        a   x     ->       h   c
//           / \            / \
//          b   c          a   b
//
pub(crate) fn rotate_left<R>(mut h: Box<Node<R>>) -> Box<Node<R>> {
    let Some(mut x) = h.right.take() else {
        return h;
    };
    h.right = x.left.take();
    x.colour = h.colour;
    h.colour = Colour::Red;
    x.left = Some(h);
    x
}

//          h                  x
//         / \                / \
//        x   c     ->       a   h
//       / \                    / \
//      a   b                  b   c
//
pub(crate) fn rotate_right<R>(mut h: Box<Node<R>>) -> Box<Node<R>> {
    let Some(mut x) = h.left.take() else {
        return h;
    };
    h.left = x.right.take();
    x.colour = h.colour;
    h.colour = Colour::Red;
    x.right = Some(h);
    x
}

/// Toggles `h` and both children. Callers only flip nodes with two children.
pub(crate) fn flip_colours<R>(h: &mut Node<R>) {
    h.colour = h.colour.flipped();
    if let Some(l) = h.left.as_mut() {
        l.colour = l.colour.flipped();
    }
    if let Some(r) = h.right.as_mut() {
        r.colour = r.colour.flipped();
    }
}

/// Restores leaning and splits temporary 4-nodes on the way back up.
pub(crate) fn balance<R>(mut h: Box<Node<R>>) -> Box<Node<R>> {
    if is_red(&h.right) {
        h = rotate_left(h);
    }
    if left_left_red(&h) {
        h = rotate_right(h);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip_colours(&mut h);
    }
    h
}

// Insert variant: a right red link next to a red left link is left for the
// flip instead of being rotated.
fn fix_up<R>(mut h: Box<Node<R>>) -> Box<Node<R>> {
    if is_red(&h.right) && !is_red(&h.left) {
        h = rotate_left(h);
    }
    if left_left_red(&h) {
        h = rotate_right(h);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip_colours(&mut h);
    }
    h
}

/// Assuming `h` is red and `h.left` is a 2-node, makes `h.left` or one of
/// its children red.
pub(crate) fn move_red_left<R>(mut h: Box<Node<R>>) -> Box<Node<R>> {
    flip_colours(&mut h);
    if h.right.as_ref().is_some_and(|r| is_red(&r.left)) {
        h.right = h.right.take().map(rotate_right);
        h = rotate_left(h);
        flip_colours(&mut h);
    }
    h
}

/// Assuming `h` is red and `h.right` is a 2-node, makes `h.right` or one of
/// its children red.
pub(crate) fn move_red_right<R>(mut h: Box<Node<R>>) -> Box<Node<R>> {
    flip_colours(&mut h);
    if h.left.as_ref().is_some_and(|l| is_red(&l.left)) {
        h = rotate_right(h);
        flip_colours(&mut h);
    }
    h
}

/// Inserts `record` under `link`. An equal record already present wins and
/// the incoming one is handed back as the second element.
pub(crate) fn insert<R: Record>(link: Link<R>, record: R) -> (Box<Node<R>>, Option<R>) {
    let mut h = match link {
        None => return (Node::new_red(record), None),
        Some(h) => h,
    };
    let rejected = match record.compare(&h.record) {
        Ordering::Less => {
            let (left, rejected) = insert(h.left.take(), record);
            h.left = Some(left);
            rejected
        }
        Ordering::Greater => {
            let (right, rejected) = insert(h.right.take(), record);
            h.right = Some(right);
            rejected
        }
        Ordering::Equal => Some(record),
    };
    (fix_up(h), rejected)
}

/// Removes the record equal to `probe` from the subtree rooted at `h`.
///
/// The tree handle only calls this for keys it has already found, so the
/// descent never runs off the bottom of the tree; if it does, the subtree is
/// rebalanced and returned with nothing removed.
pub(crate) fn erase<R: Record>(mut h: Box<Node<R>>, probe: &R) -> (Link<R>, Option<R>) {
    let removed;
    if probe.compare(&h.record) == Ordering::Less {
        if is_two_node(&h.left) {
            h = move_red_left(h);
        }
        removed = match h.left.take() {
            Some(left) => {
                let (left, removed) = erase(left, probe);
                h.left = left;
                removed
            }
            None => None,
        };
    } else {
        if is_red(&h.left) {
            h = rotate_right(h);
        }
        if probe.compare(&h.record) == Ordering::Equal && h.right.is_none() {
            let node = *h;
            debug_assert!(node.left.is_none(), "leaf match with a left child");
            return (node.left, Some(node.record));
        }
        if is_two_node(&h.right) {
            h = move_red_right(h);
        }
        removed = match h.right.take() {
            Some(right) if probe.compare(&h.record) == Ordering::Equal => {
                // Successor's record moves up; its node is dropped empty.
                let (right, successor) = erase_min(right);
                h.right = right;
                Some(std::mem::replace(&mut h.record, successor))
            }
            Some(right) => {
                let (right, removed) = erase(right, probe);
                h.right = right;
                removed
            }
            None => None,
        };
    }
    (Some(balance(h)), removed)
}

/// Removes the minimum of the subtree and returns it with the new root.
pub(crate) fn erase_min<R>(mut h: Box<Node<R>>) -> (Link<R>, R) {
    if is_two_node(&h.left) {
        h = move_red_left(h);
    }
    match h.left.take() {
        None => {
            let node = *h;
            debug_assert!(node.right.is_none(), "minimum with a right child");
            (node.right, node.record)
        }
        Some(left) => {
            let (left, min) = erase_min(left);
            h.left = left;
            (Some(balance(h)), min)
        }
    }
}

pub(crate) fn find<'a, R: Record>(link: &'a Link<R>, probe: &R) -> Option<&'a Node<R>> {
    let mut cur = link.as_deref();
    while let Some(h) = cur {
        cur = match probe.compare(&h.record) {
            Ordering::Less => h.left.as_deref(),
            Ordering::Greater => h.right.as_deref(),
            Ordering::Equal => return Some(h),
        };
    }
    None
}

pub(crate) fn find_min<R>(h: &Node<R>) -> &Node<R> {
    let mut cur = h;
    while let Some(l) = cur.left.as_deref() {
        cur = l;
    }
    cur
}

pub(crate) fn find_max<R>(h: &Node<R>) -> &Node<R> {
    let mut cur = h;
    while let Some(r) = cur.right.as_deref() {
        cur = r;
    }
    cur
}

/// In-order visit with an explicit stack.
pub(crate) fn for_each<'a, R, F>(root: &'a Link<R>, mut visit: F)
where
    F: FnMut(&'a R),
{
    let mut stack: Vec<&'a Node<R>> = Vec::new();
    let mut cur = root.as_deref();
    loop {
        while let Some(h) = cur {
            stack.push(h);
            cur = h.left.as_deref();
        }
        let Some(h) = stack.pop() else {
            break;
        };
        visit(&h.record);
        cur = h.right.as_deref();
    }
}

pub(crate) fn height<R>(link: &Link<R>) -> usize {
    match link {
        None => 0,
        Some(h) => 1 + height(&h.left).max(height(&h.right)),
    }
}

/// Pre-order: colour, record payload, then a presence flag and subtree for
/// each side. Returns the number of nodes written.
pub(crate) fn save<R: Record, W: Write>(h: &Node<R>, out: &mut Writer<W>) -> Result<usize> {
    out.put_u8(h.colour.to_byte())?;
    h.record.save(out)?;
    let mut count = 1;
    out.put_flag(h.left.is_some())?;
    if let Some(left) = &h.left {
        count += save(left, out)?;
    }
    out.put_flag(h.right.is_some())?;
    if let Some(right) = &h.right {
        count += save(right, out)?;
    }
    Ok(count)
}

/// Mirrors [`save`]. `depth` is the nesting level of the node being read,
/// starting at 1 for the root.
pub(crate) fn load<R, S, F>(
    src: &mut Reader<S>,
    factory: &F,
    depth: usize,
) -> Result<(Box<Node<R>>, usize)>
where
    R: Record,
    S: Read,
    F: RecordFactory<R> + ?Sized,
{
    let limit = src.limits().max_depth;
    if depth > limit {
        return Err(StoreError::corrupt(format!(
            "tree nesting exceeds depth limit {limit} at offset {}",
            src.bytes_read()
        )));
    }
    let colour = Colour::from_byte(src.get_u8()?)?;
    let mut record = factory.make();
    record.load(src)?;
    let mut count = 1;
    let left = if src.get_flag()? {
        let (node, n) = load(src, factory, depth + 1)?;
        count += n;
        Some(node)
    } else {
        None
    };
    let right = if src.get_flag()? {
        let (node, n) = load(src, factory, depth + 1)?;
        count += n;
        Some(node)
    } else {
        None
    };
    let node = Box::new(Node {
        record,
        colour,
        left,
        right,
    });
    Ok((node, count))
}

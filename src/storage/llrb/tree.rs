use std::fmt;
use std::io::{Read, Write};

use tracing::{debug, trace};

use super::node::{self, Colour, Link};
use super::verify::{self, TreeShape};
use crate::primitives::bytes::{Reader, Writer};
use crate::storage::record::{Record, RecordFactory};
use crate::types::{Result, StoreError};

/// An ordered set of records of one type, kept as a left-leaning red-black
/// tree.
///
/// The handle owns the root and enforces what the node algorithms leave to
/// it: the root is black after every mutation, and erase only walks the tree
/// for keys that are present. Trees are deliberately not `Clone`.
pub struct Tree<R> {
    root: Link<R>,
    len: usize,
}

impl<R> Default for Tree<R> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<R> Tree<R> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the tree holds no records.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Longest root-to-leaf path, in nodes.
    pub fn height(&self) -> usize {
        node::height(&self.root)
    }

    /// Calls `visit` on every record in ascending order.
    pub fn for_each<'a, F>(&'a self, visit: F)
    where
        F: FnMut(&'a R),
    {
        node::for_each(&self.root, visit);
    }

    /// The smallest record.
    pub fn first(&self) -> Option<&R> {
        self.root.as_deref().map(|h| &node::find_min(h).record)
    }

    /// The largest record.
    pub fn last(&self) -> Option<&R> {
        self.root.as_deref().map(|h| &node::find_max(h).record)
    }
}

impl<R: Record> Tree<R> {
    /// Adds `record` unless an equal record is already stored.
    ///
    /// On a duplicate the tree is left untouched and the incoming record is
    /// handed back to the caller.
    pub fn insert(&mut self, record: R) -> Option<R> {
        let (mut root, rejected) = node::insert(self.root.take(), record);
        root.colour = Colour::Black;
        self.root = Some(root);
        if rejected.is_none() {
            self.len += 1;
            trace!(len = self.len, "llrb.insert");
        } else {
            trace!(len = self.len, "llrb.insert duplicate ignored");
        }
        rejected
    }

    /// Removes and returns the record equal to `probe`. Absent keys are a
    /// no-op.
    pub fn erase(&mut self, probe: &R) -> Option<R> {
        if !self.contains(probe) {
            trace!(len = self.len, "llrb.erase miss");
            return None;
        }
        let mut root = self.root.take()?;
        if !node::is_red(&root.left) && !node::is_red(&root.right) {
            root.colour = Colour::Red;
        }
        let (root, removed) = node::erase(root, probe);
        self.root = root.map(|mut h| {
            h.colour = Colour::Black;
            h
        });
        if removed.is_some() {
            self.len -= 1;
        }
        trace!(len = self.len, "llrb.erase");
        removed
    }

    /// True when a record equal to `probe` is stored.
    pub fn contains(&self, probe: &R) -> bool {
        node::find(&self.root, probe).is_some()
    }

    /// The stored record equal to `probe`, which may be a key-only instance.
    pub fn get(&self, probe: &R) -> Option<&R> {
        node::find(&self.root, probe).map(|h| &h.record)
    }

    /// Checks ordering and every red-black invariant.
    pub fn verify(&self) -> Result<TreeShape> {
        let shape = verify::check(&self.root)?;
        if shape.len != self.len {
            return Err(StoreError::InvariantViolation(format!(
                "tree holds {} records but counts {}",
                shape.len, self.len
            )));
        }
        Ok(shape)
    }

    /// Writes a presence flag followed by the pre-order node stream.
    ///
    /// A tree taller than the writer's `max_depth` could not be loaded back
    /// with the same limits, so it is rejected before anything is written.
    pub fn save<W: Write>(&self, out: &mut Writer<W>) -> Result<()> {
        let height = self.height();
        let max_depth = out.limits().max_depth;
        if height > max_depth {
            return Err(StoreError::Invalid(format!(
                "tree height {height} exceeds depth limit {max_depth}"
            )));
        }
        let start = out.bytes_written();
        out.put_flag(self.root.is_some())?;
        let nodes = match self.root.as_deref() {
            Some(h) => node::save(h, out)?,
            None => 0,
        };
        debug!(
            nodes,
            bytes = out.bytes_written() - start,
            "llrb.save"
        );
        Ok(())
    }

    /// Rebuilds a tree written by [`Tree::save`]. `factory` supplies blank
    /// records of the stored type.
    pub fn load<S, F>(src: &mut Reader<S>, factory: &F) -> Result<Self>
    where
        S: Read,
        F: RecordFactory<R> + ?Sized,
    {
        let start = src.bytes_read();
        let tree = if src.get_flag()? {
            let (root, len) = node::load(src, factory, 1)?;
            Self {
                root: Some(root),
                len,
            }
        } else {
            Self::default()
        };
        debug!(
            nodes = tree.len,
            bytes = src.bytes_read() - start,
            "llrb.load"
        );
        Ok(tree)
    }

    /// [`Tree::load`] followed by [`Tree::verify`]; a loaded tree breaking
    /// an invariant is reported as corrupt data.
    pub fn load_verified<S, F>(src: &mut Reader<S>, factory: &F) -> Result<Self>
    where
        S: Read,
        F: RecordFactory<R> + ?Sized,
    {
        let tree = Self::load(src, factory)?;
        match tree.verify() {
            Ok(_) => Ok(tree),
            Err(StoreError::InvariantViolation(msg)) => Err(StoreError::CorruptData(format!(
                "loaded tree is not a valid red-black tree: {msg}"
            ))),
            Err(err) => Err(err),
        }
    }
}

impl<R: Record> Extend<R> for Tree<R> {
    fn extend<I: IntoIterator<Item = R>>(&mut self, iter: I) {
        for record in iter {
            let _ = self.insert(record);
        }
    }
}

impl<R: Record> FromIterator<R> for Tree<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut tree = Tree::new();
        tree.extend(iter);
        tree
    }
}

impl<R: fmt::Debug> fmt::Debug for Tree<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        self.for_each(|record| {
            list.entry(record);
        });
        list.finish()
    }
}

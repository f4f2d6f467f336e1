//! Left-leaning red-black tree store.
//!
//! [`Tree`] is the public handle; the recursive algorithms live in a private
//! node module and operate on owned subtrees that each return their new
//! root.

mod node;
mod tree;
mod verify;


pub use tree::Tree;
pub use verify::TreeShape;

//! Staging of children during an update.
//!
//! The update recursion rebuilds a trie bottom-up: each touched branch of a
//! node produces a [`ChildData`] holding everything the new parent will
//! need, namely the freshly built child itself, its on-disk location once
//! known, its cached hash bytes, and the subtrie minima. Untouched branches
//! are staged by copying straight out of the old parent.

use super::{calc_min_version, Node, NodeBase, NodeChildren, MAX_CHILD_DATA_LEN};
use crate::compute::Compute;
use crate::pool::{ChunkOffset, CompactVirtualOffset};

/// Marks a [`ChildData`] slot as unoccupied.
pub const INVALID_BRANCH: u8 = 0xFF;

/// Everything needed to install one child into a new parent.
pub struct ChildData {
    /// The built child, if it is held in memory. `None` once moved into a
    /// parent, or for children staged from disk.
    pub ptr: Option<Box<Node>>,
    /// The child's on-disk location; invalid until the child is flushed.
    pub offset: ChunkOffset,
    /// Cached hash bytes describing the child; only the first `len` count.
    pub data: [u8; MAX_CHILD_DATA_LEN],
    /// The minimum version over the child's subtrie.
    pub subtrie_min_version: i64,
    /// The minimum fast-list virtual offset over the child's subtrie.
    pub min_offset_fast: CompactVirtualOffset,
    /// The minimum slow-list virtual offset over the child's subtrie.
    pub min_offset_slow: CompactVirtualOffset,
    /// The branch nibble this child hangs off, or [`INVALID_BRANCH`].
    pub branch: u8,
    /// The number of meaningful bytes in `data`.
    pub len: u8,
    /// Whether the owned child should be attached to the parent's `next`
    /// slot (cached) or dropped once its bytes are staged (freed after
    /// serialization).
    pub cache_node: bool,
}

impl Default for ChildData {
    fn default() -> Self {
        ChildData {
            ptr: None,
            offset: ChunkOffset::INVALID,
            data: [0; MAX_CHILD_DATA_LEN],
            subtrie_min_version: i64::MAX,
            min_offset_fast: CompactVirtualOffset::INVALID,
            min_offset_slow: CompactVirtualOffset::INVALID,
            branch: INVALID_BRANCH,
            len: 0,
            cache_node: true,
        }
    }
}

impl ChildData {
    /// Whether this slot stages a child.
    pub fn is_valid(&self) -> bool {
        self.branch != INVALID_BRANCH
    }

    /// Resets the slot to unoccupied, dropping any owned child.
    pub fn erase(&mut self) {
        *self = ChildData::default();
    }

    /// Takes ownership of a freshly built child: records its subtrie
    /// minimum version, asks `compute` for its cached bytes, and remembers
    /// whether the parent should keep it in memory.
    pub fn finalize<C: Compute>(&mut self, node: Box<Node>, compute: &mut C, cache: bool) {
        self.subtrie_min_version = calc_min_version(&node);
        let len = compute.child_data(&node, &mut self.data);
        assert!(len <= MAX_CHILD_DATA_LEN);
        self.len = len as u8;
        self.cache_node = cache;
        self.ptr = Some(node);
    }

    /// Stages child `index` of an existing node unchanged: branch, on-disk
    /// location, minima, and cached bytes are copied; no child is owned.
    pub fn copy_old_child(&mut self, old: &NodeBase, index: usize) {
        let (_, branch) = NodeChildren::new(old.mask())
            .nth(index)
            .expect("child index out of range");
        let data = old.child_data_view(index);
        assert!(data.len() <= MAX_CHILD_DATA_LEN);

        self.ptr = None;
        self.offset = old.fnext(index);
        self.data[..data.len()].copy_from_slice(data);
        self.subtrie_min_version = old.subtrie_min_version(index);
        self.min_offset_fast = old.min_offset_fast(index);
        self.min_offset_slow = old.min_offset_slow(index);
        self.branch = branch;
        self.len = data.len() as u8;
    }
}

//! Node construction.
//!
//! All constructors size the allocation up front from the mask, the staged
//! child data, the path, the value, and the inline data length, then write
//! the header and regions in one pass. Nothing here talks to the hash
//! machinery except [`create_node_with_children`], which closes the loop
//! with the [`Compute`] collaborator after the bytes are in place.

use super::{
    ChildData, Node, NodeBase, NodeChildren, NodeVariant, CHILD_META_WIDTH, HASH_SIZE,
    HEADER_SIZE, MAX_DATA_LEN, MAX_DISK_SIZE, PTR_SIZE,
};
use crate::compute::Compute;
use crate::nibbles::NibblesView;

/// The size of a node with the given shape, in memory.
pub const fn node_size(
    number_of_children: usize,
    total_child_data: usize,
    value_len: usize,
    path_bytes: usize,
    data_len: usize,
) -> usize {
    HEADER_SIZE
        + (CHILD_META_WIDTH + PTR_SIZE) * number_of_children
        + total_child_data
        + value_len
        + path_bytes
        + data_len
}

/// The largest value a leaf can store: the disk-size ceiling minus the
/// overhead of a childless node, leaving hash-sized headroom for both the
/// path (the deepest trie in practice is keyed by hashes) and the inline
/// data region.
pub const MAX_VALUE_LEN: usize = MAX_DISK_SIZE - node_size(0, 0, 0, HASH_SIZE, HASH_SIZE);

/// Builds a node from staged child data, with a zeroed inline data region
/// of `data_len` bytes.
///
/// `children` holds one valid entry per bit set in `mask`, in ascending
/// branch order; invalid entries are skipped, so a branch-indexed 16-slot
/// array works directly. Each valid entry's cached bytes and per-child
/// bookkeeping move into the new node, and its owned child (if any) is
/// either installed into the matching `next` slot or dropped, according to
/// its `cache_node` flag.
pub fn make_node(
    mask: u16,
    children: &mut [ChildData],
    path: NibblesView<'_>,
    value: Option<&[u8]>,
    data_len: usize,
    version: i64,
) -> Box<Node> {
    let value_len = value.map_or(0, <[u8]>::len);
    assert!(value_len <= MAX_VALUE_LEN, "value of {value_len} bytes too large");
    assert!(data_len <= MAX_DATA_LEN);

    let number_of_children = mask.count_ones() as usize;
    let total_child_data: usize = children
        .iter()
        .filter(|child| child.is_valid())
        .map(|child| child.len as usize)
        .sum();
    assert!(
        total_child_data <= u16::MAX as usize,
        "child data of {total_child_data} bytes overflows the offset table"
    );

    let size = node_size(
        number_of_children,
        total_child_data,
        value_len,
        path.byte_len(),
        data_len,
    );
    assert!(
        size - number_of_children * PTR_SIZE <= MAX_DISK_SIZE,
        "node of {size} bytes exceeds the disk ceiling"
    );
    let mut node = Box::new(Node::from_buf(NodeBase::alloc(size)));
    node.init_header(mask, value, data_len, path, version);

    // First pass lays down the offset table; lengths are implied by the
    // next offset, so it must be complete before any payload is written.
    let mut branches = NodeChildren::new(mask);
    let mut cursor: u16 = 0;
    for child in children.iter().filter(|child| child.is_valid()) {
        let (index, branch) = branches
            .next()
            .expect("more valid children than branches in the mask");
        assert_eq!(
            child.branch, branch,
            "children must be in ascending branch order and match the mask"
        );
        node.set_child_data_offset(index, cursor);
        cursor += child.len as u16;
    }
    assert!(
        branches.next().is_none(),
        "mask has branches without a staged child"
    );

    let mut branches = NodeChildren::new(mask);
    for child in children.iter_mut().filter(|child| child.is_valid()) {
        let (index, _) = branches.next().unwrap();
        node.set_child_data(index, &child.data[..child.len as usize]);
        node.set_fnext(index, child.offset);
        node.set_min_offset_fast(index, child.min_offset_fast);
        node.set_min_offset_slow(index, child.min_offset_slow);
        node.set_subtrie_min_version(index, child.subtrie_min_version);
        match child.ptr.take() {
            Some(owned) if child.cache_node => node.set_next(index, owned),
            Some(owned) => drop(owned),
            None => {}
        }
    }

    node
}

/// Builds a node like [`make_node`], but with the inline data region copied
/// from `data` instead of left for the collaborator to fill.
pub fn make_node_with_data(
    mask: u16,
    children: &mut [ChildData],
    path: NibblesView<'_>,
    value: Option<&[u8]>,
    data: &[u8],
    version: i64,
) -> Box<Node> {
    let mut node = make_node(mask, children, path, value, data.len(), version);
    node.set_data(data);
    node
}

/// Builds a node with the same children as `from` (per-child bookkeeping
/// and cached bytes copied verbatim, in-memory children moved over) but
/// with a new path, value, and version.
///
/// The inline data region survives only if the node keeps a value; its
/// contents are stale if the value changed, and refreshing them is the
/// caller's business.
pub fn make_node_from(
    from: &mut Node,
    path: NibblesView<'_>,
    value: Option<&[u8]>,
    version: i64,
) -> Box<Node> {
    let value_len = value.map_or(0, <[u8]>::len);
    assert!(value_len <= MAX_VALUE_LEN, "value of {value_len} bytes too large");
    let data_len = if value.is_some() { from.data_len() } else { 0 };
    let number_of_children = from.number_of_children();

    let size = node_size(
        number_of_children,
        from.child_data_total(),
        value_len,
        path.byte_len(),
        data_len,
    );
    let mut node = Box::new(Node::from_buf(NodeBase::alloc(size)));
    node.init_header(from.mask(), value, data_len, path, version);
    node.copy_child_meta_from(from);
    node.copy_child_data_region_from(from);
    if data_len > 0 {
        node.set_data(from.data());
    }
    for index in 0..number_of_children {
        if let Some(child) = from.move_next(index) {
            node.set_next(index, child);
        }
    }
    node
}

/// The canonical factory: builds a branch or extension node, with or
/// without a leaf value, and asks `compute` to fill the inline data region
/// it asked for. A pure branch ends up with an empty one.
pub fn create_node_with_children<C: Compute>(
    compute: &mut C,
    mask: u16,
    children: &mut [ChildData],
    path: NibblesView<'_>,
    value: Option<&[u8]>,
    version: i64,
) -> Box<Node> {
    let data_len = compute.inline_data_size(mask, value);
    let mut node = make_node(mask, children, path, value, data_len, version);
    if data_len > 0 {
        compute.fill_inline_data(&mut node);
    }
    node
}

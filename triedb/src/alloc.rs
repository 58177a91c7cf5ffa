//! Exact-size buffers backing node records.
//!
//! Every node is a single contiguous allocation whose size is computed up
//! front from its header fields, so the allocator must hand out buffers of
//! exactly the requested length. Buffers are zero-initialized (the inline
//! data region and the child pointer slots rely on this) and aligned for the
//! widest field a record contains.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Alignment of node buffers. The header's 8-byte version field is the
/// widest aligned load performed against the buffer start.
pub const NODE_ALIGNMENT: usize = 8;

/// An owned, zero-initialized byte buffer of exactly the requested length.
///
/// Dropping the buffer releases the allocation.
pub struct NodeBuf {
    ptr: NonNull<u8>,
    len: usize,
}

impl NodeBuf {
    /// Allocates `len` zeroed bytes.
    pub fn zeroed(len: usize) -> Self {
        let layout = Self::layout(len);
        // SAFETY: `layout` has a non-zero size, asserted in `layout`.
        let ptr = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            handle_alloc_error(layout)
        };
        NodeBuf { ptr, len }
    }

    fn layout(len: usize) -> Layout {
        assert!(len > 0, "node buffers cannot be empty");
        Layout::from_size_align(len, NODE_ALIGNMENT).unwrap()
    }
}

impl Deref for NodeBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: the pointer covers `len` initialized bytes for as long as
        // the buffer lives, and `&self` prevents deallocation.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for NodeBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for NodeBuf {
    fn drop(&mut self) {
        // SAFETY: allocated in `zeroed` with the identical layout.
        unsafe { dealloc(self.ptr.as_ptr(), Self::layout(self.len)) }
    }
}

// SAFETY: the buffer exclusively owns its allocation.
unsafe impl Send for NodeBuf {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_and_aligned() {
        let mut buf = NodeBuf::zeroed(37);
        assert_eq!(buf.len(), 37);
        assert!(buf.iter().all(|&b| b == 0));
        assert_eq!(buf.as_ptr() as usize % NODE_ALIGNMENT, 0);
        buf[36] = 0xFF;
        assert_eq!(buf[36], 0xFF);
    }

    #[test]
    #[should_panic]
    fn empty_buffer_rejected() {
        let _ = NodeBuf::zeroed(0);
    }
}

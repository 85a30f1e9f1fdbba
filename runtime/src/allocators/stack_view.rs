// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{alloc::Layout, marker::PhantomData, ptr::NonNull, slice};

use super::{bump::BumpCursor, Allocator};

/// A bump allocator over a buffer owned by someone else.
///
/// Allocations can't be freed individually, the whole view can only be
/// [reset](StackView::reset). The buffer is never freed by the view, for an
/// allocator which owns its memory, see
/// [`FixedArena`](crate::allocators::FixedArena).
#[derive(Debug)]
pub struct StackView<'buf> {
    cursor: BumpCursor,
    _buffer: PhantomData<&'buf mut [u8]>,
}

impl<'buf> StackView<'buf> {
    /// Wraps `buffer` as a stack view with nothing allocated.
    pub fn from_slice(buffer: &'buf mut [u8]) -> StackView<'buf> {
        // Safety: the exclusive borrow guarantees that the pointer stays valid
        // for reads and writes of `buffer.len()` bytes for 'buf, and slices
        // are never larger than `isize::MAX` bytes.
        let cursor = unsafe { BumpCursor::new(buffer.as_mut_ptr(), buffer.len()) };
        StackView {
            cursor,
            _buffer: PhantomData,
        }
    }

    /// The size of the whole buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.cursor.capacity()
    }

    /// The amount of bytes allocated since creation or the last reset.
    pub fn occupied(&self) -> usize {
        self.cursor.occupied()
    }

    /// Returns true if an allocation of `size` bytes would fit.
    pub fn can_hold(&self, size: usize) -> bool {
        self.cursor.can_hold(size)
    }

    /// Allocates `size` bytes right after the previous allocation. Returns
    /// None if they don't fit (or if `size` is zero). The bytes are not zeroed,
    /// they contain whatever the buffer contained.
    pub fn allocate(&self, size: usize) -> Option<&mut [u8]> {
        let ptr = self.cursor.bump(size)?;
        // Safety:
        // - The pointer is valid for `size` bytes of reads and writes, since
        //   the cursor only hands out pointers within the buffer borrowed for
        //   'buf, which outlives this borrow of self.
        // - The memory is not accessed through any other pointer while this
        //   slice lives: the cursor never hands out the same bytes twice, and
        //   only `reset` can make it do so, which requires `&mut self`.
        // - `u8` has no invalid bit patterns, and the buffer was initialized
        //   since it came from a `&mut [u8]`.
        Some(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// Makes the whole buffer available for allocation again.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }
}

impl Allocator for StackView<'_> {
    const RELEASES_MEMORY: bool = false;

    fn allocate_layout(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        self.cursor.bump_aligned(layout.size(), layout.align())
    }

    unsafe fn deallocate_layout(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

#[cfg(test)]
mod tests {
    use super::StackView;

    #[test]
    fn allocations_are_sequential_and_disjoint() {
        let mut buffer = [0u8; 64];
        let base = buffer.as_ptr() as usize;
        let view = StackView::from_slice(&mut buffer);

        let sizes = [1, 7, 16, 3, 20];
        let mut expected_occupied = 0;
        let mut previous_end = base;
        for size in sizes {
            let allocation = view.allocate(size).unwrap();
            let start = allocation.as_ptr() as usize;
            assert_eq!(previous_end, start, "allocations should be packed back to back");
            previous_end = start + allocation.len();
            expected_occupied += size;
            assert_eq!(expected_occupied, view.occupied());
        }
    }

    #[test]
    fn allocates_exactly_up_to_capacity() {
        let mut buffer = [0u8; 10];
        let view = StackView::from_slice(&mut buffer);
        view.allocate(4).unwrap();
        assert!(view.can_hold(6));
        assert!(!view.can_hold(7));
        assert!(view.allocate(7).is_none(), "one byte too many should fail");
        assert_eq!(4, view.occupied(), "failed allocations should not occupy anything");
        assert!(view.allocate(6).is_some(), "the exact remainder should fit");
        assert!(view.allocate(1).is_none());
    }

    #[test]
    fn reset_reuses_the_base_address() {
        let mut buffer = [0u8; 8];
        let mut view = StackView::from_slice(&mut buffer);
        let first = view.allocate(4).unwrap().as_ptr();
        view.reset();
        view.reset();
        assert_eq!(0, view.occupied());
        let again = view.allocate(4).unwrap().as_ptr();
        assert_eq!(first, again);
    }

    #[test]
    fn writes_land_in_the_borrowed_buffer() {
        let mut buffer = [0u8; 4];
        {
            let view = StackView::from_slice(&mut buffer);
            view.allocate(2).unwrap().copy_from_slice(b"hi");
        }
        assert_eq!(*b"hi\0\0", buffer);
    }
}

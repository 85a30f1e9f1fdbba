// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    alloc::Layout,
    mem::{align_of, size_of, MaybeUninit},
    ptr::NonNull,
    slice,
};

use crate::memory::{zero_memory, AllocateOptions};

use super::{bump::BumpCursor, Allocator, BasicAllocator, OwnedBuffer};

/// A bump allocator with a constant capacity, which owns its backing memory.
/// Can allocate memory regions of any size very fast, but individual
/// allocations can't be freed, all of the allocations must be freed at once.
///
/// NOTE: [`FixedArena::alloc`] and [`FixedArena::try_alloc_uninit_slice`]
/// return mutable borrows, and [`FixedArena::reset`] does not drop the values
/// behind them. Containers like [`FixedVec`](crate::collections::FixedVec) do
/// drop their values, see their documentation for details.
#[derive(Debug)]
pub struct FixedArena<'a> {
    /// The backing memory. None after [`FixedArena::destroy`].
    buffer: Option<OwnedBuffer<'a>>,
    cursor: BumpCursor,
}

impl<'a> FixedArena<'a> {
    /// Creates a new [`FixedArena`] with `capacity` bytes of backing memory.
    /// Returns None if allocating the memory fails or if `capacity` overflows
    /// `isize`. The capacity is not rounded up.
    #[track_caller]
    pub fn new(allocator: BasicAllocator<'a>, capacity: usize) -> Option<FixedArena<'a>> {
        if capacity > isize::MAX as usize {
            // Practically never happens, but asserting this here helps avoid a
            // safety check later.
            return None;
        }

        let buffer = allocator.allocate(capacity, AllocateOptions::NONE)?;
        // Safety: the buffer is valid for `capacity` bytes, and it lives in
        // this arena until `destroy` (which replaces the cursor) or drop.
        let cursor = unsafe { BumpCursor::new(buffer.as_ptr(), capacity) };

        Some(FixedArena {
            buffer: Some(buffer),
            cursor,
        })
    }

    /// The total (free and allocated) amount of memory owned by this arena, in
    /// bytes.
    pub fn capacity(&self) -> usize {
        self.cursor.capacity()
    }

    /// The amount of allocated memory, in bytes.
    pub fn occupied(&self) -> usize {
        self.cursor.occupied()
    }

    /// Returns true if an allocation of `size` bytes would fit.
    pub fn can_hold(&self, size: usize) -> bool {
        self.cursor.can_hold(size)
    }

    /// Returns true if the arena's memory has been released with
    /// [`FixedArena::destroy`].
    pub fn is_destroyed(&self) -> bool {
        self.buffer.is_none()
    }

    /// Allocates `size` bytes, zeroing them if `options` says so. Returns None
    /// if there's not enough free memory left, or if `size` is zero.
    pub fn allocate(&self, size: usize, options: AllocateOptions) -> Option<&mut [u8]> {
        let ptr = self.cursor.bump(size)?;
        // Safety:
        // - The pointer is valid for reads and writes of `size` bytes: the
        //   cursor only hands out regions of the buffer owned by this arena,
        //   and the buffer can't be freed while self is borrowed.
        // - The region is not aliased: the cursor never hands out overlapping
        //   regions until `reset`/`destroy`, which require `&mut self`, which
        //   can't happen while this borrow of self is alive.
        // - The platform hands out initialized bytes, and any value is a valid
        //   `u8`.
        let bytes = unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) };
        if options.contains(AllocateOptions::ZERO_MEMORY) {
            zero_memory(bytes);
        }
        Some(bytes)
    }

    /// Allocates one `T` and moves `value` there. Returns None if there's not
    /// enough free memory left. The value is never dropped.
    pub fn alloc<T>(&self, value: T) -> Option<&mut T> {
        let uninit = self.try_alloc_uninit_slice::<T>(1)?.first_mut()?;
        Some(uninit.write(value))
    }

    /// Allocates memory for a slice of `MaybeUninit<T>`, leaving the contents
    /// of the slice uninitialized, returning None if there's not enough free
    /// memory.
    pub fn try_alloc_uninit_slice<T>(&self, len: usize) -> Option<&mut [MaybeUninit<T>]> {
        let size = len.checked_mul(size_of::<T>())?;
        let ptr = self.cursor.bump_aligned(size, align_of::<T>())?;
        let uninit_t_ptr = ptr.as_ptr() as *mut MaybeUninit<T>;

        // Safety:
        // - `uninit_t_ptr` is non-null, aligned for T (`bump_aligned`), and
        //   valid for reads and writes of `len` Ts, since the whole range is
        //   within the buffer owned by this arena.
        // - Uninitialized values are valid for `MaybeUninit<T>`.
        // - The memory is not accessed through any other pointer for the
        //   lifetime of the borrow, for the same reasons as in `allocate`.
        // - `size` is not larger than `isize::MAX`, because it is not larger
        //   than the capacity, which is checked in the constructor.
        Some(unsafe { slice::from_raw_parts_mut(uninit_t_ptr, len) })
    }

    /// Resets the arena, reclaiming all of the backing memory for future
    /// allocations. Returns the amount of bytes that were allocated.
    /// **NOTE:** While the memory is reclaimed, the values are not dropped,
    /// i.e. they are leaked.
    pub fn reset(&mut self) -> usize {
        // The mutable borrow of self guarantees that none of the borrows dealt
        // out by the allocation functions are alive anymore, so handing out the
        // same memory again won't alias.
        self.cursor.reset()
    }

    /// Releases the backing memory. Further allocations will fail. Returns
    /// false if the arena had already been destroyed.
    ///
    /// Dropping the arena does the same, this is for releasing the memory
    /// early while keeping the arena struct around.
    pub fn destroy(&mut self) -> bool {
        let Some(buffer) = self.buffer.take() else {
            return false;
        };
        self.cursor = BumpCursor::empty();
        drop(buffer);
        true
    }
}

impl Allocator for FixedArena<'_> {
    const RELEASES_MEMORY: bool = false;

    fn allocate_layout(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        self.cursor.bump_aligned(layout.size(), layout.align())
    }

    unsafe fn deallocate_layout(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

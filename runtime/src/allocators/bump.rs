// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{cell::Cell, fmt::Debug, ptr::NonNull};

/// The shared bookkeeping of every bump allocator in this module: a pointer to
/// a region of memory, its capacity, and how much of it has been handed out.
///
/// This does not own the memory, and it does not create references to it, the
/// wrapping allocators are responsible for both.
pub(crate) struct BumpCursor {
    data: *mut u8,
    capacity: usize,
    /// The amount of bytes allocated starting from `data`. Invariant: never
    /// larger than `capacity`, and only goes up, except in
    /// [`BumpCursor::reset`].
    occupied: Cell<usize>,
}

impl Debug for BumpCursor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BumpCursor")
            .field("data", &self.data)
            .field("capacity", &self.capacity)
            .field("occupied", &self.occupied.get())
            .finish()
    }
}

impl BumpCursor {
    /// A cursor with no memory at all. Every allocation fails.
    pub const fn empty() -> BumpCursor {
        BumpCursor {
            data: core::ptr::null_mut(),
            capacity: 0,
            occupied: Cell::new(0),
        }
    }

    /// ### Safety
    ///
    /// `data` must be valid for reads and writes of `capacity` bytes for as
    /// long as the pointers returned by this cursor are used, and `capacity`
    /// must not be larger than [`isize::MAX`].
    pub const unsafe fn new(data: *mut u8, capacity: usize) -> BumpCursor {
        BumpCursor {
            data,
            capacity,
            occupied: Cell::new(0),
        }
    }

    pub fn data(&self) -> *mut u8 {
        self.data
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn occupied(&self) -> usize {
        self.occupied.get()
    }

    pub fn can_hold(&self, size: usize) -> bool {
        size.checked_add(self.occupied.get())
            .is_some_and(|end| end <= self.capacity)
    }

    /// Reserves `size` bytes right after the previously reserved ones. Returns
    /// None if they don't fit, or if `size` is zero.
    ///
    /// The returned regions never overlap until [`BumpCursor::reset`].
    pub fn bump(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 || !self.can_hold(size) {
            return None;
        }
        let offset = self.occupied.get();
        self.occupied.set(offset + size);
        // Safety: `offset + size <= self.capacity` (checked by `can_hold`), so
        // the offset pointer is within the region `data` points to, which the
        // constructor requires to be valid for `capacity` bytes.
        NonNull::new(unsafe { self.data.add(offset) })
    }

    /// Like [`BumpCursor::bump`], but the returned pointer is aligned to
    /// `alignment`, skipping over padding bytes if needed. Zero-sized
    /// reservations are allowed, they still get an aligned non-null pointer.
    pub fn bump_aligned(&self, size: usize, alignment: usize) -> Option<NonNull<u8>> {
        if self.data.is_null() {
            return None;
        }
        let occupied = self.occupied.get();
        let padding = self.data.wrapping_add(occupied).align_offset(alignment);
        let offset = occupied.checked_add(padding)?;
        let end = offset.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        self.occupied.set(end);
        // Safety: `offset <= end <= self.capacity`, see `bump`.
        NonNull::new(unsafe { self.data.add(offset) })
    }

    /// Forgets all the reservations, returning how many bytes were reserved.
    ///
    /// Takes `&mut self` so that the wrappers which tie the lifetimes of their
    /// allocations to `&self` can only reset when none of those are alive.
    pub fn reset(&mut self) -> usize {
        self.occupied.replace(0)
    }
}

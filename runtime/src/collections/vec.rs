// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    fmt::Debug,
    mem::{needs_drop, MaybeUninit},
    ops::{Deref, DerefMut},
    slice,
};

use crate::allocators::FixedArena;

/// An array with a length picked at runtime and a capacity that never grows,
/// backed by memory from a [`FixedArena`].
///
/// The arena only hands out the uninitialized slice, so creating one of these
/// doesn't touch the memory at all.
pub struct FixedVec<'a, T> {
    /// Invariant: `slots[..len]` are initialized.
    slots: &'a mut [MaybeUninit<T>],
    len: usize,
}

impl<'a, T> FixedVec<'a, T> {
    /// Reserves room for `capacity` elements from `arena`. Returns None if
    /// the arena can't fit them.
    pub fn new(arena: &'a FixedArena, capacity: usize) -> Option<FixedVec<'a, T>> {
        Some(FixedVec {
            slots: arena.try_alloc_uninit_slice::<T>(capacity)?,
            len: 0,
        })
    }

    /// Appends `value`, or gives it back if the array is full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        let Some(slot) = self.slots.get_mut(self.len) else {
            return Err(value);
        };
        // A slot past `len` is never initialized, so nothing gets leaked here.
        slot.write(value);
        self.len += 1;
        Ok(())
    }

    /// Pushes clones of every value in `values`, if they all fit. Returns
    /// false without pushing anything otherwise.
    pub fn extend_from_slice(&mut self, values: &[T]) -> bool
    where
        T: Clone,
    {
        if values.len() > self.remaining_capacity() {
            return false;
        }
        for value in values {
            let slot = &mut self.slots[self.len];
            slot.write(value.clone());
            self.len += 1;
        }
        true
    }

    pub fn pop(&mut self) -> Option<T> {
        let i = self.len.checked_sub(1)?;
        self.len = i;
        // Safety: the slot was below the old `len`, and now that `len` has
        // been decremented, it won't be read again.
        Some(unsafe { self.slots[i].assume_init_read() })
    }

    /// Drops every element past `new_len`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let old_len = self.len;
        self.len = new_len;
        if needs_drop::<T>() {
            for slot in &mut self.slots[new_len..old_len] {
                // Safety: these were below the old `len`.
                unsafe { slot.assume_init_drop() };
            }
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.slots.len() - self.len
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }
}

impl<T> Drop for FixedVec<'_, T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Deref for FixedVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // Safety: the first `len` slots are initialized, and MaybeUninit<T>
        // has the same layout as T.
        unsafe { slice::from_raw_parts(self.slots.as_ptr().cast::<T>(), self.len) }
    }
}

impl<T> DerefMut for FixedVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // Safety: see Deref.
        unsafe { slice::from_raw_parts_mut(self.slots.as_mut_ptr().cast::<T>(), self.len) }
    }
}

impl<T: Debug> Debug for FixedVec<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Primitive memory operations used by all the allocators.

use core::ops::BitOr;

use bytemuck::fill_zeroes;
use platform::Platform;

/// Flags for the allocation functions of the allocators in this crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AllocateOptions(u8);

impl AllocateOptions {
    /// Hand out the memory as-is.
    pub const NONE: AllocateOptions = AllocateOptions(0);
    /// Zero the memory before handing it out.
    pub const ZERO_MEMORY: AllocateOptions = AllocateOptions(1);

    /// Returns true if every flag set in `other` is also set in `self`.
    pub const fn contains(self, other: AllocateOptions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AllocateOptions {
    type Output = AllocateOptions;
    fn bitor(self, rhs: AllocateOptions) -> AllocateOptions {
        AllocateOptions(self.0 | rhs.0)
    }
}

/// Sets every byte of `bytes` to zero.
pub fn zero_memory(bytes: &mut [u8]) {
    fill_zeroes(bytes);
}

/// Copies `src` to the start of `dst`. Returns false, without copying
/// anything, if `dst` is shorter than `src`.
pub fn copy_memory(dst: &mut [u8], src: &[u8]) -> bool {
    let Some(dst) = dst.get_mut(..src.len()) else {
        return false;
    };
    dst.copy_from_slice(src);
    true
}

/// Rounds `size` up to the closest multiple of `alignment`.
///
/// ### Panics
///
/// Panics if `alignment` is zero.
pub const fn align(size: usize, alignment: usize) -> usize {
    assert!(alignment > 0, "alignment must be non-zero");
    size.next_multiple_of(alignment)
}

/// Returns the platform's page size.
pub fn page_size(platform: &dyn Platform) -> usize {
    platform.page_size()
}

/// Rounds `size` up to the closest multiple of the platform's page size.
pub fn page_align(platform: &dyn Platform, size: usize) -> usize {
    align(size, platform.page_size())
}

// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

mod basic_allocator;
mod block_allocator;
mod bump;
mod fixed_arena;
mod stack_view;

use core::{alloc::Layout, ptr::NonNull};

pub use basic_allocator::{AllocationRecorder, BasicAllocator, OwnedBuffer};
pub use block_allocator::{
    BlockAllocator, BlockAllocatorConfig, BlockHandle, BlockInfo, BlockMode, Blocks,
};
pub use fixed_arena::FixedArena;
pub use stack_view::StackView;

/// Typed allocation interface used by the containers in
/// [`collections`](crate::collections).
///
/// Implemented by the allocators which can hand out properly aligned memory for
/// arbitrary types. The bump allocators implement [`Allocator::deallocate_layout`]
/// as a no-op, their memory is reclaimed all at once when they're reset or
/// dropped.
pub trait Allocator {
    /// True if [`Allocator::deallocate_layout`] actually gives memory back.
    /// Containers skip the call entirely when this is false.
    const RELEASES_MEMORY: bool;

    /// Allocates memory fitting `layout`. Returns None if there's not enough
    /// memory left, or if the layout has a size of zero.
    fn allocate_layout(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Deallocates memory allocated with [`Allocator::allocate_layout`].
    ///
    /// ### Safety
    ///
    /// - `ptr` must have been returned by `allocate_layout` of this same
    ///   allocator, with the same `layout`, and must not have been deallocated
    ///   already.
    /// - The memory must not be accessed after this call.
    unsafe fn deallocate_layout(&self, ptr: NonNull<u8>, layout: Layout);
}

impl<A: Allocator> Allocator for &A {
    const RELEASES_MEMORY: bool = A::RELEASES_MEMORY;

    fn allocate_layout(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate_layout(layout)
    }

    unsafe fn deallocate_layout(&self, ptr: NonNull<u8>, layout: Layout) {
        // Safety: the requirements are passed on to the caller.
        unsafe { (**self).deallocate_layout(ptr, layout) }
    }
}

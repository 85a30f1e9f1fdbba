// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    alloc::Layout,
    ffi::c_void,
    fmt::Debug,
    ops::{Deref, DerefMut},
    panic::Location,
    ptr::NonNull,
    slice,
};

use platform::Platform;

use crate::{
    diagnostics::AllocationRecord,
    memory::{zero_memory, AllocateOptions},
};

use super::Allocator;

/// Receives a note of every allocation and deallocation made through a
/// [`BasicAllocator`] created with [`BasicAllocator::with_recorder`].
///
/// Used for leak diagnostics, see
/// [`AllocationRecords`](crate::diagnostics::AllocationRecords).
pub trait AllocationRecorder {
    /// Called after a successful allocation.
    fn record(&self, record: AllocationRecord);
    /// Called right before the memory at `address` is freed.
    fn forget(&self, address: NonNull<u8>);
}

/// A thin pass-through to [`Platform::malloc`] and [`Platform::free`], with
/// optional zeroing and optional allocation bookkeeping.
///
/// This is the only allocator in the crate which actually gets memory from
/// somewhere, the rest carve their memory out of buffers allocated with this.
#[derive(Clone, Copy)]
pub struct BasicAllocator<'a> {
    platform: &'a dyn Platform,
    recorder: Option<&'a dyn AllocationRecorder>,
}

impl Debug for BasicAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BasicAllocator")
            .field("recording", &self.recorder.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> BasicAllocator<'a> {
    /// Creates an allocator which allocates from `platform` without keeping
    /// any records.
    pub fn new(platform: &'a dyn Platform) -> BasicAllocator<'a> {
        BasicAllocator {
            platform,
            recorder: None,
        }
    }

    /// Creates an allocator which allocates from `platform` and tells
    /// `recorder` about every allocation and deallocation.
    pub fn with_recorder(
        platform: &'a dyn Platform,
        recorder: &'a dyn AllocationRecorder,
    ) -> BasicAllocator<'a> {
        BasicAllocator {
            platform,
            recorder: Some(recorder),
        }
    }

    /// The platform this allocator gets its memory from.
    pub fn platform(&self) -> &'a dyn Platform {
        self.platform
    }

    /// Allocates `size` bytes, returning them as an owned buffer which frees
    /// the memory when dropped. Returns None if the platform is out of memory
    /// or `size` is zero.
    #[track_caller]
    pub fn allocate(&self, size: usize, options: AllocateOptions) -> Option<OwnedBuffer<'a>> {
        let ptr = self.allocate_raw(size, options)?;
        Some(OwnedBuffer {
            ptr,
            size,
            allocator: *self,
        })
    }

    /// Allocates `size` bytes and returns a pointer to them. The memory has to
    /// be passed back into [`BasicAllocator::deallocate_raw`] at some point, or
    /// it will be leaked.
    ///
    /// The pointer is aligned as promised by [`Platform::malloc`]. If
    /// `options` contains [`AllocateOptions::ZERO_MEMORY`], the memory is
    /// zeroed, otherwise its contents are unspecified (though initialized,
    /// they're just bytes).
    #[track_caller]
    pub fn allocate_raw(&self, size: usize, options: AllocateOptions) -> Option<NonNull<u8>> {
        if size == 0 || size > isize::MAX as usize {
            return None;
        }

        let ptr = NonNull::new(self.platform.malloc(size) as *mut u8)?;

        if options.contains(AllocateOptions::ZERO_MEMORY) {
            // Safety: `ptr` was just allocated by the platform with `size`
            // bytes, and nothing else has a pointer to it yet.
            zero_memory(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) });
        }

        if let Some(recorder) = self.recorder {
            recorder.record(AllocationRecord {
                options,
                size,
                address: ptr,
                location: Location::caller(),
            });
        }

        Some(ptr)
    }

    /// Frees memory allocated with [`BasicAllocator::allocate_raw`].
    ///
    /// ### Safety
    ///
    /// `ptr` must have been returned by `allocate_raw` of an allocator using
    /// the same platform, called with the same `size`, and it must not have
    /// been freed yet. The memory must not be accessed after this call.
    pub unsafe fn deallocate_raw(&self, ptr: NonNull<u8>, size: usize) {
        if let Some(recorder) = self.recorder {
            recorder.forget(ptr);
        }
        // Safety: the requirements are passed on to the caller.
        unsafe { self.platform.free(ptr.as_ptr() as *mut c_void, size) };
    }
}

impl Allocator for BasicAllocator<'_> {
    const RELEASES_MEMORY: bool = true;

    #[track_caller]
    fn allocate_layout(&self, layout: Layout) -> Option<NonNull<u8>> {
        let ptr = self.allocate_raw(layout.size(), AllocateOptions::NONE)?;
        if ptr.as_ptr().align_offset(layout.align()) != 0 {
            // The platform only promises alignment for primitive types, so
            // overaligned types may not fit.
            // Safety: just allocated with the same size, never handed out.
            unsafe { self.deallocate_raw(ptr, layout.size()) };
            return None;
        }
        Some(ptr)
    }

    unsafe fn deallocate_layout(&self, ptr: NonNull<u8>, layout: Layout) {
        // Safety: `allocate_layout` allocates with `allocate_raw` using the
        // layout's size, the rest is up to the caller.
        unsafe { self.deallocate_raw(ptr, layout.size()) };
    }
}

/// A byte buffer allocated with a [`BasicAllocator`], freed on drop.
///
/// Think of `Box<[u8]>`, but without a dependency on `alloc`, and with the
/// memory coming from the [`Platform`].
pub struct OwnedBuffer<'a> {
    ptr: NonNull<u8>,
    size: usize,
    allocator: BasicAllocator<'a>,
}

impl<'a> OwnedBuffer<'a> {
    /// Returns the pointer to the start of the buffer, without creating a
    /// reference to the contents.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// The allocator the buffer will be freed with.
    pub fn allocator(&self) -> BasicAllocator<'a> {
        self.allocator
    }
}

impl Debug for OwnedBuffer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OwnedBuffer")
            .field("ptr", &self.ptr)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Deref for OwnedBuffer<'_> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        // Safety: `ptr` points to `size` bytes owned exclusively by this
        // buffer, initialized by the platform (they're just bytes, any value is
        // valid), and the borrow can't outlive the buffer.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.size) }
    }
}

impl DerefMut for OwnedBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: see Deref, and we have an exclusive borrow of the buffer.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }
}

impl Drop for OwnedBuffer<'_> {
    fn drop(&mut self) {
        // Safety: the pointer was allocated in `BasicAllocator::allocate` with
        // this size, and since this is the only owner of it and it's being
        // dropped, it can't be used anymore.
        unsafe { self.allocator.deallocate_raw(self.ptr, self.size) };
    }
}

#[cfg(test)]
mod tests {
    use core::alloc::Layout;

    use crate::{
        allocators::Allocator, diagnostics::AllocationRecords, memory::AllocateOptions,
        test_platform::TestPlatform,
    };

    use super::BasicAllocator;

    #[test]
    fn buffers_are_freed_on_drop() {
        let platform = TestPlatform::new();
        let allocator = BasicAllocator::new(&platform);
        let buffer = allocator.allocate(100, AllocateOptions::NONE).unwrap();
        assert_eq!(100, buffer.len());
        assert_eq!(1, platform.live_allocations());
        drop(buffer);
        assert_eq!(0, platform.live_allocations());
    }

    #[test]
    fn zeroes_when_asked() {
        let platform = TestPlatform::new();
        platform.fill_new_allocations_with(0xCD);
        let allocator = BasicAllocator::new(&platform);
        let dirty = allocator.allocate(16, AllocateOptions::NONE).unwrap();
        assert!(dirty.iter().all(|b| *b == 0xCD));
        let zeroed = allocator.allocate(16, AllocateOptions::ZERO_MEMORY).unwrap();
        assert!(zeroed.iter().all(|b| *b == 0));
    }

    #[test]
    fn zero_sized_and_failed_allocations_return_none() {
        let platform = TestPlatform::new();
        let allocator = BasicAllocator::new(&platform);
        assert!(allocator.allocate(0, AllocateOptions::NONE).is_none());
        platform.set_out_of_memory(true);
        assert!(allocator.allocate(8, AllocateOptions::NONE).is_none());
    }

    #[test]
    fn recorder_sees_allocations_and_frees() {
        let platform = TestPlatform::new();
        let records = AllocationRecords::new(&platform);
        let allocator = BasicAllocator::with_recorder(&platform, &records);

        let a = allocator.allocate(10, AllocateOptions::NONE).unwrap();
        let b = allocator.allocate(20, AllocateOptions::ZERO_MEMORY).unwrap();
        assert_eq!(2, records.len());
        assert_eq!(30, records.live_bytes());

        drop(a);
        assert_eq!(1, records.len());
        assert_eq!(20, records.live_bytes());
        drop(b);
        assert!(records.is_empty());
    }

    #[test]
    fn layout_allocations_are_aligned() {
        let platform = TestPlatform::new();
        let allocator = BasicAllocator::new(&platform);
        let layout = Layout::new::<u64>();
        let ptr = allocator.allocate_layout(layout).unwrap();
        assert_eq!(0, ptr.as_ptr() as usize % 8);
        // Safety: allocated right above with the same layout.
        unsafe { allocator.deallocate_layout(ptr, layout) };
        assert_eq!(0, platform.live_allocations());
    }
}

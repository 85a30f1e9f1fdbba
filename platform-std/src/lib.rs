// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! A [`Platform`] implementation for hosted targets, built on the standard
//! library's global allocator and standard output.

use std::{
    alloc::{self, Layout},
    cell::Cell,
    ffi::c_void,
    fmt::Arguments,
    io::{self, Write},
    ptr,
};

use platform::{Platform, DEFAULT_PAGE_SIZE};

/// Alignment of every block returned by [`StdPlatform::malloc`]. Enough for
/// any primitive type, and for cache-line aligned structs.
pub const ALLOCATION_ALIGNMENT: usize = 64;

/// [`Platform`] over [`std::alloc`] and [`std::io::stdout`].
#[derive(Debug)]
pub struct StdPlatform {
    page_size: usize,
    live_allocations: Cell<usize>,
    live_bytes: Cell<usize>,
}

impl StdPlatform {
    pub fn new() -> StdPlatform {
        StdPlatform {
            page_size: query_page_size(),
            live_allocations: Cell::new(0),
            live_bytes: Cell::new(0),
        }
    }

    /// The amount of blocks allocated with [`Platform::malloc`] and not yet
    /// freed.
    pub fn live_allocations(&self) -> usize {
        self.live_allocations.get()
    }

    /// The total size of the blocks counted by
    /// [`StdPlatform::live_allocations`].
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.get()
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        StdPlatform::new()
    }
}

impl Platform for StdPlatform {
    fn malloc(&self, size: usize) -> *mut c_void {
        if size == 0 {
            return ptr::null_mut();
        }
        let Ok(layout) = Layout::from_size_align(size, ALLOCATION_ALIGNMENT) else {
            return ptr::null_mut();
        };
        // Safety: the layout has a non-zero size.
        let ptr = unsafe { alloc::alloc(layout) };
        if !ptr.is_null() {
            self.live_allocations.set(self.live_allocations.get() + 1);
            self.live_bytes.set(self.live_bytes.get() + size);
        }
        ptr.cast()
    }

    unsafe fn free(&self, ptr: *mut c_void, size: usize) {
        if ptr.is_null() || size == 0 {
            return;
        }
        // Safety: malloc succeeded with this size, so the layout is valid.
        let layout = unsafe { Layout::from_size_align_unchecked(size, ALLOCATION_ALIGNMENT) };
        // Safety: the caller guarantees that ptr was allocated by malloc with
        // this size, i.e. with this same layout, and hasn't been freed yet.
        unsafe { alloc::dealloc(ptr.cast(), layout) };
        self.live_allocations.set(self.live_allocations.get() - 1);
        self.live_bytes.set(self.live_bytes.get() - size);
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn println(&self, message: Arguments) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_fmt(message);
        let _ = stdout.write_all(b"\n");
    }
}

#[cfg(unix)]
fn query_page_size() -> usize {
    // Safety: sysconf has no preconditions, it returns -1 for unsupported
    // names.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    match usize::try_from(page_size) {
        Ok(page_size) if page_size.is_power_of_two() => page_size,
        _ => DEFAULT_PAGE_SIZE,
    }
}

#[cfg(not(unix))]
fn query_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use platform::Platform;
    use runtime::{
        diagnostics::AllocationRecords, AllocateOptions, BasicAllocator, BlockAllocator,
        BlockAllocatorConfig, FixedArena,
    };

    use super::{StdPlatform, ALLOCATION_ALIGNMENT};

    #[test]
    fn malloc_is_aligned_and_counted() {
        let platform = StdPlatform::new();
        let ptr = platform.malloc(100);
        assert!(!ptr.is_null());
        assert_eq!(0, ptr as usize % ALLOCATION_ALIGNMENT);
        assert_eq!(1, platform.live_allocations());
        assert_eq!(100, platform.live_bytes());
        unsafe { platform.free(ptr, 100) };
        assert_eq!(0, platform.live_allocations());
        assert_eq!(0, platform.live_bytes());
    }

    #[test]
    fn zero_sized_malloc_returns_null() {
        let platform = StdPlatform::new();
        assert!(platform.malloc(0).is_null());
        assert_eq!(0, platform.live_allocations());
    }

    #[test]
    fn page_size_is_a_power_of_two() {
        assert!(StdPlatform::new().page_size().is_power_of_two());
    }

    #[test]
    fn runtime_allocators_free_everything() {
        let platform = StdPlatform::new();
        {
            let allocator = BasicAllocator::new(&platform);
            let arena = FixedArena::new(allocator, 1000).unwrap();
            let bytes = arena.allocate(10, AllocateOptions::ZERO_MEMORY).unwrap();
            assert_eq!([0; 10], *bytes);

            let blocks =
                BlockAllocator::new(allocator, BlockAllocatorConfig::dynamic(1, 64)).unwrap();
            for _ in 0..10 {
                blocks.allocate(48, AllocateOptions::NONE).unwrap();
            }
            assert!(platform.live_allocations() > 2);
        }
        assert_eq!(0, platform.live_allocations());
    }

    #[test]
    fn allocation_records_track_std_allocations() {
        let platform = StdPlatform::new();
        let records = AllocationRecords::new(&platform);
        {
            let allocator = BasicAllocator::with_recorder(&platform, &records);
            let _arena = FixedArena::new(allocator, 256).unwrap();
            assert_eq!(1, records.len());
            assert_eq!(256, records.live_bytes());
        }
        assert!(records.is_empty());
    }
}

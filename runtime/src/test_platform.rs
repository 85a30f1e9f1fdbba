// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

extern crate alloc;

use core::{
    cell::{Cell, RefCell},
    ffi::c_void,
    fmt::Arguments,
    ptr,
};

use alloc::{boxed::Box, string::String, vec::Vec};
use platform::{Platform, DEFAULT_PAGE_SIZE};

#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct VeryAlignedThing([u8; 64]);

/// A [`Platform`] for tests: allocates from the test harness's heap, counts
/// live allocations, and keeps everything printed.
pub struct TestPlatform {
    live_allocations: Cell<usize>,
    out_of_memory: Cell<bool>,
    fill_byte: Cell<u8>,
    page_size: usize,
    printed_lines: RefCell<Vec<String>>,
}

impl Default for TestPlatform {
    fn default() -> Self {
        TestPlatform::new()
    }
}

impl TestPlatform {
    pub fn new() -> TestPlatform {
        TestPlatform::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> TestPlatform {
        TestPlatform {
            live_allocations: Cell::new(0),
            out_of_memory: Cell::new(false),
            fill_byte: Cell::new(0),
            page_size,
            printed_lines: RefCell::new(Vec::new()),
        }
    }

    /// The amount of allocations which have not been freed yet.
    pub fn live_allocations(&self) -> usize {
        self.live_allocations.get()
    }

    /// Makes every following `malloc` fail (or succeed again).
    pub fn set_out_of_memory(&self, out_of_memory: bool) {
        self.out_of_memory.set(out_of_memory);
    }

    /// Sets the byte new allocations are filled with, to make it visible
    /// whether something zeroed them.
    pub fn fill_new_allocations_with(&self, byte: u8) {
        self.fill_byte.set(byte);
    }

    pub fn printed_lines(&self) -> Vec<String> {
        self.printed_lines.borrow().clone()
    }
}

impl Platform for TestPlatform {
    fn malloc(&self, size: usize) -> *mut c_void {
        if self.out_of_memory.get() {
            return ptr::null_mut();
        }
        let count = size.div_ceil(size_of::<VeryAlignedThing>());
        let fill = VeryAlignedThing([self.fill_byte.get(); 64]);
        let things: Box<[VeryAlignedThing]> = alloc::vec![fill; count].into_boxed_slice();
        self.live_allocations.set(self.live_allocations.get() + 1);
        Box::into_raw(things) as *mut VeryAlignedThing as *mut c_void
    }

    unsafe fn free(&self, ptr: *mut c_void, size: usize) {
        let count = size.div_ceil(size_of::<VeryAlignedThing>());
        let things = ptr::slice_from_raw_parts_mut(ptr as *mut VeryAlignedThing, count);
        // Safety: ptr was allocated in `malloc` as a boxed slice of `count`
        // VeryAlignedThings, since the caller passes in the same size.
        drop(unsafe { Box::from_raw(things) });
        self.live_allocations.set(self.live_allocations.get() - 1);
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn println(&self, message: Arguments) {
        self.printed_lines.borrow_mut().push(alloc::format!("{message}"));
    }
}

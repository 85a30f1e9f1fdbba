// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    cell::{Cell, RefCell},
    panic::Location,
    ptr::NonNull,
    slice,
};

use platform::Platform;

use crate::{
    allocators::{AllocationRecorder, BasicAllocator},
    collections::LinkedList,
    memory::AllocateOptions,
};

use super::hex_dump;

/// One live allocation made through a recording [`BasicAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRecord {
    pub options: AllocateOptions,
    pub size: usize,
    pub address: NonNull<u8>,
    /// Where the allocation was made from. Functions which allocate on behalf
    /// of their caller are `#[track_caller]`, so this is usually the place
    /// where e.g. the arena was created, not the arena's constructor.
    pub location: &'static Location<'static>,
}

/// Keeps a record of every live allocation made by the [`BasicAllocator`]s
/// created with [`BasicAllocator::with_recorder`] using this as the recorder.
///
/// The records themselves are allocated from the same platform, but without
/// recording, so that they don't show up in the dumps.
pub struct AllocationRecords<'a> {
    records: RefCell<LinkedList<AllocationRecord, BasicAllocator<'a>>>,
    /// Allocations which couldn't be recorded because the platform was out of
    /// memory.
    unrecorded: Cell<usize>,
}

impl<'a> AllocationRecords<'a> {
    pub fn new(platform: &'a dyn Platform) -> AllocationRecords<'a> {
        AllocationRecords {
            records: RefCell::new(LinkedList::new(BasicAllocator::new(platform))),
            unrecorded: Cell::new(0),
        }
    }

    /// The amount of live allocations.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sum of the sizes of the live allocations.
    pub fn live_bytes(&self) -> usize {
        self.records.borrow().iter().map(|record| record.size).sum()
    }

    /// The amount of allocations which were made but couldn't be recorded.
    pub fn unrecorded(&self) -> usize {
        self.unrecorded.get()
    }

    /// Calls `f` for each live allocation, oldest first.
    ///
    /// Allocating or freeing with a recording allocator from within `f`
    /// panics, since the records are borrowed.
    pub fn for_each(&self, mut f: impl FnMut(&AllocationRecord)) {
        for record in self.records.borrow().iter() {
            f(record);
        }
    }

    /// Prints out every live allocation, one per line.
    pub fn dump(&self, platform: &dyn Platform) {
        self.print_header(platform);
        self.for_each(|record| print_record(platform, record));
        self.print_unrecorded(platform);
    }

    /// Like [`AllocationRecords::dump`], with a hex dump of each allocation's
    /// current contents.
    ///
    /// ### Safety
    ///
    /// None of the live allocations may be mutably borrowed while this runs,
    /// and they must all still be allocated (which is the case if every free
    /// went through the same recording allocators as the allocations).
    pub unsafe fn dump_with_contents(&self, platform: &dyn Platform) {
        self.print_header(platform);
        self.for_each(|record| {
            print_record(platform, record);
            // Safety: the caller guarantees the allocation is live and not
            // being mutated, and the record's size is the allocation's size.
            let contents = unsafe { slice::from_raw_parts(record.address.as_ptr(), record.size) };
            hex_dump(record.address.as_ptr() as usize, contents, |line| {
                platform.println(format_args!("    {line}"));
            });
        });
        self.print_unrecorded(platform);
    }

    fn print_header(&self, platform: &dyn Platform) {
        platform.println(format_args!(
            "{} live allocations, {} bytes in total:",
            self.len(),
            self.live_bytes(),
        ));
    }

    fn print_unrecorded(&self, platform: &dyn Platform) {
        if self.unrecorded() > 0 {
            platform.println(format_args!(
                "(and {} allocations which could not be recorded)",
                self.unrecorded(),
            ));
        }
    }
}

fn print_record(platform: &dyn Platform, record: &AllocationRecord) {
    let zeroed = if record.options.contains(AllocateOptions::ZERO_MEMORY) {
        " (zeroed)"
    } else {
        ""
    };
    platform.println(format_args!(
        "{:p}: {} bytes{zeroed}, allocated at {}",
        record.address, record.size, record.location,
    ));
}

impl AllocationRecorder for AllocationRecords<'_> {
    fn record(&self, record: AllocationRecord) {
        if self.records.borrow_mut().push_back(record).is_err() {
            self.unrecorded.set(self.unrecorded.get() + 1);
        }
    }

    fn forget(&self, address: NonNull<u8>) {
        let removed = self
            .records
            .borrow_mut()
            .remove_first(|record| record.address == address);
        debug_assert!(
            removed.is_some() || self.unrecorded() > 0,
            "freed an allocation which was never recorded: {address:p}",
        );
    }
}

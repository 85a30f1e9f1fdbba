// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::{
    alloc::Layout,
    cell::RefCell,
    fmt::Debug,
    ptr::{self, NonNull},
    slice,
};

use crate::memory::{page_align, zero_memory, AllocateOptions};

use super::{bump::BumpCursor, Allocator, BasicAllocator, OwnedBuffer};

/// How a [`BlockAllocator`] sizes its blocks and whether it can grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    /// Every block has its own allocation, and new blocks are allocated as
    /// needed, without limit. New blocks are at least `block_size` bytes,
    /// rounded up to the page size.
    Dynamic {
        /// Size of the initial blocks, and the minimum size of grown blocks.
        block_size: usize,
    },
    /// A pool of at most `slot_limit` equally sized slots, carved out of one
    /// allocation made up front. Every allocation must be exactly `slot_size`
    /// bytes.
    Pool {
        /// The size of every block, and of every allocation.
        slot_size: usize,
        /// The maximum amount of blocks.
        slot_limit: usize,
    },
}

/// Parameters for [`BlockAllocator::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAllocatorConfig {
    /// Blocks created immediately. Clamped to `slot_limit` in pool mode.
    pub initial_block_count: usize,
    pub mode: BlockMode,
}

impl BlockAllocatorConfig {
    /// A growable allocator starting with `initial_block_count` blocks of
    /// `block_size` bytes. With a `block_size` of zero, no blocks are created
    /// up front, like with [`BlockAllocator::empty`].
    pub const fn dynamic(initial_block_count: usize, block_size: usize) -> BlockAllocatorConfig {
        BlockAllocatorConfig {
            initial_block_count,
            mode: BlockMode::Dynamic { block_size },
        }
    }

    /// A pool of `slot_count` slots of `slot_size` bytes, all carved out at
    /// construction.
    pub const fn pool(slot_size: usize, slot_count: usize) -> BlockAllocatorConfig {
        BlockAllocatorConfig {
            initial_block_count: slot_count,
            mode: BlockMode::Pool {
                slot_size,
                slot_limit: slot_count,
            },
        }
    }
}

/// Stable identifier of a block in a [`BlockAllocator`]. Blocks are never
/// removed before the whole allocator is destroyed, so handles stay valid
/// until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(u32);

impl BlockHandle {
    /// The position of the block in creation order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A snapshot of one block's bookkeeping, see [`BlockAllocator::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub handle: BlockHandle,
    pub data: NonNull<u8>,
    pub capacity: usize,
    pub occupied: usize,
}

impl BlockInfo {
    /// Returns true if `ptr` points into this block's memory.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.data.as_ptr() as usize;
        (start..start + self.capacity).contains(&(ptr as usize))
    }
}

#[derive(Debug)]
struct Block {
    next: Option<BlockHandle>,
    previous: Option<BlockHandle>,
    stack: BumpCursor,
}

/// Slab of [`Block`]s, indexed by [`BlockHandle`]. Only grows.
struct BlockTable {
    blocks: NonNull<Block>,
    len: usize,
    capacity: usize,
}

impl BlockTable {
    const fn empty() -> BlockTable {
        BlockTable {
            blocks: NonNull::dangling(),
            len: 0,
            capacity: 0,
        }
    }

    fn with_capacity(allocator: &BasicAllocator, capacity: usize) -> Option<BlockTable> {
        if capacity == 0 {
            return Some(BlockTable::empty());
        }
        let layout = Layout::array::<Block>(capacity).ok()?;
        let blocks = allocator.allocate_layout(layout)?.cast::<Block>();
        Some(BlockTable {
            blocks,
            len: 0,
            capacity,
        })
    }

    fn get(&self, handle: BlockHandle) -> Option<&Block> {
        if handle.index() >= self.len {
            return None;
        }
        // Safety: the first `len` blocks are initialized, and the table owns
        // them.
        Some(unsafe { &*self.blocks.as_ptr().add(handle.index()) })
    }

    fn get_mut(&mut self, handle: BlockHandle) -> Option<&mut Block> {
        if handle.index() >= self.len {
            return None;
        }
        // Safety: see `get`, and self is borrowed mutably.
        Some(unsafe { &mut *self.blocks.as_ptr().add(handle.index()) })
    }

    /// Appends the block, doubling the capacity first if `growable` and the
    /// table is full. Gives the block back if it can't be stored.
    fn push(
        &mut self,
        allocator: &BasicAllocator,
        block: Block,
        growable: bool,
    ) -> Result<BlockHandle, Block> {
        let Ok(index) = u32::try_from(self.len) else {
            return Err(block);
        };
        if self.len == self.capacity {
            if !growable {
                return Err(block);
            }
            let Some(mut grown) = BlockTable::with_capacity(allocator, (self.capacity * 2).max(4))
            else {
                return Err(block);
            };
            // Safety: both tables have room for `self.len` blocks and don't
            // overlap. The old blocks are moved, not copied: the old table is
            // freed without reading them again.
            unsafe { ptr::copy_nonoverlapping(self.blocks.as_ptr(), grown.blocks.as_ptr(), self.len) };
            grown.len = self.len;
            self.len = 0;
            self.free(allocator);
            *self = grown;
        }
        // Safety: `len < capacity`, so the slot is within the allocation, and
        // it's not initialized yet, so nothing gets overwritten without a drop.
        unsafe { self.blocks.as_ptr().add(self.len).write(block) };
        self.len += 1;
        Ok(BlockHandle(index))
    }

    /// Frees the table's own memory. The blocks' memory is not touched.
    fn free(&mut self, allocator: &BasicAllocator) {
        if self.capacity > 0 {
            if let Ok(layout) = Layout::array::<Block>(self.capacity) {
                // Safety: allocated in `with_capacity` with this same layout,
                // and the table is emptied right after, so it won't be used.
                unsafe { allocator.deallocate_layout(self.blocks.cast(), layout) };
            }
        }
        *self = BlockTable::empty();
    }
}

struct BlockChain {
    table: BlockTable,
    head: Option<BlockHandle>,
    tail: Option<BlockHandle>,
}

impl BlockChain {
    fn find(&self, data: NonNull<u8>) -> Option<BlockHandle> {
        let mut current = self.head;
        while let Some(handle) = current {
            let block = self.table.get(handle)?;
            if block.stack.data() == data.as_ptr() {
                return Some(handle);
            }
            current = block.next;
        }
        None
    }

    fn bump_first_fit(&self, size: usize) -> Option<(BlockHandle, NonNull<u8>)> {
        let mut current = self.head;
        while let Some(handle) = current {
            let block = self.table.get(handle)?;
            if let Some(ptr) = block.stack.bump(size) {
                return Some((handle, ptr));
            }
            current = block.next;
        }
        None
    }

    fn append(
        &mut self,
        allocator: &BasicAllocator,
        stack: BumpCursor,
        growable: bool,
    ) -> Result<BlockHandle, Block> {
        let block = Block {
            next: None,
            previous: self.tail,
            stack,
        };
        let handle = self.table.push(allocator, block, growable)?;
        if let Some(tail) = self.tail.and_then(|tail| self.table.get_mut(tail)) {
            tail.next = Some(handle);
        } else {
            self.head = Some(handle);
        }
        self.tail = Some(handle);
        Ok(handle)
    }

    fn info(&self, handle: BlockHandle) -> Option<BlockInfo> {
        let block = self.table.get(handle)?;
        Some(BlockInfo {
            handle,
            data: NonNull::new(block.stack.data())?,
            capacity: block.stack.capacity(),
            occupied: block.stack.occupied(),
        })
    }
}

/// A chain of bump-allocated blocks. In [`BlockMode::Dynamic`], a bag of
/// variable-sized allocations which grows a block at a time. In
/// [`BlockMode::Pool`], a capped set of equally sized slots which can be
/// emptied individually with [`BlockAllocator::reset`].
///
/// Allocation is first fit: the first block (in creation order) with enough
/// room gets the allocation.
pub struct BlockAllocator<'a> {
    allocator: BasicAllocator<'a>,
    mode: BlockMode,
    chain: RefCell<BlockChain>,
    /// The shared backing memory of the slots in pool mode.
    pool_data: Option<OwnedBuffer<'a>>,
    destroyed: bool,
}

impl Debug for BlockAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockAllocator")
            .field("mode", &self.mode)
            .field("block_count", &self.block_count())
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl<'a> BlockAllocator<'a> {
    /// A dynamic block allocator without any blocks. The first allocation
    /// creates a page-aligned block big enough for it.
    pub fn empty(allocator: BasicAllocator<'a>) -> BlockAllocator<'a> {
        BlockAllocator {
            allocator,
            mode: BlockMode::Dynamic { block_size: 0 },
            chain: RefCell::new(BlockChain {
                table: BlockTable::empty(),
                head: None,
                tail: None,
            }),
            pool_data: None,
            destroyed: false,
        }
    }

    /// Creates a block allocator and its initial blocks. Returns None if the
    /// memory for them can't be allocated.
    ///
    /// ### Panics
    ///
    /// If the mode is [`BlockMode::Pool`] with a `slot_size` of zero.
    #[track_caller]
    pub fn new(
        allocator: BasicAllocator<'a>,
        config: BlockAllocatorConfig,
    ) -> Option<BlockAllocator<'a>> {
        let mut block_allocator = BlockAllocator::empty(allocator);
        block_allocator.mode = config.mode;

        match config.mode {
            BlockMode::Dynamic { block_size } => {
                let initial_block_count = if block_size == 0 {
                    0
                } else {
                    config.initial_block_count
                };
                let chain = block_allocator.chain.get_mut();
                chain.table = BlockTable::with_capacity(&allocator, initial_block_count)?;
                for _ in 0..initial_block_count {
                    let data = allocator.allocate_raw(block_size, AllocateOptions::NONE)?;
                    // Safety: `data` was just allocated with `block_size`
                    // bytes, and it's only freed in `destroy`.
                    let stack = unsafe { BumpCursor::new(data.as_ptr(), block_size) };
                    if let Err(block) = chain.append(&allocator, stack, true) {
                        // Safety: allocated above, never handed out.
                        unsafe { allocator.deallocate_raw(data, block.stack.capacity()) };
                        return None;
                    }
                }
            }

            BlockMode::Pool {
                slot_size,
                slot_limit,
            } => {
                assert!(slot_size > 0, "pool slots must be at least one byte");
                let blob_size = slot_size.checked_mul(slot_limit)?;
                let chain = block_allocator.chain.get_mut();
                chain.table = BlockTable::with_capacity(&allocator, slot_limit)?;
                if blob_size > 0 {
                    block_allocator.pool_data =
                        Some(allocator.allocate(blob_size, AllocateOptions::NONE)?);
                }
                for _ in 0..config.initial_block_count.min(slot_limit) {
                    block_allocator.grow(slot_size)?;
                }
            }
        }

        Some(block_allocator)
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    /// The amount of blocks currently in the chain.
    pub fn block_count(&self) -> usize {
        self.chain.borrow().table.len
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Allocates `size` bytes from the first block with room for them, adding
    /// a new block at the end of the chain if none has. Returns None if the
    /// pool is full, the platform is out of memory, `size` is zero, or the
    /// allocator has been destroyed.
    ///
    /// ### Panics
    ///
    /// In [`BlockMode::Pool`], if `size` is not the slot size.
    #[track_caller]
    pub fn allocate(&self, size: usize, options: AllocateOptions) -> Option<&mut [u8]> {
        let (_, bytes) = self.allocate_with_handle(size, options)?;
        Some(bytes)
    }

    /// Like [`BlockAllocator::allocate`], also returning the handle of the
    /// block the allocation was made in.
    #[track_caller]
    pub fn allocate_with_handle(
        &self,
        size: usize,
        options: AllocateOptions,
    ) -> Option<(BlockHandle, &mut [u8])> {
        if let BlockMode::Pool { slot_size, .. } = self.mode {
            assert_eq!(
                slot_size, size,
                "pool-mode block allocators only allocate whole slots"
            );
        }
        if size == 0 || self.destroyed {
            return None;
        }

        let existing = self.chain.borrow().bump_first_fit(size);
        let (handle, ptr) = match existing {
            Some(found) => found,
            None => {
                let handle = self.grow(size)?;
                let chain = self.chain.borrow();
                (handle, chain.table.get(handle)?.stack.bump(size)?)
            }
        };

        // Safety:
        // - The pointer is valid for `size` bytes: the block's cursor only
        //   hands out regions of the block's memory, which lives until
        //   `destroy`, which requires `&mut self`.
        // - The region is not aliased: cursors never hand out overlapping
        //   regions before being reset, and resets require `&mut self`.
        // - Platform memory is initialized, and any byte is a valid `u8`.
        let bytes = unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) };
        if options.contains(AllocateOptions::ZERO_MEMORY) {
            zero_memory(bytes);
        }
        Some((handle, bytes))
    }

    /// Appends a new block able to hold `size` bytes.
    fn grow(&self, size: usize) -> Option<BlockHandle> {
        let mut chain = self.chain.borrow_mut();
        match self.mode {
            BlockMode::Pool {
                slot_size,
                slot_limit,
            } => {
                let index = chain.table.len;
                if index >= slot_limit {
                    return None;
                }
                let blob = self.pool_data.as_ref()?;
                // Safety: `index < slot_limit`, and the blob is `slot_size *
                // slot_limit` bytes, so the slot is within the blob, which
                // lives as long as the allocator.
                let stack = unsafe { BumpCursor::new(blob.as_ptr().add(index * slot_size), slot_size) };
                chain.append(&self.allocator, stack, false).ok()
            }

            BlockMode::Dynamic { block_size } => {
                let platform = self.allocator.platform();
                let new_block_size = page_align(platform, size.max(block_size));
                let data = self.allocator.allocate_raw(new_block_size, AllocateOptions::NONE)?;
                // Safety: just allocated with `new_block_size` bytes, freed in
                // `destroy`.
                let stack = unsafe { BumpCursor::new(data.as_ptr(), new_block_size) };
                match chain.append(&self.allocator, stack, true) {
                    Ok(handle) => Some(handle),
                    Err(_) => {
                        // Safety: allocated above, never handed out.
                        unsafe { self.allocator.deallocate_raw(data, new_block_size) };
                        None
                    }
                }
            }
        }
    }

    /// The data pointer of the first block.
    pub fn first(&self) -> Option<NonNull<u8>> {
        let chain = self.chain.borrow();
        let head = chain.head?;
        NonNull::new(chain.table.get(head)?.stack.data())
    }

    /// The data pointer of the block after the one starting at `data`.
    ///
    /// Finding the current block is a linear search, so walking the whole
    /// chain this way is quadratic. Use [`BlockAllocator::blocks`] if that
    /// matters.
    pub fn next(&self, data: NonNull<u8>) -> Option<NonNull<u8>> {
        let chain = self.chain.borrow();
        let current = chain.find(data)?;
        let next = chain.table.get(current)?.next?;
        NonNull::new(chain.table.get(next)?.stack.data())
    }

    /// Returns the handle of the block whose memory starts at `data`.
    pub fn find_block(&self, data: NonNull<u8>) -> Option<BlockHandle> {
        self.chain.borrow().find(data)
    }

    pub fn block_info(&self, handle: BlockHandle) -> Option<BlockInfo> {
        self.chain.borrow().info(handle)
    }

    /// Iterates over the blocks in chain order.
    pub fn blocks(&self) -> Blocks<'_, 'a> {
        Blocks {
            allocator: self,
            next: self.chain.borrow().head,
        }
    }

    /// Empties the block whose memory starts at `data`, leaving the other
    /// blocks as they are. Returns false if no block starts at `data`.
    pub fn reset(&mut self, data: NonNull<u8>) -> bool {
        match self.find_block(data) {
            Some(handle) => self.reset_block(handle),
            None => false,
        }
    }

    /// Empties one block. Returns false if there's no such block.
    pub fn reset_block(&mut self, handle: BlockHandle) -> bool {
        match self.chain.get_mut().table.get_mut(handle) {
            Some(block) => {
                block.stack.reset();
                true
            }
            None => false,
        }
    }

    /// The occupied bytes of one block.
    pub fn block_bytes_mut(&mut self, handle: BlockHandle) -> Option<&mut [u8]> {
        let info = self.chain.get_mut().info(handle)?;
        // Safety: the occupied bytes are within the block's memory, and the
        // exclusive borrow of self means no slices returned by `allocate` are
        // alive anymore.
        Some(unsafe { slice::from_raw_parts_mut(info.data.as_ptr(), info.occupied) })
    }

    /// The occupied bytes of one block, without requiring exclusive access.
    ///
    /// ### Safety
    ///
    /// No mutable slice returned by [`BlockAllocator::allocate`] pointing into
    /// this block may be alive while the returned slice is.
    pub unsafe fn block_bytes_unchecked(&self, handle: BlockHandle) -> Option<&[u8]> {
        let info = self.block_info(handle)?;
        // Safety: the occupied bytes are within the block's memory, which
        // lives until `destroy(&mut self)`. Aliasing is up to the caller.
        Some(unsafe { slice::from_raw_parts(info.data.as_ptr(), info.occupied) })
    }

    /// Frees every block and the block table. Returns false if the allocator
    /// had already been destroyed. Dropping does the same.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;

        let chain = self.chain.get_mut();
        match self.mode {
            BlockMode::Pool { .. } => {
                // The slots are all in the one shared blob.
                self.pool_data = None;
            }
            BlockMode::Dynamic { .. } => {
                let mut current = chain.head;
                while let Some(handle) = current {
                    let Some(block) = chain.table.get(handle) else {
                        break;
                    };
                    if let Some(data) = NonNull::new(block.stack.data()) {
                        // Safety: every block in dynamic mode owns its memory,
                        // allocated in `new` or `grow` with its capacity. The
                        // block table is freed right after, so the pointer
                        // isn't used again.
                        unsafe { self.allocator.deallocate_raw(data, block.stack.capacity()) };
                    }
                    current = block.next;
                }
            }
        }

        chain.table.free(&self.allocator);
        chain.head = None;
        chain.tail = None;
        true
    }
}

impl Drop for BlockAllocator<'_> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Iterator over the blocks of a [`BlockAllocator`], see
/// [`BlockAllocator::blocks`].
pub struct Blocks<'b, 'a> {
    allocator: &'b BlockAllocator<'a>,
    next: Option<BlockHandle>,
}

impl Iterator for Blocks<'_, '_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let chain = self.allocator.chain.borrow();
        let handle = self.next?;
        self.next = chain.table.get(handle)?.next;
        chain.info(handle)
    }
}

#[cfg(test)]
mod tests {
    use core::ptr::NonNull;

    use crate::{
        allocators::BasicAllocator, memory::AllocateOptions, test_platform::TestPlatform,
    };

    use super::{BlockAllocator, BlockAllocatorConfig, BlockInfo};

    fn owning_blocks(allocator: &BlockAllocator, ptr: *const u8) -> usize {
        allocator
            .blocks()
            .filter(|info: &BlockInfo| info.contains(ptr))
            .count()
    }

    #[test]
    fn dynamic_mode_grows_one_block_at_a_time() {
        let platform = TestPlatform::new();
        let config = BlockAllocatorConfig::dynamic(1, 4096);
        let allocator = BlockAllocator::new(BasicAllocator::new(&platform), config).unwrap();
        assert_eq!(1, allocator.block_count());

        let mut pointers = [core::ptr::null::<u8>(); 3];
        for (i, pointer) in pointers.iter_mut().enumerate() {
            *pointer = allocator.allocate(3000, AllocateOptions::NONE).unwrap().as_ptr();
            assert_eq!(i + 1, allocator.block_count(), "3000 bytes twice don't fit in 4096");
        }
        for pointer in pointers {
            assert_eq!(1, owning_blocks(&allocator, pointer));
        }

        // The leftovers of the first block still get used, first fit.
        let small = allocator.allocate(1000, AllocateOptions::NONE).unwrap().as_ptr();
        assert_eq!(3, allocator.block_count());
        let first = allocator.blocks().next().unwrap();
        assert!(first.contains(small));
    }

    #[test]
    fn empty_allocator_grows_page_aligned_blocks() {
        let platform = TestPlatform::with_page_size(256);
        let allocator = BlockAllocator::empty(BasicAllocator::new(&platform));
        assert_eq!(0, allocator.block_count());
        assert!(allocator.first().is_none());

        allocator.allocate(10, AllocateOptions::NONE).unwrap();
        allocator.allocate(300, AllocateOptions::NONE).unwrap();
        let mut blocks = allocator.blocks();
        assert_eq!(256, blocks.next().unwrap().capacity);
        assert_eq!(512, blocks.next().unwrap().capacity);
        assert!(blocks.next().is_none());
    }

    #[test]
    fn zero_sized_dynamic_blocks_are_not_preallocated() {
        let platform = TestPlatform::with_page_size(256);
        let config = BlockAllocatorConfig::dynamic(2, 0);
        let allocator = BlockAllocator::new(BasicAllocator::new(&platform), config).unwrap();
        assert_eq!(0, allocator.block_count());
        assert_eq!(0, platform.live_allocations());

        allocator.allocate(10, AllocateOptions::NONE).unwrap();
        assert_eq!(1, allocator.block_count());
        assert_eq!(256, allocator.blocks().next().unwrap().capacity);
    }

    #[test]
    fn pool_mode_runs_out_after_the_limit() {
        let platform = TestPlatform::new();
        let config = BlockAllocatorConfig::pool(16, 4);
        let allocator = BlockAllocator::new(BasicAllocator::new(&platform), config).unwrap();

        let mut handles = [None; 4];
        for handle in &mut handles {
            let slot = allocator.allocate(16, AllocateOptions::NONE).unwrap();
            *handle = allocator.find_block(NonNull::new(slot.as_mut_ptr()).unwrap());
        }
        assert!(allocator.allocate(16, AllocateOptions::NONE).is_none());
        for (i, handle) in handles.iter().enumerate() {
            assert!(handle.is_some(), "every slot should start a block");
            assert!(!handles[..i].contains(handle), "slots should be in distinct blocks");
        }
    }

    #[test]
    fn pool_mode_carves_lazily_when_not_preallocated() {
        let platform = TestPlatform::new();
        let mut config = BlockAllocatorConfig::pool(8, 3);
        config.initial_block_count = 1;
        let allocator = BlockAllocator::new(BasicAllocator::new(&platform), config).unwrap();
        assert_eq!(1, allocator.block_count());
        for _ in 0..3 {
            allocator.allocate(8, AllocateOptions::NONE).unwrap();
        }
        assert_eq!(3, allocator.block_count());
        assert!(allocator.allocate(8, AllocateOptions::NONE).is_none());
    }

    #[test]
    #[should_panic]
    fn pool_mode_rejects_other_sizes() {
        let platform = TestPlatform::new();
        let config = BlockAllocatorConfig::pool(16, 4);
        let allocator = BlockAllocator::new(BasicAllocator::new(&platform), config).unwrap();
        let _ = allocator.allocate(8, AllocateOptions::NONE);
    }

    #[test]
    fn first_and_next_walk_the_chain() {
        let platform = TestPlatform::new();
        let config = BlockAllocatorConfig::pool(4, 3);
        let allocator = BlockAllocator::new(BasicAllocator::new(&platform), config).unwrap();

        let mut walked = 0;
        let mut current = allocator.first();
        while let Some(data) = current {
            assert_eq!(allocator.blocks().nth(walked).unwrap().data, data);
            walked += 1;
            current = allocator.next(data);
        }
        assert_eq!(3, walked);
    }

    #[test]
    fn reset_only_empties_one_block() {
        let platform = TestPlatform::new();
        let config = BlockAllocatorConfig::pool(4, 2);
        let mut allocator = BlockAllocator::new(BasicAllocator::new(&platform), config).unwrap();
        allocator.allocate(4, AllocateOptions::NONE).unwrap();
        allocator.allocate(4, AllocateOptions::NONE).unwrap();

        let second = allocator.blocks().nth(1).unwrap();
        assert!(allocator.reset(second.data));
        let occupied = allocator.blocks().map(|info| info.occupied);
        assert!(occupied.eq([4, 0]));

        let reused = allocator.allocate(4, AllocateOptions::NONE).unwrap().as_mut_ptr();
        assert_eq!(second.data.as_ptr(), reused);

        let mut elsewhere = [0u8; 4];
        assert!(!allocator.reset(NonNull::from(&mut elsewhere).cast()));
    }

    #[test]
    fn zeroes_only_when_asked() {
        let platform = TestPlatform::new();
        platform.fill_new_allocations_with(0xAB);
        let allocator = BlockAllocator::new(
            BasicAllocator::new(&platform),
            BlockAllocatorConfig::dynamic(1, 64),
        )
        .unwrap();
        assert_eq!([0xAB; 4], *allocator.allocate(4, AllocateOptions::NONE).unwrap());
        assert_eq!([0; 4], *allocator.allocate(4, AllocateOptions::ZERO_MEMORY).unwrap());
    }

    #[test]
    fn destroy_frees_everything_once() {
        let platform = TestPlatform::with_page_size(64);
        {
            let mut allocator = BlockAllocator::new(
                BasicAllocator::new(&platform),
                BlockAllocatorConfig::dynamic(2, 64),
            )
            .unwrap();
            for _ in 0..5 {
                allocator.allocate(64, AllocateOptions::NONE).unwrap();
            }
            assert!(platform.live_allocations() > 5);
            assert!(allocator.destroy());
            assert_eq!(0, platform.live_allocations());
            assert!(!allocator.destroy());
            assert!(allocator.allocate(1, AllocateOptions::NONE).is_none());
        }
        assert_eq!(0, platform.live_allocations());

        {
            let _pool = BlockAllocator::new(
                BasicAllocator::new(&platform),
                BlockAllocatorConfig::pool(32, 8),
            )
            .unwrap();
            assert_eq!(2, platform.live_allocations(), "one blob and one block table");
        }
        assert_eq!(0, platform.live_allocations());
    }
}

// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The table of known assets, and the reload flags the file watcher sets.

use core::{fmt::Display, mem::size_of};

use bytemuck::{Pod, Zeroable};

use crate::{
    allocators::{BasicAllocator, BlockAllocator, BlockAllocatorConfig, BlockHandle, Blocks},
    memory::AllocateOptions,
    text::{Str16View, Str8View},
};

/// The longest asset path that fits in an [`AssetEntry`].
pub const ASSET_PATH_CAPACITY: usize = 96;

/// The default maximum amount of assets in an [`AssetTable`].
pub const MAX_ASSET_COUNT: usize = 1024;

const ENTRY_SIZE: usize = size_of::<AssetEntry>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Texture,
    Shader,
    Tilemap,
}

impl AssetKind {
    const fn from_u32(value: u32) -> Option<AssetKind> {
        match value {
            0 => Some(AssetKind::Texture),
            1 => Some(AssetKind::Shader),
            2 => Some(AssetKind::Tilemap),
            _ => None,
        }
    }
}

/// One slot of an [`AssetTable`]. Plain old data, so that it can live in the
/// raw bytes of a pool slot.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct AssetEntry {
    kind: u32,
    reload_requested: u32,
    path_len: u32,
    path: [u8; ASSET_PATH_CAPACITY],
}

impl AssetEntry {
    pub fn kind(&self) -> Option<AssetKind> {
        AssetKind::from_u32(self.kind)
    }

    pub fn path(&self) -> Str8View<'_> {
        let len = (self.path_len as usize).min(ASSET_PATH_CAPACITY);
        Str8View::new(&self.path[..len])
    }

    pub fn reload_requested(&self) -> bool {
        self.reload_requested != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(BlockHandle);

impl AssetId {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetTableError {
    Full,
    PathTooLong { len: usize },
    AlreadyExists(AssetId),
}

impl Display for AssetTableError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AssetTableError::Full => write!(f, "the asset table is full"),
            AssetTableError::PathTooLong { len } => write!(
                f,
                "asset path is {len} bytes long, the maximum is {ASSET_PATH_CAPACITY}"
            ),
            AssetTableError::AlreadyExists(id) => {
                write!(f, "the asset is already in the table at index {}", id.index())
            }
        }
    }
}

impl core::error::Error for AssetTableError {}

/// A fixed-capacity table of assets, each identified by its path.
///
/// The entries live in the slots of a pool-mode [`BlockAllocator`], one slot
/// per entry, and removing an entry resets its slot for reuse.
#[derive(Debug)]
pub struct AssetTable<'a> {
    /// Invariant: no slice returned by `slots.allocate*` is kept around, so
    /// the slots can be read through `&self`.
    slots: BlockAllocator<'a>,
    capacity: usize,
}

impl<'a> AssetTable<'a> {
    /// Creates a table with room for `capacity` assets. Returns None if the
    /// memory for the slots can't be allocated.
    #[track_caller]
    pub fn new(allocator: BasicAllocator<'a>, capacity: usize) -> Option<AssetTable<'a>> {
        let slots = BlockAllocator::new(allocator, BlockAllocatorConfig::pool(ENTRY_SIZE, capacity))?;
        Some(AssetTable { slots, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The amount of assets in the table.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn insert(&mut self, kind: AssetKind, path: Str8View) -> Result<AssetId, AssetTableError> {
        if path.len() > ASSET_PATH_CAPACITY {
            return Err(AssetTableError::PathTooLong { len: path.len() });
        }
        if let Some(existing) = self.find(path) {
            return Err(AssetTableError::AlreadyExists(existing));
        }

        let mut entry = AssetEntry::zeroed();
        entry.kind = kind as u32;
        entry.path_len = path.len() as u32;
        entry.path[..path.len()].copy_from_slice(path.as_bytes());

        let (handle, slot) = self
            .slots
            .allocate_with_handle(ENTRY_SIZE, AllocateOptions::NONE)
            .ok_or(AssetTableError::Full)?;
        slot.copy_from_slice(bytemuck::bytes_of(&entry));
        Ok(AssetId(handle))
    }

    pub fn get(&self, id: AssetId) -> Option<&AssetEntry> {
        // Safety: the slices returned by `allocate_with_handle` are never kept
        // around, see the invariant on `slots`.
        let bytes = unsafe { self.slots.block_bytes_unchecked(id.0) }?;
        bytemuck::try_from_bytes(bytes).ok()
    }

    fn get_mut(&mut self, id: AssetId) -> Option<&mut AssetEntry> {
        let bytes = self.slots.block_bytes_mut(id.0)?;
        bytemuck::try_from_bytes_mut(bytes).ok()
    }

    /// Iterates over the assets in slot order.
    pub fn iter(&self) -> Assets<'_, 'a> {
        Assets {
            table: self,
            blocks: self.slots.blocks(),
        }
    }

    pub fn find(&self, path: Str8View) -> Option<AssetId> {
        self.iter()
            .find(|(_, entry)| entry.path().is_equals(path))
            .map(|(id, _)| id)
    }

    /// Flags the asset at `path` for reloading. Returns false if there's no
    /// such asset.
    pub fn request_reload(&mut self, path: Str8View) -> bool {
        let Some(id) = self.find(path) else {
            return false;
        };
        self.set_reload_requested(id)
    }

    /// Like [`AssetTable::request_reload`], for the UTF-16 paths file
    /// watchers report.
    pub fn request_reload_wide(&mut self, path: Str16View) -> bool {
        let found = self
            .iter()
            .find(|(_, entry)| path.is_equals_str8(entry.path()))
            .map(|(id, _)| id);
        match found {
            Some(id) => self.set_reload_requested(id),
            None => false,
        }
    }

    fn set_reload_requested(&mut self, id: AssetId) -> bool {
        match self.get_mut(id) {
            Some(entry) => {
                entry.reload_requested = 1;
                true
            }
            None => false,
        }
    }

    /// Calls `f` with every asset flagged for reloading, clearing the flags.
    /// Returns the amount of assets passed to `f`.
    pub fn take_reload_requests(&mut self, mut f: impl FnMut(AssetId, &AssetEntry)) -> usize {
        let mut taken = 0;
        let mut current = self.slots.first();
        while let Some(data) = current {
            current = self.slots.next(data);
            let Some(id) = self.slots.find_block(data).map(AssetId) else {
                continue;
            };
            let Some(entry) = self.get_mut(id) else {
                continue;
            };
            if entry.reload_requested() {
                entry.reload_requested = 0;
                f(id, entry);
                taken += 1;
            }
        }
        taken
    }

    /// Removes the asset, freeing its slot for a new one. Returns false if
    /// there was no such asset.
    pub fn remove(&mut self, id: AssetId) -> bool {
        self.get(id).is_some() && self.slots.reset_block(id.0)
    }
}

/// Iterator over the entries of an [`AssetTable`], see [`AssetTable::iter`].
pub struct Assets<'t, 'a> {
    table: &'t AssetTable<'a>,
    blocks: Blocks<'t, 'a>,
}

impl<'t> Iterator for Assets<'t, '_> {
    type Item = (AssetId, &'t AssetEntry);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = self.blocks.next()?;
            if block.occupied == 0 {
                continue;
            }
            let id = AssetId(block.handle);
            if let Some(entry) = self.table.get(id) {
                return Some((id, entry));
            }
        }
    }
}

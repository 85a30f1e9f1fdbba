// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::{Debug, Display};

use crate::{
    allocators::{BasicAllocator, OwnedBuffer},
    memory::{copy_memory, AllocateOptions},
};

use super::Str8View;

/// An owned byte string, allocated with a [`BasicAllocator`]. Always stored
/// with a trailing NUL, so it can be handed to APIs expecting C strings.
pub struct Str8<'a> {
    /// The contents and the NUL terminator.
    buffer: OwnedBuffer<'a>,
}

impl<'a> Str8<'a> {
    /// Copies `contents` into a new string. Returns None if the allocation
    /// fails.
    #[track_caller]
    pub fn from_view(allocator: BasicAllocator<'a>, contents: Str8View) -> Option<Str8<'a>> {
        let mut buffer = allocator.allocate(contents.len() + 1, AllocateOptions::ZERO_MEMORY)?;
        copy_memory(&mut buffer, contents.as_bytes());
        Some(Str8 { buffer })
    }

    pub fn view(&self) -> Str8View<'_> {
        Str8View::new(&self.buffer[..self.len()])
    }

    /// The length without the NUL terminator.
    pub fn len(&self) -> usize {
        self.buffer.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The contents followed by the NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buffer
    }

    /// Copies the string into a new allocation from the same allocator.
    #[track_caller]
    pub fn try_clone(&self) -> Option<Str8<'a>> {
        Str8::from_view(self.buffer.allocator(), self.view())
    }
}

impl PartialEq for Str8<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl Eq for Str8<'_> {}

impl Debug for Str8<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.view(), f)
    }
}

impl Display for Str8<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Display::fmt(&self.view(), f)
    }
}

#[cfg(test)]
mod tests {
    use crate::{allocators::BasicAllocator, test_platform::TestPlatform, text::Str8View};

    use super::Str8;

    #[test]
    fn owned_strings_are_nul_terminated() {
        let platform = TestPlatform::new();
        platform.fill_new_allocations_with(0xFF);
        let allocator = BasicAllocator::new(&platform);
        let path = Str8::from_view(allocator, "atlas.bmp".into()).unwrap();
        assert_eq!(9, path.len());
        assert_eq!(b"atlas.bmp\0", path.as_bytes_with_nul());
        assert!(path.view().is_equals(Str8View::from("atlas.bmp")));

        let empty = Str8::from_view(allocator, Str8View::default()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(b"\0", empty.as_bytes_with_nul());
    }

    #[test]
    fn clones_are_separate_allocations() {
        let platform = TestPlatform::new();
        let path = Str8::from_view(BasicAllocator::new(&platform), "a.bmp".into()).unwrap();
        let copy = path.try_clone().unwrap();
        assert_eq!(path, copy);
        assert_ne!(path.as_bytes_with_nul().as_ptr(), copy.as_bytes_with_nul().as_ptr());
        assert_eq!(2, platform.live_allocations());
        drop(path);
        assert_eq!("a.bmp", copy.view());
        platform.set_out_of_memory(true);
        assert!(copy.try_clone().is_none());
    }
}

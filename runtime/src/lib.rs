// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The memory and text substrate of the engine: allocators which never touch
//! the process heap except through [`platform::Platform`], string views, a
//! small cursor-based lexer, and the two asset grammars built on it.
//!
//! Everything in here is single-threaded. None of the allocators lock, and
//! the interior mutability they use ([`core::cell::Cell`],
//! [`core::cell::RefCell`]) keeps them `!Sync`.

#![no_std]

pub mod allocators;
pub mod assets;
pub mod collections;
pub mod diagnostics;
pub mod formats;
pub mod memory;
pub mod text;

#[cfg(test)]
mod test_platform;

pub use allocators::{
    Allocator, BasicAllocator, BlockAllocator, BlockAllocatorConfig, BlockMode, FixedArena,
    OwnedBuffer, StackView,
};
pub use memory::AllocateOptions;

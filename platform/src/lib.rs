// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! This crate mainly revolves around the [`Platform`] trait, which can be
//! implemented to provide a "platform implementation" for the runtime. The
//! runtime never touches the process heap or the standard output directly,
//! everything goes through this trait.
//!
//! This is split off of the runtime crate so that the runtime and the platform
//! implementation can be compiled independently, and so that tests can swap in
//! a platform which counts and checks allocations.

#![no_std]
#![warn(missing_docs)]

use core::{ffi::c_void, fmt::Arguments};

/// Page size assumed by platforms which can't query it.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// A trait for using platform-dependent features from the runtime without
/// depending on any platform implementation directly.
///
/// All the functions have a `&self` parameter, so that the methods can access
/// some (possibly internally mutable) state, but still keeping the platform
/// object as widely usable as possible (a "platform" is about as global an
/// object as you get). None of these functions are (supposed to be) hot, and
/// this trait is object safe, so using &dyn [`Platform`] should be fine
/// performance-wise.
pub trait Platform {
    /// Allocate the given amount of bytes (returning a null pointer on error).
    /// The returned pointer should be aligned for any primitive type. Not
    /// called often, memory is allocated in big chunks, so this can be slow
    /// and defensively implemented.
    fn malloc(&self, size: usize) -> *mut c_void;

    /// Free the memory allocated by [`Platform::malloc`].
    ///
    /// ### Safety
    ///
    /// - `ptr` must have been returned by [`Platform::malloc`] of this same
    ///   platform, with the same `size`, and it must not have been freed yet.
    /// - Since the implementation is free to free the memory, the memory
    ///   pointed at by the given pointer shouldn't be accessed after calling
    ///   this.
    unsafe fn free(&self, ptr: *mut c_void, size: usize);

    /// Returns the size of a virtual memory page in bytes. Used for sizing
    /// dynamically grown allocator blocks.
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Print out a string. For very crude debugging, and for the allocation
    /// record dumps.
    fn println(&self, message: Arguments);
}

// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

mod linked_list;
mod vec;

pub use linked_list::{Iter, IterRev, LinkedList};
pub use vec::FixedVec;

// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Leak tracking and developer-facing reports. Nothing in here is needed for
//! correctness, it's all for finding out what the rest of the crate is doing.

mod allocation_records;
mod hex_dump;
mod reporter;

pub use allocation_records::{AllocationRecord, AllocationRecords};
pub use hex_dump::{hex_dump, HEX_DUMP_BYTES_PER_ROW};
pub use reporter::{Report, Reporter, Severity, REPORT_MESSAGE_CAPACITY};

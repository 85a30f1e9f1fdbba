// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::Write;

use arrayvec::ArrayString;

pub const HEX_DUMP_BYTES_PER_ROW: usize = 16;

// "{address:016x}: ", then "xx " per byte, a space, and the ascii column.
const ROW_LENGTH: usize = 16 + 2 + HEX_DUMP_BYTES_PER_ROW * 3 + 1 + HEX_DUMP_BYTES_PER_ROW;

/// Formats `bytes` as rows of [`HEX_DUMP_BYTES_PER_ROW`] bytes, calling `emit`
/// with each row. Rows start with the address of their first byte (`address`
/// being the address of `bytes[0]`), followed by the bytes in hex, and the
/// bytes as ascii, with non-printable bytes replaced by `.`.
///
/// ```text
/// 00000000000010f0: 68 65 6c 6c 6f 0a                                hello.
/// ```
pub fn hex_dump(address: usize, bytes: &[u8], mut emit: impl FnMut(&str)) {
    for (i, row) in bytes.chunks(HEX_DUMP_BYTES_PER_ROW).enumerate() {
        let row_address = address.wrapping_add(i * HEX_DUMP_BYTES_PER_ROW);
        let mut line = ArrayString::<ROW_LENGTH>::new();
        // Can't fail, ROW_LENGTH fits the longest possible row.
        let _ = write_row(&mut line, row_address, row);
        emit(&line);
    }
}

fn write_row(line: &mut impl Write, address: usize, row: &[u8]) -> core::fmt::Result {
    write!(line, "{address:016x}: ")?;
    for column in 0..HEX_DUMP_BYTES_PER_ROW {
        match row.get(column) {
            Some(byte) => write!(line, "{byte:02x} ")?,
            None => line.write_str("   ")?,
        }
    }
    line.write_char(' ')?;
    for &byte in row {
        let printable = byte.is_ascii_graphic() || byte == b' ';
        line.write_char(if printable { byte as char } else { '.' })?;
    }
    Ok(())
}

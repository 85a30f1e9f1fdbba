// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::{Debug, Display};

/// A borrowed run of bytes, usually (but not necessarily) ASCII text.
///
/// Unlike `&str`, the bytes don't need to be valid UTF-8, which is handy for
/// slicing up files byte by byte. Never includes a NUL terminator.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Str8View<'a> {
    bytes: &'a [u8],
}

impl<'a> Str8View<'a> {
    pub const fn new(bytes: &'a [u8]) -> Str8View<'a> {
        Str8View { bytes }
    }

    /// Views the bytes up to the first NUL, or all of them if there's none.
    pub fn from_nul_terminated(bytes: &'a [u8]) -> Str8View<'a> {
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Str8View::new(&bytes[..len])
    }

    pub const fn as_bytes(self) -> &'a [u8] {
        self.bytes
    }

    /// Returns the bytes as a `str` if they're valid UTF-8.
    pub fn to_str(self) -> Option<&'a str> {
        core::str::from_utf8(self.bytes).ok()
    }

    pub const fn len(self) -> usize {
        self.bytes.len()
    }

    pub const fn is_empty(self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte-by-byte equality. Views of different lengths are never equal.
    pub fn is_equals(self, other: Str8View) -> bool {
        self.bytes == other.bytes
    }

    pub fn starts_with(self, prefix: Str8View) -> bool {
        self.bytes.starts_with(prefix.bytes)
    }

    pub fn ends_with(self, suffix: Str8View) -> bool {
        self.bytes.ends_with(suffix.bytes)
    }

    /// Returns true if `needle` appears anywhere in the view. The empty view
    /// is contained in every view.
    pub fn contains(self, needle: Str8View) -> bool {
        needle.is_empty()
            || self
                .bytes
                .windows(needle.len())
                .any(|window| window == needle.bytes)
    }

    /// The index of the first `byte` in the view.
    pub fn find_byte(self, byte: u8) -> Option<usize> {
        self.bytes.iter().position(|&b| b == byte)
    }

    /// Splits off the bytes before the first `until` and returns them, leaving
    /// `self` starting at the `until` byte. If there's no `until`, the whole
    /// view is returned and `self` becomes empty.
    pub fn capture_until(&mut self, until: u8) -> Str8View<'a> {
        let len = self.find_byte(until).unwrap_or(self.bytes.len());
        let (captured, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Str8View::new(captured)
    }

    /// Copies the bytes into `out` followed by a NUL. Returns false, without
    /// writing anything, if `out` is shorter than `len() + 1`.
    pub fn copy_to_nul_terminated(self, out: &mut [u8]) -> bool {
        let Some((terminator, contents)) = out
            .get_mut(..self.len() + 1)
            .and_then(|out| out.split_last_mut())
        else {
            return false;
        };
        contents.copy_from_slice(self.bytes);
        *terminator = 0;
        true
    }
}

impl<'a> From<&'a [u8]> for Str8View<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Str8View::new(bytes)
    }
}

impl<'a> From<&'a str> for Str8View<'a> {
    fn from(s: &'a str) -> Self {
        Str8View::new(s.as_bytes())
    }
}

impl PartialEq<[u8]> for Str8View<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes == other
    }
}

impl PartialEq<&str> for Str8View<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<Str8View<'_>> for &str {
    fn eq(&self, other: &Str8View<'_>) -> bool {
        self.as_bytes() == other.bytes
    }
}

impl Debug for Str8View<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "\"{}\"", self.bytes.escape_ascii())
    }
}

impl Display for Str8View<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for chunk in self.bytes.utf8_chunks() {
            f.write_str(chunk.valid())?;
            if !chunk.invalid().is_empty() {
                f.write_str("\u{FFFD}")?;
            }
        }
        Ok(())
    }
}

/// A borrowed run of UTF-16 code units, like the paths and file names
/// reported by Windows APIs. Never includes a NUL terminator.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Str16View<'a> {
    units: &'a [u16],
}

impl<'a> Str16View<'a> {
    pub const fn new(units: &'a [u16]) -> Str16View<'a> {
        Str16View { units }
    }

    /// Views the units up to the first NUL, or all of them if there's none.
    pub fn from_nul_terminated(units: &'a [u16]) -> Str16View<'a> {
        let len = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        Str16View::new(&units[..len])
    }

    pub const fn as_units(self) -> &'a [u16] {
        self.units
    }

    pub const fn len(self) -> usize {
        self.units.len()
    }

    pub const fn is_empty(self) -> bool {
        self.units.is_empty()
    }

    pub fn is_equals(self, other: Str16View) -> bool {
        self.units == other.units
    }

    /// Compares against a byte string, where each unit must equal the
    /// corresponding byte zero-extended.
    pub fn is_equals_str8(self, other: Str8View) -> bool {
        self.len() == other.len() && units_match_bytes(self.units, other.as_bytes())
    }

    pub fn starts_with(self, prefix: Str16View) -> bool {
        self.units.starts_with(prefix.units)
    }

    pub fn starts_with_str8(self, prefix: Str8View) -> bool {
        self.len() >= prefix.len() && units_match_bytes(&self.units[..prefix.len()], prefix.as_bytes())
    }

    pub fn ends_with(self, suffix: Str16View) -> bool {
        self.units.ends_with(suffix.units)
    }

    /// Like [`Str16View::ends_with`], for a byte string suffix, e.g. checking
    /// a UTF-16 file name for an ASCII extension.
    pub fn ends_with_str8(self, suffix: Str8View) -> bool {
        let Some(start) = self.len().checked_sub(suffix.len()) else {
            return false;
        };
        units_match_bytes(&self.units[start..], suffix.as_bytes())
    }

    /// The index of the last `unit` in the view.
    pub fn rfind_unit(self, unit: u16) -> Option<usize> {
        self.units.iter().rposition(|&u| u == unit)
    }

    /// Copies the units into `out` followed by a NUL. Returns false, without
    /// writing anything, if `out` is shorter than `len() + 1`.
    pub fn copy_to_nul_terminated(self, out: &mut [u16]) -> bool {
        let Some((terminator, contents)) = out
            .get_mut(..self.len() + 1)
            .and_then(|out| out.split_last_mut())
        else {
            return false;
        };
        contents.copy_from_slice(self.units);
        *terminator = 0;
        true
    }
}

fn units_match_bytes(units: &[u16], bytes: &[u8]) -> bool {
    units.iter().zip(bytes).all(|(&unit, &byte)| unit == u16::from(byte))
}

impl Debug for Str16View<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl Display for Str16View<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for c in char::decode_utf16(self.units.iter().copied()) {
            let c = c.unwrap_or(char::REPLACEMENT_CHARACTER);
            core::fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Str16View, Str8View};

    const fn str16<const N: usize>(s: &[u8; N]) -> [u16; N] {
        let mut units = [0; N];
        let mut i = 0;
        while i < N {
            units[i] = s[i] as u16;
            i += 1;
        }
        units
    }

    #[test]
    fn equality_depends_on_length_and_content() {
        let a = Str8View::from("tilemap");
        let b = Str8View::new(b"tilemap");
        let prefix = Str8View::from("tile");
        assert!(a.is_equals(a));
        assert!(a.is_equals(b) && b.is_equals(a));
        assert!(!a.is_equals(prefix) && !prefix.is_equals(a));
        assert!(!Str8View::from("abc").is_equals(Str8View::from("abd")));
        assert!(Str8View::default().is_equals(Str8View::from("")));
    }

    #[test]
    fn prefixes_and_suffixes() {
        let path = Str8View::from("assets/atlas.bmp");
        assert!(path.starts_with("assets".into()));
        assert!(path.ends_with(".bmp".into()));
        assert!(!path.ends_with("xbmp".into()), "the first byte of the suffix counts too");
        assert!(path.ends_with("".into()));
        assert!(!Str8View::from("mp").ends_with(".bmp".into()));
        assert!(path.contains("/atlas".into()));
        assert!(!path.contains("atlases".into()));
    }

    #[test]
    fn capture_until_splits_the_cursor() {
        let mut cursor = Str8View::from("key=value");
        assert_eq!("key", cursor.capture_until(b'='));
        assert_eq!("=value", cursor);
        let mut no_match = Str8View::from("abc");
        assert_eq!("abc", no_match.capture_until(b'!'));
        assert!(no_match.is_empty());
    }

    #[test]
    fn nul_terminated_round_trip() {
        let view = Str8View::from_nul_terminated(b"abc\0def");
        assert_eq!(3, view.len());
        let mut too_small = [0xFF; 3];
        assert!(!view.copy_to_nul_terminated(&mut too_small));
        assert_eq!([0xFF; 3], too_small);
        let mut out = [0xFF; 5];
        assert!(view.copy_to_nul_terminated(&mut out));
        assert_eq!(*b"abc\0\xFF", out);
    }

    #[test]
    fn utf16_views_compare_against_bytes() {
        let units = str16(b"atlas.bmp\0junk");
        let name = Str16View::from_nul_terminated(&units);
        assert_eq!(9, name.len());
        assert!(name.is_equals_str8("atlas.bmp".into()));
        assert!(name.ends_with_str8(".bmp".into()));
        assert!(!name.ends_with_str8("!.bmp".into()), "first byte of suffix must match");
        assert!(!name.ends_with_str8("a long suffix.bmp".into()));
        assert!(name.starts_with_str8("atlas".into()));

        let wide = [u16::from(b'a') | 0x100];
        assert!(!Str16View::new(&wide).is_equals_str8("a".into()), "high byte must be zero");

        let mut out = [0; 10];
        assert!(name.copy_to_nul_terminated(&mut out));
        assert_eq!(0, out[9]);
        assert_eq!(Some(5), name.rfind_unit(u16::from(b'.')));
    }
}

//! Wide-pack keys: the high byte of a 16-bit codepoint, and a 256-bit set of them.

use std::fmt;
use std::str::FromStr;

/// Identifies one wide glyph pack (`glyph_<HH>.png`) by codepoint high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackKey(pub u8);

impl PackKey {
    /// The pack every wide-path lookup falls back to first.
    pub const BASE: Self = Self(0x00);

    /// Key of the pack holding `ch`: bits 8..16 of the codepoint.
    ///
    /// Codepoints above the BMP alias onto the same 256 keys.
    pub fn of(ch: char) -> Self {
        Self(((u32::from(ch) >> 8) & 0xFF) as u8)
    }

    /// Atlas file name for this pack, e.g. `glyph_0A.png`.
    pub fn file_name(self) -> String {
        format!("glyph_{self}.png")
    }
}

impl fmt::Display for PackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

impl FromStr for PackKey {
    type Err = String;

    /// Parse one or two hex digits, case-insensitive (`"0a"`, `"0A"`, `"A"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 2 {
            return Err(format!("pack key must be 1-2 hex digits, got {s:?}"));
        }
        u8::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| format!("invalid pack key {s:?}: {e}"))
    }
}

/// A set of pack keys, one bit per possible high byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackKeySet {
    bits: [u64; 4],
}

impl PackKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PackKey) {
        let (word, bit) = Self::locate(key);
        self.bits[word] |= 1 << bit;
    }

    pub fn contains(&self, key: PackKey) -> bool {
        let (word, bit) = Self::locate(key);
        self.bits[word] & (1 << bit) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Keys in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PackKey> + '_ {
        (0..=u8::MAX).map(PackKey).filter(|&k| self.contains(k))
    }

    fn locate(key: PackKey) -> (usize, u32) {
        (usize::from(key.0 >> 6), u32::from(key.0 & 63))
    }
}

impl FromIterator<PackKey> for PackKeySet {
    fn from_iter<I: IntoIterator<Item = PackKey>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

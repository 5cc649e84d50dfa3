//! Bob Jenkins' lookup3 hash, as used for root name hashes
//!
//! Root manifests identify named files by a 64-bit hash of their path. The
//! path is normalized (uppercase ASCII, backslash separators) and fed to
//! `hashlittle2`; the two 32-bit outputs form the 64-bit value with the
//! primary result in the high half.

use std::fmt;

/// Combined lookup3 result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Jenkins96 {
    /// `(pc << 32) | pb`
    pub hash64: u64,
    /// Primary 32-bit result (`pc`)
    pub hash32: u32,
}

impl Jenkins96 {
    /// Hash raw bytes with zero seeds
    pub fn hash(data: &[u8]) -> Self {
        let (pc, pb) = lookup3(data, 0, 0);
        Self {
            hash64: (u64::from(pc) << 32) | u64::from(pb),
            hash32: pc,
        }
    }
}

impl fmt::Display for Jenkins96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}:{:08x}", self.hash64, self.hash32)
    }
}

/// Compute the root manifest name hash of a file path
///
/// ```
/// use tactile_crypto::jenkins::name_hash;
///
/// assert_eq!(
///     name_hash("interface/icons/inv_misc_questionmark.blp"),
///     name_hash("INTERFACE\\ICONS\\INV_MISC_QUESTIONMARK.BLP"),
/// );
/// ```
pub fn name_hash(path: &str) -> u64 {
    let normalized: Vec<u8> = path
        .bytes()
        .map(|b| if b == b'/' { b'\\' } else { b.to_ascii_uppercase() })
        .collect();
    Jenkins96::hash(&normalized).hash64
}

/// `hashlittle()` from lookup3.c
///
/// ```
/// use tactile_crypto::jenkins::hashlittle;
///
/// assert_eq!(hashlittle(b"", 0), 0xdead_beef);
/// ```
pub fn hashlittle(data: &[u8], initval: u32) -> u32 {
    lookup3(data, initval, 0).0
}

/// `hashlittle2()` from lookup3.c; `pc` and `pb` are seeds on input and results on output
pub fn hashlittle2(data: &[u8], pc: &mut u32, pb: &mut u32) {
    let (c, b) = lookup3(data, *pc, *pb);
    *pc = c;
    *pb = b;
}

fn lookup3(data: &[u8], pc: u32, pb: u32) -> (u32, u32) {
    let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
    let mut a = 0xdead_beef_u32.wrapping_add(len).wrapping_add(pc);
    let mut b = a;
    let mut c = a.wrapping_add(pb);

    if data.is_empty() {
        return (c, b);
    }

    let mut rest = data;
    while rest.len() > 12 {
        a = a.wrapping_add(le_word(&rest[0..4]));
        b = b.wrapping_add(le_word(&rest[4..8]));
        c = c.wrapping_add(le_word(&rest[8..12]));
        mix(&mut a, &mut b, &mut c);
        rest = &rest[12..];
    }

    // Missing tail bytes contribute nothing, so a zero-padded block is equivalent.
    let mut tail = [0u8; 12];
    tail[..rest.len()].copy_from_slice(rest);
    a = a.wrapping_add(le_word(&tail[0..4]));
    b = b.wrapping_add(le_word(&tail[4..8]));
    c = c.wrapping_add(le_word(&tail[8..12]));
    final_mix(&mut a, &mut b, &mut c);

    (c, b)
}

fn le_word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

fn final_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup3_reference_vectors() {
        assert_eq!(hashlittle(b"", 0), 0xdead_beef);
        assert_eq!(hashlittle(b"Four score and seven years ago", 0), 0x1777_0551);
        assert_eq!(hashlittle(b"Four score and seven years ago", 1), 0xcd62_8161);

        let (mut pc, mut pb) = (0u32, 0u32);
        hashlittle2(b"Four score and seven years ago", &mut pc, &mut pb);
        assert_eq!((pc, pb), (0x1777_0551, 0xce72_26e6));

        let (mut pc, mut pb) = (1u32, 0u32);
        hashlittle2(b"Four score and seven years ago", &mut pc, &mut pb);
        assert_eq!((pc, pb), (0xcd62_8161, 0x6cbe_a4b3));
    }

    #[test]
    fn test_tail_lengths_around_block_boundary() {
        let cases: [(&[u8], u32); 6] = [
            (b"a", 0x58d6_8708),
            (b"abc", 0x0e39_7631),
            (b"abcdefgh", 0x2995_c3be),
            (b"abcdefghijk", 0x5f61_edf8),
            (b"abcdefghijkl", 0x4012_f87b),
            (b"abcdefghijklm", 0x9281_28f9),
        ];
        for (data, expected) in cases {
            assert_eq!(hashlittle(data, 0), expected, "len {}", data.len());
        }
    }

    #[test]
    fn test_name_hash_normalizes_path() {
        let a = name_hash("world/maps/azeroth/azeroth.wdt");
        let b = name_hash("WORLD\\MAPS\\AZEROTH\\AZEROTH.WDT");
        assert_eq!(a, b);
        assert_ne!(a, name_hash("world/maps/kalimdor/kalimdor.wdt"));
    }

    #[test]
    fn test_name_hash_layout() {
        let hash = Jenkins96::hash(b"SOUND\\MUSIC\\ZONEMUSIC.MP3");
        assert_eq!((hash.hash64 >> 32) as u32, hash.hash32);
        assert_eq!(name_hash("sound/music/zonemusic.mp3"), hash.hash64);
    }
}

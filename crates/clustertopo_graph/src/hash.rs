// SPDX-License-Identifier: MIT OR Apache-2.0
//! Packed 64-bit keys for node pairs.
//!
//! Edges are identified by the two node indices they join. Packing both
//! indices into a `u64` gives a cheap, allocation-free key for hash maps.

/// Pack an ordered pair into a single key. `h64(a, b) != h64(b, a)` unless `a == b`.
#[inline]
pub fn h64(a: u32, b: u32) -> u64 {
    ((a as u64) << 32) | b as u64
}

/// Pack an unordered pair into a single key. `h64u(a, b) == h64u(b, a)`.
#[inline]
pub fn h64u(a: u32, b: u32) -> u64 {
    if a < b {
        h64(a, b)
    } else {
        h64(b, a)
    }
}

/// Unordered key for `usize` node indices, `None` when either does not fit in `u32`.
#[inline]
pub fn edge_key(a: usize, b: usize) -> Option<u64> {
    Some(h64u(u32::try_from(a).ok()?, u32::try_from(b).ok()?))
}

/// Split a packed key back into its two halves.
#[inline]
pub fn h64_split(hash: u64) -> (u32, u32) {
    ((hash >> 32) as u32, hash as u32)
}

/// Key for a `(node, edge)` pair given as `usize` indices.
#[inline]
pub fn link_key(node: usize, edge: usize) -> u64 {
    h64(node as u32, edge as u32)
}

/// Combine two 64-bit keys regardless of their order.
///
/// Used where the same entity can be discovered from either end, e.g. a
/// path walked forward or backward.
#[inline]
pub fn unordered_mix(a: u64, b: u64) -> u64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    mix(lo, hi)
}

/// Order-dependent combination of two keys.
#[inline]
pub fn mix(a: u64, b: u64) -> u64 {
    let mut h = a ^ b.rotate_left(29).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h = h.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    h ^ (h >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h64u_is_order_independent() {
        assert_eq!(h64u(3, 9), h64u(9, 3));
        assert_ne!(h64(3, 9), h64(9, 3));
    }

    #[test]
    fn test_split_roundtrip() {
        let (a, b) = h64_split(h64(7, 42));
        assert_eq!((a, b), (7, 42));

        let (lo, hi) = h64_split(h64u(42, 7));
        assert_eq!((lo, hi), (7, 42));
    }

    #[test]
    fn test_edge_key_rejects_wide_indices() {
        assert_eq!(edge_key(9, 3), Some(h64u(3, 9)));
        assert_eq!(edge_key(u32::MAX as usize, 0), Some(h64u(0, u32::MAX)));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(edge_key(u32::MAX as usize + 1, 0), None);
    }

    #[test]
    fn test_unordered_mix() {
        assert_eq!(unordered_mix(11, 99), unordered_mix(99, 11));
        assert_ne!(mix(11, 99), mix(99, 11));
    }
}

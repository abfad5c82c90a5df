/*++

Licensed under the Apache-2.0 license.

File Name:

    array.rs

Abstract:

    File contains common array definitions used by the Versal TRNG hardware
    software interface.

--*/

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::Zeroize;

macro_rules! static_assert {
    ($expression:expr) => {
        const _: () = assert!($expression);
    };
}

/// The `Array4xN` type represents word arrays in the native format of the
/// TRNG seed, personalization string and core output registers (4-byte
/// big-endian groups), and provides From traits for converting to/from byte
/// arrays.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, IntoBytes, FromBytes, Immutable, KnownLayout, PartialEq, Eq, Zeroize,
)]
pub struct Array4xN<const W: usize, const B: usize>(pub [u32; W]);

impl<const W: usize, const B: usize> Array4xN<W, B> {
    pub const fn new(val: [u32; W]) -> Self {
        Self(val)
    }
}

impl<const W: usize, const B: usize> Default for Array4xN<W, B> {
    fn default() -> Self {
        Self([0u32; W])
    }
}

//// Ensure there is no padding in the struct
static_assert!(core::mem::size_of::<Array4xN<1, 4>>() == 4);

impl<const W: usize, const B: usize> From<[u8; B]> for Array4xN<W, B> {
    #[inline(always)]
    fn from(value: [u8; B]) -> Self {
        Self::from(&value)
    }
}

impl<const W: usize, const B: usize> From<&[u8; B]> for Array4xN<W, B> {
    fn from(value: &[u8; B]) -> Self {
        let mut words = [0u32; W];
        for (i, word) in words.iter_mut().enumerate() {
            *word = u32::from_be_bytes(value[i * 4..][..4].try_into().unwrap());
        }
        Self(words)
    }
}

impl<const W: usize, const B: usize> From<Array4xN<W, B>> for [u8; B] {
    #[inline(always)]
    fn from(value: Array4xN<W, B>) -> Self {
        Self::from(&value)
    }
}

impl<const W: usize, const B: usize> From<&Array4xN<W, B>> for [u8; B] {
    fn from(value: &Array4xN<W, B>) -> Self {
        let mut bytes = [0u8; B];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(value.0.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }
}

impl<const W: usize, const B: usize> From<&[u32; W]> for Array4xN<W, B> {
    fn from(value: &[u32; W]) -> Self {
        Self(*value)
    }
}

impl<const W: usize, const B: usize> From<[u32; W]> for Array4xN<W, B> {
    fn from(value: [u32; W]) -> Self {
        Self(value)
    }
}

impl<const W: usize, const B: usize> From<Array4xN<W, B>> for [u32; W] {
    fn from(value: Array4xN<W, B>) -> Self {
        value.0
    }
}

pub type Array4x4 = Array4xN<4, 16>;
pub type Array4x8 = Array4xN<8, 32>;
pub type Array4x12 = Array4xN<12, 48>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_4x4_from_bytes() {
        assert_eq!(
            Array4x4::from([
                0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
                0xee, 0xff
            ]),
            Array4x4::new([0x0011_2233, 0x4455_6677, 0x8899_aabb, 0xccdd_eeff])
        );
    }

    #[test]
    fn test_array_4x4_to_bytes() {
        assert_eq!(
            <[u8; 16]>::from(Array4x4::new([
                0x0011_2233,
                0x4455_6677,
                0x8899_aabb,
                0xccdd_eeff
            ])),
            [
                0x00u8, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc,
                0xdd, 0xee, 0xff
            ]
        );
    }

    #[test]
    fn test_array_4x12_round_trip() {
        let mut bytes = [0u8; 48];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let words = Array4x12::from(&bytes);
        assert_eq!(words.0[0], 0x0001_0203);
        assert_eq!(words.0[11], 0x2c2d_2e2f);
        assert_eq!(<[u8; 48]>::from(words), bytes);
    }

    #[test]
    fn test_as_bytes_view_is_native_words() {
        // The zerocopy view exposes the words in register order; byte order
        // within each word is the host's, unlike the From<[u8; B]> impls.
        let arr = Array4x4::new([1, 2, 3, 4]);
        assert_eq!(arr.as_bytes().len(), 16);
    }
}

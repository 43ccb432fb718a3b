// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{
    fmt::{Display, Formatter},
    ops::Not,
};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tari_utilities::hex::{from_hex, to_hex};

use crate::SmtError;

/// The number of bytes needed to hold a key for a tree of the given height.
#[inline]
pub const fn key_length(height: usize) -> usize {
    (height + 7) / 8
}

/// A fixed-width tree key, held as the big-endian bytes of an H-bit integer.
///
/// The most significant key bit selects the child at the root, and the least significant bit selects the child just
/// above the leaf. For heights that are not a multiple of 8 the unused high bits of the first byte must be zero.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct NodeKey(#[serde(with = "crate::serde_support::bytes")] Vec<u8>);

impl NodeKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Creates a key for a tree of the given height from an integer. Fails if the integer does not fit in `height`
    /// bits.
    pub fn from_u64(value: u64, height: usize) -> Result<Self, SmtError> {
        let len = key_length(height);
        let be = value.to_be_bytes();
        let mut bytes = vec![0u8; len];
        if len >= be.len() {
            bytes[len - be.len()..].copy_from_slice(&be);
        } else {
            let (overflow, tail) = be.split_at(be.len() - len);
            if overflow.iter().any(|b| *b != 0) {
                return Err(SmtError::MalformedKey {
                    key: Self(be.to_vec()),
                    height,
                    expected_bytes: len,
                });
            }
            bytes.copy_from_slice(tail);
        }
        let key = Self(bytes);
        key.validate(height)?;
        Ok(key)
    }

    /// Parses a hex key, with or without a `0x` prefix. No width check is done here; see [`NodeKey::validate`].
    pub fn from_hex(hex: &str) -> Result<Self, SmtError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = from_hex(hex).map_err(|e| SmtError::HexError(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        to_hex(self.0.as_slice())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that the key is exactly wide enough for a tree of `height` and has no bits set above `height`.
    pub fn validate(&self, height: usize) -> Result<(), SmtError> {
        let expected_bytes = key_length(height);
        let unused_bits = expected_bytes * 8 - height;
        let high_bits_clear = unused_bits == 0 || self.0.first().map_or(true, |b| b >> (8 - unused_bits) == 0);
        if self.0.len() != expected_bytes || !high_bits_clear {
            return Err(SmtError::MalformedKey {
                key: self.clone(),
                height,
                expected_bytes,
            });
        }
        Ok(())
    }

    /// The key bit that selects a child at `depth` (0 is the root), i.e. bit `height - 1 - depth` of the integer
    /// value. Does NOT perform range checking; the key must have been validated against `height`.
    #[inline]
    pub fn bit_at_depth(&self, depth: usize, height: usize) -> usize {
        let position = height - 1 - depth;
        let byte = self.0[self.0.len() - 1 - position / 8];
        ((byte >> (position % 8)) & 1) as usize
    }

    #[inline]
    pub fn direction_at_depth(&self, depth: usize, height: usize) -> TraverseDirection {
        bit_to_dir(self.bit_at_depth(depth, height))
    }

    /// The depth, counted from the root, at which the paths of `self` and `other` split. This is the root-counted
    /// index of the highest set bit of `self XOR other`. Returns `None` if the keys are equal, and an error if either
    /// key is malformed for `height`.
    pub fn divergence_depth(&self, other: &NodeKey, height: usize) -> Result<Option<usize>, SmtError> {
        self.validate(height)?;
        other.validate(height)?;
        let unused_bits = self.0.len() * 8 - height;
        Ok(self
            .0
            .iter()
            .zip(other.0.iter())
            .enumerate()
            .find(|(_, (a, b))| a != b)
            .map(|(offset, (a, b))| offset * 8 + (a ^ b).leading_zeros() as usize - unused_bits))
    }
}

impl From<Vec<u8>> for NodeKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for NodeKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for NodeKey {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for NodeKey {
    fn from(bytes: &[u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for NodeKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

pub const fn bit_to_dir(bit: usize) -> TraverseDirection {
    match bit {
        0 => TraverseDirection::Left,
        1 => TraverseDirection::Right,
        _ => panic!("Invalid bit"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraverseDirection {
    Left,
    Right,
}

impl Not for TraverseDirection {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            TraverseDirection::Left => TraverseDirection::Right,
            TraverseDirection::Right => TraverseDirection::Left,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_lengths() {
        assert_eq!(key_length(1), 1);
        assert_eq!(key_length(4), 1);
        assert_eq!(key_length(8), 1);
        assert_eq!(key_length(9), 2);
        assert_eq!(key_length(160), 20);
        assert_eq!(key_length(256), 32);
    }

    #[test]
    fn validation() {
        assert!(NodeKey::from([0b0000_1111]).validate(4).is_ok());
        assert!(NodeKey::from([0b0001_0000]).validate(4).is_err());
        assert!(NodeKey::from([0xff]).validate(8).is_ok());
        assert!(NodeKey::from([0u8; 2]).validate(8).is_err());
        assert!(NodeKey::from([0u8; 20]).validate(160).is_ok());
        assert!(NodeKey::from([0u8; 32]).validate(160).is_err());
        assert!(NodeKey::from([0x7f, 0xff]).validate(15).is_ok());
        assert!(NodeKey::from([0x80, 0x00]).validate(15).is_err());
        let err = NodeKey::default().validate(4).unwrap_err();
        assert!(matches!(err, SmtError::MalformedKey { expected_bytes: 1, .. }));
    }

    #[test]
    fn bits_at_depth() {
        // 0101 in a 4-bit tree: root picks 0, then 1, 0, 1
        let key = NodeKey::from([0b0101]);
        let bits = (0..4).map(|d| key.bit_at_depth(d, 4)).collect::<Vec<_>>();
        assert_eq!(bits, vec![0, 1, 0, 1]);

        let key = NodeKey::from([0b1010_1010, 0b1010_1010, 0b0000_0000, 0b1111_1111]);
        for i in 0..16 {
            assert_eq!(key.bit_at_depth(i, 32), (i + 1) % 2);
        }
        for i in 16..24 {
            assert_eq!(key.bit_at_depth(i, 32), 0);
        }
        for i in 24..32 {
            assert_eq!(key.bit_at_depth(i, 32), 1);
        }
        assert_eq!(key.direction_at_depth(0, 32), TraverseDirection::Right);
        assert_eq!(!key.direction_at_depth(0, 32), TraverseDirection::Left);
    }

    #[test]
    fn divergence_depths() {
        let a = NodeKey::from([0b0101]);
        let b = NodeKey::from([0b0100]);
        assert_eq!(a.divergence_depth(&b, 4).unwrap(), Some(3));
        assert_eq!(a.divergence_depth(&a, 4).unwrap(), None);
        let c = NodeKey::from([0b1101]);
        assert_eq!(a.divergence_depth(&c, 4).unwrap(), Some(0));

        let a = NodeKey::from(b"abcdefgh12345678abcdefgh12345678");
        let b = NodeKey::from(b"abcDEFgh12345678abcdefgh12345678");
        // 'd' in binary is 01100100
        // 'D' in binary is 01000100
        assert_eq!(a.divergence_depth(&b, 256).unwrap(), Some(3 * 8 + 2));
        let b = NodeKey::from(b"\xffbcdefgh12345678abcdefgh12345678");
        assert_eq!(a.divergence_depth(&b, 256).unwrap(), Some(0));

        // Heights that do not fill the first byte
        let a = NodeKey::from([0x40, 0x00]);
        let b = NodeKey::from([0x00, 0x00]);
        assert_eq!(a.divergence_depth(&b, 15).unwrap(), Some(0));
        let b = NodeKey::from([0x40, 0x01]);
        assert_eq!(a.divergence_depth(&b, 15).unwrap(), Some(14));
    }

    #[test]
    fn divergence_of_malformed_keys() {
        let err = NodeKey::from([0xff]).divergence_depth(&NodeKey::from([0]), 4).unwrap_err();
        assert!(matches!(err, SmtError::MalformedKey { height: 4, .. }));
        let err = NodeKey::from([0x0f]).divergence_depth(&NodeKey::from([0u8; 2]), 4).unwrap_err();
        assert!(matches!(err, SmtError::MalformedKey { expected_bytes: 1, .. }));
        assert!(NodeKey::from([0u8; 2]).divergence_depth(&NodeKey::from([1u8; 2]), 4).is_err());
    }

    #[test]
    fn divergence_matches_xor_bit_length() {
        let height = 12;
        for (x, y) in [(0u64, 1u64), (5, 9), (4095, 0), (2048, 2049), (1000, 1024)] {
            let a = NodeKey::from_u64(x, height).unwrap();
            let b = NodeKey::from_u64(y, height).unwrap();
            let bit_length = 64 - (x ^ y).leading_zeros() as usize;
            assert_eq!(a.divergence_depth(&b, height).unwrap(), Some(height - bit_length));
        }
    }

    #[test]
    fn integer_keys() {
        let key = NodeKey::from_u64(5, 4).unwrap();
        assert_eq!(key.as_slice(), &[5]);
        let key = NodeKey::from_u64(0x0102, 160).unwrap();
        assert_eq!(key.len(), 20);
        assert_eq!(&key.as_slice()[18..], &[1, 2]);
        assert!(NodeKey::from_u64(16, 4).is_err());
        assert!(NodeKey::from_u64(256, 8).is_err());
    }

    #[test]
    fn hex_keys() {
        let key = NodeKey::from_hex("0x00000000000000000000000000000000000000ff").unwrap();
        assert!(key.validate(160).is_ok());
        assert_eq!(key.to_string(), "0x00000000000000000000000000000000000000ff");
        assert_eq!(NodeKey::from_hex(&key.to_hex()).unwrap(), key);
    }
}

// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! The fixed-width hash types of the tree and the two hashing rules that every node is built from.
//!
//! * a leaf is `H(value)`, over the raw 32 value bytes,
//! * an internal node is `H(left || right)`, with no separator or domain tag.
//!
//! Writing the tree and folding a branch back up to a root both go through the functions in this module.

use std::{
    convert::TryFrom,
    fmt::{Display, Formatter, LowerHex},
    str::FromStr,
};

use borsh::{BorshDeserialize, BorshSerialize};
use digest::{consts::U32, Digest};
use serde::{Deserialize, Serialize};
use tari_utilities::hex::{from_hex, to_hex};

use crate::SmtError;

/// The width, in bytes, of every digest and value handled by the tree.
pub const DIGEST_LENGTH: usize = 32;

macro_rules! hash_type {
    ($name: ident) => {
        /// A wrapper around a 32-byte hash value. Provides convenience functions to display as hex.
        #[derive(
            Clone,
            Copy,
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
        pub struct $name(#[serde(with = "crate::serde_support::hash")] [u8; DIGEST_LENGTH]);

        impl $name {
            pub const fn zero() -> Self {
                Self([0u8; DIGEST_LENGTH])
            }

            pub fn as_slice(&self) -> &[u8] {
                &self.0
            }

            pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                to_hex(self.0.as_slice())
            }

            /// Parses a 64 character hex string, with or without a `0x` prefix.
            pub fn from_hex(hex: &str) -> Result<Self, SmtError> {
                let hex = hex.strip_prefix("0x").unwrap_or(hex);
                let bytes = from_hex(hex).map_err(|e| SmtError::HexError(e.to_string()))?;
                Self::try_from(bytes.as_slice())
            }
        }

        impl From<[u8; DIGEST_LENGTH]> for $name {
            fn from(arr: [u8; DIGEST_LENGTH]) -> Self {
                Self(arr)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = SmtError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                if bytes.len() != DIGEST_LENGTH {
                    return Err(SmtError::MalformedValue {
                        expected: DIGEST_LENGTH,
                        actual: bytes.len(),
                    });
                }
                let mut result = [0u8; DIGEST_LENGTH];
                result.copy_from_slice(bytes);
                Ok(Self(result))
            }
        }

        impl FromStr for $name {
            type Err = SmtError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl LowerHex for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                if f.alternate() {
                    write!(f, "0x")?;
                }
                write!(f, "{}", self.to_hex())
            }
        }
    };
}

hash_type!(NodeHash);
hash_type!(ValueHash);

impl ValueHash {
    /// True if this is the reserved "unset" value (all zero bytes).
    pub fn is_default(&self) -> bool {
        self.0 == [0u8; DIGEST_LENGTH]
    }
}

fn finalize<D: Digest<OutputSize = U32>>(hasher: D) -> NodeHash {
    let hash = hasher.finalize();
    let mut result = [0u8; DIGEST_LENGTH];
    result.copy_from_slice(hash.as_slice());
    NodeHash::from(result)
}

/// Hashes a leaf value.
pub fn hash_leaf<D: Digest<OutputSize = U32>>(value: &ValueHash) -> NodeHash {
    finalize(D::new().chain_update(value.as_slice()))
}

/// Hashes an internal node from its two children, left then right.
pub fn hash_node<D: Digest<OutputSize = U32>>(left: &NodeHash, right: &NodeHash) -> NodeHash {
    finalize(D::new().chain_update(left.as_slice()).chain_update(right.as_slice()))
}

#[cfg(test)]
mod test {
    use sha3::Keccak256;

    use super::*;

    #[test]
    fn keccak_of_zero_value() {
        // keccak256(0x00 * 32), the well-known empty storage slot hash
        let hash = hash_leaf::<Keccak256>(&ValueHash::default());
        assert_eq!(
            hash.to_hex(),
            "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
        );
    }

    #[test]
    fn node_hash_is_ordered() {
        let a = NodeHash::from([1u8; 32]);
        let b = NodeHash::from([2u8; 32]);
        assert_ne!(hash_node::<Keccak256>(&a, &b), hash_node::<Keccak256>(&b, &a));
        let mut concat = [0u8; 64];
        concat[..32].copy_from_slice(a.as_slice());
        concat[32..].copy_from_slice(b.as_slice());
        let expected = Keccak256::digest(concat);
        assert_eq!(hash_node::<Keccak256>(&a, &b).as_slice(), expected.as_slice());
    }

    #[test]
    fn hex_conversions() {
        let hash = NodeHash::from([0xabu8; 32]);
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(NodeHash::from_hex(&hex).unwrap(), hash);
        assert_eq!(NodeHash::from_hex(&format!("0x{hex}")).unwrap(), hash);
        assert_eq!(format!("{hash:#x}"), format!("0x{hex}"));
        assert!(matches!(NodeHash::from_hex("abcd"), Err(SmtError::MalformedValue {
            expected: 32,
            actual: 2
        })));
        assert!(matches!(NodeHash::from_hex("zz"), Err(SmtError::HexError(_))));
    }

    #[test]
    fn value_width_is_checked() {
        let err = ValueHash::try_from([1u8; 31].as_slice()).unwrap_err();
        assert_eq!(err, SmtError::MalformedValue {
            expected: 32,
            actual: 31
        });
        assert!(ValueHash::default().is_default());
        assert!(!ValueHash::from([1u8; 32]).is_default());
    }
}

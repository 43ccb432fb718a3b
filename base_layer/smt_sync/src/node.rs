// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::convert::TryFrom;

use borsh::{BorshDeserialize, BorshSerialize};
use digest::{consts::U32, Digest};
use serde::{Deserialize, Serialize};

use crate::{
    hash::{hash_leaf, hash_node, DIGEST_LENGTH},
    key::TraverseDirection,
    NodeHash,
    SmtError,
    ValueHash,
};

/// A node in the content-addressed store. A node is identified solely by the hash of its serialized form, given by
/// [`Node::to_bytes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Node {
    Leaf(ValueHash),
    Branch { left: NodeHash, right: NodeHash },
}

impl Node {
    /// Builds the parent of `child` and `sibling`, with `child` placed on the side given by `direction`.
    pub fn branch_from(direction: TraverseDirection, child: NodeHash, sibling: NodeHash) -> Self {
        match direction {
            TraverseDirection::Left => Node::Branch {
                left: child,
                right: sibling,
            },
            TraverseDirection::Right => Node::Branch {
                left: sibling,
                right: child,
            },
        }
    }

    pub fn hash<D: Digest<OutputSize = U32>>(&self) -> NodeHash {
        match self {
            Node::Leaf(value) => hash_leaf::<D>(value),
            Node::Branch { left, right } => hash_node::<D>(left, right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Returns the child in the given direction, or `None` for a leaf.
    pub fn child(&self, direction: TraverseDirection) -> Option<&NodeHash> {
        match (self, direction) {
            (Node::Branch { left, .. }, TraverseDirection::Left) => Some(left),
            (Node::Branch { right, .. }, TraverseDirection::Right) => Some(right),
            (Node::Leaf(_), _) => None,
        }
    }

    /// The serialized form: the 32 value bytes for a leaf, `left || right` for a branch.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Node::Leaf(value) => value.as_slice().to_vec(),
            Node::Branch { left, right } => {
                let mut bytes = Vec::with_capacity(2 * DIGEST_LENGTH);
                bytes.extend_from_slice(left.as_slice());
                bytes.extend_from_slice(right.as_slice());
                bytes
            },
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SmtError> {
        match bytes.len() {
            DIGEST_LENGTH => Ok(Node::Leaf(ValueHash::try_from(bytes)?)),
            len if len == 2 * DIGEST_LENGTH => Ok(Node::Branch {
                left: NodeHash::try_from(&bytes[..DIGEST_LENGTH])?,
                right: NodeHash::try_from(&bytes[DIGEST_LENGTH..])?,
            }),
            len => Err(SmtError::InvalidNodeEncoding(format!(
                "expected {} or {} bytes, got {}",
                DIGEST_LENGTH,
                2 * DIGEST_LENGTH,
                len
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use sha3::Keccak256;

    use super::*;

    #[test]
    fn hash_is_hash_of_serialized_form() {
        let leaf = Node::Leaf(ValueHash::from([7u8; 32]));
        assert_eq!(leaf.hash::<Keccak256>().as_slice(), Keccak256::digest(leaf.to_bytes()).as_slice());
        let branch = Node::Branch {
            left: NodeHash::from([1u8; 32]),
            right: NodeHash::from([2u8; 32]),
        };
        assert_eq!(branch.to_bytes().len(), 64);
        assert_eq!(
            branch.hash::<Keccak256>().as_slice(),
            Keccak256::digest(branch.to_bytes()).as_slice()
        );
    }

    #[test]
    fn decoding() {
        let branch = Node::branch_from(TraverseDirection::Right, NodeHash::from([1u8; 32]), NodeHash::from([2u8; 32]));
        assert_eq!(branch.child(TraverseDirection::Left), Some(&NodeHash::from([2u8; 32])));
        assert_eq!(Node::from_bytes(&branch.to_bytes()).unwrap(), branch);
        let leaf = Node::Leaf(ValueHash::from([3u8; 32]));
        assert!(Node::from_bytes(&leaf.to_bytes()).unwrap().is_leaf());
        assert!(leaf.child(TraverseDirection::Left).is_none());
        assert!(matches!(Node::from_bytes(&[0u8; 33]), Err(SmtError::InvalidNodeEncoding(_))));
    }
}

// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::ops::Index;

use borsh::{BorshDeserialize, BorshSerialize};
use digest::{consts::U32, Digest};
use serde::{Deserialize, Serialize};

use crate::{
    hash::{hash_leaf, hash_node},
    key::TraverseDirection,
    NodeHash,
    NodeKey,
    SmtError,
    ValueHash,
};

/// The sibling hashes along the path to a key, one per depth, in root to leaf order.
///
/// A branch is an inclusion proof. Given the key and the value held at that key, folding the branch from the leaf up
/// reproduces the root of the tree it was taken from:
///
/// ```
/// # use sha3::Keccak256;
/// # use tari_smt_sync::{NodeKey, SparseMerkleTree, ValueHash};
/// let mut tree = SparseMerkleTree::<Keccak256>::new(8).unwrap();
/// let key = NodeKey::from([42u8]);
/// let value = ValueHash::from([1u8; 32]);
/// let branch = tree.set(key.clone(), value).unwrap();
/// assert!(branch.validate::<Keccak256>(&key, &value, tree.root()));
/// assert!(!branch.validate::<Keccak256>(&key, &ValueHash::default(), tree.root()));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct MerkleBranch {
    siblings: Vec<NodeHash>,
}

impl MerkleBranch {
    pub fn new(siblings: Vec<NodeHash>) -> Self {
        Self { siblings }
    }

    pub fn siblings(&self) -> &[NodeHash] {
        &self.siblings
    }

    pub fn into_siblings(self) -> Vec<NodeHash> {
        self.siblings
    }

    /// The number of siblings, which is the height of the tree the branch belongs to.
    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    pub fn get(&self, depth: usize) -> Option<&NodeHash> {
        self.siblings.get(depth)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeHash> {
        self.siblings.iter()
    }

    pub(crate) fn set(&mut self, depth: usize, hash: NodeHash) {
        self.siblings[depth] = hash;
    }

    /// Calculates the hash of the node at `depth` on the path to `key`, assuming `value` is held at `key`.
    ///
    /// The leaf is hashed and then combined with the siblings from the deepest up to index `depth`, so the siblings
    /// above `depth` play no part. Depth 0 gives the root; a depth equal to the branch length gives the leaf hash.
    pub fn path_hash<D: Digest<OutputSize = U32>>(
        &self,
        key: &NodeKey,
        value: &ValueHash,
        depth: usize,
    ) -> Result<NodeHash, SmtError> {
        let height = self.siblings.len();
        if height == 0 {
            return Err(SmtError::InvalidTreeHeight { height });
        }
        if depth > height {
            return Err(SmtError::InvalidBranchLength {
                expected: depth,
                actual: height,
            });
        }
        key.validate(height)?;
        let leaf_hash = hash_leaf::<D>(value);
        let hash = self.siblings[depth..]
            .iter()
            .enumerate()
            .rev()
            .fold(leaf_hash, |current, (offset, sibling)| {
                match key.direction_at_depth(depth + offset, height) {
                    TraverseDirection::Left => hash_node::<D>(&current, sibling),
                    TraverseDirection::Right => hash_node::<D>(sibling, &current),
                }
            });
        Ok(hash)
    }

    /// Calculates the root hash implied by this branch for the given key and value.
    pub fn calculate_root<D: Digest<OutputSize = U32>>(
        &self,
        key: &NodeKey,
        value: &ValueHash,
    ) -> Result<NodeHash, SmtError> {
        self.path_hash::<D>(key, value, 0)
    }

    /// Validates the branch against the given key, value and root hash. Malformed keys never validate.
    #[must_use = "Must use the result of the proof verification"]
    pub fn validate<D: Digest<OutputSize = U32>>(&self, key: &NodeKey, value: &ValueHash, root: &NodeHash) -> bool {
        self.calculate_root::<D>(key, value)
            .map(|calculated| calculated == *root)
            .unwrap_or(false)
    }
}

impl Index<usize> for MerkleBranch {
    type Output = NodeHash;

    fn index(&self, depth: usize) -> &Self::Output {
        &self.siblings[depth]
    }
}

impl<'a> IntoIterator for &'a MerkleBranch {
    type IntoIter = std::slice::Iter<'a, NodeHash>;
    type Item = &'a NodeHash;

    fn into_iter(self) -> Self::IntoIter {
        self.siblings.iter()
    }
}

impl From<Vec<NodeHash>> for MerkleBranch {
    fn from(siblings: Vec<NodeHash>) -> Self {
        Self::new(siblings)
    }
}

/// Reconstructs the root hash from a key, the value held at that key and the key's branch.
pub fn calc_root<D: Digest<OutputSize = U32>>(
    key: &NodeKey,
    value: &ValueHash,
    branch: &MerkleBranch,
) -> Result<NodeHash, SmtError> {
    branch.calculate_root::<D>(key, value)
}

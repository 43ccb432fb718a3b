// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::marker::PhantomData;

use digest::{consts::U32, Digest};

use crate::{
    hash::{hash_leaf, hash_node},
    MerkleBranch,
    NodeHash,
    SmtError,
    ValueHash,
};

/// The hash of the empty subtree at every depth of a tree of a given height.
///
/// Entry `d` is the hash of an empty subtree whose root sits at depth `d + 1`, i.e. the sibling found at index `d` of
/// any branch in an empty tree. The last entry is the empty leaf, `H(default value)`, and each earlier entry is
/// `H(e || e)` of the entry after it. The root of an empty tree is `H(empty[0] || empty[0])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptySubtreeTable<D> {
    hashes: Vec<NodeHash>,
    root: NodeHash,
    _digest: PhantomData<D>,
}

impl<D: Digest<OutputSize = U32>> EmptySubtreeTable<D> {
    pub fn new(height: usize) -> Result<Self, SmtError> {
        if height == 0 {
            return Err(SmtError::InvalidTreeHeight { height });
        }
        let mut hashes = vec![NodeHash::zero(); height];
        hashes[height - 1] = hash_leaf::<D>(&ValueHash::default());
        for depth in (0..height - 1).rev() {
            hashes[depth] = hash_node::<D>(&hashes[depth + 1], &hashes[depth + 1]);
        }
        let root = hash_node::<D>(&hashes[0], &hashes[0]);
        Ok(Self {
            hashes,
            root,
            _digest: PhantomData,
        })
    }
}

impl<D> EmptySubtreeTable<D> {
    pub fn height(&self) -> usize {
        self.hashes.len()
    }

    /// The root hash of a tree with no values set.
    pub fn root(&self) -> &NodeHash {
        &self.root
    }

    pub fn leaf_hash(&self) -> &NodeHash {
        &self.hashes[self.hashes.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&NodeHash> {
        self.hashes.get(index)
    }

    pub fn hashes(&self) -> &[NodeHash] {
        &self.hashes
    }

    /// The hash of the empty node whose children sit at `depth`. This is the empty root for depth 0.
    pub(crate) fn parent_of(&self, depth: usize) -> &NodeHash {
        match depth {
            0 => &self.root,
            d => &self.hashes[d - 1],
        }
    }

    /// The branch of every key in an empty tree. Each call returns a fresh copy.
    pub fn branch(&self) -> MerkleBranch {
        MerkleBranch::new(self.hashes.clone())
    }
}

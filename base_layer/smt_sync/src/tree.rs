// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{collections::HashMap, mem};

use digest::{consts::U32, Digest};
use log::*;

use crate::{
    key::TraverseDirection,
    EmptySubtreeTable,
    MerkleBranch,
    Node,
    NodeHash,
    NodeKey,
    NodeStore,
    SmtConfig,
    SmtError,
    ValueHash,
};

const LOG_TARGET: &str = "c::smt_sync::tree";

/// A sparse Merkle tree of fixed height over a content-addressed node store.
///
/// Every key addresses one leaf at depth `height`. Keys that have never been set hold the default (all zero) value.
/// Nodes are stored under their own hash, so identical subtrees share one entry and each of the `height` empty
/// subtrees is stored exactly once. A write stores the `height + 1` new nodes on the written path and moves the root;
/// nothing is ever removed from the store.
///
/// The tree has a single writer. `get` and `branch` take `&self` and may run concurrently with each other, while `set`
/// takes `&mut self`.
#[derive(Debug)]
pub struct SparseMerkleTree<D, S = HashMap<NodeHash, Node>> {
    height: usize,
    empty: EmptySubtreeTable<D>,
    store: S,
    root: NodeHash,
}

impl<D: Digest<OutputSize = U32>> SparseMerkleTree<D> {
    /// Creates an empty tree of the given height, backed by an in-memory store.
    pub fn new(height: usize) -> Result<Self, SmtError> {
        Self::with_store(height, HashMap::new())
    }

    pub fn from_config(config: &SmtConfig) -> Result<Self, SmtError> {
        config.validate()?;
        Self::new(config.height)
    }
}

impl<D, S> SparseMerkleTree<D, S>
where
    D: Digest<OutputSize = U32>,
    S: NodeStore,
{
    /// Creates an empty tree of the given height on top of `store`, seeding the store with the empty subtree nodes.
    pub fn with_store(height: usize, mut store: S) -> Result<Self, SmtError> {
        let empty = EmptySubtreeTable::<D>::new(height)?;
        let hashes = empty.hashes();
        let mut seed = |hash: NodeHash, node: Node| {
            store
                .insert(hash, node)
                .map_err(|e| SmtError::StoreError(e.to_string()))
        };
        seed(*empty.root(), Node::Branch {
            left: hashes[0],
            right: hashes[0],
        })?;
        for pair in hashes.windows(2) {
            seed(pair[0], Node::Branch {
                left: pair[1],
                right: pair[1],
            })?;
        }
        seed(*empty.leaf_hash(), Node::Leaf(ValueHash::default()))?;
        let root = *empty.root();
        debug!(target: LOG_TARGET, "Created sparse Merkle tree of height {} with root {}", height, root);
        Ok(Self {
            height,
            empty,
            store,
            root,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The current root hash.
    pub fn root(&self) -> &NodeHash {
        &self.root
    }

    pub fn empty_table(&self) -> &EmptySubtreeTable<D> {
        &self.empty
    }

    /// The branch of every key in an empty tree of this height, as an owned copy.
    pub fn empty_branch(&self) -> MerkleBranch {
        self.empty.branch()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The number of nodes held in the store.
    pub fn node_count(&self) -> Result<usize, SmtError> {
        self.store.len().map_err(|e| SmtError::StoreError(e.to_string()))
    }

    /// Returns the value held at `key`, or the default value if the key has never been set.
    pub fn get(&self, key: &NodeKey) -> Result<ValueHash, SmtError> {
        let (value, _) = self.walk(key, false)?;
        Ok(value)
    }

    /// Returns the sibling hashes along the path to `key`, in root to leaf order.
    pub fn branch(&self, key: &NodeKey) -> Result<MerkleBranch, SmtError> {
        let (_, branch) = self.walk(key, true)?;
        Ok(branch)
    }

    pub fn exists(&self, key: &NodeKey) -> Result<bool, SmtError> {
        Ok(!self.get(key)?.is_default())
    }

    pub fn contains_key(&self, key: &NodeKey) -> Result<bool, SmtError> {
        self.exists(key)
    }

    /// Sets the value at `key` and returns the key's branch after the write.
    ///
    /// The branch of the written key is read first, and the new path is then hashed from the leaf up against those
    /// siblings. The siblings of the written key are not changed by the write, so the returned branch proves `value`
    /// against the new root.
    pub fn set(&mut self, key: NodeKey, value: ValueHash) -> Result<MerkleBranch, SmtError> {
        let branch = self.branch(&key)?;
        let mut hash = self.store_node(Node::Leaf(value))?;
        for (depth, sibling) in branch.iter().enumerate().rev() {
            let direction = key.direction_at_depth(depth, self.height);
            hash = self.store_node(Node::branch_from(direction, hash, *sibling))?;
        }
        let old_root = mem::replace(&mut self.root, hash);
        trace!(target: LOG_TARGET, "Set {} to {}", key, value);
        debug!(target: LOG_TARGET, "Root changed from {} to {}", old_root, self.root);
        Ok(branch)
    }

    /// Sets the value at `key` after checking that the caller holds a current proof for it.
    ///
    /// `proof` must reconstruct the current root together with the value currently held at `key`. A proof taken
    /// before another write landed, or one that was never taken from this tree, is rejected with
    /// [`SmtError::ProofMismatch`] and the tree is left unchanged.
    pub fn update(&mut self, key: NodeKey, value: ValueHash, proof: &MerkleBranch) -> Result<MerkleBranch, SmtError> {
        key.validate(self.height)?;
        if proof.len() != self.height {
            return Err(SmtError::InvalidBranchLength {
                expected: self.height,
                actual: proof.len(),
            });
        }
        let current = self.get(&key)?;
        let computed = proof.calculate_root::<D>(&key, &current)?;
        if computed != self.root {
            warn!(
                target: LOG_TARGET,
                "Rejected write to {}. The proof gives root {} but the tree root is {}", key, computed, self.root
            );
            return Err(SmtError::ProofMismatch {
                expected: self.root,
                computed,
            });
        }
        self.set(key, value)
    }

    /// Resets `key` to the default value.
    pub fn delete(&mut self, key: NodeKey) -> Result<MerkleBranch, SmtError> {
        self.set(key, ValueHash::default())
    }

    fn walk(&self, key: &NodeKey, collect_siblings: bool) -> Result<(ValueHash, MerkleBranch), SmtError> {
        key.validate(self.height)?;
        let mut siblings = Vec::with_capacity(if collect_siblings { self.height } else { 0 });
        let mut node_hash = self.root;
        for depth in 0..self.height {
            let direction = key.direction_at_depth(depth, self.height);
            let (child, sibling) = self.children(&node_hash, depth, direction)?;
            if collect_siblings {
                siblings.push(sibling);
            }
            node_hash = child;
        }
        let value = self.leaf_value(&node_hash)?;
        Ok((value, MerkleBranch::new(siblings)))
    }

    /// Returns the child in `direction` and its sibling for the node at `node_hash`, whose children sit at `depth`.
    /// Empty subtrees are answered from the empty table without a store lookup.
    fn children(
        &self,
        node_hash: &NodeHash,
        depth: usize,
        direction: TraverseDirection,
    ) -> Result<(NodeHash, NodeHash), SmtError> {
        if node_hash == self.empty.parent_of(depth) {
            let empty_child = self.empty.hashes()[depth];
            return Ok((empty_child, empty_child));
        }
        let node = self.fetch_node(node_hash)?;
        match (node.child(direction), node.child(!direction)) {
            (Some(child), Some(sibling)) => Ok((*child, *sibling)),
            _ => Err(SmtError::InvalidNodeEncoding(format!(
                "expected a branch node at depth {} for {}",
                depth, node_hash
            ))),
        }
    }

    fn leaf_value(&self, leaf_hash: &NodeHash) -> Result<ValueHash, SmtError> {
        if leaf_hash == self.empty.leaf_hash() {
            return Ok(ValueHash::default());
        }
        match self.fetch_node(leaf_hash)? {
            Node::Leaf(value) => Ok(value),
            Node::Branch { .. } => Err(SmtError::InvalidNodeEncoding(format!(
                "expected a leaf node for {}",
                leaf_hash
            ))),
        }
    }

    fn fetch_node(&self, hash: &NodeHash) -> Result<Node, SmtError> {
        self.store
            .get(hash)
            .map_err(|e| SmtError::StoreError(e.to_string()))?
            .ok_or(SmtError::MissingNode(*hash))
    }

    fn store_node(&mut self, node: Node) -> Result<NodeHash, SmtError> {
        let hash = node.hash::<D>();
        self.store
            .insert(hash, node)
            .map_err(|e| SmtError::StoreError(e.to_string()))?;
        Ok(hash)
    }
}

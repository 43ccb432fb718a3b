// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

//! Sparse Merkle trees with incrementally maintained inclusion proofs.
//!
//! A sparse Merkle tree is a full binary Merkle tree of fixed height H over a keyspace of 2^H slots. Untouched
//! subtrees all share one canonical "empty" hash per depth, so only written paths are ever stored. Nodes are kept in
//! a content-addressed store, keyed by their own hash.
//!
//! When constructing a new tree, a hashing algorithm is specified. It is used for leaves, `H(value)`, and for internal
//! nodes, `H(left || right)`. Keys are H-bit big-endian integers; the most significant bit picks the child at the
//! root. Branches are listed root first.
//!
//! Every write to a [`StatusRegistry`] is published as an [`UpdateLogEntry`]: the key, its new value and its branch
//! after the write. A [`ProofTracker`] follows that log to keep one key's value and branch current, without access to
//! the tree. Each foreign write changes exactly one of its siblings.
//!
//! # Example
//!
//! Let's create a tree of height 4, so keys are the integers 0 to 15.
//!
//! ```rust
//! use sha3::Keccak256;
//! use tari_smt_sync::{NodeKey, ProofTracker, StatusRegistry, ValueHash};
//!
//! let key = |v| NodeKey::from_u64(v, 4).unwrap();
//! let mut registry = StatusRegistry::<Keccak256>::new(4).unwrap();
//! let mut tracker = ProofTracker::<Keccak256>::new(key(0b0101), 4).unwrap();
//!
//! registry.set_current(key(0b0101), ValueHash::from([1u8; 32])).unwrap();
//! registry.set_current(key(0b0100), ValueHash::from([2u8; 32])).unwrap();
//!
//! // The tracker only reads the log, and checks its proof against the registry's root
//! assert_eq!(tracker.status(&registry).unwrap(), ValueHash::from([1u8; 32]));
//! assert_eq!(tracker.branch(), &registry.branch(&key(0b0101)).unwrap());
//!
//! // A write with a stale proof is rejected
//! let stale = registry.branch(&key(0b0110)).unwrap();
//! registry.set_current(key(0b0111), ValueHash::from([3u8; 32])).unwrap();
//! assert!(registry.set(key(0b0110), ValueHash::from([4u8; 32]), &stale).is_err());
//! ```

mod config;
mod empty;
mod error;
mod hash;
mod key;
mod node;
mod proof;
mod registry;
mod serde_support;
mod store;
mod tracker;
mod tree;
mod update_log;

pub use config::{SmtConfig, DEFAULT_TREE_HEIGHT};
pub use empty::EmptySubtreeTable;
pub use error::SmtError;
pub use hash::{hash_leaf, hash_node, NodeHash, ValueHash, DIGEST_LENGTH};
pub use key::{key_length, NodeKey, TraverseDirection};
pub use node::Node;
pub use proof::{calc_root, MerkleBranch};
pub use registry::StatusRegistry;
pub use store::NodeStore;
pub use tracker::ProofTracker;
pub use tree::SparseMerkleTree;
pub use update_log::{
    LogSnapshot,
    RootSource,
    SharedUpdateLog,
    UpdateLogEntry,
    UpdateLogSource,
    ValueSource,
};

/// A tree hashed with Keccak-256, the hash of the EVM status contracts. Pair it with [`DEFAULT_TREE_HEIGHT`] for the
/// 160-bit address keyspace.
pub type KeccakSparseMerkleTree = SparseMerkleTree<sha3::Keccak256>;

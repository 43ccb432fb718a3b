// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use thiserror::Error;

use crate::{NodeHash, NodeKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmtError {
    #[error("Invalid tree height {height}. The height must be at least 1")]
    InvalidTreeHeight { height: usize },
    #[error("Malformed key {key}: expected {expected_bytes} bytes holding at most {height} significant bits")]
    MalformedKey {
        key: NodeKey,
        height: usize,
        expected_bytes: usize,
    },
    #[error("Malformed value: expected {expected} bytes, got {actual}")]
    MalformedValue { expected: usize, actual: usize },
    #[error("Invalid branch length: expected {expected} siblings, got {actual}")]
    InvalidBranchLength { expected: usize, actual: usize },
    #[error("Node {0} is missing from the node store")]
    MissingNode(NodeHash),
    #[error("Invalid node encoding: {0}")]
    InvalidNodeEncoding(String),
    #[error("The proof does not match the current root. Expected {expected}, computed {computed}")]
    ProofMismatch { expected: NodeHash, computed: NodeHash },
    #[error("Tracker for key {key} is inconsistent with the tree: {details}")]
    TrackerInconsistency { key: NodeKey, details: String },
    #[error("Log entry {requested} is not available. The first available entry is {first}")]
    LogIndexUnavailable { requested: usize, first: usize },
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Hex conversion error: {0}")]
    HexError(String),
}

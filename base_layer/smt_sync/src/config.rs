// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};

use crate::SmtError;

/// The height of a tree keyed by 20-byte addresses.
pub const DEFAULT_TREE_HEIGHT: usize = 160;

/// Configuration for a sparse Merkle tree instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtConfig {
    /// The number of key bits, and so the number of siblings in every branch (default: 160)
    #[serde(default = "default_height")]
    pub height: usize,
}

fn default_height() -> usize {
    DEFAULT_TREE_HEIGHT
}

impl SmtConfig {
    pub fn new(height: usize) -> Self {
        Self { height }
    }

    pub fn validate(&self) -> Result<(), SmtError> {
        if self.height == 0 {
            return Err(SmtError::InvalidTreeHeight { height: self.height });
        }
        Ok(())
    }
}

impl Default for SmtConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_TREE_HEIGHT,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config: SmtConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SmtConfig::default());
        assert_eq!(config.height, 160);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialize_and_validate() {
        let config: SmtConfig = serde_json::from_str(r#"{"height": 256}"#).unwrap();
        assert_eq!(config.height, 256);
        let config: SmtConfig = serde_json::from_str(r#"{"height": 0}"#).unwrap();
        assert_eq!(config.validate(), Err(SmtError::InvalidTreeHeight { height: 0 }));
        assert!(serde_json::from_str::<SmtConfig>(r#"{"hieght": 4}"#).is_err());
    }
}

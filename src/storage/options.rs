use serde::{Deserialize, Serialize};

use crate::primitives::bytes::{DecodeLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_STRING_LEN};

/// Configuration applied when loading persisted stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Largest string length prefix accepted while decoding, in bytes.
    pub max_string_len: usize,
    /// Deepest node nesting accepted while decoding a tree.
    pub max_depth: usize,
    /// Whether every loaded tree is checked against the red-black invariants.
    pub verify_on_load: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            verify_on_load: true,
        }
    }
}

impl StoreOptions {
    /// Sets the maximum decoded string length.
    pub fn max_string_len(mut self, bytes: usize) -> Self {
        self.max_string_len = bytes;
        self
    }

    /// Sets the maximum decoded tree depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enables or disables invariant checks after load.
    pub fn verify_on_load(mut self, enabled: bool) -> Self {
        self.verify_on_load = enabled;
        self
    }

    /// Decode bounds derived from these options.
    pub fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_string_len: self.max_string_len,
            max_depth: self.max_depth,
        }
    }
}

//! Size limits for documents
//!
//! Limits bound what the codec will decode and what the engine accepts as
//! contract terms. Violations surface as `LimitError` (validation) or as a
//! `DecodeError` pointing at the offending length prefix (decoding).

use crate::document::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size limits for documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum nesting depth (default: 128)
    pub max_nesting_depth: usize,

    /// Maximum string length in bytes, keys included (default: 16MB)
    pub max_string_bytes: usize,

    /// Maximum sequence length (default: 1M items)
    pub max_sequence_len: usize,

    /// Maximum mapping entries (default: 1M entries)
    pub max_mapping_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_nesting_depth: 128,
            max_string_bytes: 16 * 1024 * 1024,
            max_sequence_len: 1_000_000,
            max_mapping_entries: 1_000_000,
        }
    }
}

impl Limits {
    /// Small limits for tests that exercise enforcement
    pub fn with_small_limits() -> Self {
        Limits {
            max_nesting_depth: 4,
            max_string_bytes: 64,
            max_sequence_len: 8,
            max_mapping_entries: 8,
        }
    }

    /// Validate a document against these limits
    pub fn validate(&self, doc: &Document) -> Result<(), LimitError> {
        self.validate_at(doc, 0)
    }

    /// The same limits with room for `levels` more containers
    ///
    /// For documents that wrap caller data validated against `self`.
    pub fn with_extra_depth(&self, levels: usize) -> Self {
        Limits {
            max_nesting_depth: self.max_nesting_depth.saturating_add(levels),
            ..self.clone()
        }
    }

    // Depth counts enclosing containers, the same way the decoder does.
    fn validate_at(&self, doc: &Document, depth: usize) -> Result<(), LimitError> {
        match doc {
            Document::Null | Document::Bool(_) | Document::Int(_) | Document::Float(_) => Ok(()),
            Document::String(s) => self.check_string(s),
            Document::Sequence(items) => {
                let depth = self.enter(depth)?;
                if items.len() > self.max_sequence_len {
                    return Err(LimitError::TooLarge {
                        what: "sequence",
                        actual: items.len(),
                        max: self.max_sequence_len,
                    });
                }
                items
                    .iter()
                    .try_for_each(|item| self.validate_at(item, depth))
            }
            Document::Mapping(fields) => {
                let depth = self.enter(depth)?;
                if fields.len() > self.max_mapping_entries {
                    return Err(LimitError::TooLarge {
                        what: "mapping",
                        actual: fields.len(),
                        max: self.max_mapping_entries,
                    });
                }
                for (key, value) in fields.iter() {
                    self.check_string(key)?;
                    self.validate_at(value, depth)?;
                }
                Ok(())
            }
        }
    }

    fn enter(&self, depth: usize) -> Result<usize, LimitError> {
        let depth = depth + 1;
        if depth > self.max_nesting_depth {
            return Err(LimitError::NestingTooDeep {
                actual: depth,
                max: self.max_nesting_depth,
            });
        }
        Ok(depth)
    }

    fn check_string(&self, s: &str) -> Result<(), LimitError> {
        if s.len() > self.max_string_bytes {
            return Err(LimitError::TooLarge {
                what: "string",
                actual: s.len(),
                max: self.max_string_bytes,
            });
        }
        Ok(())
    }
}

/// Limit validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// Nesting depth exceeded
    #[error("Nesting depth {actual} exceeds maximum {max}")]
    NestingTooDeep {
        /// Depth reached
        actual: usize,
        /// Configured maximum
        max: usize,
    },

    /// A string, sequence or mapping is too large
    #[error("{what} of size {actual} exceeds maximum {max}")]
    TooLarge {
        /// Kind of element
        what: &'static str,
        /// Size found
        actual: usize,
        /// Configured maximum
        max: usize,
    },
}

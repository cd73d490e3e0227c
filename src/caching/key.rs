//! # Cache Key Derivation
//!
//! Deterministic fingerprinting of a conversation into a stable cache key.
//! The ordered turns are serialized into a canonical length-prefixed frame
//! and hashed with SHA-256, so identical conversations always map to the
//! same key and any difference in role, content, or ordering changes it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One conversational turn, as sent to the upstream LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker role, e.g. `system`, `user`, `assistant`.
    pub role: String,

    /// Message content.
    pub content: String,
}

impl ConversationTurn {
    pub fn new<R: Into<String>, C: Into<String>>(role: R, content: C) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Derive a deterministic cache key from an ordered conversation.
///
/// Returns the empty string for an empty conversation — the sentinel that
/// tells callers to skip caching rather than fail.
///
/// The frame is `<role_len>:<role><content_len>:<content>` per turn; length
/// prefixes keep `("ab", "c")` and `("a", "bc")` from colliding.
pub fn derive_cache_key(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return String::new();
    }

    let mut hasher = Sha256::new();
    for turn in turns {
        hasher.update(turn.role.len().to_string());
        hasher.update(b":");
        hasher.update(turn.role.as_bytes());
        hasher.update(turn.content.len().to_string());
        hasher.update(b":");
        hasher.update(turn.content.as_bytes());
    }

    hex::encode(hasher.finalize())
}

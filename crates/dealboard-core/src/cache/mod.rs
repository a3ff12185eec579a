//! Caching layer for dealboard-core
//!
//! Two independent TTL caches sit in front of the expensive calls: one for
//! raw board data (keyed by board id) and one for finished answers (keyed by
//! a digest of the normalised question). They are built once at startup and
//! handed to the orchestrator; nothing reaches them through a global.

pub mod ttl;

pub use ttl::{CacheStats, TtlCache};

use crate::models::AskResponse;
use crate::source::FetchedBoard;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Default board data TTL (3 minutes)
pub const DEFAULT_BOARD_TTL: Duration = Duration::from_secs(180);

/// Default answer TTL (5 minutes)
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(300);

/// Raw board items keyed by board id
pub type BoardCache = TtlCache<Arc<FetchedBoard>>;

/// Finished answers keyed by [`response_key`]
pub type ResponseCache = TtlCache<AskResponse>;

/// The two cache instances owned by one orchestrator
#[derive(Debug, Clone)]
pub struct Caches {
    pub boards: Arc<BoardCache>,
    pub responses: Arc<ResponseCache>,
}

/// Stats for both caches, as exposed by the inspection endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CachesStats {
    pub board_cache: CacheStats,
    pub response_cache: CacheStats,
}

impl Caches {
    pub fn new(board_ttl: Duration, response_ttl: Duration) -> Self {
        Self {
            boards: Arc::new(TtlCache::new("boards", board_ttl)),
            responses: Arc::new(TtlCache::new("responses", response_ttl)),
        }
    }

    pub fn stats(&self) -> CachesStats {
        CachesStats {
            board_cache: self.boards.stats(),
            response_cache: self.responses.stats(),
        }
    }

    /// Empty both caches; returns (board entries, response entries) removed
    pub fn clear_all(&self) -> (usize, usize) {
        (self.boards.clear(), self.responses.clear())
    }

    /// Sweep expired entries from both caches
    pub fn purge_expired(&self) -> usize {
        self.boards.purge_expired() + self.responses.purge_expired()
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_TTL, DEFAULT_RESPONSE_TTL)
    }
}

/// Case-fold, drop punctuation and collapse whitespace
///
/// `"What's our pipeline?"` and `"whats   OUR pipeline"` normalise to the
/// same string, so they share one cache entry.
pub fn normalize_question(question: &str) -> String {
    let folded: String = question
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Response cache key: SHA-256 of the normalised question
pub fn response_key(question: &str) -> String {
    let digest = Sha256::digest(normalize_question(question).as_bytes());
    format!("resp:{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_case_and_whitespace() {
        assert_eq!(
            normalize_question("  What's   our\tPIPELINE? "),
            "whats our pipeline"
        );
    }

    #[test]
    fn test_equivalent_questions_share_key() {
        assert_eq!(
            response_key("What's our pipeline?"),
            response_key("what's   our pipeline?")
        );
    }

    #[test]
    fn test_different_questions_differ() {
        assert_ne!(
            response_key("What's our pipeline?"),
            response_key("What's our revenue?")
        );
    }

    #[test]
    fn test_key_is_prefixed_sha256_hex() {
        let key = response_key("hello");
        assert!(key.starts_with("resp:"));
        assert_eq!(key.len(), "resp:".len() + 64);
    }

    #[test]
    fn test_non_ascii_letters_survive_normalisation() {
        assert_eq!(normalize_question("Révenue  Q1"), "révenue q1");
    }

    #[test]
    fn test_caches_are_independent() {
        let caches = Caches::default();
        caches.responses.set("resp:x", AskResponse::default());
        assert_eq!(caches.stats().board_cache.size, 0);
        assert_eq!(caches.stats().response_cache.size, 1);
        assert_eq!(caches.clear_all(), (0, 1));
    }
}

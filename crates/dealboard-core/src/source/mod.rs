//! Board data source
//!
//! The orchestrator only sees [`BoardSource`]: give it a board id, get back
//! every item on that board as a loosely typed JSON object. Pagination,
//! transport and column decoding stay behind the trait.

pub mod monday;
mod queries;

pub use monday::MondayClient;

use crate::error::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// One board item, flattened: `id`, `name`, `created_at`, `group` and one
/// key per column
pub type RawRecord = Map<String, Value>;

/// Every item of one board, as fetched at `fetched_at`
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBoard {
    pub board_id: String,
    pub items: Vec<RawRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchedBoard {
    pub fn new(board_id: impl Into<String>, items: Vec<RawRecord>) -> Self {
        Self {
            board_id: board_id.into(),
            items,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Anything that can return the complete item list of a board
#[async_trait]
pub trait BoardSource: Send + Sync {
    /// Fetch every item of `board_id`, following pagination to the end
    async fn fetch_records(&self, board_id: &str) -> Result<FetchedBoard, SourceError>;
}

//! dealboard-core - Core library for dealboard
//!
//! TTL caches, record cleaning, the metrics engine, the monday.com and Groq
//! collaborators, and the orchestrator that sequences them per question.

pub mod cache;
pub mod cleaning;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod narration;
pub mod orchestrator;
pub mod source;

pub use cache::{Caches, CachesStats, TtlCache};
pub use config::AppConfig;
pub use error::{ConfigError, NarrationError, PipelineError, SourceError};
pub use narration::{GroqNarrator, Narrator};
pub use orchestrator::Orchestrator;
pub use source::{BoardSource, FetchedBoard, MondayClient, RawRecord};

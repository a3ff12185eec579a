//! Request orchestrator
//!
//! One question runs CACHE_CHECK → FETCH → CLEAN → COMPUTE → NARRATE →
//! STORE. Board data and answers each sit behind their own TTL cache; the
//! answer cache is written only after narration succeeds.

use crate::cache::{response_key, Caches};
use crate::cleaning::{clean_board_data, CleanedBoards};
use crate::config::AppConfig;
use crate::error::{PipelineError, SourceError};
use crate::metrics::{compute_for_intent, summary_stats};
use crate::models::{
    format_warnings_for_executive, AskRequest, AskResponse, BoardSummary, Intent, MetricKind,
    Provenance, RawDataSummary, SummaryStats,
};
use crate::narration::{Narrator, DEFAULT_CLARIFICATION};
use crate::source::{BoardSource, FetchedBoard};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Offered when a question is too ambiguous to answer
const CLARIFICATION_SUGGESTIONS: [&str; 3] = [
    "What's our total pipeline value?",
    "Give me a leadership update",
    "Show collection efficiency",
];

/// Both boards for one request, with where they came from
struct LoadedBoards {
    deals: Arc<FetchedBoard>,
    work_orders: Arc<FetchedBoard>,
    /// True only when neither board needed a live fetch
    from_cache: bool,
}

impl LoadedBoards {
    /// Age of the oldest board in the pair
    fn fetched_at(&self) -> DateTime<Utc> {
        self.deals.fetched_at.min(self.work_orders.fetched_at)
    }

    fn clean(&self) -> CleanedBoards {
        clean_board_data(&self.deals.items, &self.work_orders.items)
    }
}

/// Sequences caches, data source, cleaning, metrics and narration
pub struct Orchestrator {
    source: Arc<dyn BoardSource>,
    narrator: Arc<dyn Narrator>,
    caches: Caches,
    deals_board_id: String,
    work_orders_board_id: String,
    confidence_threshold: f64,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn BoardSource>,
        narrator: Arc<dyn Narrator>,
        caches: Caches,
        config: &AppConfig,
    ) -> Self {
        Self {
            source,
            narrator,
            caches,
            deals_board_id: config.deals_board_id.clone(),
            work_orders_board_id: config.work_orders_board_id.clone(),
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    // ========================================================================
    // Board data
    // ========================================================================

    /// One board through the board cache; returns whether it was cached
    async fn board(&self, board_id: &str) -> Result<(Arc<FetchedBoard>, bool), SourceError> {
        if let Some(board) = self.caches.boards.get(board_id) {
            debug!(board_id, items = board.len(), "Board cache hit");
            return Ok((board, true));
        }

        let started = Instant::now();
        let board = Arc::new(self.source.fetch_records(board_id).await?);
        self.caches.boards.set(board_id, Arc::clone(&board));
        info!(
            board_id,
            items = board.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Board fetched live"
        );
        Ok((board, false))
    }

    /// Both boards, fetched concurrently on a miss
    async fn load_boards(&self) -> Result<LoadedBoards, SourceError> {
        let (deals, work_orders) = tokio::join!(
            self.board(&self.deals_board_id),
            self.board(&self.work_orders_board_id)
        );
        let (deals, deals_cached) = deals.inspect_err(|e| {
            warn!(board_id = %self.deals_board_id, error = %e, "Deals board fetch failed")
        })?;
        let (work_orders, work_orders_cached) = work_orders.inspect_err(|e| {
            warn!(board_id = %self.work_orders_board_id, error = %e, "Work orders board fetch failed")
        })?;

        Ok(LoadedBoards {
            deals,
            work_orders,
            from_cache: deals_cached && work_orders_cached,
        })
    }

    /// Board ids, provenance, completeness stats and raw cleaning warnings
    pub async fn board_summary(&self) -> Result<BoardSummary, PipelineError> {
        let boards = self.load_boards().await?;
        let cleaned = boards.clean();
        let stats = summary_stats(&cleaned.snapshot, cleaned.warnings.len());

        Ok(BoardSummary {
            deals_board_id: boards.deals.board_id.clone(),
            work_orders_board_id: boards.work_orders.board_id.clone(),
            source: if boards.from_cache {
                Provenance::Cache
            } else {
                Provenance::Live
            },
            fetched_at: boards.fetched_at(),
            summary_stats: stats,
            warnings: cleaned.warnings,
        })
    }

    // ========================================================================
    // Questions
    // ========================================================================

    /// Answer one question, dating relative periods from today (UTC)
    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse, PipelineError> {
        self.ask_on(request, Utc::now().date_naive()).await
    }

    /// Answer one question with an explicit reference date
    pub async fn ask_on(
        &self,
        request: AskRequest,
        today: NaiveDate,
    ) -> Result<AskResponse, PipelineError> {
        request.validate()?;
        let started = Instant::now();
        let key = response_key(&request.question);

        // CACHE_CHECK
        if let Some(mut cached) = self.caches.responses.get(&key) {
            cached.source = Provenance::Cache;
            cached.processing_time_ms = started.elapsed().as_millis() as u64;
            if !request.include_raw_data {
                cached.raw_data = None;
            }
            info!(
                processing_time_ms = cached.processing_time_ms,
                source = "cache",
                "Request completed"
            );
            return Ok(cached);
        }

        // FETCH
        let boards = self.load_boards().await?;

        // CLEAN
        let cleaned = boards.clean();
        let snapshot = &cleaned.snapshot;
        let stats = summary_stats(snapshot, cleaned.warnings.len());
        let warnings = format_warnings_for_executive(
            &cleaned.warnings,
            snapshot.deals.len(),
            snapshot.work_orders.len(),
        );

        let intent = self.classify(&request.question, &stats).await;
        if intent.is_ambiguous(self.confidence_threshold) {
            info!(
                confidence = intent.confidence,
                threshold = self.confidence_threshold,
                "Question needs clarification"
            );
            return Err(PipelineError::AmbiguousIntent {
                confidence: intent.confidence,
                clarification_prompt: intent
                    .clarification_prompt
                    .unwrap_or_else(|| DEFAULT_CLARIFICATION.to_string()),
                suggested_questions: CLARIFICATION_SUGGESTIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                warnings,
            });
        }

        // COMPUTE
        let metrics = compute_for_intent(&intent, snapshot, today);
        debug!(
            metric_kind = %intent.metric_kind,
            metrics = metrics.len(),
            "Metrics computed"
        );

        // NARRATE
        let narration = match intent.metric_kind {
            MetricKind::LeadershipUpdate => {
                self.narrator
                    .narrate_leadership(&metrics, &warnings, &stats)
                    .await
            }
            _ => {
                self.narrator
                    .narrate_summary(&request.question, &metrics, &warnings, &stats)
                    .await
            }
        };
        let insights = match narration {
            Ok(text) => text,
            Err(source) => {
                warn!(error = %source, "Narration failed; returning metrics only");
                return Err(PipelineError::NarrationUnavailable {
                    source,
                    metrics,
                    warnings,
                });
            }
        };

        let suggested_questions = self
            .narrator
            .suggest_follow_ups(
                &request.question,
                intent.metric_kind,
                &stats.unique_sectors,
            )
            .await;

        let raw_data = RawDataSummary {
            deals_count: snapshot.deals.len(),
            work_orders_count: snapshot.work_orders.len(),
            summary_stats: stats,
            fetched_at: boards.fetched_at(),
        };

        let mut response = AskResponse {
            insights,
            key_metrics: metrics,
            data_quality_warnings: warnings,
            confidence: intent.confidence,
            intent: Some(intent),
            suggested_questions,
            source: Provenance::Live,
            raw_data: Some(raw_data),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        // STORE
        self.caches.responses.set(key, response.clone());

        if !request.include_raw_data {
            response.raw_data = None;
        }
        info!(
            processing_time_ms = response.processing_time_ms,
            source = "live",
            board_data_cached = boards.from_cache,
            "Request completed"
        );
        Ok(response)
    }

    /// Classify, falling back to a general intent if the call fails
    async fn classify(&self, question: &str, stats: &SummaryStats) -> Intent {
        match self
            .narrator
            .classify_intent(question, &stats.unique_sectors)
            .await
        {
            Ok(intent) => {
                debug!(
                    metric_kind = %intent.metric_kind,
                    confidence = intent.confidence,
                    "Intent classified"
                );
                intent
            }
            Err(e) => {
                warn!(error = %e, "Intent classification failed; using general intent");
                Intent::fallback(question)
            }
        }
    }
}

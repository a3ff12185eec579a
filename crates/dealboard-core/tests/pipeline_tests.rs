//! Integration tests for the request orchestrator with stub collaborators

use async_trait::async_trait;
use chrono::NaiveDate;
use dealboard_core::cache::Caches;
use dealboard_core::models::{
    AskRequest, DataQualityWarning, Intent, MetricKind, MetricResult, MetricValue, Money,
    Provenance, SummaryStats,
};
use dealboard_core::{
    AppConfig, BoardSource, FetchedBoard, NarrationError, Narrator, Orchestrator, PipelineError,
    RawRecord, SourceError,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEALS: &str = "deals-1";
const WORK_ORDERS: &str = "wo-2";

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

fn sample_boards() -> HashMap<String, Vec<RawRecord>> {
    let deals = vec![
        record(json!({"id": "d1", "name": "Pit survey", "sector": "Mining", "deal_value": 100000, "deal_status": "Open", "created_at": "2024-02-01"})),
        record(json!({"id": "d2", "name": "Haul road", "sector": "mining ", "deal_value": 50000, "deal_status": "Won", "created_at": "2024-02-10"})),
        record(json!({"id": "d3", "name": "Panel audit", "sector": "Solar", "deal_value": 25000, "deal_status": "Lost", "created_at": "2023-11-01"})),
        record(json!({"id": "d4", "name": "Farm scan", "sector": "Solar", "deal_value": 40000, "deal_status": "Open", "created_at": "2023-06-01"})),
    ];
    let work_orders = vec![record(json!({
        "id": "w1", "name": "Pit survey WO", "sector": "Mining",
        "invoiced_amount": 100000, "collected_amount": 80000, "invoice_date": "2024-03-01"
    }))];
    HashMap::from([
        (DEALS.to_string(), deals),
        (WORK_ORDERS.to_string(), work_orders),
    ])
}

// ============================================================================
// Stub collaborators
// ============================================================================

struct StubSource {
    boards: HashMap<String, Vec<RawRecord>>,
    failure: Option<SourceError>,
    calls: AtomicUsize,
}

impl StubSource {
    fn new() -> Self {
        Self {
            boards: sample_boards(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BoardSource for StubSource {
    async fn fetch_records(&self, board_id: &str) -> Result<FetchedBoard, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(FetchedBoard::new(
            board_id,
            self.boards.get(board_id).cloned().unwrap_or_default(),
        ))
    }
}

enum IntentReply {
    Kind(MetricKind, f64),
    Clarify(&'static str),
    Fail,
}

struct StubNarrator {
    intent: IntentReply,
    narrate_fails: bool,
    classify_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    leadership_calls: AtomicUsize,
}

impl StubNarrator {
    fn new(intent: IntentReply) -> Self {
        Self {
            intent,
            narrate_fails: false,
            classify_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            leadership_calls: AtomicUsize::new(0),
        }
    }

    fn general() -> Self {
        Self::new(IntentReply::Kind(MetricKind::General, 0.9))
    }

    fn narration_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst) + self.leadership_calls.load(Ordering::SeqCst)
    }

    fn total_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst) + self.narration_calls()
    }
}

#[async_trait]
impl Narrator for StubNarrator {
    async fn classify_intent(
        &self,
        question: &str,
        _sectors: &[String],
    ) -> Result<Intent, NarrationError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        let mut intent = Intent::fallback(question);
        match self.intent {
            IntentReply::Kind(kind, confidence) => {
                intent.metric_kind = kind;
                intent.confidence = confidence;
            }
            IntentReply::Clarify(prompt) => {
                intent.confidence = 0.9;
                intent.requires_clarification = true;
                intent.clarification_prompt = Some(prompt.to_string());
            }
            IntentReply::Fail => return Err(NarrationError::Timeout { timeout_secs: 60 }),
        }
        Ok(intent)
    }

    async fn narrate_summary(
        &self,
        _question: &str,
        metrics: &[MetricResult],
        _warnings: &[DataQualityWarning],
        _stats: &SummaryStats,
    ) -> Result<String, NarrationError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.narrate_fails {
            return Err(NarrationError::unreachable("connection reset"));
        }
        Ok(format!("Summary over {} metrics", metrics.len()))
    }

    async fn narrate_leadership(
        &self,
        metrics: &[MetricResult],
        _warnings: &[DataQualityWarning],
        _stats: &SummaryStats,
    ) -> Result<String, NarrationError> {
        self.leadership_calls.fetch_add(1, Ordering::SeqCst);
        if self.narrate_fails {
            return Err(NarrationError::unreachable("connection reset"));
        }
        Ok(format!("## Pipeline Health\n{} metrics", metrics.len()))
    }

    async fn suggest_follow_ups(
        &self,
        _question: &str,
        _kind: MetricKind,
        _sectors: &[String],
    ) -> Vec<String> {
        vec!["What about solar?".to_string()]
    }
}

fn config() -> AppConfig {
    AppConfig {
        deals_board_id: DEALS.to_string(),
        work_orders_board_id: WORK_ORDERS.to_string(),
        ..AppConfig::default()
    }
}

fn orchestrator(
    source: &Arc<StubSource>,
    narrator: &Arc<StubNarrator>,
    caches: Caches,
) -> Orchestrator {
    Orchestrator::new(source.clone(), narrator.clone(), caches, &config())
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

// ============================================================================
// Caching and provenance
// ============================================================================

#[tokio::test]
async fn test_equivalent_question_hits_response_cache() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    let first = orch
        .ask_on(AskRequest::new("What's our pipeline?"), today())
        .await
        .unwrap();
    assert_eq!(first.source, Provenance::Live);
    assert_eq!(source.calls(), 2);

    let second = orch
        .ask_on(AskRequest::new("what's   our PIPELINE?"), today())
        .await
        .unwrap();
    assert_eq!(second.source, Provenance::Cache);
    assert_eq!(second.insights, first.insights);
    assert_eq!(second.key_metrics, first.key_metrics);

    // Nothing upstream ran for the hit
    assert_eq!(source.calls(), 2);
    assert_eq!(narrator.total_calls(), 2);

    let stats = orch.caches().stats();
    assert_eq!(stats.response_cache.hits, 1);
    assert_eq!(stats.response_cache.size, 1);
}

#[tokio::test]
async fn test_board_cache_shared_across_questions() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    orch.ask_on(AskRequest::new("pipeline?"), today())
        .await
        .unwrap();
    let second = orch
        .ask_on(AskRequest::new("collections?"), today())
        .await
        .unwrap();

    // Board data reused, but the answer itself was computed this call
    assert_eq!(source.calls(), 2);
    assert_eq!(second.source, Provenance::Live);
    assert_eq!(narrator.narration_calls(), 2);
}

#[tokio::test]
async fn test_response_cache_expiry_triggers_recompute() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let caches = Caches::new(Duration::from_secs(60), Duration::from_millis(30));
    let orch = orchestrator(&source, &narrator, caches);

    orch.ask_on(AskRequest::new("pipeline?"), today())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    let again = orch
        .ask_on(AskRequest::new("pipeline?"), today())
        .await
        .unwrap();

    assert_eq!(again.source, Provenance::Live);
    assert_eq!(narrator.narration_calls(), 2);
    // Board cache TTL is longer, so no refetch
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_raw_data_only_when_requested() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    let plain = orch
        .ask_on(AskRequest::new("pipeline?"), today())
        .await
        .unwrap();
    assert!(plain.raw_data.is_none());

    // Served from cache, but the stored entry kept the raw summary
    let with_raw = orch
        .ask_on(AskRequest::new("pipeline?").with_raw_data(true), today())
        .await
        .unwrap();
    assert_eq!(with_raw.source, Provenance::Cache);
    let raw = with_raw.raw_data.expect("raw data requested");
    assert_eq!(raw.deals_count, 4);
    assert_eq!(raw.work_orders_count, 1);
    assert_eq!(raw.summary_stats.unique_sectors, vec!["mining", "solar"]);
}

// ============================================================================
// Metrics flowing through
// ============================================================================

#[tokio::test]
async fn test_general_question_returns_general_metrics() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    let response = orch
        .ask_on(AskRequest::new("How is the business?"), today())
        .await
        .unwrap();

    let kinds: Vec<MetricKind> = response.key_metrics.iter().map(|m| m.kind).collect();
    assert_eq!(kinds, dealboard_core::metrics::GENERAL_METRICS.to_vec());

    match &response.key_metrics[0].value {
        MetricValue::Amount { amount } => assert_eq!(*amount, Money::from_whole_rupees(140_000)),
        other => panic!("unexpected value {:?}", other),
    }
    assert_eq!(response.insights, "Summary over 4 metrics");
    assert_eq!(response.suggested_questions, vec!["What about solar?"]);
    assert_eq!(response.confidence, 0.9);
}

#[tokio::test]
async fn test_leadership_update_uses_briefing() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::new(IntentReply::Kind(
        MetricKind::LeadershipUpdate,
        0.95,
    )));
    let orch = orchestrator(&source, &narrator, Caches::default());

    let response = orch
        .ask_on(AskRequest::new("Give me an update"), today())
        .await
        .unwrap();

    assert_eq!(response.key_metrics.len(), 7);
    assert!(response.insights.starts_with("## Pipeline Health"));
    assert_eq!(narrator.leadership_calls.load(Ordering::SeqCst), 1);
    assert_eq!(narrator.summary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_classification_falls_back_to_general() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::new(IntentReply::Fail));
    let orch = orchestrator(&source, &narrator, Caches::default());

    let response = orch
        .ask_on(AskRequest::new("numbers?"), today())
        .await
        .unwrap();

    assert_eq!(response.confidence, Intent::FALLBACK_CONFIDENCE);
    assert_eq!(
        response.intent.as_ref().map(|i| i.metric_kind),
        Some(MetricKind::General)
    );
    assert_eq!(response.key_metrics.len(), 4);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unreachable_source_never_calls_narrator() {
    let source = Arc::new(StubSource::failing(SourceError::unreachable(
        "connection refused",
    )));
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    let err = orch
        .ask_on(AskRequest::new("pipeline?"), today())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
    assert!(err.is_retryable());
    assert_eq!(narrator.total_calls(), 0);
    assert_eq!(orch.caches().stats().response_cache.size, 0);
    assert_eq!(orch.caches().stats().board_cache.size, 0);
}

#[tokio::test]
async fn test_source_timeout_is_source_unavailable() {
    let source = Arc::new(StubSource::failing(SourceError::Timeout { timeout_secs: 30 }));
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    let err = orch.board_summary().await.unwrap_err();
    assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
    assert!(err.debug_detail().contains("30s"));
}

#[tokio::test]
async fn test_narration_failure_keeps_metrics_and_skips_store() {
    let source = Arc::new(StubSource::new());
    let mut stub = StubNarrator::general();
    stub.narrate_fails = true;
    let narrator = Arc::new(stub);
    let orch = orchestrator(&source, &narrator, Caches::default());

    let err = orch
        .ask_on(AskRequest::new("pipeline?"), today())
        .await
        .unwrap_err();

    match &err {
        PipelineError::NarrationUnavailable { metrics, .. } => assert_eq!(metrics.len(), 4),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.code(), "NARRATION_UNAVAILABLE");
    assert_eq!(orch.caches().stats().response_cache.size, 0);

    // Retry goes through narration again rather than a cached partial
    let _ = orch.ask_on(AskRequest::new("pipeline?"), today()).await;
    assert_eq!(narrator.narration_calls(), 2);
}

#[tokio::test]
async fn test_low_confidence_asks_for_clarification() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::new(IntentReply::Kind(
        MetricKind::PipelineBySector,
        0.2,
    )));
    let orch = orchestrator(&source, &narrator, Caches::default());

    let err = orch
        .ask_on(AskRequest::new("that thing?"), today())
        .await
        .unwrap_err();

    match err {
        PipelineError::AmbiguousIntent {
            confidence,
            suggested_questions,
            ..
        } => {
            assert_eq!(confidence, 0.2);
            assert_eq!(suggested_questions.len(), 3);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(narrator.narration_calls(), 0);
    assert_eq!(orch.caches().stats().response_cache.size, 0);
}

#[tokio::test]
async fn test_explicit_clarification_prompt_is_surfaced() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::new(IntentReply::Clarify(
        "Did you mean mining or solar?",
    )));
    let orch = orchestrator(&source, &narrator, Caches::default());

    let err = orch
        .ask_on(AskRequest::new("the drilling sector?"), today())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "AMBIGUOUS_INTENT");
    assert_eq!(err.public_message(), "Did you mean mining or solar?");
}

#[tokio::test]
async fn test_invalid_request_rejected_before_fetch() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    let err = orch
        .ask_on(AskRequest::new("   "), today())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_REQUEST");
    assert_eq!(source.calls(), 0);
}

// ============================================================================
// Board summary
// ============================================================================

#[tokio::test]
async fn test_board_summary_provenance() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let orch = orchestrator(&source, &narrator, Caches::default());

    let first = orch.board_summary().await.unwrap();
    assert_eq!(first.source, Provenance::Live);
    assert_eq!(first.deals_board_id, DEALS);
    assert_eq!(first.work_orders_board_id, WORK_ORDERS);
    assert_eq!(first.summary_stats.total_deals, 4);

    let second = orch.board_summary().await.unwrap();
    assert_eq!(second.source, Provenance::Cache);
    assert_eq!(source.calls(), 2);

    // Half-populated board cache still counts as live
    orch.caches().boards.remove(WORK_ORDERS);
    let third = orch.board_summary().await.unwrap();
    assert_eq!(third.source, Provenance::Live);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let source = Arc::new(StubSource::new());
    let narrator = Arc::new(StubNarrator::general());
    let orch = Arc::new(orchestrator(&source, &narrator, Caches::default()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move {
                orch.ask_on(AskRequest::new(format!("question {}", i % 2)), today())
                    .await
            })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.key_metrics.len(), 4);
    }
    // Two distinct questions, at most one entry each
    assert_eq!(orch.caches().stats().response_cache.size, 2);
}

//! Groq narrator against a mock chat-completions endpoint

use dealboard_core::models::{MetricKind, MetricResult, MetricValue, Money, SummaryStats};
use dealboard_core::{GroqNarrator, NarrationError, Narrator};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn narrator(server: &MockServer, timeout: Duration) -> GroqNarrator {
    GroqNarrator::new(
        "groq-key",
        "llama-test",
        &format!("{}/openai/v1", server.uri()),
        timeout,
    )
    .unwrap()
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160 }
    })
}

fn pipeline_metric() -> MetricResult {
    MetricResult {
        kind: MetricKind::TotalPipelineValue,
        value: MetricValue::Amount {
            amount: Money::from_whole_rupees(12_50_00_000),
        },
        formatted: "₹12.50 Cr".to_string(),
        description: "Total value of open deals".to_string(),
        trend: None,
    }
}

#[tokio::test]
async fn test_classify_intent_parses_fenced_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("Authorization", "Bearer groq-key"))
        .and(body_partial_json(json!({ "model": "llama-test", "temperature": 0.1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"metric_type\": \"collection_efficiency\", \"sector\": \"mining\", \
             \"confidence\": 0.85, \"time_range\": {\"period\": \"ytd\"}}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let intent = narrator(&server, Duration::from_secs(5))
        .classify_intent("Mining collections this year?", &["mining".to_string()])
        .await
        .unwrap();

    assert_eq!(intent.metric_kind, MetricKind::CollectionEfficiency);
    assert_eq!(intent.sector.as_deref(), Some("mining"));
    assert_eq!(intent.confidence, 0.85);
    assert!(intent.time_scope.is_some());
    assert_eq!(intent.raw_query, "Mining collections this year?");
}

#[tokio::test]
async fn test_summary_sends_metrics_and_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(body_partial_json(json!({ "temperature": 0.5, "max_tokens": 1024 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("  Pipeline stands at ₹12.50 Cr.  ")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = narrator(&server, Duration::from_secs(5))
        .narrate_summary(
            "What's our pipeline?",
            &[pipeline_metric()],
            &[],
            &SummaryStats::default(),
        )
        .await
        .unwrap();
    assert_eq!(text, "Pipeline stands at ₹12.50 Cr.");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user_prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(user_prompt.contains("₹12.50 Cr"));
    assert!(user_prompt.contains("No significant data quality issues."));
    assert_eq!(body["messages"][0]["role"], "system");
}

#[tokio::test]
async fn test_leadership_uses_larger_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "temperature": 0.4, "max_tokens": 1500 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("## Pipeline Health")))
        .expect(1)
        .mount(&server)
        .await;

    let text = narrator(&server, Duration::from_secs(5))
        .narrate_leadership(&[pipeline_metric()], &[], &SummaryStats::default())
        .await
        .unwrap();
    assert_eq!(text, "## Pipeline Health");
}

#[tokio::test]
async fn test_empty_choices_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = narrator(&server, Duration::from_secs(5))
        .narrate_summary("q", &[], &[], &SummaryStats::default())
        .await
        .unwrap_err();
    assert!(matches!(err, NarrationError::MalformedOutput { .. }));
}

#[tokio::test]
async fn test_rate_limit_is_unreachable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("{\"error\":\"rate limited\"}"))
        .mount(&server)
        .await;

    let err = narrator(&server, Duration::from_secs(5))
        .classify_intent("q", &[])
        .await
        .unwrap_err();
    assert_eq!(err, NarrationError::unreachable("HTTP 429"));
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = narrator(&server, Duration::from_millis(200))
        .narrate_leadership(&[], &[], &SummaryStats::default())
        .await
        .unwrap_err();
    assert!(matches!(err, NarrationError::Timeout { .. }));
}

#[tokio::test]
async fn test_suggestions_are_capped_and_never_fail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "temperature": 0.7, "max_tokens": 256 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "[\"Which sector leads?\", \"How did Q1 compare?\", \"Who owns the largest deal?\", \"Extra?\"]",
        )))
        .mount(&server)
        .await;

    let suggestions = narrator(&server, Duration::from_secs(5))
        .suggest_follow_ups("pipeline?", MetricKind::TotalPipelineValue, &[])
        .await;
    assert_eq!(suggestions.len(), 3);
    assert_eq!(suggestions[0], "Which sector leads?");

    let down = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&down)
        .await;
    let none = narrator(&down, Duration::from_secs(5))
        .suggest_follow_ups("pipeline?", MetricKind::TotalPipelineValue, &[])
        .await;
    assert!(none.is_empty());
}

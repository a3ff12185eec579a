//! monday.com GraphQL client
//!
//! Walks `items_page` cursors until the board is exhausted and flattens
//! each item into a [`RawRecord`] keyed by snake_cased column title. Column
//! values are decoded by column type; anything unrecognised falls back to
//! the display text.

use super::queries::BOARD_ITEMS_PAGE;
use super::{BoardSource, FetchedBoard, RawRecord};
use crate::config::AppConfig;
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// API version pinned in every request
const API_VERSION: &str = "2024-01";

/// Upstream bodies are truncated to this many chars in logs
const LOG_BODY_CHARS: usize = 200;

/// Client for the monday.com v2 API
#[derive(Clone)]
pub struct MondayClient {
    client: Client,
    api_key: String,
    api_url: String,
    page_size: u32,
    timeout: Duration,
}

impl std::fmt::Debug for MondayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MondayClient")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("page_size", &self.page_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MondayClient {
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: api_url.into(),
            page_size: page_size.max(1),
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SourceError> {
        Self::new(
            config.monday_api_key.clone(),
            config.monday_api_url.clone(),
            config.monday_page_size,
            config.source_timeout,
        )
    }

    fn transport_error(&self, error: reqwest::Error) -> SourceError {
        if error.is_timeout() {
            SourceError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            SourceError::unreachable(error.to_string())
        }
    }

    /// Run one page query and return its `data` section
    async fn fetch_page(
        &self,
        board_id: &str,
        cursor: Option<&str>,
    ) -> Result<PageData, SourceError> {
        let body = json!({
            "query": BOARD_ITEMS_PAGE,
            "variables": {
                "boardIds": [board_id],
                "limit": self.page_size,
                "cursor": cursor,
            },
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", &self.api_key)
            .header("API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                board_id,
                status = status.as_u16(),
                body = %truncate(&text, LOG_BODY_CHARS),
                "monday.com returned an error status"
            );
            return Err(SourceError::unreachable(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let payload: GraphQlResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                SourceError::malformed(format!("invalid JSON body: {}", e))
            }
        })?;

        if !payload.errors.is_empty() {
            let messages: Vec<&str> = payload
                .errors
                .iter()
                .map(|e| e.message.as_deref().unwrap_or("Unknown error"))
                .collect();
            warn!(board_id, errors = ?messages, "GraphQL errors from monday.com");
            return Err(SourceError::malformed(format!(
                "GraphQL errors: {}",
                messages.join("; ")
            )));
        }

        payload
            .data
            .ok_or_else(|| SourceError::malformed("response has neither data nor errors"))
    }
}

#[async_trait]
impl BoardSource for MondayClient {
    async fn fetch_records(&self, board_id: &str) -> Result<FetchedBoard, SourceError> {
        let mut items: Vec<RawRecord> = Vec::new();
        let mut titles: HashMap<String, String> = HashMap::new();
        let mut cursor: Option<String> = None;
        let mut page = 0u32;

        loop {
            page += 1;
            let data = self.fetch_page(board_id, cursor.as_deref()).await?;

            let Some(board) = data.boards.into_iter().next() else {
                warn!(board_id, "No board found with this id");
                break;
            };

            if page == 1 {
                titles = board
                    .columns
                    .into_iter()
                    .map(|c| (c.id, c.title))
                    .collect();
                debug!(
                    board_id,
                    name = board.name.as_deref().unwrap_or(""),
                    columns = titles.len(),
                    "Board columns loaded"
                );
            }

            let page_len = board.items_page.items.len();
            items.extend(
                board
                    .items_page
                    .items
                    .iter()
                    .map(|item| transform_item(item, &titles)),
            );
            debug!(board_id, page, page_len, total = items.len(), "Fetched board page");

            cursor = board.items_page.cursor;
            if cursor.is_none() || page_len == 0 {
                break;
            }
        }

        info!(board_id, items = items.len(), pages = page, "Board fetch complete");
        Ok(FetchedBoard::new(board_id, items))
    }
}

// ===================
// Wire types
// ===================

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<PageData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageData {
    #[serde(default)]
    boards: Vec<BoardPage>,
}

#[derive(Debug, Deserialize)]
struct BoardPage {
    name: Option<String>,
    #[serde(default)]
    columns: Vec<ColumnDef>,
    items_page: ItemsPage,
}

#[derive(Debug, Deserialize)]
struct ColumnDef {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    cursor: Option<String>,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    id: String,
    name: Option<String>,
    created_at: Option<String>,
    group: Option<Group>,
    #[serde(default)]
    column_values: Vec<ColumnValue>,
}

#[derive(Debug, Deserialize)]
struct Group {
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ColumnValue {
    id: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
    label: Option<String>,
    index: Option<i64>,
    number: Option<f64>,
    date: Option<String>,
    time: Option<String>,
    url: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

// ===================
// Decoding
// ===================

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

/// Decode one column value by its column type; empty → null
fn decode_column_value(cv: &ColumnValue) -> Value {
    let text = non_empty(cv.text.as_deref());

    let decoded = match cv.kind.as_deref().unwrap_or_default() {
        "numbers" | "numeric" => cv
            .number
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .or_else(|| text.map(string)),
        "date" => match non_empty(cv.date.as_deref()) {
            Some(date) => match non_empty(cv.time.as_deref()) {
                Some(time) => Some(Value::String(format!("{}T{}", date, time))),
                None => Some(string(date)),
            },
            None => text.map(string),
        },
        "status" => match non_empty(cv.label.as_deref()) {
            Some(label) => Some(json!({ "label": label, "index": cv.index })),
            None => text.map(string),
        },
        "dropdown" => text.map(|t| {
            Value::Array(
                t.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(string)
                    .collect(),
            )
        }),
        "link" => text.or(non_empty(cv.url.as_deref())).map(string),
        "email" => non_empty(cv.email.as_deref()).or(text).map(string),
        "phone" => non_empty(cv.phone.as_deref()).or(text).map(string),
        _ => text.map(string),
    };

    decoded.unwrap_or(Value::Null)
}

/// `"Deal Value (₹)"` → `"deal_value_₹"`
fn normalize_column_name(name: &str) -> String {
    let replaced: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '-' | '/' | '.' | '(' | ')' | '#' => '_',
            other => other,
        })
        .collect();

    replaced
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn transform_item(item: &Item, titles: &HashMap<String, String>) -> RawRecord {
    let mut record = RawRecord::new();
    record.insert("id".to_string(), string(&item.id));
    record.insert(
        "name".to_string(),
        item.name.as_deref().map(string).unwrap_or(Value::Null),
    );
    record.insert(
        "created_at".to_string(),
        item.created_at.as_deref().map(string).unwrap_or(Value::Null),
    );
    record.insert(
        "group".to_string(),
        item.group
            .as_ref()
            .and_then(|g| g.title.as_deref())
            .map(string)
            .unwrap_or(Value::Null),
    );

    for cv in &item.column_values {
        let title = titles.get(&cv.id).map(String::as_str).unwrap_or(&cv.id);
        let key = normalize_column_name(title);
        let value = decode_column_value(cv);

        if key != title {
            record.insert(title.to_string(), value.clone());
        }
        record.insert(key, value);
    }

    record
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

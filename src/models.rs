//! Wire types for the finance tracker API.
//!
//! These mirror the server's JSON contract. Amounts are [`Decimal`] in memory
//! and plain JSON numbers on the wire; every derived figure is computed
//! server-side and only decoded here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Balances
// =============================================================================

/// A recorded month-end balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Server-assigned identifier.
    pub id: i64,
    /// Month the balance belongs to, `"YYYY-MM"`.
    pub date: String,
    /// Amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// Payload for creating a balance.
///
/// No client-side id is sent; the id in the response is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateBalanceRequest {
    pub date: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

// =============================================================================
// Metrics
// =============================================================================

/// Snapshot for the current month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentMonthMetrics {
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Change against the previous month, when one exists.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub delta_vs_prev: Option<Decimal>,
}

/// One month of a delta series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDelta {
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// `None` exactly when there is no prior-month balance to diff against.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub delta: Option<Decimal>,
}

/// Inclusive month range echoed back by the metrics endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    pub from: String,
    pub to: String,
}

/// Delta series over a month range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaMetrics {
    pub range: MonthRange,
    pub items: Vec<MonthlyDelta>,
    #[serde(default)]
    pub missing_months: Vec<String>,
}

/// Aggregates over a month range.
///
/// Numeric fields are `None` when the range lacks the data to compute them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub range: MonthRange,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub start_balance: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub end_balance: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_change: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub avg_monthly_change: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub last_month_delta: Option<Decimal>,
    #[serde(default)]
    pub positive_months: u32,
    #[serde(default)]
    pub negative_months: u32,
}

// =============================================================================
// Chat
// =============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        f.write_str(label)
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for `POST /ai/chat/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Full conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// Assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub role: MessageRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_delta_metrics_with_null_delta() {
        let body = json!({
            "range": { "from": "2025-01", "to": "2025-06" },
            "items": [
                { "month": "2025-01", "balance": 1000.0, "delta": null },
                { "month": "2025-03", "balance": 1300.0, "delta": 300.0 }
            ],
            "missing_months": ["2025-02"]
        });

        let metrics: DeltaMetrics = serde_json::from_value(body).unwrap();
        assert_eq!(metrics.items.len(), 2);
        assert_eq!(metrics.items[0].delta, None);
        assert_eq!(metrics.items[1].delta, Some(Decimal::from(300)));
        assert_eq!(metrics.missing_months, vec!["2025-02"]);
    }

    #[test]
    fn test_summary_with_insufficient_data() {
        let body = json!({
            "range": { "from": "2025-01", "to": "2025-01" },
            "start_balance": 1000.0,
            "end_balance": 1000.0,
            "total_change": null,
            "avg_monthly_change": null,
            "last_month_delta": null,
            "positive_months": 0,
            "negative_months": 0
        });

        let summary: MetricsSummary = serde_json::from_value(body).unwrap();
        assert_eq!(summary.start_balance, Some(Decimal::from(1000)));
        assert!(summary.total_change.is_none());
        assert!(summary.avg_monthly_change.is_none());
    }

    #[test]
    fn test_create_request_has_no_id() {
        let request = CreateBalanceRequest {
            date: "2025-09".to_string(),
            balance: Decimal::from(1400),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "date": "2025-09", "balance": 1400.0 }));
    }

    #[test]
    fn test_amounts_decode_without_float_noise() {
        let body = json!({ "id": 3, "date": "2025-04", "balance": 0.1 });
        let balance: Balance = serde_json::from_value(body).unwrap();
        assert_eq!(balance.balance, Decimal::from_str("0.1").unwrap());

        let body = json!({ "id": 4, "date": "2025-05", "balance": 1250 });
        let balance: Balance = serde_json::from_value(body).unwrap();
        assert_eq!(balance.balance, Decimal::from(1250));
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("How am I doing?")],
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{ "role": "user", "content": "How am I doing?" }],
                "stream": false
            })
        );
    }
}

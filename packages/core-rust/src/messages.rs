//! HTTP wire messages.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` to match the JSON
//! the leaderboard clients already speak. Query parameters arrive as raw
//! strings so that malformed numbers produce the uniform error envelope
//! instead of an extractor rejection.

use serde::{Deserialize, Serialize};

use crate::types::{NewScore, ScoreExtras};

/// Message sent with every successful response.
pub const SUCCESS_MESSAGE: &str = "Success";

/// Response envelope shared by success and error replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Success envelope carrying `payload`.
    pub fn success(payload: T) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            more_info: Some(payload),
        }
    }
}

impl ApiEnvelope<serde_json::Value> {
    /// Error envelope with only a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            more_info: None,
        }
    }

    /// Error envelope with structured detail.
    pub fn error_with(message: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            more_info: Some(detail),
        }
    }
}

/// Query string of `GET /api/scores/{mode}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreQueryParams {
    /// Point lookup; when present the window parameters are ignored.
    pub id: Option<String>,
    pub load_count: Option<String>,
    pub center_on: Option<String>,
}

/// JSON body of `POST /api/scores/{mode}`.
///
/// Unknown keys are ignored; older clients still send `password` in the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreBody {
    pub score: i64,
    pub username: String,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub mods: Option<Vec<String>>,
}

impl From<SubmitScoreBody> for NewScore {
    fn from(body: SubmitScoreBody) -> Self {
        Self {
            score: body.score,
            username: body.username,
            extras: ScoreExtras {
                multiplier: body.multiplier,
                mods: body.mods,
            },
        }
    }
}

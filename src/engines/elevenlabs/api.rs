//! Wire types of the ElevenLabs REST API and status classification.

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;
use crate::{CreditBalance, VoiceSettings};

#[derive(Debug, Serialize)]
pub(crate) struct SpeechBody<'a> {
    pub text: &'a str,
    pub model_id: &'a str,
    pub voice_settings: &'a VoiceSettings,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Subscription {
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub character_count: u64,
    #[serde(default)]
    pub character_limit: u64,
    #[serde(default)]
    pub next_character_count_reset_unix: Option<i64>,
}

impl From<Subscription> for CreditBalance {
    fn from(s: Subscription) -> Self {
        CreditBalance {
            character_count: s.character_count,
            character_limit: s.character_limit,
            tier: s.tier,
            next_reset_unix: s.next_character_count_reset_unix,
        }
    }
}

/// A voice available to the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoicesResponse {
    pub voices: Vec<Voice>,
}

/// A synthesis model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub model_id: String,
    pub name: String,
    #[serde(default)]
    pub can_do_text_to_speech: bool,
}

/// `{"detail": "..."}` or `{"detail": {"status": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Structured {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Other(serde_json::Value),
}

/// Human-readable message from an error response body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: ErrorDetail::Text(text),
        }) => text,
        Ok(ErrorBody {
            detail: ErrorDetail::Structured { status, message },
        }) => match (status, message) {
            (Some(status), Some(message)) => format!("{status}: {message}"),
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => body.trim().to_string(),
        },
        Ok(ErrorBody {
            detail: ErrorDetail::Other(value),
        }) => value.to_string(),
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Map a non-success HTTP status and its body to an error.
pub(crate) fn classify_status(status: u16, body: &str) -> SpeechError {
    let message = error_message(body);
    match status {
        401 | 403 => SpeechError::Authentication(message),
        429 => SpeechError::RateLimited(message),
        400 | 404 | 422 => SpeechError::InvalidParameter(message),
        _ => SpeechError::Server { status, message },
    }
}

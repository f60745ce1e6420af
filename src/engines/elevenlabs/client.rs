use std::time::Duration;

use derive_builder::Builder;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::api::{classify_status, Model, SpeechBody, Subscription, Voice, VoicesResponse};
use crate::error::SpeechError;
use crate::{CreditBalance, SpeechApi, SynthesisParams};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Escaped in a voice id placed in the URL path.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Spoken by [`ElevenLabsClient::voice_sample`] when no text is given.
pub const SAMPLE_TEXT: &str =
    "Hello, this is a sample voice from ElevenLabs. Xin chào, đây là giọng đọc mẫu từ ElevenLabs.";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for constructing an [`ElevenLabsClient`].
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), default)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Bound on each request, connection included. Timeouts are not retried.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Blocking ElevenLabs REST client.
///
/// Holds no credentials; every call takes the key to use, so one client
/// serves a whole key store.
pub struct ElevenLabsClient {
    base_url: String,
    client: Client,
}

impl ElevenLabsClient {
    pub fn new(config: ClientConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SpeechError::Network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Voices available to the account behind `api_key`.
    pub fn voices(&self, api_key: &str) -> Result<Vec<Voice>, SpeechError> {
        let resp: VoicesResponse = self.get_json(api_key, "/voices")?;
        Ok(resp.voices)
    }

    /// Models usable for text-to-speech.
    pub fn models(&self, api_key: &str) -> Result<Vec<Model>, SpeechError> {
        let models: Vec<Model> = self.get_json(api_key, "/models")?;
        Ok(models
            .into_iter()
            .filter(|m| m.can_do_text_to_speech)
            .collect())
    }

    /// Short MP3 sample of a voice with the default model and neutral
    /// settings.
    pub fn voice_sample(
        &self,
        api_key: &str,
        voice_id: &str,
        text: Option<&str>,
    ) -> Result<Vec<u8>, SpeechError> {
        let params = SynthesisParams {
            voice_id: voice_id.to_string(),
            ..Default::default()
        };
        self.synthesize(api_key, text.unwrap_or(SAMPLE_TEXT), &params)
    }

    fn get_json<T: DeserializeOwned>(&self, api_key: &str, path: &str) -> Result<T, SpeechError> {
        let req = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("xi-api-key", api_key)
            .header("Accept", "application/json");
        let resp = send(req)?;
        let body = resp.text().map_err(transport_error)?;
        serde_json::from_str(&body)
            .map_err(|e| SpeechError::InvalidResponse(format!("GET {path}: {e}")))
    }
}

impl SpeechApi for ElevenLabsClient {
    fn synthesize(
        &self,
        api_key: &str,
        text: &str,
        params: &SynthesisParams,
    ) -> Result<Vec<u8>, SpeechError> {
        let url = format!(
            "{}/text-to-speech/{}",
            self.base_url,
            utf8_percent_encode(&params.voice_id, PATH_SEGMENT)
        );
        let body = SpeechBody {
            text,
            model_id: &params.model_id,
            voice_settings: &params.voice_settings,
        };

        log::debug!(
            "Synthesizing {} characters with voice {}",
            text.chars().count(),
            params.voice_id
        );
        let req = self
            .client
            .post(url)
            .query(&[("output_format", params.output_format.api_name())])
            .header("xi-api-key", api_key)
            .json(&body);

        let audio = send(req)?.bytes().map_err(transport_error)?;
        if audio.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "empty audio response".to_string(),
            ));
        }
        Ok(audio.to_vec())
    }

    fn credit_balance(&self, api_key: &str) -> Result<CreditBalance, SpeechError> {
        let sub: Subscription = self.get_json(api_key, "/user/subscription")?;
        Ok(sub.into())
    }
}

/// Send a request, turning transport failures and error statuses into
/// classified errors.
fn send(req: RequestBuilder) -> Result<Response, SpeechError> {
    let resp = req.send().map_err(transport_error)?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(classify_status(status.as_u16(), &body))
}

fn transport_error(e: reqwest::Error) -> SpeechError {
    if e.is_timeout() {
        SpeechError::Network(format!("request timed out: {e}"))
    } else {
        SpeechError::Network(e.to_string())
    }
}

//! # tts-batch
//!
//! A Rust library for turning text files into speech with the ElevenLabs
//! text-to-speech API, one output file per input.
//!
//! ## Features
//!
//! - **Chunking**: long texts are split at paragraph, line, sentence or word
//!   boundaries so each request stays under the vendor's input limit
//! - **Batch conversion**: sequential, cancellable, with a per-job report
//! - **Multiple API keys**: stored locally, with deduplicated credit totals
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tts-batch = { version = "2026.2", features = ["elevenlabs"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use tts_batch::batch::{run_batch, BatchOptionsBuilder, ConversionJob, NoopObserver};
//! use tts_batch::engines::elevenlabs::ElevenLabsClient;
//! use tts_batch::CancelToken;
//!
//! let client = ElevenLabsClient::new(Default::default())?;
//! let options = BatchOptionsBuilder::default()
//!     .output_dir(PathBuf::from("out"))
//!     .build()?;
//! let jobs = vec![ConversionJob::file("chapter1.txt")];
//! let report = run_batch(&client, "xi-key", &jobs, &options, &CancelToken::new(), &mut NoopObserver)?;
//! println!("{} of {} jobs completed", report.completed(), report.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod batch;
pub mod config;
pub mod credentials;
pub mod credits;
pub mod engines;
pub mod error;
pub mod text;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use audio::OutputFormat;
pub use error::{BatchError, ConfigError, ErrorKind, SpeechError};

/// Model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "eleven_turbo_v2";

/// Voice used when none is configured ("George").
pub const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";

/// Voice tuning sent with every synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Range: 0.0–1.0, default 0.5.
    pub stability: f32,
    /// Range: 0.0–1.0, default 0.5.
    pub similarity_boost: f32,
    /// Style exaggeration. Range: 0.0–1.0, default 0.0.
    pub style: f32,
    pub use_speaker_boost: bool,
    /// Speech speed multiplier. Range: 0.7–1.2, default 1.0.
    pub speed: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
            style: 0.0,
            use_speaker_boost: true,
            speed: 1.0,
        }
    }
}

impl VoiceSettings {
    /// Check every setting against its documented range.
    pub fn validate(&self) -> Result<(), String> {
        let unit = [
            ("stability", self.stability),
            ("similarity_boost", self.similarity_boost),
            ("style", self.style),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within 0.0..=1.0, got {value}"));
            }
        }
        if !(0.7..=1.2).contains(&self.speed) {
            return Err(format!("speed must be within 0.7..=1.2, got {}", self.speed));
        }
        Ok(())
    }
}

/// Parameters shared by every synthesis request of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParams {
    pub voice_id: String,
    pub model_id: String,
    pub output_format: OutputFormat,
    pub voice_settings: VoiceSettings,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: OutputFormat::default(),
            voice_settings: VoiceSettings::default(),
        }
    }
}

impl SynthesisParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.voice_id.trim().is_empty() {
            return Err("voice id is empty".to_string());
        }
        if self.model_id.trim().is_empty() {
            return Err("model id is empty".to_string());
        }
        self.voice_settings.validate()
    }
}

/// Character quota of one API key, as reported by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Characters already used in the current period.
    pub character_count: u64,
    /// Characters allowed in the current period.
    pub character_limit: u64,
    pub tier: Option<String>,
    pub next_reset_unix: Option<i64>,
}

impl CreditBalance {
    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }
}

/// Remote speech service used by the batch converter and credit aggregator.
///
/// Every call is blocking and carries the API key it should authenticate
/// with, so one client can serve many keys.
pub trait SpeechApi {
    /// Synthesize `text` and return the encoded audio bytes.
    fn synthesize(
        &self,
        api_key: &str,
        text: &str,
        params: &SynthesisParams,
    ) -> Result<Vec<u8>, SpeechError>;

    /// Query the remaining character quota of `api_key`.
    fn credit_balance(&self, api_key: &str) -> Result<CreditBalance, SpeechError>;
}

impl<T: SpeechApi + ?Sized> SpeechApi for &T {
    fn synthesize(
        &self,
        api_key: &str,
        text: &str,
        params: &SynthesisParams,
    ) -> Result<Vec<u8>, SpeechError> {
        (**self).synthesize(api_key, text, params)
    }

    fn credit_balance(&self, api_key: &str) -> Result<CreditBalance, SpeechError> {
        (**self).credit_balance(api_key)
    }
}

/// Cooperative cancellation flag shared between a running batch and whoever
/// wants to stop it.
///
/// The batch checks it before each job and before each chunk request, so a
/// cancel takes effect once the in-flight call returns.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

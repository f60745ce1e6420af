//! ElevenLabs text-to-speech engine.
//!
//! A blocking client for the ElevenLabs REST API covering synthesis, the
//! subscription (credit) endpoint and voice/model listing. All requests
//! authenticate with the `xi-api-key` header and are bounded by the
//! configured timeout.
//!
//! # Error Mapping
//!
//! | Response | Error |
//! |---|---|
//! | 401, 403 | `SpeechError::Authentication` |
//! | 429 | `SpeechError::RateLimited` |
//! | 400, 404, 422 | `SpeechError::InvalidParameter` |
//! | other non-2xx | `SpeechError::Server` |
//! | connect failure, timeout | `SpeechError::Network` |
//!
//! # Examples
//!
//! ```rust,no_run
//! use tts_batch::engines::elevenlabs::{ClientConfigBuilder, ElevenLabsClient};
//! use tts_batch::{SpeechApi, SynthesisParams};
//! use std::time::Duration;
//!
//! let config = ClientConfigBuilder::default()
//!     .timeout(Duration::from_secs(60))
//!     .build()?;
//! let client = ElevenLabsClient::new(config)?;
//!
//! let balance = client.credit_balance("xi-key")?;
//! println!("{} characters left", balance.remaining());
//!
//! let audio = client.synthesize("xi-key", "Hello, world!", &SynthesisParams::default())?;
//! std::fs::write("hello.mp3", audio)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod client;

pub use api::{Model, Voice};
pub use client::{
    ClientConfig, ClientConfigBuilder, ElevenLabsClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
    SAMPLE_TEXT,
};

//! Remote speech synthesis engines.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `elevenlabs` - ElevenLabs REST API (blocking HTTP via reqwest)

#[cfg(feature = "elevenlabs")]
pub mod elevenlabs;

//! Output formats and assembly of per-chunk audio into one file.

use std::fmt;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;

/// Encoding requested from the API and written to disk.
///
/// MP3 chunks are concatenated frame streams. PCM chunks are raw 16-bit
/// little-endian mono samples, joined and wrapped once into a WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Mp3 { sample_rate: u32, bitrate: u32 },
    Pcm { sample_rate: u32 },
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Mp3 {
            sample_rate: 44100,
            bitrate: 128,
        }
    }
}

impl OutputFormat {
    /// Value of the `output_format` query parameter.
    pub fn api_name(&self) -> String {
        match self {
            OutputFormat::Mp3 {
                sample_rate,
                bitrate,
            } => format!("mp3_{sample_rate}_{bitrate}"),
            OutputFormat::Pcm { sample_rate } => format!("pcm_{sample_rate}"),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 { .. } => "mp3",
            OutputFormat::Pcm { .. } => "wav",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.api_name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "mp3" => return Ok(OutputFormat::default()),
            "wav" | "pcm" => return Ok(OutputFormat::Pcm { sample_rate: 44100 }),
            _ => {}
        }

        let parts: Vec<&str> = lower.split('_').collect();
        let num = |p: &str| {
            p.parse::<u32>()
                .map_err(|_| format!("invalid number '{p}' in output format '{s}'"))
        };
        match parts.as_slice() {
            ["mp3", rate, bitrate] => Ok(OutputFormat::Mp3 {
                sample_rate: num(rate)?,
                bitrate: num(bitrate)?,
            }),
            ["pcm", rate] => Ok(OutputFormat::Pcm {
                sample_rate: num(rate)?,
            }),
            _ => Err(format!(
                "unsupported output format '{s}' (expected mp3, wav, mp3_<rate>_<kbps> or pcm_<rate>)"
            )),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.api_name()
    }
}

/// Join chunk audio in order into the bytes of one output file.
pub fn assemble(format: OutputFormat, segments: &[Vec<u8>]) -> Result<Vec<u8>, SpeechError> {
    match format {
        OutputFormat::Mp3 { .. } => Ok(segments.concat()),
        OutputFormat::Pcm { sample_rate } => {
            // A stray byte must not shift the samples of later segments.
            let mut pcm = Vec::with_capacity(segments.iter().map(Vec::len).sum());
            for (i, segment) in segments.iter().enumerate() {
                let even = segment.len() & !1;
                if even != segment.len() {
                    log::warn!(
                        "PCM segment {} has an odd byte count ({}), dropping its last byte",
                        i + 1,
                        segment.len()
                    );
                }
                pcm.extend_from_slice(&segment[..even]);
            }
            pcm_to_wav(&pcm, sample_rate)
        }
    }
}

/// Wrap raw 16-bit little-endian mono PCM into a WAV container. A trailing
/// odd byte is ignored.
fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, SpeechError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_err = |e: hound::Error| SpeechError::InvalidResponse(format!("WAV encoding failed: {e}"));

    let mut buf = Vec::with_capacity(pcm.len() + 44);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buf), spec).map_err(wav_err)?;
        for pair in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;
    }
    Ok(buf)
}

/// Write `bytes` to `path` through a `.part` sibling and a rename, so the
/// path never holds a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SpeechError> {
    let tmp = part_path(path);
    let result = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(SpeechError::file_access(path, e));
    }
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

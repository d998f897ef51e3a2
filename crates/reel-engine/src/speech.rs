//! Speech synthesis client.
//!
//! Each narration chunk is synthesized to an audio clip whose duration drives
//! timeline placement. The HTTP backend trusts a duration header when the
//! service provides one and falls back to probing the downloaded clip.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Duration header set by the synthesis service, in seconds.
const DURATION_HEADER: &str = "x-audio-duration";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One synthesized narration clip.
#[derive(Debug, Clone)]
pub struct SpokenClip {
    pub path: PathBuf,
    /// Clip duration in seconds
    pub duration: f64,
}

/// Turns a text chunk into an audio clip on disk.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
        out_dir: &Path,
    ) -> EngineResult<SpokenClip>;
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
}

/// HTTP-backed synthesizer posting one request per chunk.
#[derive(Debug, Clone)]
pub struct HttpSpeechSynthesizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSpeechSynthesizer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Stable clip filename derived from the chunk text and voice.
    fn clip_name(text: &str, voice: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        if let Some(voice) = voice {
            hasher.update(voice.as_bytes());
        }
        let digest = hasher.finalize();
        format!("tts-{}.mp3", hex_prefix(&digest, 8))
    }
}

fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes.iter().take(n).map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
        out_dir: &Path,
    ) -> EngineResult<SpokenClip> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SynthesisRequest { text, voice })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::speech_failed(format!(
                "synthesis service returned {} for chunk {:?}",
                response.status(),
                text
            )));
        }

        let header_duration = response
            .headers()
            .get(DURATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|d| *d > 0.0);

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(EngineError::speech_failed(format!(
                "synthesis service returned an empty clip for chunk {:?}",
                text
            )));
        }

        let path = out_dir.join(Self::clip_name(text, voice));
        tokio::fs::write(&path, &bytes).await?;

        let duration = match header_duration {
            Some(d) => d,
            None => reel_media::probe_audio_duration(&path).await?,
        };
        debug!(clip = %path.display(), duration, "synthesized narration chunk");

        Ok(SpokenClip { path, duration })
    }
}

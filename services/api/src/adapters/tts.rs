//! services/api/src/adapters/tts.rs
//!
//! Narration for generated courses and talk-buddy replies.
//!
//! Speech is requested as raw 16-bit PCM, wrapped in a WAV container and
//! returned as a `data:audio/wav;base64,...` URI the browser can play directly.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hound::{WavSpec, WavWriter};
use medha_core::ports::{PortError, PortResult, TextToSpeechService};
use std::time::Instant;
use tracing::info;

/// Maps a configured voice name onto the provider's voices.
pub fn parse_voice(name: &str) -> Option<Voice> {
    match name.to_lowercase().as_str() {
        "alloy" => Some(Voice::Alloy),
        "ash" => Some(Voice::Ash),
        "coral" => Some(Voice::Coral),
        "echo" => Some(Voice::Echo),
        "fable" => Some(Voice::Fable),
        "onyx" => Some(Voice::Onyx),
        "nova" => Some(Voice::Nova),
        "sage" => Some(Voice::Sage),
        "shimmer" => Some(Voice::Shimmer),
        _ => None,
    }
}

/// Wraps mono 16-bit little-endian PCM in a WAV container.
pub fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for chunk in pcm_data.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

/// `TextToSpeechService` backed by the OpenAI speech endpoint.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
    sample_rate: u32,
}

impl OpenAiTtsAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: SpeechModel, voice: Voice, sample_rate: u32) -> Self {
        Self {
            client,
            model,
            voice,
            sample_rate,
        }
    }
}

#[async_trait]
impl TextToSpeechService for OpenAiTtsAdapter {
    async fn generate_speech(&self, text: &str) -> PortResult<String> {
        let request = CreateSpeechRequestArgs::default()
            .model(self.model.clone())
            .input(text)
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Pcm)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let started = Instant::now();
        let response = self
            .client
            .audio()
            .speech()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(format!("speech request: {e}")))?;
        info!("⏱️ Speech synthesis took: {:?}", started.elapsed());

        let wav = pcm16_to_wav(&response.bytes, self.sample_rate)
            .map_err(|e| PortError::Unexpected(format!("wav encoding: {e}")))?;
        Ok(format!("data:audio/wav;base64,{}", STANDARD.encode(wav)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_is_wrapped_in_a_playable_wav() {
        let samples: [i16; 4] = [0, 1000, -1000, i16::MAX];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let wav = pcm16_to_wav(&pcm, 24_000).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn voices_are_matched_case_insensitively() {
        assert!(matches!(parse_voice("Nova"), Some(Voice::Nova)));
        assert!(parse_voice("Algenib").is_none());
    }
}

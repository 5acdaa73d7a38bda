//! Google Cloud Speech-to-Text (v1 REST, synchronous recognize).
//!
//! The synchronous endpoint accepts roughly one minute of audio. Each result's
//! top alternative becomes one cue; timings are synthesized from text length
//! because the endpoint does not return them without word offsets.

use std::env;
use std::fs;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::error::CaptionServiceError;
use super::synth::{synthesize_cues, CueWindow};
use super::{CaptionGenerator, CaptionRequest, GeneratedCaptions};

pub const SPEECH_API_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
    model: &'static str,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

/// Top transcript of each result, in order.
pub fn parse_recognize_response(body: &str) -> Result<Vec<String>, CaptionServiceError> {
    let response: RecognizeResponse = serde_json::from_str(body).map_err(|e| {
        CaptionServiceError::unavailable(format!("unexpected response body: {}", e))
    })?;

    Ok(response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|a| a.transcript)
        .collect())
}

/// Speech-to-Text client authenticated with an API key.
pub struct GoogleSpeechGenerator {
    api_key: String,
    endpoint: String,
    window: CueWindow,
    client: reqwest::blocking::Client,
}

impl GoogleSpeechGenerator {
    pub fn new(api_key: impl Into<String>, window: CueWindow) -> Result<Self, CaptionServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: SPEECH_API_URL.to_string(),
            window,
            client,
        })
    }

    /// Read the API key from `var`.
    pub fn from_env(var: &str, window: CueWindow) -> Result<Self, CaptionServiceError> {
        match env::var(var) {
            Ok(key) if !key.trim().is_empty() => Self::new(key.trim(), window),
            _ => Err(CaptionServiceError::MissingCredentials {
                var: var.to_string(),
            }),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl CaptionGenerator for GoogleSpeechGenerator {
    fn name(&self) -> &str {
        "google-speech"
    }

    fn generate(&self, request: &CaptionRequest) -> Result<GeneratedCaptions, CaptionServiceError> {
        let audio = fs::read(&request.audio_path).map_err(|source| {
            CaptionServiceError::AudioUnreadable {
                path: request.audio_path.clone(),
                source,
            }
        })?;

        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: request.sample_rate,
                language_code: &request.language,
                enable_automatic_punctuation: true,
                model: "default",
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(&audio),
            },
        };

        tracing::debug!(
            "Sending {} bytes of audio to {} ({})",
            audio.len(),
            self.endpoint,
            request.language
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(CaptionServiceError::Service {
                status: status.as_u16(),
                body: text,
            });
        }

        let transcripts = parse_recognize_response(&text)?;
        Ok(GeneratedCaptions::Cues(synthesize_cues(transcripts, self.window)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_top_alternatives() {
        let body = r#"{
            "results": [
                {"alternatives": [{"transcript": "hello world", "confidence": 0.93},
                                  {"transcript": "hollow word"}]},
                {"alternatives": []},
                {"alternatives": [{"transcript": "second line"}]}
            ]
        }"#;
        assert_eq!(
            parse_recognize_response(body).unwrap(),
            vec!["hello world".to_string(), "second line".to_string()]
        );
    }

    #[test]
    fn empty_response_has_no_transcripts() {
        assert!(parse_recognize_response("{}").unwrap().is_empty());
    }

    #[test]
    fn malformed_response_is_unavailable() {
        let err = parse_recognize_response("<html>").unwrap_err();
        assert!(matches!(err, CaptionServiceError::Unavailable(_)));
    }

    #[test]
    fn missing_key_is_missing_credentials() {
        let err = GoogleSpeechGenerator::from_env("VMERGE_TEST_UNSET_SPEECH_KEY", CueWindow::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("VMERGE_TEST_UNSET_SPEECH_KEY"));
    }

    #[test]
    fn unreadable_audio_fails_before_any_request() {
        let generator = GoogleSpeechGenerator::new("key", CueWindow::default())
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/unused");
        let request = CaptionRequest {
            audio_path: PathBuf::from("/nonexistent/vmerge/audio.wav"),
            language: "en-US".to_string(),
            sample_rate: 16000,
        };

        let err = generator.generate(&request).err().unwrap();
        assert!(matches!(err, CaptionServiceError::AudioUnreadable { .. }));
    }

    #[test]
    fn request_body_uses_camel_case() {
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: 16000,
                language_code: "en-US",
                enable_automatic_punctuation: true,
                model: "default",
            },
            audio: RecognitionAudio {
                content: "AAAA".to_string(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["config"]["sampleRateHertz"], 16000);
        assert_eq!(json["config"]["languageCode"], "en-US");
        assert_eq!(json["audio"]["content"], "AAAA");
    }
}

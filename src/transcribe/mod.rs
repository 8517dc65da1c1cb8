use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub mod captions;
pub mod classify;

use crate::config::Settings;
use crate::{ProviderResult, ResearchError};
use captions::{CaptionSource, TimedTextClient, MIN_CAPTION_CHARS};
use classify::classify_error;

pub const DEFAULT_TRANSCRIBE_ENDPOINT: &str = "https://api.gettranscribe.ai/transcriptions";

const PROVIDER: &str = "GetTranscribe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    Success,
    Error,
}

impl TranscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionStatus::Success => "success",
            TranscriptionStatus::Error => "error",
        }
    }
}

/// Outcome for one input URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub url: String,

    /// Empty when the URL failed
    pub transcript: String,

    pub status: TranscriptionStatus,

    /// User-facing failure message
    pub error: Option<String>,
}

impl TranscriptionResult {
    pub fn success(url: &str, transcript: String) -> Self {
        Self {
            url: url.to_string(),
            transcript,
            status: TranscriptionStatus::Success,
            error: None,
        }
    }

    pub fn failure(url: &str, error: String) -> Self {
        Self {
            url: url.to_string(),
            transcript: String::new(),
            status: TranscriptionStatus::Error,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TranscriptionStatus::Success
    }
}

/// Primary speech-to-text provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, url: &str) -> ProviderResult<String>;
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    transcript: Option<String>,
    text: Option<String>,
}

/// Client for the hosted transcription API
pub struct GetTranscribeClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GetTranscribeClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl TranscriptionService for GetTranscribeClient {
    async fn transcribe(&self, url: &str) -> ProviderResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| ResearchError::network(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::ProviderRequest {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let data: TranscribeResponse = response.json().await.map_err(|e| ResearchError::ProviderRequest {
            provider: PROVIDER.to_string(),
            status: Some(status.as_u16()),
            message: format!("unexpected response body: {}", e),
        })?;

        data.transcript
            .filter(|t| !t.is_empty())
            .or(data.text.filter(|t| !t.is_empty()))
            .ok_or_else(|| ResearchError::NoTranscript { url: url.to_string() })
    }
}

fn youtube_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/watch\?(?:[^#]*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([A-Za-z0-9_-]{11})",
        )
        .expect("valid video id pattern")
    })
}

/// 11-character video id from the common YouTube URL shapes
pub fn youtube_video_id(url: &str) -> Option<String> {
    youtube_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Sequential transcription with a caption fallback for YouTube URLs
pub struct TranscriptionPipeline {
    service: Box<dyn TranscriptionService>,
    captions: Box<dyn CaptionSource>,
    show_progress: bool,
}

impl TranscriptionPipeline {
    pub fn new(service: Box<dyn TranscriptionService>, captions: Box<dyn CaptionSource>) -> Self {
        Self {
            service,
            captions,
            show_progress: false,
        }
    }

    /// Build the HTTP-backed pipeline; the transcription token must be configured
    pub fn from_settings(settings: &Settings) -> ProviderResult<Self> {
        let token = settings.transcription_token()?;
        let transcription = &settings.transcription;

        Ok(Self::new(
            Box::new(GetTranscribeClient::new(&transcription.endpoint, token)),
            Box::new(TimedTextClient::new(
                &transcription.caption_endpoint,
                &transcription.caption_language,
            )),
        ))
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Transcribe every URL in order, one at a time.
    ///
    /// A failing URL never stops the batch; it is recorded as an error entry
    /// in its input position.
    pub async fn transcribe_all(&self, urls: &[String]) -> Vec<TranscriptionResult> {
        let progress = if self.show_progress {
            let bar = ProgressBar::new(urls.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            progress.set_message(crate::utils::truncate_chars(url, 50));
            let result = self.transcribe_one(url).await;

            if result.is_success() {
                tracing::info!(url = %url, chars = result.transcript.chars().count(), "Transcribed");
            } else {
                tracing::warn!(url = %url, error = ?result.error, "Transcription failed");
            }

            results.push(result);
            progress.inc(1);
        }

        progress.finish_and_clear();
        results
    }

    async fn transcribe_one(&self, url: &str) -> TranscriptionResult {
        if let Err(e) = crate::utils::validate_url(url) {
            return TranscriptionResult::failure(url, classify_error(&e.to_string()));
        }

        let err = match self.service.transcribe(url).await {
            Ok(transcript) => return TranscriptionResult::success(url, transcript),
            Err(err) => err,
        };
        tracing::debug!("Primary transcription failed for {}: {}", url, err);

        if let Some(video_id) = youtube_video_id(url) {
            if let Some(text) = self.captions.fetch_captions(&video_id).await {
                if text.chars().count() > MIN_CAPTION_CHARS {
                    tracing::info!(url = %url, "Using published captions");
                    return TranscriptionResult::success(url, text);
                }
            }
        }

        TranscriptionResult::failure(url, classify_error(&err.to_string()))
    }
}

/// Status line for a finished batch
pub fn batch_summary(results: &[TranscriptionResult]) -> String {
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    if succeeded == 0 {
        "No transcripts were generated for the provided URLs.".to_string()
    } else {
        format!("Transcribed {} of {} videos", succeeded, results.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use captions::MockCaptionSource;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_youtube_video_id() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(youtube_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(youtube_video_id("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=5"), id);
        assert_eq!(youtube_video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"), id);
        assert_eq!(youtube_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id);
        assert_eq!(youtube_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(youtube_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(youtube_video_id("https://www.tiktok.com/@a/video/1"), None);
    }

    #[test]
    fn test_result_serializes_lowercase_status() {
        let value = serde_json::to_value(TranscriptionResult::failure("u", "bad".into())).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["transcript"], "");
        assert_eq!(value["error"], "bad");
    }

    #[tokio::test]
    async fn test_middle_failure_keeps_order() {
        let mut service = MockTranscriptionService::new();
        service.expect_transcribe().times(3).returning(|url| {
            if url.contains("/2") {
                Err(ResearchError::ProviderRequest {
                    provider: "GetTranscribe".into(),
                    status: Some(422),
                    message: r#"{"message": "Unsupported media"}"#.into(),
                })
            } else {
                Ok(format!("transcript for {}", url))
            }
        });
        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().never();

        let pipeline = TranscriptionPipeline::new(Box::new(service), Box::new(captions));
        let results = pipeline
            .transcribe_all(&urls(&[
                "https://www.tiktok.com/@a/video/1",
                "https://www.tiktok.com/@a/video/2",
                "https://www.tiktok.com/@a/video/3",
            ]))
            .await;

        let statuses: Vec<TranscriptionStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                TranscriptionStatus::Success,
                TranscriptionStatus::Error,
                TranscriptionStatus::Success
            ]
        );
        assert_eq!(results[1].url, "https://www.tiktok.com/@a/video/2");
        assert_eq!(results[1].transcript, "");
        assert_eq!(results[1].error.as_deref(), Some("Unsupported media"));
        assert_eq!(batch_summary(&results), "Transcribed 2 of 3 videos");
    }

    #[tokio::test]
    async fn test_youtube_failure_uses_captions() {
        let mut service = MockTranscriptionService::new();
        service
            .expect_transcribe()
            .returning(|_| Err(ResearchError::network("GetTranscribe", "timeout")));
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .times(1)
            .returning(|id| {
                assert_eq!(id, "dQw4w9WgXcQ");
                Some("never gonna give you up, never gonna let you down".to_string())
            });

        let pipeline = TranscriptionPipeline::new(Box::new(service), Box::new(captions));
        let results = pipeline
            .transcribe_all(&urls(&["https://youtu.be/dQw4w9WgXcQ"]))
            .await;

        assert!(results[0].is_success());
        assert!(results[0].transcript.starts_with("never gonna"));
        assert_eq!(results[0].error, None);
    }

    #[tokio::test]
    async fn test_short_captions_are_rejected() {
        let mut service = MockTranscriptionService::new();
        service.expect_transcribe().returning(|url| {
            Err(ResearchError::NoTranscript {
                url: url.to_string(),
            })
        });
        let mut captions = MockCaptionSource::new();
        captions
            .expect_fetch_captions()
            .returning(|_| Some("too short".to_string()));

        let pipeline = TranscriptionPipeline::new(Box::new(service), Box::new(captions));
        let results = pipeline
            .transcribe_all(&urls(&["https://www.youtube.com/watch?v=dQw4w9WgXcQ"]))
            .await;

        assert_eq!(results[0].status, TranscriptionStatus::Error);
        assert!(results[0]
            .error
            .as_deref()
            .unwrap_or_default()
            .starts_with("Transcript not available"));
        assert_eq!(
            batch_summary(&results),
            "No transcripts were generated for the provided URLs."
        );
    }

    #[tokio::test]
    async fn test_malformed_url_fails_only_its_own_entry() {
        let mut service = MockTranscriptionService::new();
        service
            .expect_transcribe()
            .times(1)
            .returning(|_| Ok("spoken words".to_string()));
        let mut captions = MockCaptionSource::new();
        captions.expect_fetch_captions().never();

        let pipeline = TranscriptionPipeline::new(Box::new(service), Box::new(captions));
        let results = pipeline
            .transcribe_all(&urls(&["not a url", "https://YouTube.com/watch?v=dQw4w9WgXcQ"]))
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "not a url");
        assert_eq!(results[0].status, TranscriptionStatus::Error);
        assert_eq!(results[0].error.as_deref(), Some("Invalid URL format: not a url"));
        assert!(results[1].is_success());
        assert_eq!(results[1].url, "https://YouTube.com/watch?v=dQw4w9WgXcQ");
    }

    async fn transcribe_server(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcriptions"))
            .and(header("x-api-key", "key-1"))
            .and(body_json(json!({"url": "https://www.tiktok.com/@a/video/1"})))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    fn client_for(server: &MockServer) -> GetTranscribeClient {
        GetTranscribeClient::new(&format!("{}/transcriptions", server.uri()), "key-1")
    }

    #[tokio::test]
    async fn test_client_reads_transcript_then_text() {
        let server =
            transcribe_server(ResponseTemplate::new(200).set_body_json(json!({"transcript": "hello there"}))).await;
        let text = client_for(&server)
            .transcribe("https://www.tiktok.com/@a/video/1")
            .await
            .unwrap();
        assert_eq!(text, "hello there");

        let server = transcribe_server(
            ResponseTemplate::new(200).set_body_json(json!({"transcript": "", "text": "from text field"})),
        )
        .await;
        let text = client_for(&server)
            .transcribe("https://www.tiktok.com/@a/video/1")
            .await
            .unwrap();
        assert_eq!(text, "from text field");
    }

    #[tokio::test]
    async fn test_client_without_transcript_fields() {
        let server = transcribe_server(ResponseTemplate::new(200).set_body_json(json!({"id": "job-1"}))).await;
        let err = client_for(&server)
            .transcribe("https://www.tiktok.com/@a/video/1")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ResearchError::NoTranscript {
                url: "https://www.tiktok.com/@a/video/1".into()
            }
        );
    }

    #[tokio::test]
    async fn test_client_error_status_keeps_body() {
        let body = r#"{"userMessage": "This video is private"}"#;
        let server = transcribe_server(ResponseTemplate::new(422).set_body_string(body)).await;
        let err = client_for(&server)
            .transcribe("https://www.tiktok.com/@a/video/1")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ResearchError::ProviderRequest {
                provider: "GetTranscribe".into(),
                status: Some(422),
                message: body.into(),
            }
        );
        assert_eq!(classify_error(&err.to_string()), "This video is private");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let pipeline = TranscriptionPipeline::new(
            Box::new(MockTranscriptionService::new()),
            Box::new(MockCaptionSource::new()),
        );
        assert!(pipeline.transcribe_all(&[]).await.is_empty());
    }

    #[test]
    fn test_from_settings_requires_token() {
        let settings = Settings::default();
        assert!(matches!(
            TranscriptionPipeline::from_settings(&settings),
            Err(ResearchError::MissingCredential { .. })
        ));
    }
}

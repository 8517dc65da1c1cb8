use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;

pub const DEFAULT_CAPTION_ENDPOINT: &str = "https://www.youtube.com/api/timedtext";

/// Caption text at or below this many characters is not worth keeping
pub const MIN_CAPTION_CHARS: usize = 20;

/// Bodies shorter than this are treated as "no captions"
const MIN_BODY_LEN: usize = 10;

/// Secondary transcript source for videos with public captions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Caption text for a video, or `None` on any failure
    async fn fetch_captions(&self, video_id: &str) -> Option<String>;
}

/// Public timed-text caption endpoint
pub struct TimedTextClient {
    client: Client,
    endpoint: String,
    language: String,
}

impl TimedTextClient {
    pub fn new(endpoint: &str, language: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl CaptionSource for TimedTextClient {
    async fn fetch_captions(&self, video_id: &str) -> Option<String> {
        tracing::debug!("Fetching {} captions for video {}", self.language, video_id);

        let response = match self
            .client
            .get(&self.endpoint)
            .query(&[("v", video_id), ("lang", self.language.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Caption request for {} failed: {}", video_id, e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Caption request for {} returned HTTP {}", video_id, response.status());
            return None;
        }

        let body = response.text().await.ok()?;
        if body.len() < MIN_BODY_LEN {
            return None;
        }

        let text = parse_caption_document(&body);
        if text.chars().count() <= MIN_CAPTION_CHARS {
            return None;
        }

        Some(text)
    }
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<text[^>]*>([^<]*)</text>").expect("valid segment pattern"))
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// Decode the handful of entities the timed-text format emits
pub fn unescape_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extract plain text from a caption document.
///
/// `<text start=".." dur="..">..</text>` segments are joined with spaces;
/// anything else has its tags stripped and whitespace collapsed.
pub fn parse_caption_document(document: &str) -> String {
    let segments: Vec<String> = segment_pattern()
        .captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape_entities(m.as_str().trim()))
        .filter(|s| !s.is_empty())
        .collect();

    if !segments.is_empty() {
        return segments.join(" ").trim().to_string();
    }

    let stripped = tag_pattern().replace_all(document, " ");
    whitespace_pattern()
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

use serde_json::Value;

use crate::utils::truncate_chars;

/// Longest raw message shown to the user
pub const MAX_MESSAGE_CHARS: usize = 120;

const NO_AUDIO_MARKERS: &[&str] = &["no_audio", "without audio", "media without audio"];
const DOWNLOAD_MARKERS: &[&str] = &["Failed to download", "all methods failed", "YouTube audio"];

const NO_AUDIO_MESSAGE: &str =
    "No audio in this media. Use a video with speech (e.g. Reels), not image posts or silent clips.";
const DOWNLOAD_MESSAGE: &str = "The transcription service couldn't download this video's audio \
     (common with some YouTube videos). Try TikTok or Instagram Reels URLs, or a different public YouTube video.";

/// Turn a raw provider failure into a short message for the user.
///
/// Known failure text maps to curated messages; structured payloads yield their
/// human-readable field; anything else is truncated.
pub fn classify_error(raw: &str) -> String {
    let msg = raw.trim();
    if msg.is_empty() {
        return "Transcription failed.".to_string();
    }

    if NO_AUDIO_MARKERS.iter().any(|m| msg.contains(m)) {
        return NO_AUDIO_MESSAGE.to_string();
    }

    if DOWNLOAD_MARKERS.iter().any(|m| msg.contains(m)) {
        return DOWNLOAD_MESSAGE.to_string();
    }

    if let Some(human) = structured_message(msg) {
        return human;
    }

    truncate_chars(msg, MAX_MESSAGE_CHARS)
}

/// Human field of a JSON error payload, which may follow a text prefix
fn structured_message(msg: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(msg).ok().or_else(|| {
        let start = msg.find('{')?;
        serde_json::from_str(&msg[start..]).ok()
    })?;

    ["/userMessage", "/message", "/data/userMessage", "/error"]
        .iter()
        .filter_map(|pointer| payload.pointer(pointer))
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
}

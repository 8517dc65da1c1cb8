use serde_json::{json, Value};

use super::{FieldAliases, Platform, PlatformAdapter, VideoRecord};
use crate::normalize;

/// Instagram hashtag search through the hashtag scraper actor
pub struct InstagramAdapter;

const FIELDS: FieldAliases = FieldAliases {
    url: &["url", "permalink"],
    video_id: &["id", "shortCode", "code"],
    caption: &["caption", "title"],
    creator: &["ownerFullName", "ownerUsername", "owner.full_name"],
    creator_username: &["ownerUsername", "owner.username"],
    likes: &["likesCount", "likes", "like_count"],
    shares: &[],
    saves: &[],
    views: &["videoViewCount", "videoViews", "viewCount", "playCount", "views"],
    created_at: &["timestamp", "takenAtTimestamp", "createdAt"],
    hashtags: &["hashtags"],
    thumbnail: &["displayUrl", "thumbnailUrl", "imageUrl"],
};

/// The hashtag scraper takes one bare tag: first word, `#` removed
pub fn hashtag_for(topic: &str) -> String {
    topic
        .replace('#', "")
        .split_whitespace()
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| topic.to_string())
}

impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn default_actor(&self) -> &'static str {
        "apify/instagram-hashtag-scraper"
    }

    fn legacy_actors(&self) -> &'static [&'static str] {
        &["apify/instagram-scraper"]
    }

    fn build_input(&self, topic: &str, max_results: u32) -> Value {
        json!({
            "hashtags": [hashtag_for(topic)],
            "resultsLimit": max_results,
        })
    }

    fn map_item(&self, item: &Value) -> VideoRecord {
        let mut record = FIELDS.map(Platform::Instagram, item);

        if record.url.is_empty() {
            let short_code = normalize::text_field(item, &["shortCode"]);
            if !short_code.is_empty() {
                record.url = format!("https://instagram.com/p/{}", short_code);
            }
        }

        record
    }
}

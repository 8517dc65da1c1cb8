use serde_json::{json, Value};

use super::{FieldAliases, Platform, PlatformAdapter, VideoRecord};

/// TikTok keyword search through a TikTok scraper actor
pub struct TikTokAdapter;

/// The scraper caps keyword searches at this many videos
const MAX_VIDEOS_PER_KEYWORD: u32 = 100;

const FIELDS: FieldAliases = FieldAliases {
    url: &["webVideoUrl", "videoUrl", "url", "link"],
    video_id: &["id", "videoId"],
    caption: &["text", "desc", "caption"],
    creator: &["authorMeta.name", "author.nickname", "author.uniqueId", "owner.nickname"],
    creator_username: &["authorMeta.nickName", "author.uniqueId", "owner.uniqueId"],
    likes: &["diggCount", "likes", "stats.diggCount"],
    shares: &["shareCount", "shares", "stats.shareCount"],
    saves: &["collectCount", "saves", "stats.collectCount"],
    views: &["playCount", "views", "stats.playCount"],
    created_at: &["createTime", "createTimeISO", "timestamp", "createdAt"],
    hashtags: &["hashtags"],
    thumbnail: &["covers.default", "video.cover", "thumbnail", "coverUrl"],
};

impl PlatformAdapter for TikTokAdapter {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn default_actor(&self) -> &'static str {
        "thescrapelab/tiktok-scraper-2-0"
    }

    fn legacy_actors(&self) -> &'static [&'static str] {
        // Returns 404 since the free scraper was retired
        &["clockworks/free-tiktok-scraper"]
    }

    fn build_input(&self, topic: &str, max_results: u32) -> Value {
        json!({
            "workflow": "keywords",
            "keywords": [topic],
            "maxVideosPerKeyword": max_results.min(MAX_VIDEOS_PER_KEYWORD),
        })
    }

    fn map_item(&self, item: &Value) -> VideoRecord {
        FIELDS.map(Platform::TikTok, item)
    }
}

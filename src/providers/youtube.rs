use serde_json::{json, Value};

use super::{FieldAliases, Platform, PlatformAdapter, VideoRecord};

/// YouTube keyword search through a YouTube scraper actor
pub struct YouTubeAdapter;

const FIELDS: FieldAliases = FieldAliases {
    url: &["url"],
    video_id: &["id", "videoId"],
    caption: &["title", "snippet.title"],
    creator: &["channelName", "snippet.channelTitle"],
    creator_username: &["channelHandle", "channelId"],
    likes: &[
        "likes",
        "likeCount",
        "like_count",
        "statistics.likeCount",
        "statistics.like_count",
        "stats.likeCount",
        "stats.like_count",
    ],
    shares: &[],
    saves: &[],
    views: &[
        "views",
        "viewCount",
        "view_count",
        "statistics.viewCount",
        "statistics.view_count",
        "stats.viewCount",
        "stats.view_count",
    ],
    created_at: &["publishedAt", "snippet.publishedAt", "uploadDate", "date"],
    hashtags: &["tags"],
    thumbnail: &["thumbnail", "thumbnails.high.url", "thumbnailUrl"],
};

impl PlatformAdapter for YouTubeAdapter {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn default_actor(&self) -> &'static str {
        "streamers/youtube-scraper"
    }

    fn build_input(&self, topic: &str, max_results: u32) -> Value {
        json!({
            "searchKeywords": topic,
            "maxResults": max_results,
            "uploadDate": "all",
        })
    }

    fn map_item(&self, item: &Value) -> VideoRecord {
        let mut record = FIELDS.map(Platform::YouTube, item);

        if record.url.is_empty() && !record.video_id.is_empty() {
            record.url = format!("https://youtube.com/watch?v={}", record.video_id);
        }

        record
    }
}

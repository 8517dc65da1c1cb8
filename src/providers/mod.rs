use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod apify;
pub mod instagram;
pub mod poller;
pub mod tiktok;
pub mod youtube;

use crate::normalize;
use crate::ProviderResult;
use apify::ActorApi;
use poller::{PollConfig, RunPoller};

/// Platforms with a scraping provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    TikTok,
    Instagram,
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::TikTok, Platform::Instagram, Platform::YouTube];

    pub fn label(&self) -> &'static str {
        match self {
            Platform::TikTok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::YouTube => "YouTube",
        }
    }

    /// Settings section holding this platform's token and actor
    pub fn settings_key(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::YouTube => "youtube",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Platform-independent view of a scraped video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub platform: Platform,
    pub url: String,
    pub video_id: String,
    pub caption: String,
    pub creator: String,
    pub creator_username: String,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,
    pub views: u64,

    /// Raw provider timestamp; format varies by platform
    pub created_at: String,

    /// Comma-joined
    pub hashtags: String,
    pub thumbnail: String,
}

impl VideoRecord {
    pub fn empty(platform: Platform) -> Self {
        Self {
            platform,
            url: String::new(),
            video_id: String::new(),
            caption: String::new(),
            creator: String::new(),
            creator_username: String::new(),
            likes: 0,
            comments: 0,
            shares: 0,
            saves: 0,
            views: 0,
            created_at: String::new(),
            hashtags: String::new(),
            thumbnail: String::new(),
        }
    }
}

/// Ordered source aliases for each canonical field.
///
/// Earlier paths win. An empty list leaves the field at its default.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub url: &'static [&'static str],
    pub video_id: &'static [&'static str],
    pub caption: &'static [&'static str],
    pub creator: &'static [&'static str],
    pub creator_username: &'static [&'static str],
    pub likes: &'static [&'static str],
    pub shares: &'static [&'static str],
    pub saves: &'static [&'static str],
    pub views: &'static [&'static str],
    pub created_at: &'static [&'static str],
    pub hashtags: &'static [&'static str],
    pub thumbnail: &'static [&'static str],
}

impl FieldAliases {
    /// Map one raw scraper item; comments always go through the metric fallback chain
    pub fn map(&self, platform: Platform, item: &Value) -> VideoRecord {
        VideoRecord {
            platform,
            url: normalize::text_field(item, self.url),
            video_id: normalize::text_field(item, self.video_id),
            caption: normalize::text_field(item, self.caption),
            creator: normalize::text_field(item, self.creator),
            creator_username: normalize::text_field(item, self.creator_username),
            likes: normalize::numeric_field(item, self.likes),
            comments: normalize::comment_count(item),
            shares: normalize::numeric_field(item, self.shares),
            saves: normalize::numeric_field(item, self.saves),
            views: normalize::numeric_field(item, self.views),
            created_at: normalize::text_field(item, self.created_at),
            hashtags: normalize::joined_list(item, self.hashtags),
            thumbnail: normalize::text_field(item, self.thumbnail),
        }
    }
}

/// Token and actor used for one provider's runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub api_token: String,

    /// Configured actor id; empty selects the platform default
    pub actor_id: String,
}

/// Per-platform knowledge: run input shape, actor choice, and item mapping
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Maintained actor used when none is configured
    fn default_actor(&self) -> &'static str;

    /// Retired actor ids that are swapped for [`PlatformAdapter::default_actor`]
    fn legacy_actors(&self) -> &'static [&'static str] {
        &[]
    }

    /// Run input for a topic search
    fn build_input(&self, topic: &str, max_results: u32) -> Value;

    /// Translate one raw dataset item
    fn map_item(&self, item: &Value) -> VideoRecord;

    /// Pick the actor to run, replacing blank or retired ids
    fn resolve_actor(&self, configured: &str) -> String {
        let configured = configured.trim();
        if configured.is_empty() {
            return self.default_actor().to_string();
        }

        if self.legacy_actors().contains(&configured) {
            tracing::warn!(
                "{} actor {} is no longer maintained, using {}",
                self.platform(),
                configured,
                self.default_actor()
            );
            return self.default_actor().to_string();
        }

        configured.to_string()
    }
}

/// Registry of the built-in platform adapters
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    /// Create a new registry with default adapters
    pub fn new() -> Self {
        let mut registry = Self {
            adapters: Vec::new(),
        };

        registry.register(Box::new(tiktok::TikTokAdapter));
        registry.register(Box::new(instagram::InstagramAdapter));
        registry.register(Box::new(youtube::YouTubeAdapter));

        registry
    }

    pub fn register(&mut self, adapter: Box<dyn PlatformAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn get(&self, platform: Platform) -> Option<&dyn PlatformAdapter> {
        self.adapters
            .iter()
            .find(|adapter| adapter.platform() == platform)
            .map(|boxed| boxed.as_ref())
    }

    pub fn list(&self) -> impl Iterator<Item = &dyn PlatformAdapter> {
        self.adapters.iter().map(|boxed| boxed.as_ref())
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one provider search: submit, wait, fetch, map.
///
/// Every error is labelled with the platform that produced it.
pub async fn search(
    api: &dyn ActorApi,
    adapter: &dyn PlatformAdapter,
    topic: &str,
    max_results: u32,
    credentials: &ProviderCredentials,
    poll: PollConfig,
) -> ProviderResult<Vec<VideoRecord>> {
    let label = adapter.platform().label();
    let token = credentials.api_token.as_str();
    let actor = adapter.resolve_actor(&credentials.actor_id);
    let input = adapter.build_input(topic, max_results);

    let handle = api
        .start_run(&actor, token, &input)
        .await
        .map_err(|e| e.with_provider(label))?;
    tracing::info!(platform = label, run_id = %handle.run_id, actor = %actor, "Run started");

    let run = RunPoller::new(api, poll)
        .await_completion(&handle.run_id, token)
        .await
        .map_err(|e| e.with_provider(label))?;

    // The finished run reports the dataset authoritatively; the submission id is the fallback
    let dataset_id = run.dataset_id.unwrap_or(handle.dataset_id);

    let items = api
        .dataset_items(&dataset_id, token)
        .await
        .map_err(|e| e.with_provider(label))?;

    if let Some(first) = items.first() {
        tracing::debug!(platform = label, "First raw item: {}", first);
    }
    tracing::info!(platform = label, count = items.len(), "Fetched dataset items");

    Ok(items.iter().map(|item| adapter.map_item(item)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::apify::{JobHandle, MockActorApi, RunInfo, RunStatus};
    use crate::ResearchError;
    use serde_json::json;
    use std::time::Duration;

    fn fast_poll() -> PollConfig {
        PollConfig {
            interval: Duration::ZERO,
            max_attempts: 5,
        }
    }

    fn credentials(actor_id: &str) -> ProviderCredentials {
        ProviderCredentials {
            api_token: "secret".into(),
            actor_id: actor_id.into(),
        }
    }

    #[test]
    fn test_registry_has_every_platform() {
        let registry = AdapterRegistry::new();
        for platform in Platform::ALL {
            assert_eq!(registry.get(platform).map(|a| a.platform()), Some(platform));
        }
        assert_eq!(registry.list().count(), 3);
    }

    #[test]
    fn test_resolve_actor_remaps_legacy_ids() {
        let adapter = tiktok::TikTokAdapter;
        assert_eq!(adapter.resolve_actor(""), "thescrapelab/tiktok-scraper-2-0");
        assert_eq!(
            adapter.resolve_actor("clockworks/free-tiktok-scraper"),
            "thescrapelab/tiktok-scraper-2-0"
        );
        assert_eq!(adapter.resolve_actor(" me/my-actor "), "me/my-actor");
    }

    #[test]
    fn test_video_record_serializes_camel_case() {
        let value = serde_json::to_value(VideoRecord::empty(Platform::YouTube)).unwrap();
        assert_eq!(value["platform"], "YouTube");
        assert_eq!(value["creatorUsername"], "");
        assert_eq!(value["views"], 0);
    }

    #[tokio::test]
    async fn test_search_submits_polls_and_maps() {
        let mut api = MockActorApi::new();
        api.expect_start_run()
            .withf(|actor, token, input| {
                actor == "thescrapelab/tiktok-scraper-2-0" && token == "secret" && input["keywords"][0] == "cats"
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(JobHandle {
                    run_id: "run-1".into(),
                    dataset_id: "ds-1".into(),
                })
            });
        api.expect_run_status().times(1).returning(|run_id, _| {
            Ok(RunInfo {
                run_id: run_id.to_string(),
                status: RunStatus::Succeeded,
                dataset_id: Some("ds-1".into()),
            })
        });
        api.expect_dataset_items()
            .withf(|dataset_id, _| dataset_id == "ds-1")
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    json!({"id": "1", "playCount": 100, "webVideoUrl": "https://tiktok.test/1"}),
                    json!({"id": "2", "stats": {"playCount": "250"}}),
                ])
            });

        let records = search(
            &api,
            &tiktok::TikTokAdapter,
            "cats",
            20,
            &credentials("clockworks/free-tiktok-scraper"),
            fast_poll(),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].views, 100);
        assert_eq!(records[0].url, "https://tiktok.test/1");
        assert_eq!(records[1].views, 250);
        assert!(records.iter().all(|r| r.platform == Platform::TikTok));
    }

    #[tokio::test]
    async fn test_search_reads_dataset_reported_by_finished_run() {
        let mut api = MockActorApi::new();
        api.expect_start_run().returning(|_, _, _| {
            Ok(JobHandle {
                run_id: "run-2".into(),
                dataset_id: "ds-submitted".into(),
            })
        });
        api.expect_run_status().returning(|run_id, _| {
            Ok(RunInfo {
                run_id: run_id.to_string(),
                status: RunStatus::Succeeded,
                dataset_id: Some("ds-final".into()),
            })
        });
        api.expect_dataset_items()
            .withf(|dataset_id, _| dataset_id == "ds-final")
            .times(1)
            .returning(|_, _| Ok(vec![json!({"id": "abc", "viewCount": 7})]));

        let records = search(
            &api,
            &youtube::YouTubeAdapter,
            "rust",
            10,
            &credentials(""),
            fast_poll(),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_submission_skips_polling() {
        let mut api = MockActorApi::new();
        api.expect_start_run().times(1).returning(|_, _, _| {
            Err(ResearchError::ProviderRequest {
                provider: "Apify".into(),
                status: Some(401),
                message: "invalid token".into(),
            })
        });
        api.expect_run_status().never();
        api.expect_dataset_items().never();

        let err = search(
            &api,
            &youtube::YouTubeAdapter,
            "rust",
            10,
            &credentials(""),
            fast_poll(),
        )
        .await
        .unwrap_err();

        assert!(err.is_auth_failure());
        assert!(err.to_string().starts_with("YouTube request failed (HTTP 401)"));
    }

    #[tokio::test]
    async fn test_failed_run_is_labelled_with_platform() {
        let mut api = MockActorApi::new();
        api.expect_start_run().returning(|_, _, _| {
            Ok(JobHandle {
                run_id: "run-9".into(),
                dataset_id: "ds-9".into(),
            })
        });
        api.expect_run_status().returning(|run_id, _| {
            Ok(RunInfo {
                run_id: run_id.to_string(),
                status: RunStatus::Aborted,
                dataset_id: None,
            })
        });
        api.expect_dataset_items().never();

        let err = search(
            &api,
            &instagram::InstagramAdapter,
            "#food",
            10,
            &credentials(""),
            fast_poll(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Instagram run run-9 aborted");
    }
}

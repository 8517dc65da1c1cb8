use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;

use crate::config::Settings;
use crate::providers::apify::ActorApi;
use crate::providers::{self, AdapterRegistry, Platform, VideoRecord};
use crate::{ProviderResult, ResearchError};

/// Which providers a discovery run should query
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlatformSelection {
    /// TikTok, Instagram and YouTube
    All,
    /// TikTok and Instagram
    Both,
    Tiktok,
    Instagram,
    Youtube,
}

impl PlatformSelection {
    /// Providers in invocation order
    pub fn platforms(&self) -> Vec<Platform> {
        match self {
            PlatformSelection::All => Platform::ALL.to_vec(),
            PlatformSelection::Both => vec![Platform::TikTok, Platform::Instagram],
            PlatformSelection::Tiktok => vec![Platform::TikTok],
            PlatformSelection::Instagram => vec![Platform::Instagram],
            PlatformSelection::Youtube => vec![Platform::YouTube],
        }
    }
}

/// Thresholds applied after all providers return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryFilters {
    pub min_views: u64,
    pub min_likes: u64,

    /// Inclusive, from the start of the day (UTC)
    pub date_from: Option<NaiveDate>,

    /// Inclusive, through the end of the day (UTC)
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    pub topic: String,
    pub selection: PlatformSelection,
    pub filters: DiscoveryFilters,
    pub max_results: u32,
}

/// How a finished discovery should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Providers returned nothing
    NoVideos,
    /// Videos were found but none survived the filters
    NoneMatched,
    Found,
}

/// Merged, filtered and sorted results plus per-stage counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    pub total_found: usize,
    pub after_metric_filter: usize,
    pub after_date_filter: usize,
    pub videos: Vec<VideoRecord>,
}

impl DiscoveryReport {
    pub fn outcome(&self) -> DiscoveryOutcome {
        if self.total_found == 0 {
            DiscoveryOutcome::NoVideos
        } else if self.videos.is_empty() {
            DiscoveryOutcome::NoneMatched
        } else {
            DiscoveryOutcome::Found
        }
    }

    /// One-line status for the user
    pub fn summary(&self, filters: &DiscoveryFilters) -> String {
        match self.outcome() {
            DiscoveryOutcome::NoVideos => "No videos available for this search via Apify.".to_string(),
            DiscoveryOutcome::NoneMatched => format!(
                "Found {} videos but none passed your filters (Min Views: {}, Min Likes: {}). \
                 Try lowering Min Views / Min Likes or clearing the date range.",
                self.total_found, filters.min_views, filters.min_likes
            ),
            DiscoveryOutcome::Found => format!("Found {} videos", self.videos.len()),
        }
    }
}

/// Fans a topic search out to the selected providers and merges the results
pub struct Discovery<'a> {
    api: &'a dyn ActorApi,
    settings: &'a Settings,
    registry: AdapterRegistry,
}

impl<'a> Discovery<'a> {
    pub fn new(api: &'a dyn ActorApi, settings: &'a Settings) -> Self {
        Self {
            api,
            settings,
            registry: AdapterRegistry::new(),
        }
    }

    /// Search every selected provider concurrently.
    ///
    /// Credentials are checked for all providers before any request is sent.
    /// A failure from any provider fails the whole discovery.
    pub async fn discover(&self, request: &DiscoveryRequest) -> ProviderResult<DiscoveryReport> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(ResearchError::InvalidInput(
                "Please enter a topic or hashtag".to_string(),
            ));
        }

        let mut jobs = Vec::new();
        for platform in request.selection.platforms() {
            let credentials = self.settings.platform_credentials(platform)?;
            let adapter = self.registry.get(platform).ok_or_else(|| {
                ResearchError::InvalidInput(format!("No adapter registered for {}", platform))
            })?;
            jobs.push((adapter, credentials));
        }

        let labels: Vec<&str> = jobs.iter().map(|(a, _)| a.platform().label()).collect();
        tracing::info!("Searching {} in parallel for {:?}", labels.join(" + "), topic);

        let poll = self.settings.poll_config();
        let searches = jobs.iter().map(|(adapter, credentials)| {
            providers::search(self.api, *adapter, topic, request.max_results, credentials, poll)
        });

        let results = try_join_all(searches).await?;
        let merged: Vec<VideoRecord> = results.into_iter().flatten().collect();

        Ok(apply_filters(merged, &request.filters, Utc::now()))
    }
}

/// Metric filter, date filter, then a stable sort by views (descending)
pub fn apply_filters(videos: Vec<VideoRecord>, filters: &DiscoveryFilters, now: DateTime<Utc>) -> DiscoveryReport {
    let total_found = videos.len();

    let mut kept: Vec<VideoRecord> = videos
        .into_iter()
        .filter(|v| v.views >= filters.min_views && v.likes >= filters.min_likes)
        .collect();
    let after_metric_filter = kept.len();

    if filters.date_from.is_some() || filters.date_to.is_some() {
        let from = filters
            .date_from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| Utc.from_utc_datetime(&d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = filters
            .date_to
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .map(|d| Utc.from_utc_datetime(&d))
            .unwrap_or(now);

        // Unknown dates are never excluded
        kept.retain(|v| match parse_created_at(&v.created_at) {
            Some(created) => created >= from && created <= to,
            None => true,
        });
    }
    let after_date_filter = kept.len();

    kept.sort_by(|a, b| b.views.cmp(&a.views));

    tracing::debug!(
        total_found,
        after_metric_filter,
        after_date_filter,
        "Applied discovery filters"
    );

    DiscoveryReport {
        total_found,
        after_metric_filter,
        after_date_filter,
        videos: kept,
    }
}

/// Best-effort timestamp parsing for provider date strings
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        let n: i64 = raw.parse().ok()?;
        // Scrapers mix epoch seconds and epoch milliseconds
        return if n >= 100_000_000_000 {
            Utc.timestamp_millis_opt(n).single()
        } else {
            Utc.timestamp_opt(n, 0).single()
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|d| Utc.from_utc_datetime(&d));
        }
    }

    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// User-facing message for a failed discovery
pub fn describe_failure(err: &ResearchError) -> String {
    let mut msg = String::from("Failed to fetch videos from Apify. ");

    if err.is_auth_failure() {
        msg.push_str("Check your Apify API token in Settings (invalid or expired).");
    } else if err.is_network_failure() {
        msg.push_str("Network issue, try again or run with --verbose for details.");
    } else {
        msg.push_str(&err.to_string());
    }

    msg
}

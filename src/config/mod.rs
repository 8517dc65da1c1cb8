use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::poller::{PollConfig, DEFAULT_MAX_ATTEMPTS};
use crate::providers::{apify, Platform, ProviderCredentials};
use crate::transcribe::{captions, DEFAULT_TRANSCRIBE_ENDPOINT};
use crate::ResearchError;

/// Persisted application settings.
///
/// Loaded once at startup and only written back by an explicit save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tiktok: PlatformSettings,
    pub instagram: PlatformSettings,
    pub youtube: PlatformSettings,

    /// Transcription service settings
    pub transcription: TranscriptionSettings,

    /// Spreadsheet export target
    pub sheets: SheetsSettings,

    pub apify: ApifySettings,
    pub polling: PollingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Scraping provider API token
    pub api_token: String,

    /// Scraper actor id (`user/actor`); blank uses the platform default
    pub actor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub api_token: String,
    pub endpoint: String,
    pub caption_endpoint: String,
    pub caption_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsSettings {
    pub sheet_id: String,
    pub sheet_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApifySettings {
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            endpoint: DEFAULT_TRANSCRIBE_ENDPOINT.to_string(),
            caption_endpoint: captions::DEFAULT_CAPTION_ENDPOINT.to_string(),
            caption_language: "en".to_string(),
        }
    }
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl Default for ApifySettings {
    fn default() -> Self {
        Self {
            base_url: apify::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Load settings from `path`, writing defaults there when the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs_err::read_to_string(path)
                .context("Failed to read config file")?;

            let settings: Settings = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            settings.validate()?;
            Ok(settings)
        } else {
            let settings = Self::default();
            settings.save_to(path)?;
            Ok(settings)
        }
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Remove all saved settings
    pub fn reset(path: &Path) -> Result<()> {
        if path.exists() {
            fs_err::remove_file(path).context("Failed to remove config file")?;
        }
        Ok(())
    }

    /// Resolve the settings file: explicit path, then `./config.yaml`, then the user config dir
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("video-research").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        if self.polling.max_attempts == 0 {
            anyhow::bail!("polling.max_attempts must be at least 1");
        }

        url::Url::parse(&self.apify.base_url)
            .with_context(|| format!("Invalid apify.base_url: {}", self.apify.base_url))?;

        Ok(())
    }

    /// Update one setting by dotted key, e.g. `tiktok.api_token`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim().to_string();

        match key {
            "tiktok.api_token" => self.tiktok.api_token = value,
            "tiktok.actor_id" => self.tiktok.actor_id = value,
            "instagram.api_token" => self.instagram.api_token = value,
            "instagram.actor_id" => self.instagram.actor_id = value,
            "youtube.api_token" => self.youtube.api_token = value,
            "youtube.actor_id" => self.youtube.actor_id = value,
            "transcription.api_token" => self.transcription.api_token = value,
            "transcription.endpoint" => self.transcription.endpoint = value,
            "transcription.caption_endpoint" => self.transcription.caption_endpoint = value,
            "transcription.caption_language" => self.transcription.caption_language = value,
            "sheets.sheet_id" => self.sheets.sheet_id = value,
            "sheets.sheet_name" => self.sheets.sheet_name = value,
            "apify.base_url" => self.apify.base_url = value,
            "polling.interval_ms" => {
                self.polling.interval_ms = value
                    .parse()
                    .with_context(|| format!("polling.interval_ms must be a number, got {:?}", value))?;
            }
            "polling.max_attempts" => {
                self.polling.max_attempts = value
                    .parse()
                    .with_context(|| format!("polling.max_attempts must be a number, got {:?}", value))?;
            }
            other => anyhow::bail!("Unknown setting: {}", other),
        }

        self.validate()
    }

    pub fn platform(&self, platform: Platform) -> &PlatformSettings {
        match platform {
            Platform::TikTok => &self.tiktok,
            Platform::Instagram => &self.instagram,
            Platform::YouTube => &self.youtube,
        }
    }

    /// Credentials for one scraping provider; fails before any network call when the token is blank
    pub fn platform_credentials(&self, platform: Platform) -> Result<ProviderCredentials, ResearchError> {
        let section = self.platform(platform);
        if section.api_token.trim().is_empty() {
            return Err(ResearchError::MissingCredential {
                provider: platform.label().to_string(),
            });
        }

        Ok(ProviderCredentials {
            api_token: section.api_token.trim().to_string(),
            actor_id: section.actor_id.clone(),
        })
    }

    pub fn transcription_token(&self) -> Result<&str, ResearchError> {
        let token = self.transcription.api_token.trim();
        if token.is_empty() {
            return Err(ResearchError::MissingCredential {
                provider: "transcription".to_string(),
            });
        }
        Ok(token)
    }

    pub fn has_any_platform_token(&self) -> bool {
        Platform::ALL
            .iter()
            .any(|p| !self.platform(*p).api_token.trim().is_empty())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.polling.interval_ms),
            max_attempts: self.polling.max_attempts,
        }
    }

    /// Display current settings with tokens masked
    pub fn display(&self) {
        println!("Current Configuration:");
        for platform in Platform::ALL {
            let section = self.platform(platform);
            println!(
                "  {} token: {}  actor: {}",
                platform,
                mask(&section.api_token),
                if section.actor_id.is_empty() { "(default)" } else { section.actor_id.as_str() }
            );
        }
        println!("  Transcription token: {}", mask(&self.transcription.api_token));
        println!("  Transcription endpoint: {}", self.transcription.endpoint);
        println!("  Sheet: {} / {}", self.sheets.sheet_id, self.sheets.sheet_name);
        println!(
            "  Polling: every {}ms, up to {} checks",
            self.polling.interval_ms, self.polling.max_attempts
        );
    }
}

/// Show only the last four characters of a secret
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }

    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }

    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

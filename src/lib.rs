//! Video Research - discover short-form videos through scraping providers and transcribe them
//!
//! This library drives third-party scraping jobs (TikTok, Instagram, YouTube) and a
//! transcription service, normalizes their heterogeneous results into [`VideoRecord`]s,
//! filters and sorts them, and exports the outcome.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod normalize;
pub mod output;
pub mod providers;
pub mod transcribe;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Settings;
pub use discovery::{DiscoveryFilters, DiscoveryReport, PlatformSelection};
pub use providers::{Platform, VideoRecord};
pub use transcribe::{TranscriptionPipeline, TranscriptionResult, TranscriptionStatus};

/// Result type used at the application edge
pub type Result<T> = anyhow::Result<T>;

/// Result type for provider-facing operations
pub type ProviderResult<T> = std::result::Result<T, ResearchError>;

/// Failure taxonomy shared by every network-calling component
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResearchError {
    #[error("Missing {provider} API token. Add it with `vidscout config --set`")]
    MissingCredential { provider: String },

    #[error("{provider} request failed{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    ProviderRequest {
        provider: String,
        /// `None` when the request never produced an HTTP response
        status: Option<u16>,
        message: String,
    },

    #[error("{provider} run {run_id} {}", .state.to_lowercase())]
    ProviderRun {
        provider: String,
        run_id: String,
        state: String,
    },

    #[error("{provider} run {run_id} timed out after {attempts} status checks")]
    ProviderTimeout {
        provider: String,
        run_id: String,
        attempts: u32,
    },

    #[error("Transcript not available for this video: {url}")]
    NoTranscript { url: String },

    #[error("{0}")]
    InvalidInput(String),
}

impl ResearchError {
    /// Build a transport-level failure (no HTTP response was received)
    pub fn network(provider: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ResearchError::ProviderRequest {
            provider: provider.into(),
            status: None,
            message: err.to_string(),
        }
    }

    /// Replace the provider label on provider-scoped errors
    pub fn with_provider(self, label: &str) -> Self {
        match self {
            ResearchError::ProviderRequest { status, message, .. } => ResearchError::ProviderRequest {
                provider: label.to_string(),
                status,
                message,
            },
            ResearchError::ProviderRun { run_id, state, .. } => ResearchError::ProviderRun {
                provider: label.to_string(),
                run_id,
                state,
            },
            ResearchError::ProviderTimeout { run_id, attempts, .. } => ResearchError::ProviderTimeout {
                provider: label.to_string(),
                run_id,
                attempts,
            },
            other => other,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ResearchError::ProviderRequest { status: Some(401 | 403), .. }
        )
    }

    pub fn is_network_failure(&self) -> bool {
        matches!(self, ResearchError::ProviderRequest { status: None, .. })
    }
}

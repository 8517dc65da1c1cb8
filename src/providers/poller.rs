use std::time::{Duration, Instant};
use tokio::time::sleep;

use super::apify::{ActorApi, RunInfo, RunStatus};
use crate::{ProviderResult, ResearchError};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 180;

/// Status checks between progress log lines
const LOG_EVERY: u32 = 15;

/// Fixed-interval polling bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Waits for a submitted run to reach a terminal state
pub struct RunPoller<'a> {
    api: &'a dyn ActorApi,
    config: PollConfig,
}

impl<'a> RunPoller<'a> {
    pub fn new(api: &'a dyn ActorApi, config: PollConfig) -> Self {
        Self { api, config }
    }

    /// Poll until the run succeeds, fails, or the attempt budget runs out.
    ///
    /// Suspends on a timer between checks, so concurrent pollers for other
    /// runs keep making progress.
    pub async fn await_completion(&self, run_id: &str, token: &str) -> ProviderResult<RunInfo> {
        let started = Instant::now();

        for attempt in 0..self.config.max_attempts {
            let run = self.api.run_status(run_id, token).await?;

            if attempt > 0 && attempt % LOG_EVERY == 0 {
                tracing::info!(
                    run_id,
                    status = run.status.as_str(),
                    elapsed_secs = started.elapsed().as_secs(),
                    "Run still in progress"
                );
            }

            if run.status == RunStatus::Succeeded {
                tracing::info!(run_id, checks = attempt + 1, "Run completed");
                return Ok(run);
            }

            if run.status.is_failure() {
                tracing::warn!(run_id, status = run.status.as_str(), "Run ended without results");
                return Err(ResearchError::ProviderRun {
                    provider: "Apify".to_string(),
                    run_id: run_id.to_string(),
                    state: run.status.as_str().to_string(),
                });
            }

            sleep(self.config.interval).await;
        }

        Err(ResearchError::ProviderTimeout {
            provider: "Apify".to_string(),
            run_id: run_id.to_string(),
            attempts: self.config.max_attempts,
        })
    }
}

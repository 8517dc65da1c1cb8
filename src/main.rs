use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use video_research::cli::{Cli, Commands, OutputFormat};
use video_research::config::Settings;
use video_research::discovery::{describe_failure, Discovery, DiscoveryFilters, DiscoveryRequest};
use video_research::output;
use video_research::providers::apify::ApifyClient;
use video_research::providers::AdapterRegistry;
use video_research::transcribe::{batch_summary, TranscriptionPipeline};
use video_research::utils;
use video_research::ResearchError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config_path = Settings::resolve_path(cli.config.as_deref())?;
    tracing::debug!("Using settings file {}", config_path.display());

    match cli.command {
        Commands::Discover {
            topic,
            platform,
            min_views,
            min_likes,
            date_from,
            date_to,
            max_results,
            output,
            format,
        } => {
            let settings = Settings::load_from(&config_path)?;
            if !settings.has_any_platform_token() {
                anyhow::bail!(
                    "Discovery is unavailable: no platform API token is configured. \
                     Add one with `vidscout config --set tiktok.api_token=<token>`"
                );
            }

            let request = DiscoveryRequest {
                topic,
                selection: platform,
                filters: DiscoveryFilters {
                    min_views,
                    min_likes,
                    date_from,
                    date_to,
                },
                max_results,
            };

            let api = ApifyClient::new(&settings.apify.base_url);
            let discovery = Discovery::new(&api, &settings);

            let spinner = spinner(cli.quiet, format!("Searching for {:?}...", request.topic.trim()));
            let result = discovery.discover(&request).await;
            spinner.finish_and_clear();

            let report = match result {
                Ok(report) => report,
                Err(err @ (ResearchError::MissingCredential { .. } | ResearchError::InvalidInput(_))) => {
                    return Err(err.into());
                }
                Err(err) => {
                    tracing::debug!("Discovery failed: {:?}", err);
                    anyhow::bail!(describe_failure(&err));
                }
            };

            let summary = report.summary(&request.filters);
            if report.videos.is_empty() {
                eprintln!("{}", style(summary).yellow());
                if format != OutputFormat::Json {
                    return Ok(());
                }
            } else {
                eprintln!("{}", style(summary).green().bold());
            }

            let content = output::render_discovery(&report, format)?;
            emit(&content, output.as_deref())?;
        }
        Commands::Transcribe {
            urls,
            file,
            from_discovery,
            select,
            output,
            format,
        } => {
            let settings = Settings::load_from(&config_path)?;
            let urls = collect_urls(urls, file.as_deref(), from_discovery.as_deref(), select.as_deref())?;

            let pipeline = TranscriptionPipeline::from_settings(&settings)?.with_progress(!cli.quiet);

            tracing::info!("Transcribing {} video(s)", urls.len());
            let results = pipeline.transcribe_all(&urls).await;

            let summary = batch_summary(&results);
            if results.iter().any(|r| r.is_success()) {
                eprintln!("{}", style(summary).green().bold());
            } else {
                eprintln!("{}", style(summary).red());
            }

            let content = output::render_transcriptions(&results, format)?;
            emit(&content, output.as_deref())?;
        }
        Commands::Config { show, set, reset } => {
            if reset {
                Settings::reset(&config_path)?;
                println!("All saved settings cleared ({})", config_path.display());
                return Ok(());
            }

            let mut settings = Settings::load_from(&config_path)?;

            if !set.is_empty() {
                for assignment in &set {
                    let (key, value) = assignment
                        .split_once('=')
                        .with_context(|| format!("Expected KEY=VALUE, got {:?}", assignment))?;
                    settings.set(key.trim(), value)?;
                    println!("Set {}", key.trim());
                }
                settings.save_to(&config_path)?;
                println!("Settings saved to {}", config_path.display());
            }

            if show || set.is_empty() {
                settings.display();
                if !show {
                    println!();
                    println!("Change a value with `vidscout config --set KEY=VALUE`");
                }
            }
        }
        Commands::Platforms => {
            println!("Supported platforms:");
            for adapter in AdapterRegistry::new().list() {
                println!(
                    "  • {} (settings: {}.api_token, default actor: {})",
                    adapter.platform(),
                    adapter.platform().settings_key(),
                    adapter.default_actor()
                );
            }
            println!("Transcription: TikTok, Instagram Reels and YouTube URLs (YouTube captions as fallback)");
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.verbose {
        "video_research=debug,vidscout=debug"
    } else if cli.quiet {
        "video_research=warn,vidscout=warn"
    } else {
        "video_research=info,vidscout=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);

    if cli.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Gather transcription URLs from arguments, a URL file and a discovery export, in that order
fn collect_urls(
    args: Vec<String>,
    file: Option<&Path>,
    from_discovery: Option<&Path>,
    select: Option<&str>,
) -> Result<Vec<String>> {
    let mut raw = args;

    if let Some(path) = file {
        let content = fs_err::read_to_string(path)?;
        raw.extend(utils::parse_url_list(&content));
    }

    if let Some(path) = from_discovery {
        let videos = output::load_discovery_export(path)?;
        let indices = match select {
            Some(selection) => utils::parse_index_list(selection, videos.len())?,
            None => (0..videos.len()).collect(),
        };
        raw.extend(
            indices
                .into_iter()
                .map(|i| videos[i].url.clone())
                .filter(|url| !url.trim().is_empty()),
        );
    }

    // Malformed entries are reported per URL by the pipeline
    let urls: Vec<String> = raw
        .iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        anyhow::bail!("Please enter at least one video URL");
    }

    Ok(urls)
}

fn emit(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            output::save_to_file(content, path)?;
            eprintln!("Results saved to: {}", path.display());
        }
        None => output::print_to_console(content),
    }
    Ok(())
}

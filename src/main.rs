mod cli;

use aniplay::api::{ApiClient, CatalogApi, HttpCatalogApi, HttpWatchStateApi, WatchStateApi};
use aniplay::config::Config;
use aniplay::models::{
    EpisodeContext, EpisodeMedia, NextEpisode, PlayerSettingsPatch, QualityTier, SeriesAlias,
};
use aniplay::player::{
    Collaborators, ControllerOptions, HeadlessFactory, HeadlessHlsBackend, LogOverlay,
    PlaybackController, PlayerEvent, RecordingNavigator, SessionPhase,
};
use aniplay::storage::{ProgressStore, SettingsStore};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ProgressAction};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "aniplay=debug".to_string()
        } else {
            "aniplay=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Episode {
            alias,
            season,
            number,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(show_episode(&config, SeriesAlias::new(alias), season, number, json))
        }
        Commands::Play {
            alias,
            season,
            number,
            episode_file,
            next,
            step,
            quality,
            auto_skip,
            auto_next,
        } => {
            let request = PlayRequest {
                alias: SeriesAlias::new(alias),
                season,
                number,
                episode_file,
                next,
                step,
                patch: PlayerSettingsPatch {
                    quality,
                    auto_skip,
                    auto_next,
                    ..Default::default()
                },
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(play(&config, request))
        }
        Commands::Progress { action } => progress(&config, action),
        Commands::Settings {
            quality,
            volume,
            speed,
            auto_skip,
            auto_next,
        } => settings(
            &config,
            PlayerSettingsPatch {
                quality,
                volume,
                speed,
                auto_skip,
                auto_next,
            },
        ),
    }
}

async fn show_episode(
    config: &Config,
    alias: SeriesAlias,
    season: u32,
    number: u32,
    json: bool,
) -> Result<()> {
    let catalog = HttpCatalogApi::new(ApiClient::new(&config.api)?);
    let episode = catalog
        .episode(&alias, season, number)
        .await
        .with_context(|| {
            format!(
                "Failed to fetch {} season {} episode {}",
                alias, season, number
            )
        })?;
    let next = catalog.next_episode(&alias, season, number).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&episode)?);
        return Ok(());
    }

    println!("Episode {}: {}", episode.number, episode.title.primary);
    if let Some(secondary) = &episode.title.secondary {
        println!("  {}", secondary);
    }
    println!("Id: {}", episode.id);
    println!("Duration: {}", format_time(episode.duration));
    for tier in QualityTier::DESCENDING {
        if let Some(url) = episode.renditions.url_for(tier) {
            println!("  {:>5}  {}", tier.label(), url);
        }
    }
    if let Some(opening) = episode.opening {
        println!(
            "Opening: {} - {}",
            format_time(opening.start),
            format_time(opening.stop)
        );
    }
    if let Some(ending) = episode.ending {
        println!("Ending from: {}", format_time(ending.start));
    }
    match next {
        Some(next) => println!(
            "Next: season {} episode {}",
            next.season_sort_order.unwrap_or(season),
            next.next_episode_number
        ),
        None => println!("Next: none"),
    }
    Ok(())
}

struct PlayRequest {
    alias: SeriesAlias,
    season: u32,
    number: u32,
    episode_file: Option<PathBuf>,
    next: Option<u32>,
    step: f64,
    patch: PlayerSettingsPatch,
}

async fn play(config: &Config, request: PlayRequest) -> Result<()> {
    if !request.step.is_finite() || request.step <= 0.0 {
        anyhow::bail!("--step must be positive, got {}", request.step);
    }

    let client = ApiClient::new(&config.api)?;
    let (episode, next) = match &request.episode_file {
        Some(path) => {
            let next = request.next.map(|number| NextEpisode {
                next_episode_number: number,
                season_sort_order: None,
            });
            (read_episode(path)?, next)
        }
        None => {
            let catalog = HttpCatalogApi::new(client.clone());
            let episode = catalog
                .episode(&request.alias, request.season, request.number)
                .await
                .context("Failed to fetch episode")?;
            let next = catalog
                .next_episode(&request.alias, request.season, request.number)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Next episode lookup failed: {}", e);
                    None
                });
            (episode, next)
        }
    };

    if episode.duration <= 0.0 {
        anyhow::bail!("Episode {} has no known duration", episode.id);
    }
    let duration = episode.duration;

    let data_dir = config.data_dir()?;
    let mut settings = open_settings(config, &data_dir)?;
    settings.update(&request.patch);
    let progress = open_progress(config, &data_dir)?;

    let factory = HeadlessFactory::new(false);
    let navigator = RecordingNavigator::default();
    let watch_api: Option<Arc<dyn WatchStateApi>> = Some(Arc::new(HttpWatchStateApi::new(client)));

    // Simulated time advances instantly, so every update is processed
    let mut options = ControllerOptions::from_config(config);
    options.time_update_interval = Duration::ZERO;

    let mut controller = PlaybackController::new(
        Collaborators {
            factory: Box::new(factory.clone()),
            hls: Box::new(HeadlessHlsBackend::default()),
            overlay: Box::new(LogOverlay::default()),
            navigator: Box::new(navigator.clone()),
            orientation: None,
            watch_api,
        },
        settings,
        progress,
        options,
    );

    controller.mount();
    controller.load_episode(
        EpisodeContext::new(request.alias, request.season, episode).with_next(next),
    );

    let Some(handle) = factory.latest() else {
        let message = controller
            .error_message()
            .unwrap_or_else(|| "player was not created".to_string());
        anyhow::bail!("Playback failed: {}", message);
    };

    handle.emit(PlayerEvent::Ready);
    handle.emit(PlayerEvent::Play);
    controller.process_pending();

    let mut updates = 0usize;
    loop {
        if controller.phase() == SessionPhase::Error || !navigator.opened().is_empty() {
            break;
        }
        if handle.current_time() >= duration {
            handle.emit(PlayerEvent::Ended);
            controller.process_pending();
            break;
        }
        handle.advance(request.step);
        controller.process_pending();
        updates += 1;
    }

    let position = handle.current_time();
    let skipped = controller.has_skipped_opening();
    let error = controller.error_message();
    controller.watch_tracker_mut().drain().await;
    controller.unmount();

    if let Some(message) = error {
        anyhow::bail!("Playback failed: {}", message);
    }

    println!("Played {} updates, stopped at {}", updates, format_time(position.min(duration)));
    println!("Opening skipped: {}", if skipped { "yes" } else { "no" });
    match navigator.opened().first() {
        Some((alias, season, number)) => {
            println!("Advanced to {} season {} episode {}", alias, season, number)
        }
        None => println!("Stayed on this episode"),
    }
    Ok(())
}

fn read_episode(path: &Path) -> Result<EpisodeMedia> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read episode file {:?}", path))?;
    serde_json::from_str(&contents).context("Failed to parse episode file")
}

fn open_settings(config: &Config, data_dir: &Path) -> Result<SettingsStore> {
    SettingsStore::open(data_dir.join("settings.json"), config.storage.expiry_days)
        .context("Failed to open settings store")
}

fn open_progress(config: &Config, data_dir: &Path) -> Result<ProgressStore> {
    ProgressStore::open(
        data_dir.join("progress.json"),
        config.storage.progress_capacity,
        config.storage.expiry_days,
    )
    .context("Failed to open progress store")
}

fn progress(config: &Config, action: ProgressAction) -> Result<()> {
    let mut store = open_progress(config, &config.data_dir()?)?;
    match action {
        ProgressAction::List => {
            if store.is_empty() {
                println!("No saved positions");
            }
            for (key, seconds) in store.entries() {
                println!(
                    "series {} episode {}: {}",
                    key.series_external_id,
                    key.episode_number,
                    format_time(seconds as f64)
                );
            }
        }
        ProgressAction::Clear => {
            let count = store.len();
            store.clear()?;
            println!("Cleared {} saved positions", count);
        }
    }
    Ok(())
}

fn settings(config: &Config, patch: PlayerSettingsPatch) -> Result<()> {
    let mut store = open_settings(config, &config.data_dir()?)?;
    let current = store.update(&patch);

    let quality = current.quality.map(|tier| tier.label()).unwrap_or("auto");
    println!("Quality:   {}", quality);
    println!("Volume:    {}", optional(current.volume));
    println!("Speed:     {}", optional(current.speed));
    println!("Auto-skip: {}", current.auto_skip);
    println!("Auto-next: {}", current.auto_next);
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, mins, secs) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

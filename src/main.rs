//! `ytdl-player` CLI - resolve a media page into direct-play URLs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use ytdl_player_lib::player::models::DEFAULT_AUDIO_PARSE_OPTIONS;
use ytdl_player_lib::player::utils::{format_time, normalize_request_url};
use ytdl_player_lib::player::MediaResolver;
use ytdl_player_lib::{
    init_logging, AudioSession, MediaFormat, MediaInfo, ParseEvent, ParserConfig, ToolManager,
    VideoQuality, VideoSession, YoutubeDlResolver, YtdlParser,
};

#[derive(Parser)]
#[command(name = "ytdl-player")]
#[command(about = "Resolve media pages into direct-play URLs with youtube-dl")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// youtube-dl executable to run instead of the managed/system one
    #[arg(long, global = true)]
    ytdl: Option<PathBuf>,

    /// Directory for the managed youtube-dl copy
    #[arg(long, global = true)]
    tool_dir: Option<PathBuf>,

    /// HTTP/SOCKS proxy for youtube-dl and the updater
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// youtube-dl timeout in seconds
    #[arg(long, global = true, default_value_t = 60)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a URL and print what a player should open
    Parse {
        /// Page URL (YouTube, Vimeo, Twitch, ...)
        url: String,

        /// Preferred quality (best, 2160p, 1440p, 1080p, 720p, 480p, 360p)
        #[arg(short, long, default_value = "720p")]
        quality: VideoQuality,

        /// Resolve for audio-only playback
        #[arg(short, long)]
        audio: bool,

        /// Custom youtube-dl options (replaces the quality-derived ones)
        #[arg(long, allow_hyphen_values = true)]
        options: Option<String>,

        /// Skip the youtube-dl update check
        #[arg(long)]
        no_update: bool,

        /// List every supported format
        #[arg(short, long)]
        list: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Install or update the managed youtube-dl
    Update,

    /// Show youtube-dl status
    Tools {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = ParserConfig::default()
        .with_ytdl_path(cli.ytdl)
        .with_proxy(cli.proxy)
        .with_timeout(cli.timeout);
    if let Some(dir) = cli.tool_dir {
        config = config.with_tool_dir(dir);
    }

    match cli.command {
        Commands::Parse {
            url,
            quality,
            audio,
            options,
            no_update,
            list,
            json,
        } => {
            let options = options.unwrap_or_else(|| {
                if audio {
                    DEFAULT_AUDIO_PARSE_OPTIONS.to_string()
                } else {
                    quality.parse_options()
                }
            });
            let config = config
                .with_options(Some(options))
                .with_auto_update(!no_update);
            let info = resolve(&config, &url).await?;

            if audio {
                print_audio(AudioSession::new(info), list, json)
            } else {
                print_video(VideoSession::new(info, quality), list, json)
            }
        }
        Commands::Update => {
            let manager = ToolManager::new(config)?;
            match manager.ensure_latest().await? {
                Some(version) => println!("Updated youtube-dl to {}", version),
                None => println!("youtube-dl is up to date"),
            }
            println!("{}", manager.managed_path().display());
            Ok(())
        }
        Commands::Tools { json } => {
            let resolved = YoutubeDlResolver::new(config.clone()).locate();
            let status = ToolManager::new(config)?.tool_status(resolved);

            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Managed copy:   {}{}", status.managed_path, if status.managed_present { "" } else { " (missing)" });
                println!("Stored version: {}", status.stored_version.as_deref().unwrap_or("-"));
                println!("Resolved:       {}", status.resolved_path.as_deref().unwrap_or("not found"));
                println!("Reports:        {}", status.reported_version.as_deref().unwrap_or("-"));
            }
            Ok(())
        }
    }
}

/// Run one parse cycle and wait for its result
async fn resolve(config: &ParserConfig, url: &str) -> Result<MediaInfo> {
    let resolver = Arc::new(YoutubeDlResolver::new(config.clone()));
    if !config.auto_update && !resolver.is_available() {
        bail!("youtube-dl not found; run `ytdl-player update` or pass --ytdl");
    }

    let updater = if config.auto_update {
        Some(Arc::new(ToolManager::new(config.clone())?))
    } else {
        None
    };

    let (parser, mut events) = YtdlParser::new(config, resolver, updater);
    let request_id = parser
        .prepare_and_parse(&normalize_request_url(url))
        .context("Failed to start parsing")?;

    while let Some(event) = events.recv().await {
        match event {
            ParseEvent::VersionUpdated(version) => {
                info!("Update youtube-dl to latest version {}", version);
            }
            ParseEvent::Success { request_id: id, info } if id == request_id => return Ok(info),
            ParseEvent::Failure { request_id: id, failure } if id == request_id => {
                bail!("{:?}: {}", failure.code, failure.message);
            }
            other => debug!("Dropping stale event {:?}", other),
        }
    }

    bail!("Parser stopped before delivering a result")
}

fn format_row(index: usize, format: &MediaFormat, selected: bool) -> String {
    format!(
        "{} {:>2}  {:<8} {:<6} {:<14} {:<14} {}",
        if selected { "*" } else { " " },
        index,
        format.format_id,
        format.quality_label(),
        format.vcodec,
        format.acodec,
        format.url
    )
}

fn print_video(session: VideoSession, list: bool, json: bool) -> Result<()> {
    if !session.has_playable_stream() {
        bail!("No playable stream found");
    }

    if json {
        let out = serde_json::json!({
            "title": session.info().title,
            "duration": session.info().duration,
            "format_index": session.current_format().map(|_| session.format_index()),
            "quality": session.quality_label(),
            "video_url": session.playback_url(),
            "audio_url": session.audio_url(),
            "supported": session.supported_formats(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let info = session.info();
    println!("{} [{}]", info.title, format_time(info.duration as f64));
    if let Some(label) = session.quality_label() {
        println!("Quality: {}", label);
    }
    println!("Video:   {}", session.playback_url());
    match session.audio_url() {
        Some(url) => println!("Audio:   {}", url),
        None if session.current_format().is_some() => println!("Audio:   (none, silent playback)"),
        None => {}
    }

    if list {
        println!();
        for (index, format) in session.supported_formats().video_formats.iter().enumerate() {
            println!("{}", format_row(index, format, index == session.format_index()));
        }
    }
    Ok(())
}

fn print_audio(session: AudioSession, list: bool, json: bool) -> Result<()> {
    let url = session.playback_url();
    if url.is_empty() {
        bail!("No playable stream found");
    }

    if json {
        let out = serde_json::json!({
            "title": session.info().title,
            "duration": session.info().duration,
            "audio_url": url,
            "supported": session.audio_formats(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let info = session.info();
    println!("{} [{}]", info.title, format_time(info.duration as f64));
    println!("Audio:   {}", url);

    if list {
        println!();
        for (index, format) in session.audio_formats().iter().enumerate() {
            println!("{}", format_row(index, format, index == 0));
        }
    }
    Ok(())
}

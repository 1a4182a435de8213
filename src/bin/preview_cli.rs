use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use preview_audio_player::{
    init_logging, BackendError, Operation, Platform, PlaybackEvent, PlayerConfig, PrepareRequest,
    PreviewController,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "preview_cli",
    about = "Drive a simulated preview session from the command line"
)]
struct Cli {
    /// Configuration file (defaults to assets/preview_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Platform engine to emulate (defaults to the configured platform)
    #[arg(long, value_enum)]
    platform: Option<PlatformArg>,
    /// Log controller and backend activity to stderr
    #[arg(long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prepare tracks, play them and export the mix, printing JSON lines
    Session {
        #[arg(long)]
        original: PathBuf,
        #[arg(long)]
        processed: PathBuf,
        #[arg(long)]
        background: PathBuf,
        #[arg(long, default_value_t = 0.0)]
        recording_start: f64,
        /// Play only this window instead of the whole track: START DURATION
        #[arg(long, num_args = 2, value_names = ["START", "DURATION"])]
        preview: Option<Vec<f64>>,
        #[arg(long, value_enum, default_value_t = TrackArg::Processed)]
        track: TrackArg,
        #[arg(long, default_value_t = 1.0)]
        vocal_volume: f32,
        #[arg(long, default_value_t = 1.0)]
        background_volume: f32,
        /// Stop waiting for playback to finish after this many seconds
        #[arg(long, default_value_t = 60)]
        max_wait_secs: u64,
        /// Export the mix once playback finished
        #[arg(long)]
        export: bool,
        /// Export destination (the engine picks one when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List operations and their native names per platform
    Capabilities,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlatformArg {
    Ios,
    Android,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Ios => Platform::Ios,
            PlatformArg::Android => Platform::Android,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TrackArg {
    Original,
    Processed,
}

struct SessionArgs {
    request: PrepareRequest,
    preview: Option<(f64, f64)>,
    track: TrackArg,
    volumes: (f32, f32),
    max_wait: Duration,
    export: bool,
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    if cli.verbose {
        init_logging();
    }

    let config = match &cli.config {
        Some(path) => PlayerConfig::load_from_file(path),
        None => PlayerConfig::load(),
    };
    let platform = cli
        .platform
        .map(Platform::from)
        .unwrap_or_else(|| config.resolved_platform());

    match cli.command {
        Commands::Session {
            original,
            processed,
            background,
            recording_start,
            preview,
            track,
            vocal_volume,
            background_volume,
            max_wait_secs,
            export,
            output,
        } => {
            let request = PrepareRequest::new(original, processed, background, recording_start);
            let args = SessionArgs {
                request,
                preview: preview.map(|window| (window[0], window[1])),
                track,
                volumes: (vocal_volume, background_volume),
                max_wait: Duration::from_secs(max_wait_secs),
                export,
                output,
            };
            run_session(platform, &config, args)
        }
        Commands::Capabilities => run_capabilities(),
    }
}

fn run_session(platform: Platform, config: &PlayerConfig, args: SessionArgs) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    runtime.block_on(async move {
        let controller = PreviewController::for_platform(platform, config);
        let mut events = controller.playback_events();

        if !report("prepare", controller.prepare(args.request).await)? {
            return Ok(ExitCode::from(2));
        }

        let (vocal, background) = args.volumes;
        report("set_volume", controller.set_volume(vocal, background).await)?;
        let switched = match args.track {
            TrackArg::Original => controller.switch_to_original_vocal_track().await,
            TrackArg::Processed => controller.switch_to_processed_vocal_track().await,
        };
        report("switch_vocal_track", switched)?;

        let started = match args.preview {
            Some((start, duration)) => {
                report(
                    "set_preview_at",
                    controller.set_preview_at(start, duration).await,
                )?;
                controller.play_preview().await
            }
            None => controller.play().await,
        };
        if !report("play", started)? {
            return Ok(ExitCode::from(2));
        }

        let finished = tokio::time::timeout(args.max_wait, async {
            while let Some(event) = events.next().await {
                println!("{}", serde_json::to_string(&event)?);
                if matches!(event, PlaybackEvent::Finished { .. }) {
                    break;
                }
            }
            Ok::<(), anyhow::Error>(())
        })
        .await;
        match finished {
            Ok(result) => result?,
            Err(_) => {
                eprintln!("Playback did not finish within {:?}", args.max_wait);
                report("stop", controller.stop().await)?;
            }
        }

        let mut exit = ExitCode::from(0);
        if args.export {
            let exported = match (args.preview.is_some(), args.output) {
                (false, None) => controller.export().await,
                (false, Some(path)) => controller.export_to_file(path).await,
                (true, None) => controller.export_preview().await,
                (true, Some(path)) => controller.export_preview_to_file(path).await,
            };
            if !report("export", exported)? {
                exit = ExitCode::from(2);
            }
        }

        report("release", controller.dispose().await)?;
        Ok::<ExitCode, anyhow::Error>(exit)
    })
}

fn run_capabilities() -> Result<ExitCode> {
    for platform in [Platform::Ios, Platform::Android] {
        let operations: Vec<CapabilityEntry> = Operation::ALL
            .iter()
            .map(|operation| CapabilityEntry {
                operation: operation.label(),
                native_name: operation.native_name(platform),
                supported: platform.supports(*operation),
            })
            .collect();
        let payload = CapabilityPayload {
            platform,
            module: platform.native_module_name(),
            operations,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }
    Ok(ExitCode::from(0))
}

/// Print one operation result as a JSON line. Returns whether it succeeded.
fn report<T: Serialize>(operation: &str, result: Result<T, BackendError>) -> Result<bool> {
    let ok = result.is_ok();
    let payload = match result {
        Ok(value) => ResultPayload {
            operation,
            value: Some(serde_json::to_value(value)?),
            error: None,
        },
        Err(error) => ResultPayload {
            operation,
            value: None,
            error: Some(error),
        },
    };
    println!("{}", serde_json::to_string(&payload)?);
    Ok(ok)
}

#[derive(Serialize)]
struct ResultPayload<'a> {
    operation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BackendError>,
}

#[derive(Serialize)]
struct CapabilityPayload {
    platform: Platform,
    module: &'static str,
    operations: Vec<CapabilityEntry>,
}

#[derive(Serialize)]
struct CapabilityEntry {
    operation: &'static str,
    native_name: &'static str,
    supported: bool,
}

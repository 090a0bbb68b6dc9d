use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use vocal_capture_core::sim::{SimSettings, SimulatedPlatform, Tone, L16_MIME_TYPE};
use vocal_capture_core::{
    ContextState, EngineConfig, PermissionState, RecordingMetadata, RecordingOptions, SessionController,
};

use crate::observer::ConsoleObserver;

type Controller = SessionController<SimulatedPlatform, SimulatedPlatform, SimulatedPlatform, SimulatedPlatform>;

#[derive(Args)]
pub struct RecordArgs {
    /// Recording length in seconds
    #[arg(long, default_value_t = 2.0)]
    seconds: f64,

    /// Frequency of the simulated input tone in Hz
    #[arg(long, default_value_t = 440.0)]
    frequency: f32,

    /// Amplitude of the simulated input tone (0.0 - 1.0)
    #[arg(long, default_value_t = 0.5)]
    amplitude: f32,

    /// Encoder bit rate in bits per second
    #[arg(long)]
    bit_rate: Option<u32>,

    /// Recording options as the studio UI sends them, e.g. '{"audioConstraints":{"echoCancellation":false}}'
    #[arg(long)]
    options: Option<String>,

    /// Label the recording as raw PCM instead of the first browser container
    #[arg(long)]
    raw_pcm: bool,

    /// Print level updates on every tick
    #[arg(long)]
    levels: bool,

    /// Write the captured bytes here, with the metadata next to it as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiagnoseArgs {
    /// Simulate a host that cannot capture audio
    #[arg(long)]
    no_capture: bool,

    /// Simulate a denied microphone permission
    #[arg(long)]
    deny_permission: bool,

    /// Simulate a host whose audio context starts suspended
    #[arg(long)]
    suspended: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    decoded: bool,
    duration_secs: f64,
    sample_rate: f64,
    channels: u16,
    decode_error: Option<&'a str>,
    metadata: &'a RecordingMetadata,
}

fn controller(platform: &SimulatedPlatform, config: EngineConfig) -> Result<Controller> {
    SessionController::new(
        config,
        platform.clone(),
        platform.clone(),
        platform.clone(),
        platform.clone(),
    )
    .context("invalid engine configuration")
}

pub async fn record(args: RecordArgs) -> Result<()> {
    anyhow::ensure!(args.seconds > 0.0, "recording length must be positive");

    let mut options = match &args.options {
        Some(json) => RecordingOptions::from_json(json).map_err(anyhow::Error::msg)?,
        None => RecordingOptions::default(),
    };
    if args.bit_rate.is_some() {
        options.bit_rate = args.bit_rate;
    }

    let platform = SimulatedPlatform::new(SimSettings {
        tone: Some(Tone {
            frequency_hz: args.frequency,
            amplitude: args.amplitude.clamp(0.0, 1.0),
        }),
        ..Default::default()
    });
    let mut config = EngineConfig::default();
    if args.raw_pcm {
        config.mime_preferences.insert(0, L16_MIME_TYPE.to_string());
    }

    let mut controller = controller(&platform, config)?;
    controller.set_observer(Arc::new(ConsoleObserver::new(args.levels)));

    let handle = controller.start_recording(options).await?;
    log::info!("Recording {} for {:.1}s", handle.id, args.seconds);
    tokio::time::sleep(Duration::from_secs_f64(args.seconds)).await;

    let result = controller.stop_recording().await;
    controller.cleanup().await;
    let result = result?;

    let summary = Summary {
        decoded: result.is_decoded(),
        duration_secs: result.duration_secs,
        sample_rate: result.sample_rate,
        channels: result.channels,
        decode_error: result.decode_error.as_deref(),
        metadata: &result.metadata,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = &args.output {
        fs::write(path, &result.raw).with_context(|| format!("failed to write {}", path.display()))?;
        let metadata_path = path.with_extension("json");
        let json = result.metadata.to_json().map_err(anyhow::Error::msg)?;
        fs::write(&metadata_path, json).with_context(|| format!("failed to write {}", metadata_path.display()))?;
        log::info!("Saved {} bytes to {}", result.raw.len(), path.display());
    }
    Ok(())
}

pub async fn diagnose(args: DiagnoseArgs) -> Result<()> {
    let mut settings = SimSettings {
        capture_supported: !args.no_capture,
        ..Default::default()
    };
    if args.deny_permission {
        settings.permission = Some(PermissionState::Denied);
    }
    if args.suspended {
        settings.initial_context_state = ContextState::Suspended;
    }
    let platform = SimulatedPlatform::new(settings);
    let controller = controller(&platform, EngineConfig::default())?;

    let report = controller.diagnostics().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

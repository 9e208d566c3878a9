// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trail_recorder::config::{load_config_with_env, LoggingConfig};
use trail_recorder::{
    OfflineDownloads, OfflineManifestStore, RecorderConfig, RecordingController, RecordingState,
};

/// Trail Recorder - Record trails and manage offline region packages
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a trail from the configured sample source
    Record {
        /// Trail catalog identifier to attach to the recording
        #[arg(long)]
        trail_id: Option<String>,

        /// Stop after this many seconds (default: wait for Ctrl+C)
        #[arg(long)]
        seconds: Option<u64>,

        /// Pause after this many seconds
        #[arg(long, requires = "resume_after")]
        pause_after: Option<u64>,

        /// Resume after this many seconds
        #[arg(long, requires = "pause_after")]
        resume_after: Option<u64>,

        /// Write the completed recording as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage offline region packages
    Packages {
        #[command(subcommand)]
        action: PackageAction,
    },
}

#[derive(Subcommand, Debug)]
enum PackageAction {
    /// List stored packages
    List,
    /// Download a region for offline use
    Download { region: String },
    /// Remove a region's package
    Remove { region: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config_with_env(&args.config)?;
    init_tracing(&config.logging)?;

    info!("Loaded configuration from: {:?}", args.config);

    match args.command {
        Command::Record {
            trail_id,
            seconds,
            pause_after,
            resume_after,
            output,
        } => {
            let pause_window = pause_after.zip(resume_after);
            record(&config, trail_id, seconds, pause_window, output).await
        }
        Command::Packages { action } => packages(&config, action).await,
    }
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

async fn record(
    config: &RecorderConfig,
    trail_id: Option<String>,
    seconds: Option<u64>,
    pause_window: Option<(u64, u64)>,
    output: Option<PathBuf>,
) -> Result<()> {
    let controller = Arc::new(RecordingController::from_config(config));

    let recording = controller.start(trail_id).await?;
    info!(
        "Recording {} started from {} source",
        recording.id, config.source.kind
    );

    let mut subscription = controller.subscribe_to_samples().await;
    let progress = tokio::spawn(async move {
        let mut count = 0u64;
        while let Some(sample) = subscription.recv().await {
            count += 1;
            println!(
                "#{:<5} {:>10.6} {:>11.6} {:>8.1} m",
                count,
                sample.coordinate.latitude,
                sample.coordinate.longitude,
                sample.altitude
            );
        }
        count
    });

    if let Some((pause_after, resume_after)) = pause_window {
        if resume_after <= pause_after {
            warn!("--resume-after must be later than --pause-after, ignoring pause");
        } else {
            let controller = controller.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(pause_after)).await;
                controller.pause().await;
                tokio::time::sleep(Duration::from_secs(resume_after - pause_after)).await;
                controller.resume().await;
            });
        }
    }

    let mut state_rx = controller.state_changes();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow_and_update();
            info!("Recording state: {}", state);
            if state == RecordingState::Completed {
                break;
            }
        }
    });

    match seconds {
        Some(secs) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
                _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, stopping"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Received Ctrl+C, stopping");
        }
    }

    let completed = controller.stop().await?;
    let delivered = progress.await.unwrap_or(0);

    println!(
        "Recorded {} samples ({} delivered): {:.1} m, {:.1} m ascent, {:.1} s",
        completed.samples.len(),
        delivered,
        completed.total_distance,
        completed.total_ascent,
        completed.duration
    );

    if let Some(path) = output {
        let json = serde_json::to_vec_pretty(&completed)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write recording to {}", path.display()))?;
        info!("Recording written to {}", path.display());
    }

    Ok(())
}

async fn packages(config: &RecorderConfig, action: PackageAction) -> Result<()> {
    let store = Arc::new(OfflineManifestStore::from_config(&config.storage)?);
    info!(
        "Manifest backend initialized: {}",
        store.backend().backend_type()
    );
    store.prepare().await?;

    let downloads = OfflineDownloads::from_config(store.clone(), None, &config.storage);

    match action {
        PackageAction::List => {
            let packages = store.list().await?;
            if packages.is_empty() {
                println!("No offline packages");
            }
            for package in packages {
                println!("{}", serde_json::to_string(&package)?);
            }
        }
        PackageAction::Download { region } => {
            let package = downloads.download(&region).await?;
            println!("{}", serde_json::to_string_pretty(&package)?);
        }
        PackageAction::Remove { region } => {
            downloads.remove(&region).await?;
            println!("Removed '{}'", region);
        }
    }

    Ok(())
}

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use anyhow::bail;
use clap::Parser;
use reqwest::{Client, ClientBuilder};
use stitch::{PlayerSurface, Session, StreamMode};

#[derive(Parser, Debug, Clone)]
pub struct PlayerArgs {
    /// Debug output
    #[clap(long, alias = "debug")]
    verbose: bool,

    /// Form-encoded key=value pair sent with the stream request,
    /// e.g. "cust_params=section=sports". Repeatable.
    #[clap(short, long)]
    param: Vec<String>,

    /// Request a live stream (event-driven ad tracking). Defaults to VOD.
    #[clap(long)]
    live: bool,

    /// Seconds of playback to simulate before pausing
    #[clap(long, default_value = "60")]
    duration: u64,

    /// Request timeout in seconds
    #[clap(long, default_value = "10")]
    timeout: u64,

    /// Stream-creation API endpoint
    api_url: String,
}

impl PlayerArgs {
    fn client(&self) -> anyhow::Result<Client> {
        Ok(ClientBuilder::new()
            .timeout(Duration::from_secs(self.timeout))
            .build()?)
    }

    fn params(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut params = Vec::with_capacity(self.param.len());
        for param in &self.param {
            let Some((key, value)) = param.split_once('=') else {
                bail!("Invalid parameter: {param}");
            };
            params.push((key.to_string(), value.to_string()));
        }
        Ok(params)
    }
}

/// Stands in for a real playback engine: the position is wall-clock time
/// since start, the controls toggle is logged.
struct SimulatedPlayer {
    started: Instant,
    controls: AtomicBool,
}

impl SimulatedPlayer {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            controls: AtomicBool::new(true),
        }
    }
}

impl PlayerSurface for SimulatedPlayer {
    fn position(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn set_controls_enabled(&self, enabled: bool) {
        if self.controls.swap(enabled, Ordering::SeqCst) != enabled {
            if enabled {
                log::info!("Ad break over, controls shown");
            } else {
                log::info!("Ad break, controls hidden");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = PlayerArgs::parse();
    if args.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug");
    }
    pretty_env_logger::init();

    let client = args.client()?;
    let mode = if args.live {
        StreamMode::Live
    } else {
        StreamMode::Vod
    };

    let surface = Arc::new(SimulatedPlayer::new());
    let session = Session::create(client, &args.api_url, &args.params()?, mode, surface).await?;

    log::info!("Stream manifest: {}", session.manifest_url());
    log::info!(
        "Simulating {duration}s of playback (mode: {mode:?})",
        duration = args.duration
    );

    session.play();
    tokio::time::sleep(Duration::from_secs(args.duration)).await;
    session.pause();

    Ok(())
}

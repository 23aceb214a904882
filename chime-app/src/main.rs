//! chime - audio handle demo
//!
//! Plays a narration track, a frequency sweep and the coin pickup effect in
//! sequence. Press Enter to quit early.

mod config;
mod demo;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use chime_audio::Device;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use demo::Demo;

/// Tick interval for the demo loop
const TICK: Duration = Duration::from_millis(16);

#[derive(Debug, Default)]
struct Args {
    cwd: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--cwd" | "-cwd" => {
                args.cwd = Some(iter.next().context("--cwd needs a directory")?.into());
            }
            "--config" => {
                args.config = Some(iter.next().context("--config needs a file")?.into());
            }
            other => tracing::warn!(arg = other, "unknown argument"),
        }
    }
    Ok(args)
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args()?;
    if let Some(dir) = &args.cwd {
        std::env::set_current_dir(dir)
            .with_context(|| format!("change directory to {}", dir.display()))?;
    }

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("read config {}", path.display()))?,
        None => AppConfig::load(),
    };
    tracing::debug!(?config, "loaded config");

    let device = Device::install_global(Device::new(&config.engine_config()))
        .map_err(|_| anyhow::anyhow!("audio device already initialized"))?;
    if device.is_headless() {
        tracing::warn!("no audio output available, nothing will be heard");
    }

    // Quit flag set from stdin
    let quit = Arc::new(AtomicBool::new(false));
    let quit_input = quit.clone();
    thread::Builder::new()
        .name("chime-input".into())
        .spawn(move || {
            let mut line = String::new();
            // A closed stdin lets the demo run to the end
            if let Ok(n) = io::stdin().lock().read_line(&mut line) {
                if n > 0 {
                    quit_input.store(true, Ordering::SeqCst);
                }
            }
        })
        .context("spawn input thread")?;

    println!("Press enter to quit...");

    let mut demo = Demo::new(device, &config);
    let mut last = Instant::now();
    while !quit.load(Ordering::SeqCst) {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        if !demo.tick(dt) {
            break;
        }
        thread::sleep(TICK);
    }

    tracing::info!(stage = ?demo.stage(), "demo finished");
    Ok(())
}

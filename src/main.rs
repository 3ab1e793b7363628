// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::Level;

use regency::chart::join_lines;
use regency::scroll::ScrollTarget;
use regency::session::{BandId, Leader};
use regency::{follow, MemorySessionStore, RegencyConfig, SessionController};

fn print_usage() {
    println!("REGENCY - Live worship session leader/follower");
    println!();
    println!("Usage: regency [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --transpose <FILE> <N>    Classify a chord sheet and transpose it by N semitones");
    println!("  --simulate                Run a leader and a follower against an in-memory store");
    println!("  --check-config <FILE>     Validate a YAML or TOML configuration file");
    println!("  --config <FILE>           Use this configuration for --transpose and --simulate");
    println!("  --verbose, -v             Debug logging");
    println!("  --help                    Show this help message");
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn transpose_file(path: &str, semitones: i32, config: &RegencyConfig) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read chord sheet: {}", path))?;
    let lines = config.transposer().classify_and_transpose(&content, semitones);
    println!("{}", join_lines(&lines));
    Ok(())
}

fn check_config(path: &str) -> Result<()> {
    let config = RegencyConfig::load(path)?;
    println!("Configuration OK: {}", path);
    println!(
        "  {} scroll speeds, {} cue presets, {} chord-shaped words",
        config.scroll.speeds.len(),
        config.cues.presets.len(),
        config.chords.blacklist().len()
    );
    Ok(())
}

#[derive(Default)]
struct PixelCounter(AtomicU64);

impl ScrollTarget for PixelCounter {
    fn scroll_by(&self, pixels: u32) {
        self.0.fetch_add(pixels as u64, Ordering::Relaxed);
    }
}

/// Drive one leader and one follower through a short session
async fn simulate(config: &RegencyConfig) -> Result<()> {
    let store = MemorySessionStore::new();
    let band = BandId::from("demo-band");
    let mut leader =
        SessionController::new(store.clone(), band.clone(), Leader::new("leader-1", "Ana"), config);
    leader.start_session(None, Some("demo-song".into())).await?;

    let target = Arc::new(PixelCounter::default());
    let mut follower = follow(&store, &band, config, target.clone());

    leader.step_transpose(2).await?;
    leader.toggle_scroll_play().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    leader.send_preset_cue(0).await?;
    leader.end_session().await?;

    while let Some(event) = follower.next_event().await {
        println!("[follower] {:?}", event);
    }
    println!("[follower] scrolled {} px", target.0.load(Ordering::Relaxed));
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<RegencyConfig> {
    match path {
        Some(path) => RegencyConfig::load(path),
        None => Ok(RegencyConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args: Vec<String> = env::args().collect();

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    args.retain(|a| a != "--verbose" && a != "-v");
    init_logging(verbose);

    let mut config_path = None;
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if pos + 1 >= args.len() {
            eprintln!("Error: --config requires a file path");
            std::process::exit(1);
        }
        config_path = Some(args.remove(pos + 1));
        args.remove(pos);
    }

    if args.len() < 2 {
        println!("REGENCY - Live worship session leader/follower");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--transpose" => {
            if args.len() < 4 {
                eprintln!("Error: --transpose requires a file and a semitone count");
                std::process::exit(1);
            }
            let semitones: i32 = args[3]
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid semitone count: {}", args[3]))?;
            let config = load_config(config_path.as_deref())?;
            transpose_file(&args[2], semitones, &config)?;
        }
        "--simulate" => {
            let config = load_config(config_path.as_deref())?;
            simulate(&config).await?;
        }
        "--check-config" => {
            if args.len() < 3 {
                eprintln!("Error: --check-config requires a file path");
                std::process::exit(1);
            }
            check_config(&args[2])?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}

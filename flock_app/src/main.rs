use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap_serde_derive::{clap::Parser, ClapSerde};
use flock_lib::{birdwatcher::Birdwatcher, flock::Flock};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cliargs;
mod render;
use cliargs::{read_config_file, Args, Config};
use render::Canvas;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = load_config()?;
    debug!("effective config:\n{}", serde_yaml::to_string(&config)?);

    run(&config)
}

fn load_config() -> Result<Config> {
    // Parse whole args with clap
    let mut args = Args::parse();

    // If there is no config file use only the config parsed from clap
    if !args.config_path.exists() {
        return Ok(Config::from(&mut args.config));
    }

    let file_config = read_config_file(&args.config_path)
        .with_context(|| format!("Error in configuration file {}", args.config_path.display()))?;

    // merge config already parsed from clap
    Ok(Config::from(file_config).merge(&mut args.config))
}

fn run(config: &Config) -> Result<()> {
    let options = config
        .flock_options()
        .context("invalid flock configuration")?;

    let mut flock = if config.seed == 0 {
        Flock::new(options, config.no_agents, &mut rand::thread_rng())
    } else {
        Flock::from_seed(options, config.no_agents, config.seed)
    }
    .context("could not build the flock")?;

    let mut bird_watcher = Birdwatcher::new(config.sample_rate);
    let mut canvas = Canvas::new(config.cols, config.rows);
    let delay = Duration::from_millis(config.delay_ms);
    let stdout = io::stdout();

    info!(
        no_agents = flock.len(),
        ticks = config.ticks,
        seed = config.seed,
        "flock started"
    );

    while config.ticks == 0 || flock.tick() < config.ticks {
        flock.step();
        bird_watcher.watch(&flock);

        if config.render_every > 0 && flock.tick() % config.render_every == 0 {
            // presentation only reads the settled state
            let frame = canvas.draw(flock.agents(), &flock.options().bounds);
            let mut out = stdout.lock();
            writeln!(out, "\x1b[2J\x1b[H{frame}tick {}", flock.tick())?;
            out.flush()?;
        }

        if flock.tick() % summary_every(config.sample_rate) == 0 {
            if let Some(summary) = bird_watcher.summary() {
                debug!(
                    tick = flock.tick(),
                    mean_speed = summary.mean_speed,
                    polarisation = summary.polarisation,
                    "flock sample"
                );
            }
            bird_watcher.forget_history();
        }

        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    match bird_watcher.summary() {
        Some(summary) => info!(
            ticks = flock.tick(),
            mean_speed = summary.mean_speed,
            polarisation = summary.polarisation,
            centroid_x = summary.centroid_x,
            centroid_y = summary.centroid_y,
            "flock finished"
        ),
        None => info!(ticks = flock.tick(), "flock finished without samples"),
    }

    Ok(())
}

/// Ticks between two logged summaries, ten samples apart.
fn summary_every(sample_rate: u64) -> u64 {
    sample_rate.max(1).saturating_mul(10)
}

use birdwatcher::{AgentData, Birdwatcher};
use flock::{Flock, FlockError};
use options::FlockOptions;

pub mod agent;
pub mod flock;

pub mod birdwatcher;
pub mod math_helpers;
pub mod options;

/// Runs a seeded flock for `no_iter` ticks without any presentation and
/// returns what a [`Birdwatcher`] sampled along the way.
pub fn flock_base(
    no_iter: u64,
    options: FlockOptions,
    no_agents: usize,
    seed: u64,
    sample_rate: u64,
) -> Result<Vec<AgentData>, FlockError> {
    let mut flock = Flock::from_seed(options, no_agents, seed)?;
    let mut bird_watcher = Birdwatcher::new(sample_rate);

    (0..no_iter).for_each(|_| {
        flock.step();
        bird_watcher.watch(&flock);
    });

    Ok(bird_watcher.pop_data())
}

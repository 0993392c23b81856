use std::mem;

use glam::Vec2;
use serde::Serialize;

use crate::{flock::Flock, math_helpers::normalize_to};

// a read-only observer, it accumulates samples in memory and never touches the flock
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct AgentData {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub n_neighbours: usize,
    pub time: u64,
}

/// Aggregate picture of one sample.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct FlockSummary {
    pub time: u64,
    pub mean_speed: f32,
    /// length of the mean unit heading, 1 when every moving agent heads the same way
    pub polarisation: f32,
    pub centroid_x: f32,
    pub centroid_y: f32,
}

pub struct Birdwatcher {
    locations: Vec<AgentData>,
    last_sample_start: usize,
    render_ticker: u64,
    sample_rate: u64,
}

impl Birdwatcher {
    pub fn new(sample_rate: u64) -> Self {
        Birdwatcher {
            locations: Vec::new(),
            last_sample_start: 0,
            render_ticker: 0,
            sample_rate: sample_rate.max(1),
        }
    }

    /// Triggers data collection
    pub fn watch(&mut self, flock: &Flock) {
        if !self.should_sample() {
            return;
        }

        let time = self.render_ticker / self.sample_rate;
        self.last_sample_start = self.locations.len();
        self.locations.extend(flock.view().map(|(a, m)| AgentData {
            id: a.id,
            x: a.position.x,
            y: a.position.y,
            vx: a.velocity.x,
            vy: a.velocity.y,
            n_neighbours: m.n_neighbours,
            time,
        }));
    }

    pub fn restart(&mut self) {
        self.locations.clear();
        self.last_sample_start = 0;
        self.render_ticker = 0;
    }

    pub fn data(&self) -> &[AgentData] {
        &self.locations
    }

    /// Drops every sample but the latest, for long unattended runs.
    pub fn forget_history(&mut self) {
        self.locations.drain(..self.last_sample_start);
        self.last_sample_start = 0;
    }

    pub fn pop_data(&mut self) -> Vec<AgentData> {
        self.last_sample_start = 0;
        mem::take(&mut self.locations)
    }

    /// Summarises the most recent sample, `None` before anything was sampled.
    pub fn summary(&self) -> Option<FlockSummary> {
        let latest = &self.locations[self.last_sample_start..];
        let first = latest.first()?;
        let n = latest.len() as f32;

        let mut speed = 0.;
        let mut heading = Vec2::ZERO;
        let mut centroid = Vec2::ZERO;
        for d in latest {
            let velocity = Vec2::new(d.vx, d.vy);
            speed += velocity.length();
            heading += normalize_to(velocity, 1.).unwrap_or(Vec2::ZERO);
            centroid += Vec2::new(d.x, d.y);
        }
        centroid /= n;

        Some(FlockSummary {
            time: first.time,
            mean_speed: speed / n,
            polarisation: (heading / n).length(),
            centroid_x: centroid.x,
            centroid_y: centroid.y,
        })
    }

    fn should_sample(&mut self) -> bool {
        self.render_ticker += 1;

        self.render_ticker % self.sample_rate == 0
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::Birdwatcher;
    use crate::{
        agent::Agent, flock::Flock, math_helpers::tests::assert_eqf32, options::FlockOptions,
    };

    fn marching_flock() -> Flock {
        Flock::from_agents(
            FlockOptions::default(),
            vec![
                Agent::new(100., 100., Vec2::new(3., 4.), 5., 0),
                Agent::new(300., 500., Vec2::new(3., 4.), 5., 1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn samples_every_nth_watch() {
        let flock = marching_flock();
        let mut bird_watcher = Birdwatcher::new(3);

        (0..7).for_each(|_| bird_watcher.watch(&flock));

        let data = bird_watcher.pop_data();
        assert_eq!(data.len(), 4);
        assert_eq!(data[0].time, 1);
        assert_eq!(data[3].time, 2);
        assert!(bird_watcher.data().is_empty());
    }

    #[test]
    fn zero_sample_rate_samples_every_watch() {
        let flock = marching_flock();
        let mut bird_watcher = Birdwatcher::new(0);

        bird_watcher.watch(&flock);

        assert_eq!(bird_watcher.data().len(), 2);
    }

    #[test]
    fn summary_describes_latest_sample() {
        let flock = marching_flock();
        let mut bird_watcher = Birdwatcher::new(1);
        assert_eq!(bird_watcher.summary(), None);

        bird_watcher.watch(&flock);
        bird_watcher.watch(&flock);

        let summary = bird_watcher.summary().unwrap();
        assert_eq!(summary.time, 2);
        assert_eqf32!(summary.mean_speed, 5.);
        assert_eqf32!(summary.polarisation, 1.);
        assert_eqf32!(summary.centroid_x, 200.);
        assert_eqf32!(summary.centroid_y, 300.);
    }

    #[test]
    fn forgetting_history_keeps_latest_sample() {
        let mut flock = marching_flock();
        let mut bird_watcher = Birdwatcher::new(1);

        (0..5).for_each(|_| {
            flock.step();
            bird_watcher.watch(&flock);
        });
        let before = bird_watcher.summary();
        bird_watcher.forget_history();

        assert_eq!(bird_watcher.data().len(), 2);
        assert!(bird_watcher.data().iter().all(|d| d.time == 5));
        assert_eq!(bird_watcher.summary(), before);
    }

    #[test]
    fn resting_flock_has_no_polarisation() {
        let flock = Flock::from_seed(FlockOptions::default(), 10, 3).unwrap();
        let mut bird_watcher = Birdwatcher::new(1);

        bird_watcher.watch(&flock);

        let summary = bird_watcher.summary().unwrap();
        assert_eqf32!(summary.polarisation, 0.);
        assert_eqf32!(summary.mean_speed, 0.);
    }
}

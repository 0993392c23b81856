use glam::f32::Vec2;

use crate::{
    math_helpers::{distance_agent, limit_velocity, normalize_to},
    options::{Bounds, FlockOptions, SeparationGuard},
};

/// Per-agent observation of the latest tick, written by the flock only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMetadata {
    pub id: usize,
    /// agents within `neighbour_distance`
    pub n_neighbours: usize,
    /// agents within `desired_separation`
    pub n_separating: usize,
    pub acceleration: Vec2,
}

impl AgentMetadata {
    pub fn new(agent: &Agent) -> Self {
        AgentMetadata {
            id: agent.id,
            ..Default::default()
        }
    }
}

/// What the three rules produced for one agent against one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutcome {
    pub acceleration: Vec2,
    pub n_neighbours: usize,
    pub n_separating: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    // sequential id starting from 0
    pub id: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
}

impl Agent {
    /// Creates a new [`Agent`].
    pub fn new(x: f32, y: f32, velocity: Vec2, mass: f32, id: usize) -> Self {
        Agent {
            id,
            position: Vec2::new(x, y),
            velocity,
            mass,
        }
    }

    /// Creates a resting [`Agent`], the way every agent starts a run.
    pub fn at_rest(x: f32, y: f32, mass: f32, id: usize) -> Self {
        Agent::new(x, y, Vec2::ZERO, mass, id)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    /// Sums the separation, cohesion and alignment accelerations against
    /// `others`, which must be the pre-step snapshot of the whole flock.
    pub fn run_rules(&self, others: &[Agent], options: &FlockOptions) -> RuleOutcome {
        let (separation, n_separating) = self.separation(others, options);
        let (cohesion, n_neighbours) = self.cohesion(others, options);
        let (alignment, _) = self.alignment(others, options);

        RuleOutcome {
            acceleration: separation + cohesion + alignment,
            n_neighbours,
            n_separating,
        }
    }

    /// Agents strictly closer than `threshold`, excluding anything at distance zero
    /// (itself, and co-located agents which have no direction to act along).
    fn within<'a>(
        &'a self,
        others: &'a [Agent],
        threshold: f32,
    ) -> impl Iterator<Item = (&'a Agent, f32)> + 'a {
        others
            .iter()
            .map(move |other| (other, distance_agent(self, other)))
            .filter(move |(_, distance)| *distance > 0. && *distance < threshold)
    }

    /// Converts a desired velocity into an acceleration for this agent.
    fn steer(&self, desired: Vec2, weight: f32) -> Vec2 {
        (desired - self.velocity) / self.mass * weight
    }

    pub fn separation(&self, others: &[Agent], options: &FlockOptions) -> (Vec2, usize) {
        let mut steer = Vec2::ZERO;
        let mut count = 0;

        for (other, distance) in self.within(others, options.desired_separation) {
            // closer neighbours push harder
            if let Some(away) = normalize_to(self.position - other.position, 1.) {
                steer += away / distance;
                count += 1;
            }
        }

        if count == 0 {
            return (Vec2::ZERO, 0);
        }

        steer /= count as f32;

        let guard_passed = match options.separation_guard {
            SeparationGuard::NonZero => steer != Vec2::ZERO,
            SeparationGuard::BothAxes => steer.x * steer.y != 0.,
        };
        if !guard_passed {
            return (Vec2::ZERO, count);
        }

        match normalize_to(steer, options.max_speed) {
            Some(desired) => (self.steer(desired, options.separation_weight), count),
            None => (Vec2::ZERO, count),
        }
    }

    pub fn cohesion(&self, others: &[Agent], options: &FlockOptions) -> (Vec2, usize) {
        let mut center = Vec2::ZERO;
        let mut count = 0;

        for (other, _) in self.within(others, options.neighbour_distance) {
            center += other.position;
            count += 1;
        }

        if count == 0 {
            return (Vec2::ZERO, 0);
        }

        center /= count as f32;

        // too crowded here, head away from the local centre instead
        let sign = if count > options.desired_neighbours as usize {
            -1.
        } else {
            1.
        };

        match normalize_to((center - self.position) * sign, options.max_speed) {
            Some(desired) => (self.steer(desired, options.cohesion_weight), count),
            None => (Vec2::ZERO, count),
        }
    }

    pub fn alignment(&self, others: &[Agent], options: &FlockOptions) -> (Vec2, usize) {
        let mut avg = Vec2::ZERO;
        let mut count = 0;

        for (other, _) in self.within(others, options.neighbour_distance) {
            avg += other.velocity;
            count += 1;
        }

        if count == 0 {
            return (Vec2::ZERO, 0);
        }

        avg /= count as f32;

        match normalize_to(avg, options.max_speed) {
            Some(desired) => (self.steer(desired, options.alignment_weight), count),
            None => (Vec2::ZERO, count),
        }
    }

    // Actually shifts the agent, one unit of time
    pub fn update_location(&mut self, acceleration: Vec2, options: &FlockOptions) {
        self.velocity = limit_velocity(self.velocity + acceleration, options);
        self.position += self.velocity;

        self.boundaries(options)
    }

    /// Per axis, whether the extent `[position, position + size]` sticks out of the domain.
    pub fn outside(&self, options: &FlockOptions) -> (bool, bool) {
        let Bounds { width, height } = options.bounds;
        let far = self.position + Vec2::splat(options.size);

        (
            self.position.x < 0. || far.x > width,
            self.position.y < 0. || far.y > height,
        )
    }

    fn boundaries(&mut self, options: &FlockOptions) {
        let (outside_x, outside_y) = self.outside(options);

        // flip and step back once on every axis whose extent left the domain
        if outside_x {
            self.velocity.x = -self.velocity.x;
            self.position.x += self.velocity.x;
        }

        if outside_y {
            self.velocity.y = -self.velocity.y;
            self.position.y += self.velocity.y;
        }
    }
}

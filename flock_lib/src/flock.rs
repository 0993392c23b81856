use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::{debug, error, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::agent::{Agent, AgentMetadata, RuleOutcome};
use crate::options::{Bounds, FlockOptions, OptionsError};

#[derive(Debug, Error, PartialEq)]
pub enum FlockError {
    #[error("invalid flock options: {0}")]
    Options(#[from] OptionsError),
    #[error("agent {id} has a non-finite position or velocity")]
    NonFiniteAgent { id: usize },
    #[error("agent {id} has mass {mass}, mass must be finite and positive")]
    InvalidAgentMass { id: usize, mass: f32 },
}

/// Owns every agent of one run and advances them together, one tick per [`Flock::step`].
///
/// Rules always read the flock as it was before the tick started: accelerations
/// for all agents are collected into a scratch buffer first, and only then
/// committed.
pub struct Flock {
    agents: Vec<Agent>,
    metadata: Vec<AgentMetadata>,
    options: FlockOptions,
    outcomes: Vec<RuleOutcome>,
    tick: u64,
}

impl Flock {
    /// Places `no_agents` resting agents uniformly inside the bounds, minus the margin.
    pub fn new<R: Rng + ?Sized>(
        options: FlockOptions,
        no_agents: usize,
        rng: &mut R,
    ) -> Result<Self, FlockError> {
        options.validate()?;

        let agents = (0..no_agents)
            .map(|id| get_agent(&options, id, rng))
            .collect();

        debug!(no_agents, "flock created");
        Ok(Flock::assemble(options, agents))
    }

    /// Same as [`Flock::new`], with a reproducible generator.
    pub fn from_seed(
        options: FlockOptions,
        no_agents: usize,
        seed: u64,
    ) -> Result<Self, FlockError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        Flock::new(options, no_agents, &mut rng)
    }

    /// Takes explicit starting states. Agents are re-identified by their index.
    pub fn from_agents(options: FlockOptions, agents: Vec<Agent>) -> Result<Self, FlockError> {
        options.validate()?;

        let mut agents = agents;
        for (id, agent) in agents.iter_mut().enumerate() {
            agent.id = id;

            if !agent.is_finite() {
                return Err(FlockError::NonFiniteAgent { id });
            }
            if !(agent.mass.is_finite() && agent.mass > 0.) {
                return Err(FlockError::InvalidAgentMass {
                    id,
                    mass: agent.mass,
                });
            }

            if agent.outside(&options) != (false, false) {
                let (x, y) = (agent.position.x, agent.position.y);
                warn!(id, x, y, "agent starts outside the bounds");
            }
        }

        debug!(no_agents = agents.len(), "flock created from explicit agents");
        Ok(Flock::assemble(options, agents))
    }

    fn assemble(options: FlockOptions, agents: Vec<Agent>) -> Self {
        Flock {
            metadata: agents.iter().map(AgentMetadata::new).collect(),
            outcomes: Vec::with_capacity(agents.len()),
            agents,
            options,
            tick: 0,
        }
    }

    /// Advances every agent by one unit of simulated time.
    pub fn step(&mut self) {
        self.tick += 1;
        if self.agents.is_empty() {
            return;
        }

        // calculation loop, reads the snapshot only
        self.calculate_outcomes();

        // update loop
        let options = &self.options;
        for ((agent, meta), outcome) in self
            .agents
            .iter_mut()
            .zip(self.metadata.iter_mut())
            .zip(self.outcomes.iter())
        {
            agent.update_location(outcome.acceleration, options);

            meta.id = agent.id;
            meta.n_neighbours = outcome.n_neighbours;
            meta.n_separating = outcome.n_separating;
            meta.acceleration = outcome.acceleration;

            debug_assert!(agent.is_finite(), "agent {} left finite state", agent.id);
            if !agent.is_finite() {
                error!(tick = self.tick, id = agent.id, "non-finite agent state after step");
            }
        }

        trace!(tick = self.tick, no_agents = self.agents.len(), "step done");
    }

    fn calculate_outcomes(&mut self) {
        let snapshot = &self.agents;
        let options = &self.options;

        #[cfg(feature = "parallel")]
        if options.parallel {
            snapshot
                .par_iter()
                .map(|agent| agent.run_rules(snapshot, options))
                .collect_into_vec(&mut self.outcomes);
            return;
        }

        self.outcomes.clear();
        self.outcomes.extend(
            snapshot
                .iter()
                .map(|agent| agent.run_rules(snapshot, options)),
        );
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn metadata(&self) -> &[AgentMetadata] {
        &self.metadata
    }

    /// Read-only pairing of every agent with what the last tick observed about it.
    pub fn view(&self) -> impl Iterator<Item = (&Agent, &AgentMetadata)> + '_ {
        self.agents.iter().zip(self.metadata.iter())
    }

    pub fn options(&self) -> &FlockOptions {
        &self.options
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn get_agent<R: Rng + ?Sized>(options: &FlockOptions, id: usize, rng: &mut R) -> Agent {
    let Bounds { width, height } = options.bounds;

    // x in [margin, width - margin)
    let x = rng.gen_range(options.margin..width - options.margin);
    // y in [margin, height - margin)
    let y = rng.gen_range(options.margin..height - options.margin);

    Agent::at_rest(x, y, options.mass, id)
}

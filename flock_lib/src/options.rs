use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected flock configuration, one variant per violated constraint.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum OptionsError {
    #[error("max_speed must be finite and positive, got {0}")]
    InvalidMaxSpeed(f32),
    #[error("neighbour_distance must be finite and non-negative, got {0}")]
    InvalidNeighbourDistance(f32),
    #[error("desired_separation must be finite and non-negative, got {0}")]
    InvalidDesiredSeparation(f32),
    #[error("{rule} weight must be finite and non-negative, got {value}")]
    InvalidWeight { rule: &'static str, value: f32 },
    #[error("mass must be finite and positive, got {0}")]
    InvalidMass(f32),
    #[error("agent size must be finite and non-negative, got {0}")]
    InvalidSize(f32),
    #[error("bounds must be finite and positive, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },
    #[error("placement margin {margin} leaves no room inside {width}x{height}")]
    InvalidMargin { margin: f32, width: f32, height: f32 },
    #[error("unknown {kind} `{value}`")]
    UnknownMode { kind: &'static str, value: String },
}

/// How the integrated velocity is capped.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
// {"type": "Magnitude"}
pub enum SpeedLimit {
    /// caps the vector length, which also bounds each component symmetrically
    Magnitude,
    /// caps each component from above only, leaving large negative components untouched
    AxisUpper,
}

impl FromStr for SpeedLimit {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "magnitude" => Ok(SpeedLimit::Magnitude),
            "axis_upper" | "axisupper" => Ok(SpeedLimit::AxisUpper),
            _ => Err(OptionsError::UnknownMode {
                kind: "speed limit",
                value: s.to_owned(),
            }),
        }
    }
}

/// When an averaged separation vector is strong enough to steer by.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SeparationGuard {
    /// any non-zero vector
    NonZero,
    /// both components non-zero, a purely horizontal or vertical push is dropped
    BothAxes,
}

impl FromStr for SeparationGuard {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "non_zero" | "nonzero" => Ok(SeparationGuard::NonZero),
            "both_axes" | "bothaxes" => Ok(SeparationGuard::BothAxes),
            _ => Err(OptionsError::UnknownMode {
                kind: "separation guard",
                value: s.to_owned(),
            }),
        }
    }
}

/// Rectangular domain spanning `[0, width] x [0, height]`.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Bounds { width, height }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlockOptions {
    pub max_speed: f32,
    pub neighbour_distance: f32,
    pub desired_separation: f32,
    /// neighbour count above which cohesion pushes away from the local centre
    pub desired_neighbours: u32,

    pub separation_weight: f32,
    pub cohesion_weight: f32,
    pub alignment_weight: f32,

    /// divisor applied to every rule acceleration, uniform across the flock
    pub mass: f32,
    /// edge length of the agent's square extent `[position, position + size]`,
    /// used for boundary reflection
    pub size: f32,
    pub bounds: Bounds,
    /// distance from the edges kept free when agents are placed at random
    pub margin: f32,

    pub speed_limit: SpeedLimit,
    pub separation_guard: SeparationGuard,

    /// computes accelerations on the rayon pool when the `parallel` feature is on
    pub parallel: bool,
}

impl FlockOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        self.validate_motion()?;
        self.validate_rules()?;
        self.validate_domain()
    }

    fn validate_motion(&self) -> Result<(), OptionsError> {
        if !(self.max_speed.is_finite() && self.max_speed > 0.) {
            return Err(OptionsError::InvalidMaxSpeed(self.max_speed));
        }
        if !(self.mass.is_finite() && self.mass > 0.) {
            return Err(OptionsError::InvalidMass(self.mass));
        }
        Ok(())
    }

    fn validate_rules(&self) -> Result<(), OptionsError> {
        if !is_non_negative(self.neighbour_distance) {
            return Err(OptionsError::InvalidNeighbourDistance(
                self.neighbour_distance,
            ));
        }
        if !is_non_negative(self.desired_separation) {
            return Err(OptionsError::InvalidDesiredSeparation(
                self.desired_separation,
            ));
        }

        for (rule, value) in [
            ("separation", self.separation_weight),
            ("cohesion", self.cohesion_weight),
            ("alignment", self.alignment_weight),
        ] {
            if !is_non_negative(value) {
                return Err(OptionsError::InvalidWeight { rule, value });
            }
        }
        Ok(())
    }

    fn validate_domain(&self) -> Result<(), OptionsError> {
        let Bounds { width, height } = self.bounds;
        if !(width.is_finite() && height.is_finite() && width > 0. && height > 0.) {
            return Err(OptionsError::InvalidBounds { width, height });
        }
        if !is_non_negative(self.size) || self.size >= width.min(height) {
            return Err(OptionsError::InvalidSize(self.size));
        }
        if !is_non_negative(self.margin)
            || 2. * self.margin >= width
            || 2. * self.margin >= height
        {
            return Err(OptionsError::InvalidMargin {
                margin: self.margin,
                width,
                height,
            });
        }
        Ok(())
    }
}

fn is_non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.
}

impl Default for FlockOptions {
    fn default() -> Self {
        let max_speed = 30.;
        let neighbour_distance = 500.;
        let desired_separation = 100.;
        let desired_neighbours = 20;

        let separation_weight = 1.0;
        let cohesion_weight = 1.0;
        let alignment_weight = 1.0;

        FlockOptions {
            max_speed,
            neighbour_distance,
            desired_separation,
            desired_neighbours,
            separation_weight,
            cohesion_weight,
            alignment_weight,
            mass: 5.,
            size: 20.,
            bounds: Bounds::new(1000., 1000.),
            margin: 20.,
            speed_limit: SpeedLimit::Magnitude,
            // speed_limit: SpeedLimit::AxisUpper,
            separation_guard: SeparationGuard::NonZero,
            parallel: false,
        }
    }
}

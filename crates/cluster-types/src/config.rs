// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{ClusterError, ClusterResult};
use crate::material::Material;
use crate::reactor::NuclearReactor;
use crate::state::ClusterState;
use crate::validate;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens to a proposal that would drive a concentration below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativePolicy {
    /// Reject: shrink the step, and fail the run once retries are exhausted.
    #[default]
    Strict,
    /// Clamp to zero once retries are exhausted, counting every clamp.
    ClampToZero,
}

/// Treatment of clusters growing past the largest tracked size N.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Growth out of N leaves the system and is reported as outflow.
    #[default]
    Discard,
    /// Bin N absorbs everything at or above N.
    Accumulate,
}

/// Explicit time-integration scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    #[default]
    ForwardEuler,
    /// Two-stage trapezoidal predictor-corrector.
    Heun,
}

/// Step-size control of the rate-equation integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    #[serde(default)]
    pub scheme: Scheme,
    /// First trial step [s] (default: 1e-12)
    #[serde(default = "default_initial_step")]
    pub initial_step: f64,
    /// Smallest step before a run is declared divergent [s] (default: 1e-30)
    #[serde(default = "default_min_step")]
    pub min_step: f64,
    /// Largest step ever taken [s] (default: 1e20)
    #[serde(default = "default_max_step")]
    pub max_step: f64,
    /// Largest accepted |ΔC| relative to max(C, absolute_tolerance) (default: 0.5)
    #[serde(default = "default_max_relative_change")]
    pub max_relative_change: f64,
    /// Concentration floor of the relative-change test [cm⁻³] (default: 10)
    #[serde(default = "default_absolute_tolerance")]
    pub absolute_tolerance: f64,
    /// Fraction of the inverse fastest loss rate used as step ceiling (default: 0.5)
    #[serde(default = "default_stiffness_safety")]
    pub stiffness_safety: f64,
    /// Step growth after a clean acceptance (default: 2.0)
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
    /// Halvings allowed per step (default: 40)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Accepted steps allowed per `run` call (default: 5000)
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub boundary: BoundaryPolicy,
    #[serde(default)]
    pub negative_policy: NegativePolicy,
}

fn default_initial_step() -> f64 {
    1e-12
}
fn default_min_step() -> f64 {
    1e-30
}
fn default_max_step() -> f64 {
    1e20
}
fn default_max_relative_change() -> f64 {
    0.5
}
fn default_absolute_tolerance() -> f64 {
    10.0
}
fn default_stiffness_safety() -> f64 {
    0.5
}
fn default_growth_factor() -> f64 {
    2.0
}
fn default_max_retries() -> usize {
    40
}
fn default_max_steps() -> usize {
    5000
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        IntegratorConfig {
            scheme: Scheme::default(),
            initial_step: default_initial_step(),
            min_step: default_min_step(),
            max_step: default_max_step(),
            max_relative_change: default_max_relative_change(),
            absolute_tolerance: default_absolute_tolerance(),
            stiffness_safety: default_stiffness_safety(),
            growth_factor: default_growth_factor(),
            max_retries: default_max_retries(),
            max_steps: default_max_steps(),
            boundary: BoundaryPolicy::default(),
            negative_policy: NegativePolicy::default(),
        }
    }
}

impl IntegratorConfig {
    pub fn validate(&self) -> ClusterResult<()> {
        validate::positive("initial_step", self.initial_step)?;
        validate::positive("min_step", self.min_step)?;
        validate::positive("max_step", self.max_step)?;
        if self.min_step > self.max_step {
            return Err(ClusterError::invalid(
                "min_step",
                format!("{} exceeds max_step {}", self.min_step, self.max_step),
            ));
        }
        validate::positive("max_relative_change", self.max_relative_change)?;
        validate::positive("absolute_tolerance", self.absolute_tolerance)?;
        validate::positive("stiffness_safety", self.stiffness_safety)?;
        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(ClusterError::invalid(
                "growth_factor",
                format!("must be finite and >= 1, got {}", self.growth_factor),
            ));
        }
        if self.max_steps == 0 {
            return Err(ClusterError::invalid("max_steps", "must be at least 1"));
        }
        Ok(())
    }
}

/// Optional starting population. Profiles shorter than N are zero-padded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialProfile {
    #[serde(default)]
    pub interstitials: Vec<f64>,
    #[serde(default)]
    pub vacancies: Vec<f64>,
    /// Overrides the material's initial dislocation density [cm⁻²].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislocation_density: Option<f64>,
}

impl InitialProfile {
    /// Build a state with `max_cluster_size` tracked sizes.
    pub fn to_state(
        &self,
        max_cluster_size: usize,
        default_dislocation_density: f64,
    ) -> ClusterResult<ClusterState> {
        let pad = |values: &[f64]| -> ClusterResult<Array1<f64>> {
            if values.len() > max_cluster_size {
                return Err(ClusterError::ShapeMismatch {
                    expected: max_cluster_size,
                    found: values.len(),
                });
            }
            let mut out = Array1::zeros(max_cluster_size);
            for (slot, &value) in out.iter_mut().zip(values) {
                *slot = value;
            }
            Ok(out)
        };
        ClusterState::from_profile(
            pad(&self.interstitials)?,
            pad(&self.vacancies)?,
            self.dislocation_density
                .unwrap_or(default_dislocation_density),
        )
    }
}

fn default_max_cluster_size() -> usize {
    100
}

/// Complete description of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_max_cluster_size")]
    pub max_cluster_size: usize,
    pub material: Material,
    pub reactor: NuclearReactor,
    #[serde(default)]
    pub integrator: IntegratorConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<InitialProfile>,
}

impl SimulationConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> ClusterResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> ClusterResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> ClusterResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ClusterResult<()> {
        self.integrator.validate()?;
        if self.max_cluster_size < crate::constants::MIN_CLUSTER_SIZES {
            return Err(ClusterError::invalid(
                "max_cluster_size",
                format!(
                    "must be >= {}, got {}",
                    crate::constants::MIN_CLUSTER_SIZES,
                    self.max_cluster_size
                ),
            ));
        }
        Ok(())
    }

    /// Starting state: the configured profile, or an empty population with
    /// the material's dislocation density.
    pub fn initial_state(&self) -> ClusterResult<ClusterState> {
        let rho0 = self.material.initial_dislocation_density();
        let state = match &self.initial {
            Some(profile) => profile.to_state(self.max_cluster_size, rho0)?,
            None => ClusterState::new(self.max_cluster_size, rho0)?,
        };
        Ok(state.with_policy(self.integrator.negative_policy))
    }
}

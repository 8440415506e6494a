// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Simulation Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `ClusterDynamics`: one simulation run over a material and reactor.

use crate::coefficients::RateCoefficients;
use crate::integrator::{Diagnostics, Integrator, StepResult};
use crate::rates::{self, MassBalance, Populations};
use cluster_types::config::{IntegratorConfig, SimulationConfig};
use cluster_types::error::{ClusterError, ClusterResult};
use cluster_types::material::Material;
use cluster_types::reactor::NuclearReactor;
use cluster_types::state::{ClusterState, Species};
use serde::{Deserialize, Serialize};

/// Dislocation density recorded after an accepted step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DislocationSample {
    /// Simulation time [s].
    pub time: f64,
    /// Network dislocation density [cm⁻²].
    pub density: f64,
}

/// Summary of one `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub start_time: f64,
    pub end_time: f64,
    pub steps: usize,
    pub rejected: usize,
    pub clamped: usize,
    pub dislocation_density: f64,
    /// Accumulated dose at the end of the run [dpa].
    pub dpa: f64,
}

/// Cluster dynamics simulation: material, reactor, state and integrator.
#[derive(Debug, Clone)]
pub struct ClusterDynamics {
    material: Material,
    reactor: NuclearReactor,
    state: ClusterState,
    integrator: Integrator,
    history: Vec<DislocationSample>,
    dpa: f64,
}

impl ClusterDynamics {
    /// Empty population with `max_cluster_size` tracked sizes, starting from
    /// the material's dislocation density.
    pub fn new(
        max_cluster_size: usize,
        material: Material,
        reactor: NuclearReactor,
        config: IntegratorConfig,
    ) -> ClusterResult<Self> {
        let state = ClusterState::new(max_cluster_size, material.initial_dislocation_density())?;
        Self::with_initial_state(state, material, reactor, config)
    }

    /// Start from an explicit state. The state adopts the configured
    /// negative-value policy.
    pub fn with_initial_state(
        state: ClusterState,
        material: Material,
        reactor: NuclearReactor,
        config: IntegratorConfig,
    ) -> ClusterResult<Self> {
        let state = state.with_policy(config.negative_policy);
        let integrator = Integrator::new(config, state.max_cluster_size())?;
        let history = vec![DislocationSample {
            time: state.time(),
            density: state.dislocation_density(),
        }];
        Ok(ClusterDynamics {
            material,
            reactor,
            state,
            integrator,
            history,
            dpa: 0.0,
        })
    }

    pub fn from_config(config: &SimulationConfig) -> ClusterResult<Self> {
        config.validate()?;
        Self::with_initial_state(
            config.initial_state()?,
            config.material.clone(),
            config.reactor.clone(),
            config.integrator.clone(),
        )
    }

    /// Advance the simulation by `duration` seconds.
    ///
    /// The final step is shortened to land exactly on `start + duration`.
    /// Repeated calls resume where the previous one stopped. A run that
    /// needs more than `max_steps` accepted steps stops with
    /// `StepLimitExceeded`, keeping the progress made so far.
    pub fn run(&mut self, duration: f64) -> ClusterResult<RunSummary> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(ClusterError::InvalidDuration(duration));
        }
        let start_time = self.state.time();
        let end = start_time + duration;
        tracing::info!(
            start_time,
            duration,
            flux = self.reactor.flux(),
            temperature = self.reactor.temperature(),
            "starting cluster dynamics run"
        );

        let mut steps = 0usize;
        let mut rejected = 0usize;
        let mut clamped = 0usize;
        let max_steps = self.integrator.config().max_steps;
        while self.state.time() < end {
            if steps >= max_steps {
                tracing::error!(
                    steps,
                    time = self.state.time(),
                    target = end,
                    "step limit reached"
                );
                return Err(ClusterError::StepLimitExceeded {
                    steps,
                    time: self.state.time(),
                    target: end,
                });
            }
            let result = self.step(end)?;
            steps += 1;
            rejected += result.rejected;
            clamped += result.clamped;
        }

        let summary = RunSummary {
            start_time,
            end_time: self.state.time(),
            steps,
            rejected,
            clamped,
            dislocation_density: self.state.dislocation_density(),
            dpa: self.dpa,
        };
        tracing::info!(
            end_time = summary.end_time,
            steps,
            rejected,
            clamped,
            dislocation_density = summary.dislocation_density,
            interstitials = self.state.total(Species::Interstitial),
            vacancies = self.state.total(Species::Vacancy),
            "finished cluster dynamics run"
        );
        Ok(summary)
    }

    /// Take one accepted step towards `target` [s].
    pub fn step(&mut self, target: f64) -> ClusterResult<StepResult> {
        let result = self
            .integrator
            .step(&mut self.state, &self.material, &self.reactor, target)?;
        self.dpa += self.reactor.flux() * result.step_size;
        self.history.push(DislocationSample {
            time: result.time,
            density: self.state.dislocation_density(),
        });
        Ok(result)
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn reactor(&self) -> &NuclearReactor {
        &self.reactor
    }

    pub fn state(&self) -> &ClusterState {
        &self.state
    }

    /// Replace the material; takes effect from the next step, which starts
    /// again from the initial trial step.
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
        self.integrator.reset_step_size();
    }

    /// Replace the irradiation environment; takes effect from the next step,
    /// which starts again from the initial trial step.
    pub fn set_reactor(&mut self, reactor: NuclearReactor) {
        self.reactor = reactor;
        self.integrator.reset_step_size();
    }

    /// Dislocation density after construction and after every accepted step.
    pub fn dislocation_density_history(&self) -> &[DislocationSample] {
        &self.history
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.integrator.diagnostics()
    }

    /// Accumulated dose [dpa].
    pub fn dpa(&self) -> f64 {
        self.dpa
    }

    /// Defect budget of the current state.
    pub fn mass_balance(&self) -> MassBalance {
        let coeffs = RateCoefficients::compute(
            &self.material,
            &self.reactor,
            &self.state,
            self.integrator.config().boundary,
        );
        rates::mass_balance(&coeffs, &Populations::from_state(&self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{osiris, sa304};
    use cluster_types::config::InitialProfile;

    fn sim(n: usize) -> ClusterDynamics {
        ClusterDynamics::new(n, sa304(), osiris(), IntegratorConfig::default()).unwrap()
    }

    #[test]
    fn test_run_lands_on_duration() {
        let mut s = sim(8);
        let summary = s.run(1e-4).unwrap();
        assert_eq!(summary.start_time, 0.0);
        assert_eq!(summary.end_time, 1e-4);
        assert_eq!(s.state().time(), 1e-4);
        assert!(summary.steps > 1);
        assert_eq!(s.diagnostics().accepted, summary.steps);
        assert_eq!(s.dislocation_density_history().len(), summary.steps + 1);
        assert!(s.state().total(Species::Interstitial) > 0.0);
        assert!(s.state().total(Species::Vacancy) > 0.0);
    }

    #[test]
    fn test_run_resumes() {
        let mut s = sim(6);
        s.run(2e-5).unwrap();
        let second = s.run(3e-5).unwrap();
        assert_eq!(second.start_time, 2e-5);
        assert!((second.end_time - 5e-5).abs() < 1e-18);
    }

    #[test]
    fn test_zero_duration_is_noop() {
        let mut s = sim(4);
        let summary = s.run(0.0).unwrap();
        assert_eq!(summary.steps, 0);
        assert_eq!(s.state().time(), 0.0);
    }

    #[test]
    fn test_invalid_duration() {
        let mut s = sim(4);
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(s.run(bad), Err(ClusterError::InvalidDuration(_))));
        }
        assert_eq!(s.state().time(), 0.0);
    }

    #[test]
    fn test_dpa_accumulates_flux_times_time() {
        let mut s = sim(4);
        s.run(1e-4).unwrap();
        let expected = osiris().flux() * 1e-4;
        assert!((s.dpa() - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn test_set_reactor_changes_dose_rate() {
        let mut s = sim(4);
        s.set_reactor(osiris().with_flux(0.0).unwrap());
        s.run(1e-5).unwrap();
        assert_eq!(s.dpa(), 0.0);
        assert_eq!(s.state().total(Species::Interstitial), 0.0);
        assert_eq!(s.reactor().flux(), 0.0);
    }

    #[test]
    fn test_step_limit_stops_run() {
        let config = IntegratorConfig {
            max_steps: 10,
            ..IntegratorConfig::default()
        };
        let mut s = ClusterDynamics::new(6, sa304(), osiris(), config).unwrap();
        match s.run(1e-3) {
            Err(ClusterError::StepLimitExceeded { steps, time, target }) => {
                assert_eq!(steps, 10);
                assert_eq!(target, 1e-3);
                assert_eq!(time, s.state().time());
                assert!(time > 0.0 && time < 1e-3);
            }
            other => panic!("Unexpected result: {other:?}"),
        }
        assert_eq!(s.diagnostics().accepted, 10);
        assert_eq!(s.dislocation_density_history().len(), 11);
    }

    #[test]
    fn test_unresolvable_step_fails_instead_of_stalling() {
        let mut s = sim(4);
        s.set_reactor(osiris().with_flux(0.0).unwrap());
        s.run(1e12).unwrap();
        assert_eq!(s.state().time(), 1e12);

        // Production from an empty population needs steps far below the
        // spacing of representable times near 1e12 s.
        s.set_reactor(osiris());
        let history = s.dislocation_density_history().len();
        match s.run(1.0) {
            Err(ClusterError::StepDivergence { time, .. }) => assert_eq!(time, 1e12),
            other => panic!("Unexpected result: {other:?}"),
        }
        assert_eq!(s.state().time(), 1e12);
        assert_eq!(s.state().total(Species::Interstitial), 0.0);
        assert_eq!(s.dislocation_density_history().len(), history);
        assert_eq!(s.dpa(), 0.0);
    }

    #[test]
    fn test_reactor_swap_after_quiet_phase() {
        let mut s = sim(6);
        s.set_reactor(osiris().with_flux(0.0).unwrap());
        s.run(0.1).unwrap();
        assert!(s.diagnostics().largest_step().unwrap() > 1e-3);

        s.set_reactor(osiris());
        s.run(1e-4).unwrap();
        assert!((s.state().time() - (0.1 + 1e-4)).abs() < 1e-15);
        assert!(s.state().total(Species::Interstitial) > 0.0);
        assert!(s.state().total(Species::Vacancy) > 0.0);
    }

    #[test]
    fn test_from_config_uses_initial_profile() {
        let mut config = crate::test_support::config(6);
        config.initial = Some(InitialProfile {
            interstitials: vec![1e10],
            vacancies: vec![2e10, 1e9],
            dislocation_density: Some(5e9),
        });
        let s = ClusterDynamics::from_config(&config).unwrap();
        assert_eq!(s.state().get(Species::Vacancy, 2).unwrap(), 1e9);
        assert_eq!(s.state().dislocation_density(), 5e9);
        assert_eq!(s.dislocation_density_history()[0].density, 5e9);
    }

    #[test]
    fn test_mass_balance_reports_production() {
        let s = sim(6);
        let b = s.mass_balance();
        assert!(b.interstitial.production > 0.0);
        assert_eq!(b.interstitial.recombination, 0.0);
        assert_eq!(b.interstitial.net(), b.interstitial.production);
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Rate-Equation Integrator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Explicit time stepping with adaptive step-size control.
//!
//! Each step computes the coefficient table once, bounds the step by the
//! stiffness of the system, by the current rates of change and by the
//! remaining time, then halves the step until the proposal is finite,
//! non-negative and changes no concentration by more than
//! `max_relative_change · max(C, absolute_tolerance)`.

use crate::coefficients::RateCoefficients;
use crate::rates::{self, Derivatives, Populations};
use cluster_types::config::{IntegratorConfig, NegativePolicy, Scheme};
use cluster_types::error::{ClusterError, ClusterResult};
use cluster_types::material::Material;
use cluster_types::reactor::NuclearReactor;
use cluster_types::state::{ClusterState, Species};
use ndarray::{Array1, Zip};
use std::fmt;

/// Why a proposal was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    NonFinite,
    Negative,
    ExcessiveChange,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViolationKind::NonFinite => "non-finite value",
            ViolationKind::Negative => "negative value",
            ViolationKind::ExcessiveChange => "excessive change",
        })
    }
}

/// First offending quantity of a rejected proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    /// `None` for the dislocation density.
    pub species: Option<Species>,
    pub size: usize,
    pub value: f64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.species {
            Some(species) => write!(
                f,
                "{} for {species} size {} ({:e})",
                self.kind, self.size, self.value
            ),
            None => write!(f, "{} for dislocation density ({:e})", self.kind, self.value),
        }
    }
}

/// Outcome of one integration attempt. The proposal itself stays in the
/// integrator's scratch buffers until the next attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepAttempt {
    pub step_size: f64,
    pub violation: Option<Violation>,
    /// True when negative values are the only violations, so the proposal
    /// may be clamped.
    pub clampable: bool,
}

impl StepAttempt {
    pub fn is_acceptable(&self) -> bool {
        self.violation.is_none()
    }
}

/// Result of one accepted step. The state has already been updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// Simulation time after the step [s].
    pub time: f64,
    pub step_size: f64,
    pub accepted: bool,
    /// Attempts rejected before acceptance.
    pub rejected: usize,
    /// Values clamped to zero in this step.
    pub clamped: usize,
}

/// Counters accumulated over the integrator's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub step_sizes: Vec<f64>,
    pub accepted: usize,
    pub rejected: usize,
    pub clamped: usize,
    /// Interstitials carried past the largest tracked size [cm⁻³].
    pub interstitial_outflow: f64,
    /// Vacancies carried past the largest tracked size [cm⁻³].
    pub vacancy_outflow: f64,
}

impl Diagnostics {
    pub fn outflow(&self, species: Species) -> f64 {
        match species {
            Species::Interstitial => self.interstitial_outflow,
            Species::Vacancy => self.vacancy_outflow,
        }
    }

    pub fn smallest_step(&self) -> Option<f64> {
        self.step_sizes.iter().copied().reduce(f64::min)
    }

    pub fn largest_step(&self) -> Option<f64> {
        self.step_sizes.iter().copied().reduce(f64::max)
    }
}

/// Adaptive explicit integrator of the cluster rate equations.
#[derive(Debug, Clone)]
pub struct Integrator {
    config: IntegratorConfig,
    next_dt: f64,
    k1: Derivatives,
    k2: Derivatives,
    proposal_i: Array1<f64>,
    proposal_v: Array1<f64>,
    proposal_rho: f64,
    diagnostics: Diagnostics,
}

impl Integrator {
    pub fn new(config: IntegratorConfig, max_cluster_size: usize) -> ClusterResult<Self> {
        config.validate()?;
        Ok(Integrator {
            next_dt: config.initial_step,
            config,
            k1: Derivatives::zeros(max_cluster_size),
            k2: Derivatives::zeros(max_cluster_size),
            proposal_i: Array1::zeros(max_cluster_size),
            proposal_v: Array1::zeros(max_cluster_size),
            proposal_rho: 0.0,
            diagnostics: Diagnostics::default(),
        })
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Trial step size the controller will start the next step with [s].
    pub fn next_step_size(&self) -> f64 {
        self.next_dt
    }

    /// Restart the controller from `initial_step`, e.g. after the material
    /// or the irradiation conditions change.
    pub fn reset_step_size(&mut self) {
        self.next_dt = self.config.initial_step;
    }

    /// Concentrations of the most recent attempt.
    pub fn proposal(&self, species: Species) -> &Array1<f64> {
        match species {
            Species::Interstitial => &self.proposal_i,
            Species::Vacancy => &self.proposal_v,
        }
    }

    pub fn proposed_dislocation_density(&self) -> f64 {
        self.proposal_rho
    }

    /// Integrate `state` over `dt` with frozen `coeffs` into the scratch
    /// buffers and check the result. Nothing is committed.
    pub fn attempt(
        &mut self,
        state: &ClusterState,
        coeffs: &RateCoefficients,
        dt: f64,
    ) -> ClusterResult<StepAttempt> {
        let n = state.max_cluster_size();
        if self.proposal_i.len() != n {
            return Err(ClusterError::ShapeMismatch {
                expected: self.proposal_i.len(),
                found: n,
            });
        }
        let pop = Populations::from_state(state);
        rates::evaluate(coeffs, &pop, &mut self.k1);
        euler_into(&pop, &self.k1, dt, &mut self.proposal_i, &mut self.proposal_v);
        self.proposal_rho = pop.dislocation_density + dt * self.k1.dislocation_density;

        if self.config.scheme == Scheme::Heun {
            let predicted = Populations {
                interstitials: &self.proposal_i,
                vacancies: &self.proposal_v,
                dislocation_density: self.proposal_rho,
            };
            rates::evaluate(coeffs, &predicted, &mut self.k2);
            let half = 0.5 * dt;
            for species in Species::ALL {
                let target = match species {
                    Species::Interstitial => &mut self.proposal_i,
                    Species::Vacancy => &mut self.proposal_v,
                };
                Zip::from(target)
                    .and(pop.species(species))
                    .and(self.k1.species(species))
                    .and(self.k2.species(species))
                    .for_each(|out, &c, &d1, &d2| *out = c + half * (d1 + d2));
            }
            self.proposal_rho = pop.dislocation_density
                + half * (self.k1.dislocation_density + self.k2.dislocation_density);
        }

        Ok(self.check(&pop, dt))
    }

    fn check(&self, before: &Populations<'_>, dt: f64) -> StepAttempt {
        let mut non_finite = None;
        let mut negative = None;
        let mut excessive = None;
        let limit = self.config.max_relative_change;
        let floor = self.config.absolute_tolerance;

        for species in Species::ALL {
            let proposed = self.proposal(species);
            for (idx, (&new, &old)) in proposed.iter().zip(before.species(species)).enumerate() {
                let found = |kind| Violation {
                    kind,
                    species: Some(species),
                    size: idx + 1,
                    value: new,
                };
                if !new.is_finite() {
                    non_finite.get_or_insert(found(ViolationKind::NonFinite));
                } else if new < 0.0 {
                    negative.get_or_insert(found(ViolationKind::Negative));
                } else if (new - old).abs() > limit * old.abs().max(floor) {
                    excessive.get_or_insert(found(ViolationKind::ExcessiveChange));
                }
            }
        }
        let rho = self.proposal_rho;
        let found = |kind| Violation {
            kind,
            species: None,
            size: 0,
            value: rho,
        };
        if !rho.is_finite() {
            non_finite.get_or_insert(found(ViolationKind::NonFinite));
        } else if rho < 0.0 {
            negative.get_or_insert(found(ViolationKind::Negative));
        }

        StepAttempt {
            step_size: dt,
            clampable: non_finite.is_none() && excessive.is_none(),
            violation: non_finite.or(negative).or(excessive),
        }
    }

    /// Advance `state` by one accepted step towards `t_target`.
    ///
    /// The step never passes `t_target`; a step shortened to land on it ends
    /// exactly there. On `StepDivergence` the state is left untouched.
    pub fn step(
        &mut self,
        state: &mut ClusterState,
        material: &Material,
        reactor: &NuclearReactor,
        t_target: f64,
    ) -> ClusterResult<StepResult> {
        let t0 = state.time();
        if !t_target.is_finite() || t_target <= t0 {
            return Err(ClusterError::invalid(
                "t_target",
                format!("must be finite and > {t0}, got {t_target}"),
            ));
        }

        let coeffs = RateCoefficients::compute(material, reactor, state, self.config.boundary);
        let pop = Populations::from_state(state);
        let l_max = rates::max_loss_rate(&coeffs, &pop);
        let balance = rates::mass_balance(&coeffs, &pop);

        let controller_dt = self.next_dt.min(self.config.max_step);
        let stiffness_dt = if l_max > 0.0 {
            self.config.stiffness_safety / l_max
        } else {
            f64::INFINITY
        };
        rates::evaluate(&coeffs, &pop, &mut self.k1);
        let change_dt = change_limited_step(
            &pop,
            &self.k1,
            self.config.max_relative_change,
            self.config.absolute_tolerance,
        );
        let remaining = t_target - t0;
        let mut dt = controller_dt.min(stiffness_dt).min(change_dt);
        let mut clipped = false;
        if remaining <= dt {
            dt = remaining;
            clipped = true;
        }

        let mut rejected = 0usize;
        let accepted = loop {
            let attempt = self.attempt(state, &coeffs, dt)?;
            let Some(violation) = attempt.violation else {
                break attempt;
            };
            let exhausted = rejected >= self.config.max_retries || 0.5 * dt < self.config.min_step;
            if exhausted {
                if attempt.clampable && state.policy() == NegativePolicy::ClampToZero {
                    tracing::warn!(
                        time = t0,
                        dt,
                        %violation,
                        "retries exhausted, clamping negative concentrations"
                    );
                    break attempt;
                }
                self.diagnostics.rejected += rejected + 1;
                tracing::error!(
                    time = t0,
                    dt,
                    attempts = rejected + 1,
                    %violation,
                    "step diverged"
                );
                return Err(ClusterError::StepDivergence {
                    time: t0,
                    attempts: rejected + 1,
                    step_size: dt,
                    reason: violation.to_string(),
                });
            }
            tracing::debug!(time = t0, dt, %violation, "rejected step proposal");
            rejected += 1;
            dt *= 0.5;
            clipped = false;
        };

        let new_time = if clipped {
            t_target
        } else {
            (t0 + accepted.step_size).min(t_target)
        };
        if new_time <= t0 {
            self.diagnostics.rejected += rejected;
            tracing::error!(time = t0, dt, "step below the time resolution");
            return Err(ClusterError::StepDivergence {
                time: t0,
                attempts: rejected + 1,
                step_size: dt,
                reason: format!("step of {dt:e} s does not advance time {t0:e} s"),
            });
        }
        let clamped = state.commit(
            &self.proposal_i,
            &self.proposal_v,
            self.proposal_rho,
            new_time,
        )?;

        self.next_dt = if rejected > 0 {
            dt
        } else if clipped {
            controller_dt
        } else {
            (dt * self.config.growth_factor).min(self.config.max_step)
        };

        self.diagnostics.step_sizes.push(dt);
        self.diagnostics.accepted += 1;
        self.diagnostics.rejected += rejected;
        self.diagnostics.clamped += clamped;
        self.diagnostics.interstitial_outflow += dt * balance.interstitial.boundary_loss;
        self.diagnostics.vacancy_outflow += dt * balance.vacancy.boundary_loss;

        tracing::debug!(time = new_time, dt, rejected, "accepted step");
        Ok(StepResult {
            time: new_time,
            step_size: dt,
            accepted: true,
            rejected,
            clamped,
        })
    }
}

/// Largest step over which no concentration would change by more than
/// `limit · max(C, floor)` at its current rate.
fn change_limited_step(pop: &Populations<'_>, rate: &Derivatives, limit: f64, floor: f64) -> f64 {
    let mut dt = f64::INFINITY;
    for species in Species::ALL {
        for (&c, &d) in pop.species(species).iter().zip(rate.species(species)) {
            if d != 0.0 {
                dt = dt.min(limit * c.abs().max(floor) / d.abs());
            }
        }
    }
    dt
}

fn euler_into(
    pop: &Populations<'_>,
    rate: &Derivatives,
    dt: f64,
    out_i: &mut Array1<f64>,
    out_v: &mut Array1<f64>,
) {
    Zip::from(out_i)
        .and(pop.interstitials)
        .and(&rate.interstitials)
        .for_each(|out, &c, &d| *out = c + dt * d);
    Zip::from(out_v)
        .and(pop.vacancies)
        .and(&rate.vacancies)
        .for_each(|out, &c, &d| *out = c + dt * d);
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Rate Equations
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Right-hand side of the cluster rate equations.
//!
//! For each species s and size n:
//!
//! dC(1)/dt = G(1) − R − (k_d + k_gb)·C(1) − 2J⁺(1) − Σ_{n≥2} J⁺(n)
//!            + 2Jᵉ(2) + Σ_{n≥3} Jᵉ(n) + Jᵃ_s(2) − Σ_{n≥2} Jᵃ_p(n)
//!
//! dC(n)/dt = G(n) + (1 − P(n))·J⁺(n−1) − J⁺(n) − Jᵉ(n) + Jᵉ(n+1) − Jᵃ(n) + Jᵃ(n+1)
//!
//! with growth J⁺(n) = β(n)·C(1)·C(n), emission Jᵉ(n) = α(n)·C(n) and
//! annihilation Jᵃ_s(n) = β_p(n)·C_p(1)·C_s(n). A fraction P(n) of the
//! interstitial loops growing into size n unfaults into the network:
//!
//! dρ/dt = Σ 2π·r(n+1)·P(n+1)·J⁺_i(n) − K·φ·b²·ρ^(3/2)

use crate::coefficients::RateCoefficients;
use cluster_types::config::BoundaryPolicy;
use cluster_types::state::{ClusterState, Species};
use ndarray::Array1;
use std::f64::consts::PI;

/// Borrowed concentrations the right-hand side is evaluated at.
#[derive(Debug, Clone, Copy)]
pub struct Populations<'a> {
    pub interstitials: &'a Array1<f64>,
    pub vacancies: &'a Array1<f64>,
    pub dislocation_density: f64,
}

impl<'a> Populations<'a> {
    pub fn from_state(state: &'a ClusterState) -> Self {
        Populations {
            interstitials: state.concentrations(Species::Interstitial),
            vacancies: state.concentrations(Species::Vacancy),
            dislocation_density: state.dislocation_density(),
        }
    }

    pub fn species(&self, species: Species) -> &'a Array1<f64> {
        match species {
            Species::Interstitial => self.interstitials,
            Species::Vacancy => self.vacancies,
        }
    }
}

/// Time derivatives of every tracked quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivatives {
    pub interstitials: Array1<f64>,
    pub vacancies: Array1<f64>,
    pub dislocation_density: f64,
}

impl Derivatives {
    pub fn zeros(max_cluster_size: usize) -> Self {
        Derivatives {
            interstitials: Array1::zeros(max_cluster_size),
            vacancies: Array1::zeros(max_cluster_size),
            dislocation_density: 0.0,
        }
    }

    pub fn species(&self, species: Species) -> &Array1<f64> {
        match species {
            Species::Interstitial => &self.interstitials,
            Species::Vacancy => &self.vacancies,
        }
    }

    fn species_mut(&mut self, species: Species) -> &mut Array1<f64> {
        match species {
            Species::Interstitial => &mut self.interstitials,
            Species::Vacancy => &mut self.vacancies,
        }
    }
}

/// Evaluate all derivatives at `pop` into `out`.
pub fn evaluate(coeffs: &RateCoefficients, pop: &Populations<'_>, out: &mut Derivatives) {
    for species in Species::ALL {
        species_derivative(coeffs, pop, species, out.species_mut(species));
    }
    out.dislocation_density = dislocation_derivative(coeffs, pop);
}

fn species_derivative(
    coeffs: &RateCoefficients,
    pop: &Populations<'_>,
    species: Species,
    out: &mut Array1<f64>,
) {
    let k = coeffs.species(species);
    let kp = coeffs.species(species.partner());
    let own = pop.species(species);
    let partner = pop.species(species.partner());
    let n_max = own.len();
    let c1 = own[0];
    let cp1 = partner[0];
    let accumulate = coeffs.boundary == BoundaryPolicy::Accumulate;

    out.assign(&k.production);
    if accumulate {
        out[n_max - 1] += k.overflow_production;
    }
    out[0] -= coeffs.recombination * c1 * cp1 + k.sink_rate() * c1;

    for idx in 0..n_max {
        let n = idx + 1;
        // Growth n → n+1.
        let grow = k.capture[idx] * c1 * own[idx];
        if n == 1 {
            out[0] -= 2.0 * grow;
        } else {
            out[0] -= grow;
            out[idx] -= grow;
        }
        if n < n_max {
            out[idx + 1] += (1.0 - k.unfault[idx + 1]) * grow;
        } else if accumulate {
            out[idx] += grow;
        }

        if n >= 2 {
            // Emission n → n−1 + monomer.
            let emit = k.emission[idx] * own[idx];
            out[idx] -= emit;
            out[idx - 1] += emit;
            out[0] += emit;

            // Own cluster absorbs a partner monomer and shrinks.
            let shrink = kp.capture[idx] * cp1 * own[idx];
            out[idx] -= shrink;
            out[idx - 1] += shrink;

            // Partner cluster absorbs one of our monomers.
            out[0] -= k.capture[idx] * c1 * partner[idx];
        }
    }
}

fn dislocation_derivative(coeffs: &RateCoefficients, pop: &Populations<'_>) -> f64 {
    let k = &coeffs.interstitial;
    let own = pop.interstitials;
    let n_max = own.len();
    let c1 = own[0];
    let last = match coeffs.boundary {
        BoundaryPolicy::Discard => n_max,
        BoundaryPolicy::Accumulate => n_max - 1,
    };
    let unfaulted: f64 = (0..last)
        .map(|idx| {
            2.0 * PI * coeffs.radius[idx + 1] * k.unfault[idx + 1] * k.capture[idx] * c1 * own[idx]
        })
        .sum();
    unfaulted - coeffs.recovery * pop.dislocation_density.max(0.0).powf(1.5)
}

/// Largest per-unit loss rate of any populated equation [1/s]. Its inverse
/// bounds the explicit step. Empty bins only gain, so they are skipped.
pub fn max_loss_rate(coeffs: &RateCoefficients, pop: &Populations<'_>) -> f64 {
    let mut l_max = 0.0_f64;
    for species in Species::ALL {
        let k = coeffs.species(species);
        let kp = coeffs.species(species.partner());
        let own = pop.species(species);
        let partner = pop.species(species.partner());
        let c1 = own[0].max(0.0);
        let cp1 = partner[0].max(0.0);

        let mut monomer = coeffs.recombination * cp1 + k.sink_rate() + 4.0 * k.capture[0] * c1;
        for idx in 1..own.len() {
            monomer += k.capture[idx] * (own[idx].max(0.0) + partner[idx].max(0.0));
            if own[idx] > 0.0 {
                let cluster = k.capture[idx] * c1 + k.emission[idx] + kp.capture[idx] * cp1;
                l_max = l_max.max(cluster);
            }
        }
        if c1 > 0.0 {
            l_max = l_max.max(monomer);
        }
    }
    let recovery = 1.5 * coeffs.recovery * pop.dislocation_density.max(0.0).sqrt();
    l_max.max(recovery)
}

/// Point-defect source and loss channels of one species [defects/cm³/s].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeciesBalance {
    /// Defects entering tracked clusters from cascades.
    pub production: f64,
    /// Mutual recombination of mobile monomers.
    pub recombination: f64,
    /// Absorption at dislocations and grain boundaries.
    pub sinks: f64,
    /// Loss by meeting the partner species in clusters.
    pub annihilation: f64,
    /// Defects leaving with loops that unfault into the network.
    pub unfault: f64,
    /// Defects carried past the largest tracked size.
    pub boundary_loss: f64,
}

impl SpeciesBalance {
    /// Rate of change of Σ n·C(n).
    pub fn net(&self) -> f64 {
        self.production
            - self.recombination
            - self.sinks
            - self.annihilation
            - self.unfault
            - self.boundary_loss
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MassBalance {
    pub interstitial: SpeciesBalance,
    pub vacancy: SpeciesBalance,
}

impl MassBalance {
    pub fn species(&self, species: Species) -> &SpeciesBalance {
        match species {
            Species::Interstitial => &self.interstitial,
            Species::Vacancy => &self.vacancy,
        }
    }
}

/// Per-species breakdown of the defect inventory budget at `pop`.
pub fn mass_balance(coeffs: &RateCoefficients, pop: &Populations<'_>) -> MassBalance {
    let balance = |species: Species| {
        let k = coeffs.species(species);
        let kp = coeffs.species(species.partner());
        let own = pop.species(species);
        let partner = pop.species(species.partner());
        let n_max = own.len();
        let c1 = own[0];
        let cp1 = partner[0];

        let mut production: f64 = k
            .production
            .iter()
            .enumerate()
            .map(|(idx, g)| (idx + 1) as f64 * g)
            .sum();
        let growth = |idx: usize| k.capture[idx] * c1 * own[idx];
        let unfault: f64 = (0..n_max - 1)
            .map(|idx| (idx + 2) as f64 * k.unfault[idx + 1] * growth(idx))
            .sum();
        let boundary_loss = match coeffs.boundary {
            BoundaryPolicy::Discard => (n_max + 1) as f64 * growth(n_max - 1),
            BoundaryPolicy::Accumulate => {
                production += n_max as f64 * k.overflow_production;
                growth(n_max - 1)
            }
        };
        let annihilation: f64 = (1..n_max)
            .map(|idx| kp.capture[idx] * cp1 * own[idx] + k.capture[idx] * c1 * partner[idx])
            .sum();

        SpeciesBalance {
            production,
            recombination: coeffs.recombination * c1 * cp1,
            sinks: k.sink_rate() * c1,
            annihilation,
            unfault,
            boundary_loss,
        }
    };
    MassBalance {
        interstitial: balance(Species::Interstitial),
        vacancy: balance(Species::Vacancy),
    }
}

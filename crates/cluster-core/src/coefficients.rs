// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Rate Coefficients
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-step coefficient table of the cluster rate equations.
//!
//! Capture, emission, sink and production rates derived from the material,
//! the irradiation environment and the current sink population. Computed
//! once per integrator step and frozen for every attempt of that step.

use cluster_types::config::BoundaryPolicy;
use cluster_types::constants::{GRAIN_BOUNDARY_FACTOR, K_BOLTZMANN_EV, MAX_CASCADE_CLUSTER};
use cluster_types::material::{Material, SpeciesParams};
use cluster_types::reactor::NuclearReactor;
use cluster_types::state::{ClusterState, Species};
use ndarray::Array1;
use std::f64::consts::PI;

/// Radius of a planar loop holding `n` defects [cm]: r = sqrt(√3·a²·n / 4π).
pub fn cluster_radius(lattice_param: f64, n: usize) -> f64 {
    (3.0_f64.sqrt() * lattice_param * lattice_param * n as f64 / (4.0 * PI)).sqrt()
}

/// Mean half-spacing of the dislocation network seen by a loop [cm]:
/// R_d = (2π²·Σ r(n)·C_i(n) + π·ρ)^(−1/2). Infinite when there is neither
/// a network nor any interstitial loop. Extra radii beyond the population
/// are ignored.
pub fn mean_dislocation_cell_radius(
    radius: &Array1<f64>,
    interstitials: &Array1<f64>,
    dislocation_density: f64,
) -> f64 {
    let loops: f64 = radius
        .iter()
        .zip(interstitials)
        .map(|(&r, &c)| r * c.max(0.0))
        .sum();
    let inverse_square = 2.0 * PI * PI * loops + PI * dislocation_density.max(0.0);
    if inverse_square > 0.0 {
        inverse_square.sqrt().recip()
    } else {
        f64::INFINITY
    }
}

/// Probability that a loop of radius `r` unfaults while growing to radius
/// `r_next` inside a dislocation cell of radius `cell_radius`:
/// P = (2r·dr + dr²) / ((π·R_d/2)² − r²), capped at 1 once the loop spans
/// the cell.
pub fn unfault_probability(r: f64, r_next: f64, cell_radius: f64) -> f64 {
    let dr = r_next - r;
    let reach = PI * cell_radius / 2.0;
    let free_area = reach * reach - r * r;
    if !free_area.is_finite() {
        return 0.0;
    }
    if free_area <= 0.0 {
        return 1.0;
    }
    ((2.0 * r * dr + dr * dr) / free_area).clamp(0.0, 1.0)
}

/// Capture bias of a size-`n` cluster, decaying from the loop bias towards
/// the dislocation bias as the loop grows.
pub fn capture_bias(params: &SpeciesParams, lattice_param: f64, burgers_vector: f64, n: usize) -> f64 {
    let loop_term = (burgers_vector / (8.0 * PI * lattice_param)).sqrt() * params.loop_bias;
    params.dislocation_bias
        + (loop_term - params.dislocation_bias) / (n as f64).powf(params.dislocation_bias_param / 2.0)
}

/// Coefficients of one defect species.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesCoefficients {
    /// Diffusivity of the mobile monomer [cm²/s].
    pub diffusivity: f64,
    /// β(n): capture rate of a mobile defect of this species by a size-n
    /// cluster of either species [cm³/s], index n − 1.
    pub capture: Array1<f64>,
    /// α(n): emission rate of one defect from a size-n cluster [1/s],
    /// index n − 1 (zero for the monomer).
    pub emission: Array1<f64>,
    /// P_unf(n): probability that a cluster growing into size n unfaults
    /// and joins the network, index n − 1 for n = 1..N+1. Zero for
    /// vacancies.
    pub unfault: Array1<f64>,
    /// Cascade production per size [cm⁻³/s], index n − 1.
    pub production: Array1<f64>,
    /// Cascade production of clusters larger than N [cm⁻³/s].
    pub overflow_production: f64,
    /// Dislocation sink rate k_d [1/s].
    pub dislocation_sink: f64,
    /// Grain-boundary sink rate k_gb [1/s].
    pub grain_boundary_sink: f64,
}

impl SpeciesCoefficients {
    /// Combined fixed-sink rate k_d + k_gb [1/s].
    pub fn sink_rate(&self) -> f64 {
        self.dislocation_sink + self.grain_boundary_sink
    }
}

/// Coefficient table for both species plus the coupled terms.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCoefficients {
    pub interstitial: SpeciesCoefficients,
    pub vacancy: SpeciesCoefficients,
    /// Mutual recombination constant 4π(D_i + D_v)·r_rec [cm³/s].
    pub recombination: f64,
    /// Network recovery constant K·φ·b² [cm/s].
    pub recovery: f64,
    /// Loop radius r(n), index n − 1, for n = 1..N+1 [cm].
    pub radius: Array1<f64>,
    pub boundary: BoundaryPolicy,
}

impl RateCoefficients {
    /// Derive the coefficient table for the current state.
    pub fn compute(
        material: &Material,
        reactor: &NuclearReactor,
        state: &ClusterState,
        boundary: BoundaryPolicy,
    ) -> Self {
        let n_max = state.max_cluster_size();
        let a = material.lattice_param();
        let b = material.burgers_vector();
        let omega = material.atomic_volume();
        let temperature = reactor.temperature();
        let kt = K_BOLTZMANN_EV * temperature;
        let rho = state.dislocation_density();

        let radius = Array1::from_shape_fn(n_max + 1, |idx| cluster_radius(a, idx + 1));
        let effective = |species: Species| reactor.apply_bias(species, *material.species(species));
        let params_i = effective(Species::Interstitial);
        let params_v = effective(Species::Vacancy);

        // Geometric capture efficiency 2π·r(n)·Z(n) = β(n)/D, shared by the
        // sink strength and the capture rates.
        let efficiency = |params: &SpeciesParams| -> Array1<f64> {
            Array1::from_shape_fn(n_max, |idx| {
                2.0 * PI * radius[idx] * capture_bias(params, a, b, idx + 1)
            })
        };
        let eff_i = efficiency(&params_i);
        let eff_v = efficiency(&params_v);

        let cluster_sum = state.concentrations(Species::Interstitial)
            + state.concentrations(Species::Vacancy);
        let cell_radius =
            mean_dislocation_cell_radius(&radius, state.concentrations(Species::Interstitial), rho);

        let build = |species: Species, params: &SpeciesParams, eff: &Array1<f64>| {
            let diffusivity = params.diffusivity(temperature);
            let capture = eff.mapv(|e| e * diffusivity);
            let emission = Array1::from_shape_fn(n_max, |idx| {
                let n = idx + 1;
                if n < 2 {
                    0.0
                } else {
                    capture[idx] / omega * (-params.binding_energy_at(n) / kt).exp()
                }
            });
            let unfault = match species {
                Species::Interstitial => Array1::from_shape_fn(n_max + 1, |idx| {
                    unfault_probability(radius[idx], cluster_radius(a, idx + 2), cell_radius)
                }),
                Species::Vacancy => Array1::zeros(n_max + 1),
            };
            let cascade = reactor.cascade(species);
            let rate = reactor.recombination() * reactor.flux() / omega;
            let production =
                Array1::from_shape_fn(n_max, |idx| rate * cascade.fraction(idx + 1));
            let overflow_production: f64 = (n_max + 1..=MAX_CASCADE_CLUSTER)
                .map(|n| rate * cascade.fraction(n))
                .sum();
            let strength = params.dislocation_bias * rho + eff.dot(&cluster_sum);
            SpeciesCoefficients {
                diffusivity,
                capture,
                emission,
                unfault,
                production,
                overflow_production,
                dislocation_sink: rho * diffusivity * params.dislocation_bias,
                grain_boundary_sink: GRAIN_BOUNDARY_FACTOR * diffusivity * strength.max(0.0).sqrt()
                    / material.grain_size(),
            }
        };

        let interstitial = build(Species::Interstitial, &params_i, &eff_i);
        let vacancy = build(Species::Vacancy, &params_v, &eff_v);
        let recombination = 4.0
            * PI
            * (interstitial.diffusivity + vacancy.diffusivity)
            * material.recombination_radius();

        RateCoefficients {
            interstitial,
            vacancy,
            recombination,
            recovery: reactor.dislocation_density_evolution() * reactor.flux() * b * b,
            radius,
            boundary,
        }
    }

    pub fn species(&self, species: Species) -> &SpeciesCoefficients {
        match species {
            Species::Interstitial => &self.interstitial,
            Species::Vacancy => &self.vacancy,
        }
    }

    /// Number of tracked cluster sizes N.
    pub fn max_cluster_size(&self) -> usize {
        self.interstitial.capture.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{osiris, sa304};

    #[test]
    fn test_radius_scales_with_sqrt_n() {
        let a = 3.6e-8;
        let r1 = cluster_radius(a, 1);
        let r4 = cluster_radius(a, 4);
        assert!((r4 / r1 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_bias_limits() {
        let m = sa304();
        let p = m.interstitial();
        let a = m.lattice_param();
        let b = m.burgers_vector();
        let z1 = capture_bias(p, a, b, 1);
        let expected = (b / (8.0 * PI * a)).sqrt() * p.loop_bias;
        assert!((z1 - expected).abs() < 1e-12);
        let z_far = capture_bias(p, a, b, 1_000_000_000);
        assert!((z_far - p.dislocation_bias).abs() < 1e-3);
    }

    #[test]
    fn test_interstitial_dimer_emission_dominates() {
        let m = sa304();
        let r = osiris();
        let state = ClusterState::new(10, m.initial_dislocation_density()).unwrap();
        let c = RateCoefficients::compute(&m, &r, &state, BoundaryPolicy::Discard);
        assert_eq!(c.max_cluster_size(), 10);
        assert_eq!(c.radius.len(), 11);
        assert_eq!(c.interstitial.emission[0], 0.0);
        let alpha = c.interstitial.emission[1];
        assert!(alpha > 5e4 && alpha < 5e5, "alpha_i(2) = {alpha:e}");
        // Vacancies migrate far slower than interstitials.
        assert!(c.vacancy.diffusivity < 1e-4 * c.interstitial.diffusivity);
        assert!(c.vacancy.unfault.iter().all(|&p| p == 0.0));
        assert_eq!(c.interstitial.unfault.len(), 11);
        let p2 = c.interstitial.unfault[1];
        assert!(p2 > 1e-7 && p2 < 1e-5, "P_unf(2) = {p2:e}");
    }

    #[test]
    fn test_cell_radius_of_bare_network() {
        let radius = Array1::from_shape_fn(3, |idx| cluster_radius(3.6e-8, idx + 1));
        let empty = Array1::zeros(3);
        let r_d = mean_dislocation_cell_radius(&radius, &empty, 1e10);
        assert!((r_d - 1.0 / (PI * 1e10).sqrt()).abs() < 1e-12 * r_d);
        assert_eq!(mean_dislocation_cell_radius(&radius, &empty, 0.0), f64::INFINITY);

        // Interstitial loops tighten the cell.
        let loaded = Array1::from(vec![0.0, 1e15, 0.0]);
        assert!(mean_dislocation_cell_radius(&radius, &loaded, 1e10) < r_d);
    }

    #[test]
    fn test_unfault_probability() {
        let a = 3.6e-8;
        let (r2, r3) = (cluster_radius(a, 2), cluster_radius(a, 3));
        let cell = 1.0 / (PI * 1e10).sqrt();
        let reach = PI * cell / 2.0;
        let dr = r3 - r2;
        let expected = (2.0 * r2 * dr + dr * dr) / (reach * reach - r2 * r2);
        let p = unfault_probability(r2, r3, cell);
        assert!((p - expected).abs() < 1e-12 * expected);
        assert!(p > 1e-7 && p < 1e-5, "P_unf = {p:e}");

        // Larger loops sweep more of the cell per captured defect.
        let (r50, r51) = (cluster_radius(a, 50), cluster_radius(a, 51));
        assert!(unfault_probability(r50, r51, cell) > unfault_probability(r2, r3, cell));

        assert_eq!(unfault_probability(r2, r3, f64::INFINITY), 0.0);
        assert_eq!(unfault_probability(r2, r3, r2 / 10.0), 1.0);
    }

    #[test]
    fn test_production_sums_to_cascade_yield() {
        let m = sa304();
        let r = osiris();
        let state = ClusterState::new(10, 0.0).unwrap();
        let c = RateCoefficients::compute(&m, &r, &state, BoundaryPolicy::Discard);
        let expected = r.recombination() * r.flux() / m.atomic_volume();
        let total: f64 = c.interstitial.production.sum();
        assert!((total - expected).abs() < 1e-9 * expected);
        assert_eq!(c.interstitial.overflow_production, 0.0);
        assert_eq!(c.interstitial.production[4], 0.0);
    }

    #[test]
    fn test_overflow_production_for_small_n() {
        let m = sa304();
        let r = osiris();
        let state = ClusterState::new(2, 0.0).unwrap();
        let c = RateCoefficients::compute(&m, &r, &state, BoundaryPolicy::Accumulate);
        let rate = r.recombination() * r.flux() / m.atomic_volume();
        let expected = rate * (0.2 + 0.06);
        assert!((c.interstitial.overflow_production - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn test_zero_flux_gives_zero_production_and_recovery() {
        let m = sa304();
        let r = osiris().with_flux(0.0).unwrap();
        let state = ClusterState::new(5, 1e10).unwrap();
        let c = RateCoefficients::compute(&m, &r, &state, BoundaryPolicy::Discard);
        assert!(c.interstitial.production.iter().all(|&g| g == 0.0));
        assert!(c.vacancy.production.iter().all(|&g| g == 0.0));
        assert_eq!(c.recovery, 0.0);
    }

    #[test]
    fn test_sinks_grow_with_cluster_population() {
        let m = sa304();
        let r = osiris();
        let empty = ClusterState::new(5, 1e10).unwrap();
        let mut loaded = empty.clone();
        loaded.set(Species::Interstitial, 3, 1e16).unwrap();
        let c0 = RateCoefficients::compute(&m, &r, &empty, BoundaryPolicy::Discard);
        let c1 = RateCoefficients::compute(&m, &r, &loaded, BoundaryPolicy::Discard);
        assert!(c1.vacancy.grain_boundary_sink > c0.vacancy.grain_boundary_sink);
        assert_eq!(c1.vacancy.dislocation_sink, c0.vacancy.dislocation_sink);
        let kd = 1e10 * c0.interstitial.diffusivity * 0.8;
        assert!((c0.interstitial.dislocation_sink - kd).abs() < 1e-12 * kd);
    }

    #[test]
    fn test_bias_override_changes_capture() {
        let m = sa304();
        let mut params = osiris().params().clone();
        params.interstitial_bias.loop_bias = Some(0.0);
        params.interstitial_bias.dislocation_bias = Some(0.0);
        let r = cluster_types::reactor::NuclearReactor::new(params).unwrap();
        let state = ClusterState::new(4, 1e10).unwrap();
        let c = RateCoefficients::compute(&m, &r, &state, BoundaryPolicy::Discard);
        assert!(c.interstitial.capture.iter().all(|&beta| beta == 0.0));
        assert_eq!(c.interstitial.dislocation_sink, 0.0);
        assert!(c.vacancy.capture[0] > 0.0);
    }
}

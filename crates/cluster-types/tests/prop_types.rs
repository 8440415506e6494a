// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Property-Based Tests (proptest) for cluster-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for cluster-types using proptest.
//!
//! Covers: state accessor bounds, totals, reactor fraction validation,
//! material validation and configuration round-trips.

use cluster_types::config::{IntegratorConfig, NegativePolicy};
use cluster_types::error::ClusterError;
use cluster_types::material::{Material, MaterialParams, SpeciesParams};
use cluster_types::reactor::{CascadeFractions, NuclearReactor, ReactorParams};
use cluster_types::state::{ClusterState, Species};
use ndarray::Array1;
use proptest::prelude::*;

fn species_params(migration_energy: f64) -> SpeciesParams {
    SpeciesParams {
        formation_energy: 4.1,
        migration_energy,
        diffusion_prefactor: 1e-3,
        binding_energy: 0.6,
        dislocation_bias: 0.8,
        dislocation_bias_param: 1.1,
        loop_bias: 63.0,
    }
}

fn material_params(em_i: f64, em_v: f64) -> MaterialParams {
    let a = 3.6e-8;
    MaterialParams {
        name: String::new(),
        lattice_param: a,
        burgers_vector: a / 2.0_f64.sqrt(),
        atomic_volume: a.powi(3) / 4.0,
        recombination_radius: 0.7e-7,
        grain_size: 4e-3,
        initial_dislocation_density: 1e10,
        interstitial: species_params(em_i),
        vacancy: species_params(em_v),
    }
}

fn reactor_params(cascade: CascadeFractions) -> ReactorParams {
    ReactorParams {
        name: String::new(),
        flux: 1e-6,
        temperature: 600.0,
        recombination: 0.3,
        interstitial_cascade: cascade,
        vacancy_cascade: CascadeFractions::default(),
        dislocation_density_evolution: 300.0,
        interstitial_bias: Default::default(),
        vacancy_bias: Default::default(),
    }
}

fn species() -> impl Strategy<Value = Species> {
    prop_oneof![Just(Species::Interstitial), Just(Species::Vacancy)]
}

// ── ClusterState Invariants ──────────────────────────────────────────

proptest! {
    /// Sizes 1..=N are readable, 0 and N+1.. are OutOfRange.
    #[test]
    fn state_accessor_bounds(n in 2usize..64, size in 0usize..80, s in species()) {
        let state = ClusterState::new(n, 0.0).unwrap();
        let result = state.get(s, size);
        if (1..=n).contains(&size) {
            prop_assert_eq!(result.unwrap(), 0.0);
        } else {
            let is_out_of_range = matches!(result, Err(ClusterError::OutOfRange { .. }));
            prop_assert!(is_out_of_range);
        }
    }

    /// set then get returns the stored value; totals add up.
    #[test]
    fn state_set_get_total(values in prop::collection::vec(0.0f64..1e20, 2..40)) {
        let n = values.len();
        let mut state = ClusterState::new(n, 0.0).unwrap();
        for (idx, &v) in values.iter().enumerate() {
            state.set(Species::Vacancy, idx + 1, v).unwrap();
        }
        for (idx, &v) in values.iter().enumerate() {
            prop_assert_eq!(state.get(Species::Vacancy, idx + 1).unwrap(), v);
        }
        let expected: f64 = values.iter().sum();
        let total = state.total(Species::Vacancy);
        prop_assert!((total - expected).abs() <= 1e-12 * expected.max(1.0));
        prop_assert_eq!(state.total(Species::Interstitial), 0.0);
        prop_assert!(state.defect_inventory(Species::Vacancy) >= total * (1.0 - 1e-12));
    }

    /// Negative writes never land in a strict state.
    #[test]
    fn strict_state_rejects_negatives(v in -1e10f64..-1e-30, size in 1usize..8) {
        let mut state = ClusterState::new(8, 0.0).unwrap();
        let rejected = matches!(
            state.set(Species::Interstitial, size, v),
            Err(ClusterError::NegativeConcentration { .. })
        );
        prop_assert!(rejected);
        prop_assert_eq!(state.total(Species::Interstitial), 0.0);
    }

    /// Clamped commits leave only non-negative values and count every clamp.
    #[test]
    fn clamp_commit_is_non_negative(values in prop::collection::vec(-1e5f64..1e5, 2..32)) {
        let n = values.len();
        let mut state = ClusterState::new(n, 0.0)
            .unwrap()
            .with_policy(NegativePolicy::ClampToZero);
        let proposal = Array1::from(values.clone());
        let clamped = state.commit(&proposal, &Array1::zeros(n), 0.0, 1.0).unwrap();
        let negatives = values.iter().filter(|&&v| v < 0.0).count();
        prop_assert_eq!(clamped, negatives);
        prop_assert!(state.concentrations(Species::Interstitial).iter().all(|&c| c >= 0.0));
    }
}

// ── Parameter Validation ─────────────────────────────────────────────

proptest! {
    /// Cascade fractions are accepted exactly when each lies in [0,1] and
    /// the sum does not exceed 1.
    #[test]
    fn cascade_fraction_admissibility(
        bi in -0.2f64..1.2,
        tri in -0.2f64..1.2,
        quad in -0.2f64..1.2,
    ) {
        let cascade = CascadeFractions { bi, tri, quad };
        let admissible = [bi, tri, quad].iter().all(|f| (0.0..=1.0).contains(f))
            && bi + tri + quad <= 1.0;
        let result = NuclearReactor::new(reactor_params(cascade));
        prop_assert_eq!(result.is_ok(), admissible);
        if let Ok(r) = result {
            let sum: f64 = (1..=4).map(|n| r.cascade(Species::Interstitial).fraction(n)).sum();
            prop_assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    /// Any negative migration energy is an InvalidParameter.
    #[test]
    fn negative_migration_energy_rejected(em in -10.0f64..-1e-9) {
        let rejected = matches!(
            Material::new(material_params(em, 1.35)),
            Err(ClusterError::InvalidParameter { .. })
        );
        prop_assert!(rejected);
        prop_assert!(Material::new(material_params(0.45, em)).is_err());
    }

    /// Diffusivity grows with temperature for any positive migration energy.
    #[test]
    fn diffusivity_increases_with_temperature(
        em in 0.01f64..3.0,
        t in 200.0f64..1200.0,
        dt in 1.0f64..300.0,
    ) {
        let p = species_params(em);
        prop_assert!(p.diffusivity(t + dt) > p.diffusivity(t));
    }

    /// Integrator settings survive a JSON round-trip.
    #[test]
    fn integrator_config_roundtrip(
        initial_step in 1e-15f64..1e-3,
        max_relative_change in 0.01f64..1.0,
        max_retries in 1usize..100,
    ) {
        let cfg = IntegratorConfig {
            initial_step,
            max_relative_change,
            max_retries,
            ..IntegratorConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: IntegratorConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(cfg, back);
    }
}

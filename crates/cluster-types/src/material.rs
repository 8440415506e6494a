// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Material Parameters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Immutable material property set.
//!
//! Parameter layout follows Pokor et al., J. Nucl. Mater. 326 (2004), Table 6.
//! Units: cm, eV, cm²/s.

use crate::constants::{BINDING_ENERGY_EXPONENT, K_BOLTZMANN_EV};
use crate::error::{ClusterError, ClusterResult};
use crate::state::Species;
use crate::validate;
use serde::{Deserialize, Serialize};

/// Point-defect properties of one species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    /// Formation energy of an isolated defect [eV].
    pub formation_energy: f64,
    /// Migration energy [eV].
    pub migration_energy: f64,
    /// Pre-exponential diffusion factor D₀ [cm²/s].
    pub diffusion_prefactor: f64,
    /// Binding energy of the di-cluster [eV]; anchors the binding energy curve.
    pub binding_energy: f64,
    /// Capture bias at network dislocations.
    pub dislocation_bias: f64,
    /// Decay exponent of the loop bias towards the dislocation bias.
    pub dislocation_bias_param: f64,
    /// Capture bias at small dislocation loops.
    pub loop_bias: f64,
}

impl SpeciesParams {
    /// Binding energy of one defect to a cluster of `n` defects [eV].
    ///
    /// E_b(n) = E_f + (E_b2 − E_f)/(2^0.8 − 1) · (n^0.8 − (n−1)^0.8),
    /// so E_b(2) = E_b2 and E_b(n) → E_f for large clusters.
    pub fn binding_energy_at(&self, n: usize) -> f64 {
        let p = BINDING_ENERGY_EXPONENT;
        let nf = n as f64;
        self.formation_energy
            + (self.binding_energy - self.formation_energy) / (2.0_f64.powf(p) - 1.0)
                * (nf.powf(p) - (nf - 1.0).max(0.0).powf(p))
    }

    /// Arrhenius diffusivity D = D₀·exp(−E_m / k_B T) [cm²/s].
    pub fn diffusivity(&self, temperature: f64) -> f64 {
        self.diffusion_prefactor * (-self.migration_energy / (K_BOLTZMANN_EV * temperature)).exp()
    }

    fn validate(&self, species: Species) -> ClusterResult<()> {
        let field = |name: &str| format!("{species}.{name}");
        validate::non_negative(&field("formation_energy"), self.formation_energy)?;
        validate::non_negative(&field("migration_energy"), self.migration_energy)?;
        validate::non_negative(&field("diffusion_prefactor"), self.diffusion_prefactor)?;
        validate::non_negative(&field("binding_energy"), self.binding_energy)?;
        validate::non_negative(&field("dislocation_bias"), self.dislocation_bias)?;
        validate::non_negative(&field("dislocation_bias_param"), self.dislocation_bias_param)?;
        validate::non_negative(&field("loop_bias"), self.loop_bias)?;
        Ok(())
    }
}

/// Raw material input, as written in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    #[serde(default)]
    pub name: String,
    /// Lattice parameter a [cm].
    pub lattice_param: f64,
    /// Burgers vector magnitude b [cm].
    pub burgers_vector: f64,
    /// Atomic volume Ω [cm³].
    pub atomic_volume: f64,
    /// Vacancy-interstitial recombination radius [cm].
    pub recombination_radius: f64,
    /// Grain size d [cm].
    pub grain_size: f64,
    /// Network dislocation density at t = 0 [cm⁻²].
    pub initial_dislocation_density: f64,
    pub interstitial: SpeciesParams,
    pub vacancy: SpeciesParams,
}

/// Validated, immutable material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MaterialParams", into = "MaterialParams")]
pub struct Material {
    params: MaterialParams,
}

impl Material {
    pub fn new(params: MaterialParams) -> ClusterResult<Self> {
        validate::positive("lattice_param", params.lattice_param)?;
        validate::positive("burgers_vector", params.burgers_vector)?;
        validate::positive("atomic_volume", params.atomic_volume)?;
        validate::non_negative("recombination_radius", params.recombination_radius)?;
        validate::positive("grain_size", params.grain_size)?;
        validate::non_negative(
            "initial_dislocation_density",
            params.initial_dislocation_density,
        )?;
        params.interstitial.validate(Species::Interstitial)?;
        params.vacancy.validate(Species::Vacancy)?;
        Ok(Material { params })
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn lattice_param(&self) -> f64 {
        self.params.lattice_param
    }

    pub fn burgers_vector(&self) -> f64 {
        self.params.burgers_vector
    }

    pub fn atomic_volume(&self) -> f64 {
        self.params.atomic_volume
    }

    pub fn recombination_radius(&self) -> f64 {
        self.params.recombination_radius
    }

    pub fn grain_size(&self) -> f64 {
        self.params.grain_size
    }

    pub fn initial_dislocation_density(&self) -> f64 {
        self.params.initial_dislocation_density
    }

    pub fn species(&self, species: Species) -> &SpeciesParams {
        match species {
            Species::Interstitial => &self.params.interstitial,
            Species::Vacancy => &self.params.vacancy,
        }
    }

    pub fn interstitial(&self) -> &SpeciesParams {
        &self.params.interstitial
    }

    pub fn vacancy(&self) -> &SpeciesParams {
        &self.params.vacancy
    }

    pub fn params(&self) -> &MaterialParams {
        &self.params
    }
}

impl TryFrom<MaterialParams> for Material {
    type Error = ClusterError;

    fn try_from(params: MaterialParams) -> ClusterResult<Self> {
        Material::new(params)
    }
}

impl From<Material> for MaterialParams {
    fn from(material: Material) -> Self {
        material.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steel_params() -> MaterialParams {
        let a = 3.6e-8;
        MaterialParams {
            name: "SA304".to_string(),
            lattice_param: a,
            burgers_vector: a / 2.0_f64.sqrt(),
            atomic_volume: a.powi(3) / 4.0,
            recombination_radius: 0.7e-7,
            grain_size: 4e-3,
            initial_dislocation_density: 1e10,
            interstitial: SpeciesParams {
                formation_energy: 4.1,
                migration_energy: 0.45,
                diffusion_prefactor: 1e-3,
                binding_energy: 0.6,
                dislocation_bias: 0.8,
                dislocation_bias_param: 1.1,
                loop_bias: 63.0,
            },
            vacancy: SpeciesParams {
                formation_energy: 1.7,
                migration_energy: 1.35,
                diffusion_prefactor: 0.6,
                binding_energy: 0.5,
                dislocation_bias: 0.65,
                dislocation_bias_param: 1.0,
                loop_bias: 33.0,
            },
        }
    }

    #[test]
    fn test_valid_material_accessors() {
        let m = Material::new(steel_params()).unwrap();
        assert_eq!(m.name(), "SA304");
        assert!((m.lattice_param() - 3.6e-8).abs() < 1e-20);
        assert_eq!(m.species(Species::Vacancy).migration_energy, 1.35);
        assert_eq!(m.interstitial().loop_bias, 63.0);
    }

    #[test]
    fn test_negative_migration_energy_rejected() {
        let mut p = steel_params();
        p.interstitial.migration_energy = -0.1;
        match Material::new(p) {
            Err(ClusterError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "interstitial.migration_energy");
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_geometry_rejected() {
        let cases: [fn(&mut MaterialParams); 4] = [
            |p| p.lattice_param = 0.0,
            |p| p.atomic_volume = -1.0,
            |p| p.grain_size = f64::NAN,
            |p| p.burgers_vector = f64::INFINITY,
        ];
        for mutate in cases {
            let mut p = steel_params();
            mutate(&mut p);
            assert!(Material::new(p).is_err());
        }
    }

    #[test]
    fn test_binding_energy_curve() {
        let v = steel_params().vacancy;
        assert!((v.binding_energy_at(2) - v.binding_energy).abs() < 1e-12);
        // Large clusters approach the formation energy.
        let far = v.binding_energy_at(100_000);
        assert!((far - v.formation_energy).abs() < 0.01, "E_b(1e5) = {far}");
        // Monotone between the two anchors.
        for n in 2..50 {
            assert!(v.binding_energy_at(n + 1) >= v.binding_energy_at(n));
        }
    }

    #[test]
    fn test_diffusivity_arrhenius() {
        let i = steel_params().interstitial;
        let d_low = i.diffusivity(500.0);
        let d_high = i.diffusivity(700.0);
        assert!(d_low > 0.0 && d_high > d_low);
        assert!(d_high < i.diffusion_prefactor);
    }

    #[test]
    fn test_serde_goes_through_validation() {
        let m = Material::new(steel_params()).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: Material = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);

        let bad = json.replace("\"grain_size\":0.004", "\"grain_size\":-0.004");
        assert!(serde_json::from_str::<Material>(&bad).is_err());
    }
}

// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Parameter Sweeps
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sensitivity series over one material or reactor parameter, run as
//! independent simulations in parallel via Rayon.

use crate::simulation::{ClusterDynamics, RunSummary};
use cluster_types::config::IntegratorConfig;
use cluster_types::error::{ClusterError, ClusterResult};
use cluster_types::material::Material;
use cluster_types::reactor::NuclearReactor;
use cluster_types::state::ClusterState;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameter varied across a sensitivity series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensitivityVariable {
    /// [eV]
    InterstitialMigrationEnergy,
    /// [eV]
    VacancyMigrationEnergy,
    /// [eV]
    InterstitialFormationEnergy,
    /// [eV]
    VacancyFormationEnergy,
    /// Di-interstitial binding energy [eV]
    InterstitialBindingEnergy,
    /// Di-vacancy binding energy [eV]
    VacancyBindingEnergy,
    /// [cm⁻²]
    InitialDislocationDensity,
    /// [dpa/s]
    Flux,
    /// [K]
    Temperature,
    /// Network recovery coefficient K
    DislocationDensityEvolution,
}

impl SensitivityVariable {
    pub const ALL: [SensitivityVariable; 10] = [
        SensitivityVariable::InterstitialMigrationEnergy,
        SensitivityVariable::VacancyMigrationEnergy,
        SensitivityVariable::InterstitialFormationEnergy,
        SensitivityVariable::VacancyFormationEnergy,
        SensitivityVariable::InterstitialBindingEnergy,
        SensitivityVariable::VacancyBindingEnergy,
        SensitivityVariable::InitialDislocationDensity,
        SensitivityVariable::Flux,
        SensitivityVariable::Temperature,
        SensitivityVariable::DislocationDensityEvolution,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SensitivityVariable::InterstitialMigrationEnergy => "interstitial-migration-energy",
            SensitivityVariable::VacancyMigrationEnergy => "vacancy-migration-energy",
            SensitivityVariable::InterstitialFormationEnergy => "interstitial-formation-energy",
            SensitivityVariable::VacancyFormationEnergy => "vacancy-formation-energy",
            SensitivityVariable::InterstitialBindingEnergy => "interstitial-binding-energy",
            SensitivityVariable::VacancyBindingEnergy => "vacancy-binding-energy",
            SensitivityVariable::InitialDislocationDensity => "initial-dislocation-density",
            SensitivityVariable::Flux => "flux",
            SensitivityVariable::Temperature => "temperature",
            SensitivityVariable::DislocationDensityEvolution => "dislocation-density-evolution",
        }
    }

    /// Current value of this parameter.
    pub fn value(self, material: &Material, reactor: &NuclearReactor) -> f64 {
        match self {
            SensitivityVariable::InterstitialMigrationEnergy => material.interstitial().migration_energy,
            SensitivityVariable::VacancyMigrationEnergy => material.vacancy().migration_energy,
            SensitivityVariable::InterstitialFormationEnergy => material.interstitial().formation_energy,
            SensitivityVariable::VacancyFormationEnergy => material.vacancy().formation_energy,
            SensitivityVariable::InterstitialBindingEnergy => material.interstitial().binding_energy,
            SensitivityVariable::VacancyBindingEnergy => material.vacancy().binding_energy,
            SensitivityVariable::InitialDislocationDensity => material.initial_dislocation_density(),
            SensitivityVariable::Flux => reactor.flux(),
            SensitivityVariable::Temperature => reactor.temperature(),
            SensitivityVariable::DislocationDensityEvolution => {
                reactor.dislocation_density_evolution()
            }
        }
    }

    /// Copies of `material` and `reactor` with this parameter set to
    /// `value`, validated like any other construction.
    pub fn apply(
        self,
        material: &Material,
        reactor: &NuclearReactor,
        value: f64,
    ) -> ClusterResult<(Material, NuclearReactor)> {
        let mut m = material.params().clone();
        let mut r = reactor.params().clone();
        match self {
            SensitivityVariable::InterstitialMigrationEnergy => m.interstitial.migration_energy = value,
            SensitivityVariable::VacancyMigrationEnergy => m.vacancy.migration_energy = value,
            SensitivityVariable::InterstitialFormationEnergy => m.interstitial.formation_energy = value,
            SensitivityVariable::VacancyFormationEnergy => m.vacancy.formation_energy = value,
            SensitivityVariable::InterstitialBindingEnergy => m.interstitial.binding_energy = value,
            SensitivityVariable::VacancyBindingEnergy => m.vacancy.binding_energy = value,
            SensitivityVariable::InitialDislocationDensity => m.initial_dislocation_density = value,
            SensitivityVariable::Flux => r.flux = value,
            SensitivityVariable::Temperature => r.temperature = value,
            SensitivityVariable::DislocationDensityEvolution => {
                r.dislocation_density_evolution = value
            }
        }
        Ok((Material::new(m)?, NuclearReactor::new(r)?))
    }
}

impl fmt::Display for SensitivityVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensitivityVariable {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensitivityVariable::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| ClusterError::invalid("sensitivity variable", format!("unknown name `{s}`")))
    }
}

/// One point of a sweep.
#[derive(Debug, Clone)]
pub struct SweepCase {
    pub label: String,
    pub material: Material,
    pub reactor: NuclearReactor,
}

impl SweepCase {
    /// One case per value of `variable`, everything else taken from
    /// `material` and `reactor`. Labels read `name=value`.
    pub fn series(
        variable: SensitivityVariable,
        material: &Material,
        reactor: &NuclearReactor,
        values: &[f64],
    ) -> ClusterResult<Vec<SweepCase>> {
        values
            .iter()
            .map(|&value| {
                let (material, reactor) = variable.apply(material, reactor, value)?;
                Ok(SweepCase {
                    label: format!("{variable}={value}"),
                    material,
                    reactor,
                })
            })
            .collect()
    }

    /// One case per temperature [K].
    pub fn temperature_series(
        material: &Material,
        reactor: &NuclearReactor,
        temperatures: &[f64],
    ) -> ClusterResult<Vec<SweepCase>> {
        Self::series(SensitivityVariable::Temperature, material, reactor, temperatures)
    }
}

/// Result of one sweep case. A failed case carries its error and no state.
#[derive(Debug)]
pub struct SweepOutcome {
    pub label: String,
    pub summary: ClusterResult<RunSummary>,
    pub state: Option<ClusterState>,
}

/// Run every case for `duration` seconds on its own simulation. Outcomes are
/// returned in input order.
pub fn run_sweep(
    cases: &[SweepCase],
    max_cluster_size: usize,
    config: &IntegratorConfig,
    duration: f64,
) -> Vec<SweepOutcome> {
    cases
        .par_iter()
        .map(|case| {
            let run = ClusterDynamics::new(
                max_cluster_size,
                case.material.clone(),
                case.reactor.clone(),
                config.clone(),
            )
            .and_then(|mut sim| sim.run(duration).map(|summary| (summary, sim)));
            match run {
                Ok((summary, sim)) => SweepOutcome {
                    label: case.label.clone(),
                    summary: Ok(summary),
                    state: Some(sim.state().clone()),
                },
                Err(err) => {
                    tracing::warn!(label = %case.label, error = %err, "sweep case failed");
                    SweepOutcome {
                        label: case.label.clone(),
                        summary: Err(err),
                        state: None,
                    }
                }
            }
        })
        .collect()
}

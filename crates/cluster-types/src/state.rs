// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::config::NegativePolicy;
use crate::constants::MIN_CLUSTER_SIZES;
use crate::error::{ClusterError, ClusterResult};
use crate::validate;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-defect species tracked by the rate equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Interstitial,
    Vacancy,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Interstitial, Species::Vacancy];

    /// The species that recombines with this one.
    pub fn partner(self) -> Species {
        match self {
            Species::Interstitial => Species::Vacancy,
            Species::Vacancy => Species::Interstitial,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Species::Interstitial => "interstitial",
            Species::Vacancy => "vacancy",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spatially averaged cluster population.
///
/// Concentrations [cm⁻³] are stored per species in contiguous arrays indexed
/// by `size - 1`. Dislocation density is in cm⁻², time in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterState {
    interstitials: Array1<f64>,
    vacancies: Array1<f64>,
    dislocation_density: f64,
    time: f64,
    policy: NegativePolicy,
    clamped: usize,
}

impl ClusterState {
    /// Empty population with `max_cluster_size` tracked sizes.
    pub fn new(max_cluster_size: usize, dislocation_density: f64) -> ClusterResult<Self> {
        Self::from_profile(
            Array1::zeros(max_cluster_size),
            Array1::zeros(max_cluster_size),
            dislocation_density,
        )
    }

    /// Population from explicit interstitial/vacancy profiles (index = size − 1).
    pub fn from_profile(
        interstitials: Array1<f64>,
        vacancies: Array1<f64>,
        dislocation_density: f64,
    ) -> ClusterResult<Self> {
        let n = interstitials.len();
        if vacancies.len() != n {
            return Err(ClusterError::ShapeMismatch {
                expected: n,
                found: vacancies.len(),
            });
        }
        if n < MIN_CLUSTER_SIZES {
            return Err(ClusterError::invalid(
                "max_cluster_size",
                format!("must be >= {MIN_CLUSTER_SIZES}, got {n}"),
            ));
        }
        validate::non_negative("dislocation_density", dislocation_density)?;
        for species in Species::ALL {
            let values = match species {
                Species::Interstitial => &interstitials,
                Species::Vacancy => &vacancies,
            };
            for (idx, &value) in values.iter().enumerate() {
                check_value(species, idx + 1, value)?;
            }
        }
        Ok(ClusterState {
            interstitials,
            vacancies,
            dislocation_density,
            time: 0.0,
            policy: NegativePolicy::Strict,
            clamped: 0,
        })
    }

    pub fn with_policy(mut self, policy: NegativePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> NegativePolicy {
        self.policy
    }

    /// Number of tracked cluster sizes N.
    pub fn max_cluster_size(&self) -> usize {
        self.interstitials.len()
    }

    /// Elapsed simulation time [s].
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Network dislocation density [cm⁻²].
    pub fn dislocation_density(&self) -> f64 {
        self.dislocation_density
    }

    /// How many negative values were clamped to zero so far.
    pub fn clamped_count(&self) -> usize {
        self.clamped
    }

    pub fn concentrations(&self, species: Species) -> &Array1<f64> {
        match species {
            Species::Interstitial => &self.interstitials,
            Species::Vacancy => &self.vacancies,
        }
    }

    fn concentrations_mut(&mut self, species: Species) -> &mut Array1<f64> {
        match species {
            Species::Interstitial => &mut self.interstitials,
            Species::Vacancy => &mut self.vacancies,
        }
    }

    fn index(&self, size: usize) -> ClusterResult<usize> {
        let max = self.max_cluster_size();
        if size == 0 || size > max {
            return Err(ClusterError::OutOfRange { size, max });
        }
        Ok(size - 1)
    }

    /// Concentration of `species` clusters of `size` [cm⁻³].
    pub fn get(&self, species: Species, size: usize) -> ClusterResult<f64> {
        let idx = self.index(size)?;
        Ok(self.concentrations(species)[idx])
    }

    /// Overwrite one concentration. Negative values are rejected unless the
    /// state clamps, in which case they become zero and are counted.
    pub fn set(&mut self, species: Species, size: usize, value: f64) -> ClusterResult<()> {
        let idx = self.index(size)?;
        if !value.is_finite() {
            return Err(ClusterError::NonFinite {
                quantity: format!("{species} concentration at size {size}"),
            });
        }
        let value = if value < 0.0 {
            match self.policy {
                NegativePolicy::Strict => {
                    return Err(ClusterError::NegativeConcentration {
                        species,
                        size,
                        value,
                    })
                }
                NegativePolicy::ClampToZero => {
                    tracing::warn!(%species, size, value, "clamping negative concentration to zero");
                    self.clamped += 1;
                    0.0
                }
            }
        } else {
            value
        };
        self.concentrations_mut(species)[idx] = value;
        Ok(())
    }

    pub fn set_dislocation_density(&mut self, value: f64) -> ClusterResult<()> {
        validate::non_negative("dislocation_density", value)?;
        self.dislocation_density = value;
        Ok(())
    }

    /// Sum of concentrations over all sizes [cm⁻³].
    pub fn total(&self, species: Species) -> f64 {
        self.concentrations(species).sum()
    }

    /// Point defects held in tracked clusters, Σ n·C(n) [cm⁻³].
    pub fn defect_inventory(&self, species: Species) -> f64 {
        self.concentrations(species)
            .iter()
            .enumerate()
            .map(|(idx, c)| (idx + 1) as f64 * c)
            .sum()
    }

    /// Install a complete proposal produced by the integrator.
    ///
    /// Nothing is written unless the whole proposal is admissible. Returns
    /// the number of values clamped under [`NegativePolicy::ClampToZero`].
    pub fn commit(
        &mut self,
        interstitials: &Array1<f64>,
        vacancies: &Array1<f64>,
        dislocation_density: f64,
        time: f64,
    ) -> ClusterResult<usize> {
        let n = self.max_cluster_size();
        for proposal in [interstitials, vacancies] {
            if proposal.len() != n {
                return Err(ClusterError::ShapeMismatch {
                    expected: n,
                    found: proposal.len(),
                });
            }
        }
        if !time.is_finite() || time < self.time {
            return Err(ClusterError::invalid(
                "time",
                format!("must be finite and >= {}, got {time}", self.time),
            ));
        }
        if !dislocation_density.is_finite() {
            return Err(ClusterError::NonFinite {
                quantity: "dislocation density".to_string(),
            });
        }

        let mut negatives = 0usize;
        for (species, proposal) in [
            (Species::Interstitial, interstitials),
            (Species::Vacancy, vacancies),
        ] {
            for (idx, &value) in proposal.iter().enumerate() {
                if !value.is_finite() {
                    return Err(ClusterError::NonFinite {
                        quantity: format!("{species} concentration at size {}", idx + 1),
                    });
                }
                if value < 0.0 {
                    if self.policy == NegativePolicy::Strict {
                        return Err(ClusterError::NegativeConcentration {
                            species,
                            size: idx + 1,
                            value,
                        });
                    }
                    negatives += 1;
                }
            }
        }
        if dislocation_density < 0.0 && self.policy == NegativePolicy::Strict {
            return Err(ClusterError::invalid(
                "dislocation_density",
                format!("became negative: {dislocation_density}"),
            ));
        }

        self.interstitials.assign(interstitials);
        self.vacancies.assign(vacancies);
        if negatives > 0 {
            self.interstitials.mapv_inplace(|c| c.max(0.0));
            self.vacancies.mapv_inplace(|c| c.max(0.0));
            tracing::warn!(
                count = negatives,
                time,
                "clamped negative concentrations to zero"
            );
        }
        self.dislocation_density = dislocation_density.max(0.0);
        self.time = time;
        self.clamped += negatives;
        Ok(negatives)
    }
}

fn check_value(species: Species, size: usize, value: f64) -> ClusterResult<()> {
    if !value.is_finite() {
        return Err(ClusterError::NonFinite {
            quantity: format!("{species} concentration at size {size}"),
        });
    }
    if value < 0.0 {
        return Err(ClusterError::NegativeConcentration {
            species,
            size,
            value,
        });
    }
    Ok(())
}

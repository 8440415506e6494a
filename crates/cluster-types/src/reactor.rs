// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Nuclear Reactor Conditions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Irradiation environment: dose rate, temperature and cascade yields.

use crate::constants::MAX_CASCADE_CLUSTER;
use crate::error::{ClusterError, ClusterResult};
use crate::material::SpeciesParams;
use crate::state::Species;
use crate::validate;
use serde::{Deserialize, Serialize};

/// Fractions of cascade-produced defects born directly as di-, tri- and
/// quad-clusters. The remainder are isolated monomers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeFractions {
    #[serde(default)]
    pub bi: f64,
    #[serde(default)]
    pub tri: f64,
    #[serde(default)]
    pub quad: f64,
}

impl CascadeFractions {
    /// Share of defects produced as monomers.
    pub fn mono(&self) -> f64 {
        1.0 - self.bi - self.tri - self.quad
    }

    /// Share of defects produced as clusters of `size`; zero above size 4.
    pub fn fraction(&self, size: usize) -> f64 {
        match size {
            1 => self.mono(),
            2 => self.bi,
            3 => self.tri,
            4 => self.quad,
            _ => 0.0,
        }
    }

    fn validate(&self, species: Species) -> ClusterResult<()> {
        let prefix = format!("{species}_cascade");
        validate::fraction(&format!("{prefix}.bi"), self.bi)?;
        validate::fraction(&format!("{prefix}.tri"), self.tri)?;
        validate::fraction(&format!("{prefix}.quad"), self.quad)?;
        let sum = self.bi + self.tri + self.quad;
        if sum > 1.0 {
            return Err(ClusterError::invalid(
                prefix,
                format!("cluster fractions sum to {sum} (> 1)"),
            ));
        }
        Ok(())
    }
}

/// Reactor-specific replacement of a species' capture biases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislocation_bias: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_bias: Option<f64>,
}

/// Raw reactor input, as written in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorParams {
    #[serde(default)]
    pub name: String,
    /// Displacement dose rate [dpa/s].
    pub flux: f64,
    /// Irradiation temperature [K].
    pub temperature: f64,
    /// Cascade efficiency η: share of displaced atoms surviving in-cascade
    /// recombination.
    pub recombination: f64,
    #[serde(default)]
    pub interstitial_cascade: CascadeFractions,
    #[serde(default)]
    pub vacancy_cascade: CascadeFractions,
    /// Irradiation-driven network recovery coefficient K.
    #[serde(default)]
    pub dislocation_density_evolution: f64,
    #[serde(default)]
    pub interstitial_bias: BiasOverride,
    #[serde(default)]
    pub vacancy_bias: BiasOverride,
}

/// Validated, immutable irradiation environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReactorParams", into = "ReactorParams")]
pub struct NuclearReactor {
    params: ReactorParams,
}

impl NuclearReactor {
    pub fn new(params: ReactorParams) -> ClusterResult<Self> {
        validate::non_negative("flux", params.flux)?;
        validate::positive("temperature", params.temperature)?;
        validate::fraction("recombination", params.recombination)?;
        validate::non_negative(
            "dislocation_density_evolution",
            params.dislocation_density_evolution,
        )?;
        params.interstitial_cascade.validate(Species::Interstitial)?;
        params.vacancy_cascade.validate(Species::Vacancy)?;
        for (species, bias) in [
            (Species::Interstitial, &params.interstitial_bias),
            (Species::Vacancy, &params.vacancy_bias),
        ] {
            if let Some(z) = bias.dislocation_bias {
                validate::non_negative(&format!("{species}_bias.dislocation_bias"), z)?;
            }
            if let Some(z) = bias.loop_bias {
                validate::non_negative(&format!("{species}_bias.loop_bias"), z)?;
            }
        }
        Ok(NuclearReactor { params })
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Dose rate [dpa/s].
    pub fn flux(&self) -> f64 {
        self.params.flux
    }

    /// Temperature [K].
    pub fn temperature(&self) -> f64 {
        self.params.temperature
    }

    pub fn recombination(&self) -> f64 {
        self.params.recombination
    }

    pub fn dislocation_density_evolution(&self) -> f64 {
        self.params.dislocation_density_evolution
    }

    pub fn cascade(&self, species: Species) -> &CascadeFractions {
        match species {
            Species::Interstitial => &self.params.interstitial_cascade,
            Species::Vacancy => &self.params.vacancy_cascade,
        }
    }

    pub fn bias(&self, species: Species) -> &BiasOverride {
        match species {
            Species::Interstitial => &self.params.interstitial_bias,
            Species::Vacancy => &self.params.vacancy_bias,
        }
    }

    /// Material species parameters with this reactor's bias overrides applied.
    pub fn apply_bias(&self, species: Species, mut params: SpeciesParams) -> SpeciesParams {
        let bias = self.bias(species);
        if let Some(z) = bias.dislocation_bias {
            params.dislocation_bias = z;
        }
        if let Some(z) = bias.loop_bias {
            params.loop_bias = z;
        }
        params
    }

    /// Rate of cascade production of `size` clusters per atom [1/s].
    pub fn production_fraction(&self, species: Species, size: usize) -> f64 {
        if size == 0 || size > MAX_CASCADE_CLUSTER {
            return 0.0;
        }
        self.params.recombination * self.params.flux * self.cascade(species).fraction(size)
    }

    /// Same environment at a different dose rate.
    pub fn with_flux(&self, flux: f64) -> ClusterResult<Self> {
        let mut params = self.params.clone();
        params.flux = flux;
        NuclearReactor::new(params)
    }

    /// Same environment at a different temperature.
    pub fn with_temperature(&self, temperature: f64) -> ClusterResult<Self> {
        let mut params = self.params.clone();
        params.temperature = temperature;
        NuclearReactor::new(params)
    }

    pub fn params(&self) -> &ReactorParams {
        &self.params
    }
}

impl TryFrom<ReactorParams> for NuclearReactor {
    type Error = ClusterError;

    fn try_from(params: ReactorParams) -> ClusterResult<Self> {
        NuclearReactor::new(params)
    }
}

impl From<NuclearReactor> for ReactorParams {
    fn from(reactor: NuclearReactor) -> Self {
        reactor.params
    }
}

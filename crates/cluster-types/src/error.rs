// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Errors
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::state::Species;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid run duration: {0} (must be finite and >= 0)")]
    InvalidDuration(f64),

    #[error("Cluster size {size} out of range [1, {max}]")]
    OutOfRange { size: usize, max: usize },

    #[error("Negative concentration {value:e} for {species} cluster of size {size}")]
    NegativeConcentration {
        species: Species,
        size: usize,
        value: f64,
    },

    #[error("Non-finite value for {quantity}")]
    NonFinite { quantity: String },

    #[error("Profile length mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error(
        "Step diverged at t={time:e} s after {attempts} attempts (last dt={step_size:e} s): {reason}"
    )]
    StepDivergence {
        time: f64,
        attempts: usize,
        step_size: f64,
        reason: String,
    },

    #[error("Step limit of {steps} reached at t={time:e} s before t={target:e} s")]
    StepLimitExceeded { steps: usize, time: f64, target: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClusterError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ClusterError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type ClusterResult<T> = Result<T, ClusterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = ClusterError::invalid("vacancy.migration_energy", "must be finite and >= 0");
        assert!(err.to_string().contains("vacancy.migration_energy"));

        let err = ClusterError::OutOfRange { size: 0, max: 10 };
        assert_eq!(err.to_string(), "Cluster size 0 out of range [1, 10]");

        let err = ClusterError::NegativeConcentration {
            species: Species::Vacancy,
            size: 3,
            value: -1.0,
        };
        assert!(err.to_string().contains("vacancy cluster of size 3"));
    }
}

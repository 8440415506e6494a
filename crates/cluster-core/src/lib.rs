// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Cluster Core
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Spatially averaged cluster dynamics of irradiation defects.
//!
//! Rate coefficients, the coupled rate equations, the adaptive explicit
//! integrator, the `ClusterDynamics` driver and parallel parameter sweeps.

pub mod coefficients;
pub mod integrator;
pub mod rates;
pub mod simulation;
pub mod sweep;

pub use integrator::{Diagnostics, Integrator, StepResult};
pub use simulation::{ClusterDynamics, DislocationSample, RunSummary};

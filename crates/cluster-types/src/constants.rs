// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Boltzmann constant (eV/K)
pub const K_BOLTZMANN_EV: f64 = 8.6173e-5;

/// Celsius to Kelvin offset (K)
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Exponent of the capillary binding-energy law: E_b(n) ∝ n^0.8 − (n−1)^0.8.
pub const BINDING_ENERGY_EXPONENT: f64 = 0.8;

/// Largest cluster size created directly inside a displacement cascade.
pub const MAX_CASCADE_CLUSTER: usize = 4;

/// Fewest tracked cluster sizes: the mobile monomer plus one cluster bin.
pub const MIN_CLUSTER_SIZES: usize = 2;

/// Geometry factor of the grain-boundary sink strength, k²_gb = 6·k/d.
pub const GRAIN_BOUNDARY_FACTOR: f64 = 6.0;

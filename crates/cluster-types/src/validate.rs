// ─────────────────────────────────────────────────────────────────────
// SCPN Cluster Dynamics — Parameter Validation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{ClusterError, ClusterResult};

pub(crate) fn non_negative(name: &str, value: f64) -> ClusterResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ClusterError::invalid(
            name,
            format!("must be finite and >= 0, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn positive(name: &str, value: f64) -> ClusterResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ClusterError::invalid(
            name,
            format!("must be finite and > 0, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn fraction(name: &str, value: f64) -> ClusterResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ClusterError::invalid(
            name,
            format!("must lie in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

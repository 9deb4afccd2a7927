// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation tolerances

use serde::{Deserialize, Serialize};

/// Tolerances used by every validation call
///
/// The defaults are the ones the bound `vc` function applies when the caller
/// leaves a parameter out.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Points closer than this are merged into one vertex
    #[serde(rename = "snap_tol")]
    pub tol_snap: f64,
    /// Maximum distance between a polygon vertex and the fitted plane
    pub planarity_d2p_tol: f64,
    /// Maximum angle (degrees) between a triangle normal and the polygon normal
    pub planarity_n_tol: f64,
    /// Overlap tolerance for solid-solid tests; negative disables them
    pub overlap_tol: f64,
}

impl ValidationOptions {
    pub const DEFAULT_TOL_SNAP: f64 = 0.001;
    pub const DEFAULT_PLANARITY_D2P_TOL: f64 = 0.01;
    pub const DEFAULT_PLANARITY_N_TOL: f64 = 20.0;
    pub const DEFAULT_OVERLAP_TOL: f64 = -1.0;

    /// Create options from the four positional tolerances
    pub fn new(
        tol_snap: f64,
        planarity_d2p_tol: f64,
        planarity_n_tol: f64,
        overlap_tol: f64,
    ) -> Self {
        Self {
            tol_snap,
            planarity_d2p_tol,
            planarity_n_tol,
            overlap_tol,
        }
    }

    /// Describe the first tolerance that cannot be used, if any
    pub fn check(&self) -> Option<String> {
        let named = [
            ("snap_tol", self.tol_snap),
            ("planarity_d2p_tol", self.planarity_d2p_tol),
            ("planarity_n_tol", self.planarity_n_tol),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Some(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if self.overlap_tol.is_nan() {
            return Some("overlap_tol must be a number".to_string());
        }
        None
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            tol_snap: Self::DEFAULT_TOL_SNAP,
            planarity_d2p_tol: Self::DEFAULT_PLANARITY_D2P_TOL,
            planarity_n_tol: Self::DEFAULT_PLANARITY_N_TOL,
            overlap_tol: Self::DEFAULT_OVERLAP_TOL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        assert!(ValidationOptions::default().check().is_none());
    }

    #[test]
    fn test_negative_snap_rejected() {
        let opts = ValidationOptions::new(-0.5, 0.01, 20.0, -1.0);
        let msg = opts.check().unwrap();
        assert!(msg.contains("snap_tol"));
    }

    #[test]
    fn test_negative_overlap_allowed() {
        let opts = ValidationOptions::new(0.0, 0.0, 0.0, -1.0);
        assert!(opts.check().is_none());
    }
}

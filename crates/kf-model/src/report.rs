// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation report
//!
//! A report collects per-feature, per-primitive results plus dataset-level
//! errors, and derives the overviews and the overall validity from them.

use crate::{ErrorCode, ValidationOptions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Geometric primitive type
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Solid,
    CompositeSolid,
    MultiSolid,
    CompositeSurface,
    MultiSurface,
    GeometryTemplate,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Solid => "Solid",
            PrimitiveKind::CompositeSolid => "CompositeSolid",
            PrimitiveKind::MultiSolid => "MultiSolid",
            PrimitiveKind::CompositeSurface => "CompositeSurface",
            PrimitiveKind::MultiSurface => "MultiSurface",
            PrimitiveKind::GeometryTemplate => "GeometryTemplate",
        };
        f.write_str(name)
    }
}

/// One reported error
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: ErrorCode,
    pub description: String,
    /// Location inside the primitive, e.g. `shell: 0; face: 3`
    pub id: String,
    pub info: String,
}

impl ErrorEntry {
    pub fn new(code: ErrorCode, id: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            code,
            description: code.name().to_string(),
            id: id.into(),
            info: info.into(),
        }
    }
}

/// Result for one primitive
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveReport {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PrimitiveKind,
    pub validity: bool,
    pub errors: Vec<ErrorEntry>,
}

impl PrimitiveReport {
    pub fn new(id: impl Into<String>, kind: PrimitiveKind, errors: Vec<ErrorEntry>) -> Self {
        Self {
            id: id.into(),
            kind,
            validity: errors.is_empty(),
            errors,
        }
    }
}

/// Result for one feature (city object or tu3djson feature)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureReport {
    pub id: String,
    #[serde(rename = "type")]
    pub feature_type: String,
    pub validity: bool,
    pub primitives: Vec<PrimitiveReport>,
}

impl FeatureReport {
    pub fn new(
        id: impl Into<String>,
        feature_type: impl Into<String>,
        primitives: Vec<PrimitiveReport>,
    ) -> Self {
        Self {
            id: id.into(),
            feature_type: feature_type.into(),
            validity: primitives.iter().all(|p| p.validity),
            primitives,
        }
    }

    /// Unique error codes over all primitives
    pub fn error_codes(&self) -> BTreeSet<ErrorCode> {
        self.primitives
            .iter()
            .flat_map(|p| p.errors.iter().map(|e| e.code))
            .collect()
    }
}

/// Count of total and valid items of one type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(rename = "type")]
    pub kind: String,
    pub total: usize,
    pub valid: usize,
}

/// Full validation report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(rename = "type")]
    pub report_type: String,
    pub input_file_type: Option<String>,
    pub parameters: ValidationOptions,
    pub primitives_overview: Vec<Overview>,
    pub features_overview: Vec<Overview>,
    pub features: Vec<FeatureReport>,
    pub dataset_errors: Vec<ErrorEntry>,
    pub all_errors: Vec<ErrorCode>,
    pub validity: bool,
}

impl ValidationReport {
    pub const REPORT_TYPE: &'static str = "validation_report";

    /// Create an empty report; call [`ValidationReport::finish`] once filled
    pub fn new(input_file_type: Option<&str>, parameters: ValidationOptions) -> Self {
        Self {
            report_type: Self::REPORT_TYPE.to_string(),
            input_file_type: input_file_type.map(str::to_string),
            parameters,
            primitives_overview: Vec::new(),
            features_overview: Vec::new(),
            features: Vec::new(),
            dataset_errors: Vec::new(),
            all_errors: Vec::new(),
            validity: true,
        }
    }

    /// Record an error about the dataset as a whole
    pub fn add_dataset_error(&mut self, code: ErrorCode, info: impl Into<String>) {
        self.dataset_errors.push(ErrorEntry::new(code, "", info));
    }

    /// Derive overviews, the error summary and the overall validity
    pub fn finish(mut self) -> Self {
        let mut prims: BTreeMap<PrimitiveKind, (usize, usize)> = BTreeMap::new();
        let mut feats: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        let mut codes: BTreeSet<ErrorCode> = BTreeSet::new();

        for f in &self.features {
            let entry = feats.entry(f.feature_type.as_str()).or_default();
            entry.0 += 1;
            if f.validity {
                entry.1 += 1;
            }
            for p in &f.primitives {
                let entry = prims.entry(p.kind).or_default();
                entry.0 += 1;
                if p.validity {
                    entry.1 += 1;
                }
            }
            codes.extend(f.error_codes());
        }
        codes.extend(self.dataset_errors.iter().map(|e| e.code));

        self.primitives_overview = prims
            .into_iter()
            .map(|(kind, (total, valid))| Overview {
                kind: kind.to_string(),
                total,
                valid,
            })
            .collect();
        self.features_overview = feats
            .into_iter()
            .map(|(kind, (total, valid))| Overview {
                kind: kind.to_string(),
                total,
                valid,
            })
            .collect();
        self.validity = self.dataset_errors.is_empty() && self.features.iter().all(|f| f.validity);
        self.all_errors = codes.into_iter().collect();
        self
    }

    /// Check whether a specific code was reported anywhere
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.all_errors.contains(&code)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

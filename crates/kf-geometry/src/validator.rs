// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation entry points
//!
//! Every entry point returns a finished [`ValidationReport`]; problems with
//! the document as a whole become dataset errors (9xx) in the report.

use crate::builder::{
    build_cityjson_features, build_geometry_feature, build_templates, build_tu3djson_features,
    PrimitiveBuilder,
};
use crate::primitive::Feature;
use crate::Result;
use kf_model::{
    CityJson, DocumentKind, ErrorCode, FeatureReport, PrimitiveReport, Tu3dGeometry, Tu3dJson,
    ValidationOptions, ValidationReport,
};
use rayon::prelude::*;
use serde_json::Value;
use std::sync::Arc;

/// Validate a parsed document of any supported kind
pub fn validate_json(value: &Value, opts: &ValidationOptions) -> ValidationReport {
    match DocumentKind::detect(value) {
        Ok(DocumentKind::CityJson) => validate_cityjson(value, opts),
        Ok(DocumentKind::Tu3dJson) => validate_tu3djson(value, opts),
        Err(e) => {
            log::warn!("not a supported JSON file: {}", e);
            let mut report = ValidationReport::new(None, *opts);
            report.add_dataset_error(
                ErrorCode::InvalidInputFile,
                format!("not a supported JSON file: {}", e),
            );
            report.finish()
        }
    }
}

/// Validate JSON text
///
/// Fails only when the text is not JSON.
pub fn validate_str(text: &str, opts: &ValidationOptions) -> Result<ValidationReport> {
    let value: Value = serde_json::from_str(text)?;
    Ok(validate_json(&value, opts))
}

/// Validate a CityJSON document
pub fn validate_cityjson(value: &Value, opts: &ValidationOptions) -> ValidationReport {
    let report = ValidationReport::new(Some(DocumentKind::CityJson.as_str()), *opts);
    run(report, opts, || {
        let doc = CityJson::from_value(value)?;
        log::info!(
            "CityJSON {}: {} city objects",
            doc.version.as_deref().unwrap_or("(no version)"),
            doc.city_objects.len()
        );

        let templates = build_templates(&doc, opts.tol_snap)?;
        let results: Vec<Option<Arc<PrimitiveReport>>> = templates
            .par_iter()
            .map(|t| t.as_ref().map(|p| Arc::new(p.validate(opts))))
            .collect();
        for r in results.iter().flatten().filter(|r| !r.validity) {
            log::debug!("geometry template {} is invalid", r.id);
        }

        let builder = PrimitiveBuilder::with_templates(opts.tol_snap, results);
        build_cityjson_features(&doc, &builder)
    })
}

/// Validate a tu3djson document
pub fn validate_tu3djson(value: &Value, opts: &ValidationOptions) -> ValidationReport {
    let report = ValidationReport::new(Some(DocumentKind::Tu3dJson.as_str()), *opts);
    run(report, opts, || {
        let doc = Tu3dJson::from_value(value)?;
        log::info!("tu3djson: {} features", doc.features.len());
        build_tu3djson_features(&doc.features, &PrimitiveBuilder::new(opts.tol_snap))
    })
}

/// Validate a single bare geometry object carrying its own `vertices`
pub fn validate_one_geom(value: &Value, opts: &ValidationOptions) -> ValidationReport {
    let report = ValidationReport::new(Some("geometry"), *opts);
    run(report, opts, || {
        let geometry = Tu3dGeometry::from_value(value)?;
        let feature = build_geometry_feature("0", &geometry, &PrimitiveBuilder::new(opts.tol_snap))?;
        Ok(vec![feature])
    })
}

/// Check parameters, build features, validate them, and finish the report
fn run<F>(mut report: ValidationReport, opts: &ValidationOptions, build: F) -> ValidationReport
where
    F: FnOnce() -> Result<Vec<Feature>>,
{
    if let Some(problem) = opts.check() {
        log::warn!("wrong input parameters: {}", problem);
        report.add_dataset_error(ErrorCode::WrongInputParameters, problem);
        return report.finish();
    }

    match build() {
        Ok(features) => {
            report.features = validate_features(&features, opts);
        }
        Err(e) => {
            log::warn!("invalid input file: {}", e);
            report.add_dataset_error(ErrorCode::InvalidInputFile, e.to_string());
        }
    }
    report.finish()
}

/// Validate features in parallel, keeping their order
pub fn validate_features(features: &[Feature], opts: &ValidationOptions) -> Vec<FeatureReport> {
    features.par_iter().map(|f| f.validate(opts)).collect()
}

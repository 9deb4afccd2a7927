// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric primitives and features
//!
//! A primitive is one geometry of a feature. Solids hold an outer shell and
//! any number of inner shells; multi/composite surfaces hold a single surface;
//! template instances share the already computed result of their template.

use crate::shell::{
    connected_components, edge_stats, point_in_shell, signed_volume, validate_shell,
};
use crate::surface::Surface;
use crate::polygon::validate_polygon;
use kf_model::{ErrorCode, ErrorEntry, FeatureReport, PrimitiveKind, PrimitiveReport, ValidationOptions};
use std::sync::Arc;

/// A solid: outer shell plus inner shells (cavities)
#[derive(Clone, Debug)]
pub struct Solid {
    oshell: Surface,
    ishells: Vec<Surface>,
}

impl Solid {
    pub fn new(oshell: Surface) -> Self {
        Self {
            oshell,
            ishells: Vec::new(),
        }
    }

    /// Build from shells in file order: the first one is the outer shell
    pub fn from_shells(shells: Vec<Surface>) -> Option<Self> {
        let mut iter = shells.into_iter();
        let oshell = iter.next()?;
        Some(Self {
            oshell,
            ishells: iter.collect(),
        })
    }

    pub fn add_ishell(&mut self, shell: Surface) {
        self.ishells.push(shell);
    }

    pub fn oshell(&self) -> &Surface {
        &self.oshell
    }

    pub fn ishells(&self) -> &[Surface] {
        &self.ishells
    }

    fn shells(&self) -> impl Iterator<Item = &Surface> {
        std::iter::once(&self.oshell).chain(self.ishells.iter())
    }

    fn is_empty(&self) -> bool {
        self.shells().all(Surface::is_empty)
    }

    /// Validate shells, their orientation, and how they relate to each other
    pub fn validate(&self, loc: &str, opts: &ValidationOptions, errors: &mut Vec<ErrorEntry>) -> bool {
        let before = errors.len();

        for (k, shell) in self.shells().enumerate() {
            validate_shell(shell, &format!("{}shell: {}; ", loc, k), opts, errors);
        }
        if errors.len() > before {
            return false;
        }

        let volume = signed_volume(&self.oshell);
        if volume < 0.0 {
            errors.push(ErrorEntry::new(
                ErrorCode::PolygonWronglyOriented,
                format!("{}shell: 0", loc),
                "outer shell is oriented inwards",
            ));
        }
        for (k, shell) in self.ishells.iter().enumerate() {
            if signed_volume(shell) > 0.0 {
                errors.push(ErrorEntry::new(
                    ErrorCode::WrongOrientationShell,
                    format!("{}shell: {}", loc, k + 1),
                    "inner shell is oriented outwards",
                ));
            }
        }
        if errors.len() > before {
            return false;
        }

        let keys: Vec<Vec<[u64; 3]>> = self.shells().map(Surface::vertex_key).collect();
        for a in 0..keys.len() {
            for b in (a + 1)..keys.len() {
                if keys[a] == keys[b] {
                    errors.push(ErrorEntry::new(
                        ErrorCode::DuplicatedShells,
                        loc.trim_end_matches("; "),
                        format!("shells: {} and {}", a, b),
                    ));
                }
            }
        }
        if errors.len() > before {
            return false;
        }

        for (k, shell) in self.ishells.iter().enumerate() {
            let outside = shell
                .points()
                .iter()
                .find(|p| !point_in_shell(p, &self.oshell));
            if let Some(p) = outside {
                errors.push(ErrorEntry::new(
                    ErrorCode::InnerShellOutside,
                    format!("{}shell: {}", loc, k + 1),
                    format!("vertex ({}, {}, {}) is outside the outer shell", p.x, p.y, p.z),
                ));
            }
        }

        errors.len() == before
    }
}

/// Geometry of a primitive
#[derive(Clone, Debug)]
pub enum Body {
    Solid(Solid),
    MultiSurface(Surface),
    CompositeSurface(Surface),
    MultiSolid(Vec<Solid>),
    CompositeSolid(Vec<Solid>),
    /// Instance of a geometry template, carrying the template's result
    Template {
        index: usize,
        result: Arc<PrimitiveReport>,
    },
}

/// One geometry of a feature
#[derive(Clone, Debug)]
pub struct Primitive {
    pub id: String,
    pub body: Body,
}

impl Primitive {
    pub fn new(id: impl Into<String>, body: Body) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match &self.body {
            Body::Solid(_) => PrimitiveKind::Solid,
            Body::MultiSurface(_) => PrimitiveKind::MultiSurface,
            Body::CompositeSurface(_) => PrimitiveKind::CompositeSurface,
            Body::MultiSolid(_) => PrimitiveKind::MultiSolid,
            Body::CompositeSolid(_) => PrimitiveKind::CompositeSolid,
            Body::Template { .. } => PrimitiveKind::GeometryTemplate,
        }
    }

    fn is_empty(&self) -> bool {
        match &self.body {
            Body::Solid(s) => s.is_empty(),
            Body::MultiSurface(s) | Body::CompositeSurface(s) => s.is_empty(),
            Body::MultiSolid(solids) | Body::CompositeSolid(solids) => {
                solids.iter().all(Solid::is_empty)
            }
            Body::Template { .. } => false,
        }
    }

    /// Validate and report
    pub fn validate(&self, opts: &ValidationOptions) -> PrimitiveReport {
        let mut errors = Vec::new();

        if self.is_empty() {
            errors.push(ErrorEntry::new(ErrorCode::EmptyPrimitive, "", "no polygons"));
            return PrimitiveReport::new(&self.id, self.kind(), errors);
        }

        match &self.body {
            Body::Solid(solid) => {
                solid.validate("", opts, &mut errors);
            }
            Body::MultiSurface(surface) => {
                for face in 0..surface.number_of_faces() {
                    validate_polygon(surface, face, "", opts, &mut errors);
                }
            }
            Body::CompositeSurface(surface) => {
                validate_composite_surface(surface, opts, &mut errors);
            }
            Body::MultiSolid(solids) | Body::CompositeSolid(solids) => {
                validate_solids(solids, opts, &mut errors);
            }
            Body::Template { index, result } => {
                log::trace!("{} reuses result of template {}", self.id, index);
                errors.extend(result.errors.iter().cloned());
            }
        }

        PrimitiveReport::new(&self.id, self.kind(), errors)
    }
}

fn validate_composite_surface(
    surface: &Surface,
    opts: &ValidationOptions,
    errors: &mut Vec<ErrorEntry>,
) {
    let before = errors.len();
    for face in 0..surface.number_of_faces() {
        validate_polygon(surface, face, "", opts, errors);
    }
    if errors.len() > before {
        return;
    }

    let stats = edge_stats(surface);
    if stats.non_manifold > 0 {
        errors.push(ErrorEntry::new(
            ErrorCode::NonManifoldCase,
            "",
            format!("{} edges used by more than two polygons", stats.non_manifold),
        ));
        return;
    }
    let components = connected_components(surface);
    if components > 1 {
        errors.push(ErrorEntry::new(
            ErrorCode::MultipleConnectedComponents,
            "",
            format!("{} components", components),
        ));
        return;
    }
    if stats.same_direction > 0 {
        errors.push(ErrorEntry::new(
            ErrorCode::PolygonWronglyOriented,
            "",
            format!("{} edges used twice in the same direction", stats.same_direction),
        ));
    }
}

fn validate_solids(solids: &[Solid], opts: &ValidationOptions, errors: &mut Vec<ErrorEntry>) {
    let before = errors.len();
    for (i, solid) in solids.iter().enumerate() {
        solid.validate(&format!("solid: {}; ", i), opts, errors);
    }
    if errors.len() > before {
        return;
    }

    let keys: Vec<Vec<[u64; 3]>> = solids.iter().map(|s| s.oshell().vertex_key()).collect();
    for a in 0..keys.len() {
        for b in (a + 1)..keys.len() {
            if keys[a] == keys[b] {
                errors.push(ErrorEntry::new(
                    ErrorCode::DuplicatedSolids,
                    "",
                    format!("solids: {} and {}", a, b),
                ));
            }
        }
    }
}

/// A city object (or tu3djson feature) with its primitives
#[derive(Clone, Debug)]
pub struct Feature {
    pub id: String,
    pub feature_type: String,
    pub primitives: Vec<Primitive>,
}

impl Feature {
    pub fn new(id: impl Into<String>, feature_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            feature_type: feature_type.into(),
            primitives: Vec::new(),
        }
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Validate every primitive
    pub fn validate(&self, opts: &ValidationOptions) -> FeatureReport {
        let primitives: Vec<PrimitiveReport> =
            self.primitives.iter().map(|p| p.validate(opts)).collect();
        let report = FeatureReport::new(&self.id, &self.feature_type, primitives);
        if report.validity {
            log::debug!("{} ({}) is valid", self.id, self.feature_type);
        } else {
            log::debug!(
                "{} ({}) has errors {:?}",
                self.id,
                self.feature_type,
                report.error_codes()
            );
        }
        report
    }
}

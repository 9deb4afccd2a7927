// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ring and polygon checks (1xx and 2xx codes)
//!
//! A polygon is checked in stages: rings on their own, then planarity, then
//! the rings against each other in the polygon's plane, and finally the
//! normals of its triangulation. Each stage only runs when the previous one
//! found nothing.

use crate::surface::{RingIds, Surface};
use crate::triangulation::{
    calculate_polygon_normal, plane_basis, project_to_2d_with_basis, triangulate_polygon_with_holes,
};
use crate::{Point2, Point3, Vector3};
use kf_model::{ErrorCode, ErrorEntry, ValidationOptions};
use rustc_hash::FxHashSet;

/// Relative tolerance of the 2D predicates
const EPS_2D: f64 = 1e-9;

// ============================================================================
// 2D predicates
// ============================================================================

#[inline]
fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Side of `p` relative to the directed line `a -> b`: 1 left, -1 right, 0 on it
#[inline]
fn side(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>, eps: f64) -> i8 {
    let len = (b - a).norm();
    if len == 0.0 {
        return 0;
    }
    let d = cross(a, b, p) / len;
    if d > eps {
        1
    } else if d < -eps {
        -1
    } else {
        0
    }
}

#[inline]
fn within_box(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>, eps: f64) -> bool {
    p.x >= a.x.min(b.x) - eps
        && p.x <= a.x.max(b.x) + eps
        && p.y >= a.y.min(b.y) - eps
        && p.y <= a.y.max(b.y) + eps
}

/// True if the closed segments `p1p2` and `q1q2` share at least one point
pub fn segments_intersect(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
    eps: f64,
) -> bool {
    let d1 = side(q1, q2, p1, eps);
    let d2 = side(q1, q2, p2, eps);
    let d3 = side(p1, p2, q1, eps);
    let d4 = side(p1, p2, q2, eps);

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }

    (d1 == 0 && within_box(q1, q2, p1, eps))
        || (d2 == 0 && within_box(q1, q2, p2, eps))
        || (d3 == 0 && within_box(p1, p2, q1, eps))
        || (d4 == 0 && within_box(p1, p2, q2, eps))
}

/// Two segments meeting at `shared` overlap when they leave it in the same direction
#[inline]
fn folds_back(shared: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>, eps: f64) -> bool {
    side(shared, a, b, eps) == 0 && (a - shared).dot(&(b - shared)) > 0.0
}

/// Twice the signed area; positive for counter-clockwise rings
pub fn signed_area_2d(ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area
}

/// Crossing-number point in ring test
pub fn point_in_ring(p: &Point2<f64>, ring: &[Point2<f64>]) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// ============================================================================
// Ring-level checks
// ============================================================================

fn has_consecutive_same(ring: &[usize]) -> bool {
    let n = ring.len();
    n >= 2 && (0..n).any(|i| ring[i] == ring[(i + 1) % n])
}

fn distinct_count(ring: &[usize]) -> usize {
    ring.iter().collect::<FxHashSet<_>>().len()
}

fn ring_self_intersects(ids: &[usize], pts: &[Point2<f64>], eps: f64) -> bool {
    let n = ids.len();
    if distinct_count(ids) != n {
        // the ring passes twice through the same vertex
        return true;
    }
    for i in 0..n {
        let a1 = &pts[i];
        let a2 = &pts[(i + 1) % n];
        for j in (i + 1)..n {
            let b1 = &pts[j];
            let b2 = &pts[(j + 1) % n];
            if j == i + 1 {
                if folds_back(a2, a1, b2, eps) {
                    return true;
                }
            } else if i == 0 && j == n - 1 {
                if folds_back(a1, a2, b1, eps) {
                    return true;
                }
            } else if segments_intersect(a1, a2, b1, b2, eps) {
                return true;
            }
        }
    }
    false
}

fn rings_intersect(
    ids_a: &[usize],
    pts_a: &[Point2<f64>],
    ids_b: &[usize],
    pts_b: &[Point2<f64>],
    eps: f64,
) -> bool {
    let na = ids_a.len();
    let nb = ids_b.len();
    for i in 0..na {
        let (ia1, ia2) = (ids_a[i], ids_a[(i + 1) % na]);
        let (a1, a2) = (&pts_a[i], &pts_a[(i + 1) % na]);
        for j in 0..nb {
            let (ib1, ib2) = (ids_b[j], ids_b[(j + 1) % nb]);
            let (b1, b2) = (&pts_b[j], &pts_b[(j + 1) % nb]);

            let shared = [ia1, ia2]
                .iter()
                .filter(|id| **id == ib1 || **id == ib2)
                .count();
            let hit = match shared {
                0 => segments_intersect(a1, a2, b1, b2, eps),
                // rings may touch in a single vertex; only an overlap counts
                1 => {
                    let (s, a_other, b_other) = if ia1 == ib1 {
                        (a1, a2, b2)
                    } else if ia1 == ib2 {
                        (a1, a2, b1)
                    } else if ia2 == ib1 {
                        (a2, a1, b2)
                    } else {
                        (a2, a1, b1)
                    };
                    folds_back(s, a_other, b_other, eps)
                }
                _ => true,
            };
            if hit {
                return true;
            }
        }
    }
    false
}

/// A point of `ring` that is not a vertex of `other`, for containment tests
fn sample_point(
    ids: &[usize],
    pts: &[Point2<f64>],
    other_ids: &[usize],
) -> Point2<f64> {
    ids.iter()
        .position(|id| !other_ids.contains(id))
        .map(|i| pts[i])
        .unwrap_or_else(|| Point2::from((pts[0].coords + pts[1].coords) * 0.5))
}

// ============================================================================
// Polygon validation
// ============================================================================

/// Validate one face of `surface`
///
/// Errors are appended to `errors` with the location `<loc>face: <n>`.
/// Returns `true` when the face has no error.
pub fn validate_polygon(
    surface: &Surface,
    face: usize,
    loc: &str,
    opts: &ValidationOptions,
    errors: &mut Vec<ErrorEntry>,
) -> bool {
    let rings: &[RingIds] = &surface.faces()[face];
    let id = format!("{}face: {}", loc, face);
    let before = errors.len();

    // -- rings on their own
    for (r, ring) in rings.iter().enumerate() {
        if distinct_count(ring) < 3 {
            errors.push(ErrorEntry::new(
                ErrorCode::TooFewPoints,
                &id,
                format!("ring: {}", r),
            ));
        } else if has_consecutive_same(ring) {
            errors.push(ErrorEntry::new(
                ErrorCode::ConsecutivePointsSame,
                &id,
                format!("ring: {}", r),
            ));
        }
    }
    if rings.is_empty() {
        errors.push(ErrorEntry::new(ErrorCode::TooFewPoints, &id, "polygon has no ring"));
    }
    if errors.len() > before {
        return false;
    }

    let rings_3d: Vec<Vec<Point3<f64>>> = rings.iter().map(|r| surface.ring_points(r)).collect();

    // -- planarity: distance to plane
    let mut ring_normals: Vec<Vector3<f64>> = Vec::with_capacity(rings.len());
    for (r, pts) in rings_3d.iter().enumerate() {
        match calculate_polygon_normal(pts) {
            Some(n) => ring_normals.push(n),
            None => {
                errors.push(ErrorEntry::new(
                    ErrorCode::RingSelfIntersection,
                    &id,
                    format!("ring: {} has no area (collinear points)", r),
                ));
                return false;
            }
        }
    }
    let normal = ring_normals[0];
    let outer = &rings_3d[0];
    let centroid = Point3::from(
        outer.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / outer.len() as f64,
    );

    let max_distance = rings_3d
        .iter()
        .flatten()
        .map(|p| (p - centroid).dot(&normal).abs())
        .fold(0.0_f64, f64::max);
    if max_distance > opts.planarity_d2p_tol {
        errors.push(ErrorEntry::new(
            ErrorCode::NonPlanarPolygonDistancePlane,
            &id,
            format!(
                "distance to fitted plane: {:.6} (tolerance {})",
                max_distance, opts.planarity_d2p_tol
            ),
        ));
        return false;
    }

    // -- rings against each other, in the plane
    let (u_axis, v_axis) = plane_basis(&normal);
    let rings_2d: Vec<Vec<Point2<f64>>> = rings_3d
        .iter()
        .map(|r| project_to_2d_with_basis(r, &u_axis, &v_axis, &centroid))
        .collect();
    let extent = rings_2d[0]
        .iter()
        .map(|p| p.coords.amax())
        .fold(0.0_f64, f64::max);
    let eps = EPS_2D * (1.0 + extent);

    for (r, ring) in rings.iter().enumerate() {
        if ring_self_intersects(ring, &rings_2d[r], eps) {
            errors.push(ErrorEntry::new(
                ErrorCode::RingSelfIntersection,
                &id,
                format!("ring: {}", r),
            ));
        }
    }
    if errors.len() > before {
        return false;
    }

    let mut sorted: Vec<Vec<usize>> = rings.to_vec();
    for s in sorted.iter_mut() {
        s.sort_unstable();
    }
    for a in 0..rings.len() {
        for b in (a + 1)..rings.len() {
            if sorted[a] == sorted[b] {
                errors.push(ErrorEntry::new(
                    ErrorCode::DuplicatedRings,
                    &id,
                    format!("rings: {} and {}", a, b),
                ));
            }
        }
    }
    if errors.len() > before {
        return false;
    }

    for a in 0..rings.len() {
        for b in (a + 1)..rings.len() {
            if rings_intersect(&rings[a], &rings_2d[a], &rings[b], &rings_2d[b], eps) {
                errors.push(ErrorEntry::new(
                    ErrorCode::IntersectionRings,
                    &id,
                    format!("rings: {} and {}", a, b),
                ));
            }
        }
    }
    if errors.len() > before {
        return false;
    }

    for r in 1..rings.len() {
        let sample = sample_point(&rings[r], &rings_2d[r], &rings[0]);
        if !point_in_ring(&sample, &rings_2d[0]) {
            errors.push(ErrorEntry::new(
                ErrorCode::InnerRingOutside,
                &id,
                format!("ring: {}", r),
            ));
        }
    }
    if errors.len() > before {
        return false;
    }

    for a in 1..rings.len() {
        for b in 1..rings.len() {
            if a == b {
                continue;
            }
            let sample = sample_point(&rings[a], &rings_2d[a], &rings[b]);
            if point_in_ring(&sample, &rings_2d[b]) {
                errors.push(ErrorEntry::new(
                    ErrorCode::InnerRingsNested,
                    &id,
                    format!("ring {} inside ring {}", a, b),
                ));
            }
        }
    }
    if errors.len() > before {
        return false;
    }

    for (r, ring) in rings_2d.iter().enumerate().skip(1) {
        if signed_area_2d(ring) > 0.0 {
            errors.push(ErrorEntry::new(
                ErrorCode::OrientationRingsSame,
                &id,
                format!("ring: {}", r),
            ));
        }
    }
    if errors.len() > before {
        return false;
    }

    // -- planarity: normals of the triangulation
    if let Some(angle) = max_triangle_deviation(&rings_3d, &rings_2d, &normal) {
        if angle > opts.planarity_n_tol {
            errors.push(ErrorEntry::new(
                ErrorCode::NonPlanarPolygonNormalsDeviation,
                &id,
                format!(
                    "triangle normal deviates {:.3} degrees (tolerance {})",
                    angle, opts.planarity_n_tol
                ),
            ));
            return false;
        }
    }

    true
}

/// Largest angle (degrees) between a triangle normal and the polygon normal
fn max_triangle_deviation(
    rings_3d: &[Vec<Point3<f64>>],
    rings_2d: &[Vec<Point2<f64>>],
    normal: &Vector3<f64>,
) -> Option<f64> {
    let indices = match triangulate_polygon_with_holes(&rings_2d[0], &rings_2d[1..]) {
        Ok(indices) => indices,
        Err(e) => {
            log::debug!("skipping normals deviation check: {}", e);
            return None;
        }
    };
    let all: Vec<&Point3<f64>> = rings_3d.iter().flatten().collect();

    let mut worst = 0.0_f64;
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (all[tri[0]], all[tri[1]], all[tri[2]]);
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len <= crate::triangulation::DEGENERATE_NORMAL {
            continue;
        }
        // earcut does not preserve winding, so compare up to sign
        let cos = (n.dot(normal) / len).abs().min(1.0);
        worst = worst.max(cos.acos().to_degrees());
    }
    Some(worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(z: f64, size: f64, offset: f64) -> Vec<Point3<f64>> {
        vec![
            Point3::new(offset, offset, z),
            Point3::new(offset + size, offset, z),
            Point3::new(offset + size, offset + size, z),
            Point3::new(offset, offset + size, z),
        ]
    }

    fn check(rings: &[Vec<Point3<f64>>]) -> Vec<ErrorCode> {
        let mut s = Surface::new(None, 0.001);
        s.add_face_points(rings);
        let mut errors = Vec::new();
        validate_polygon(&s, 0, "", &ValidationOptions::default(), &mut errors);
        errors.into_iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_valid_square() {
        assert!(check(&[square(0.0, 1.0, 0.0)]).is_empty());
    }

    #[test]
    fn test_too_few_points() {
        let ring = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(check(&[ring]), vec![ErrorCode::TooFewPoints]);
    }

    #[test]
    fn test_consecutive_points_same() {
        let mut ring = square(0.0, 1.0, 0.0);
        ring.insert(2, ring[1]);
        assert_eq!(check(&[ring]), vec![ErrorCode::ConsecutivePointsSame]);
    }

    #[test]
    fn test_bowtie_self_intersects() {
        let ring = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(check(&[ring]), vec![ErrorCode::RingSelfIntersection]);
    }

    #[test]
    fn test_non_planar() {
        let mut ring = square(0.0, 1.0, 0.0);
        ring[2].z = 0.2;
        assert_eq!(check(&[ring]), vec![ErrorCode::NonPlanarPolygonDistancePlane]);
    }

    #[test]
    fn test_normals_deviation() {
        // within the distance tolerance, but the two triangles fold by about 0.3 degrees
        let mut ring = square(0.0, 1.0, 0.0);
        ring[2].z = 0.008;
        assert!(check(&[ring.clone()]).is_empty());

        let mut s = Surface::new(None, 0.001);
        s.add_face_points(&[ring]);
        let strict = ValidationOptions {
            planarity_n_tol: 0.1,
            ..ValidationOptions::default()
        };
        let mut errors = Vec::new();
        assert!(!validate_polygon(&s, 0, "", &strict, &mut errors));
        let codes: Vec<ErrorCode> = errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::NonPlanarPolygonNormalsDeviation]);
        assert_eq!(errors[0].id, "face: 0");
    }

    #[test]
    fn test_hole_valid_and_wrong_orientation() {
        let outer = square(0.0, 10.0, 0.0);
        let hole: Vec<_> = square(0.0, 2.0, 4.0).into_iter().rev().collect();
        assert!(check(&[outer.clone(), hole]).is_empty());

        let same_way = square(0.0, 2.0, 4.0);
        assert_eq!(
            check(&[outer, same_way]),
            vec![ErrorCode::OrientationRingsSame]
        );
    }

    #[test]
    fn test_hole_outside() {
        let outer = square(0.0, 10.0, 0.0);
        let hole: Vec<_> = square(0.0, 2.0, 20.0).into_iter().rev().collect();
        assert_eq!(check(&[outer, hole]), vec![ErrorCode::InnerRingOutside]);
    }

    #[test]
    fn test_hole_crossing_outer() {
        let outer = square(0.0, 10.0, 0.0);
        let hole: Vec<_> = square(0.0, 4.0, 8.0).into_iter().rev().collect();
        assert_eq!(check(&[outer, hole]), vec![ErrorCode::IntersectionRings]);
    }

    #[test]
    fn test_nested_holes() {
        let outer = square(0.0, 10.0, 0.0);
        let big: Vec<_> = square(0.0, 6.0, 2.0).into_iter().rev().collect();
        let small: Vec<_> = square(0.0, 1.0, 4.0).into_iter().rev().collect();
        let codes = check(&[outer, big, small]);
        assert_eq!(codes, vec![ErrorCode::InnerRingsNested]);
    }

    #[test]
    fn test_duplicated_rings() {
        let outer = square(0.0, 10.0, 0.0);
        let hole: Vec<_> = square(0.0, 2.0, 4.0).into_iter().rev().collect();
        assert_eq!(
            check(&[outer, hole.clone(), hole]),
            vec![ErrorCode::DuplicatedRings]
        );
    }

    #[test]
    fn test_segments_intersect_touching() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        let c = Point2::new(1.0, 0.0);
        let d = Point2::new(1.0, 1.0);
        assert!(segments_intersect(&a, &b, &c, &d, 1e-9));
        let e = Point2::new(1.0, 0.5);
        assert!(!segments_intersect(&a, &b, &e, &d, 1e-9));
    }

    #[test]
    fn test_point_in_ring() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        assert!(point_in_ring(&Point2::new(2.0, 2.0), &ring));
        assert!(!point_in_ring(&Point2::new(5.0, 2.0), &ring));
    }
}

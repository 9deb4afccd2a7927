// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shell checks (3xx codes)
//!
//! Topology is read from the directed edges of every ring: in a closed,
//! consistently oriented 2-manifold each undirected edge is used exactly twice,
//! once in each direction.

use crate::polygon::{point_in_ring, validate_polygon};
use crate::surface::Surface;
use crate::triangulation::{newell_normal, plane_basis, project_to_2d_with_basis};
use crate::{Point3, Vector3};
use kf_model::{ErrorCode, ErrorEntry, ValidationOptions};
use rustc_hash::FxHashMap;

/// Ray direction for point-in-shell tests; irrational ratios keep it off edges
const RAY_DIRECTION: [f64; 3] = [1.0, 0.414_213_562_373, 0.236_067_977_5];

/// Edge usage statistics of a surface
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeStats {
    /// Undirected edges used by a single polygon
    pub boundary: usize,
    /// Undirected edges used by more than two polygons
    pub non_manifold: usize,
    /// Directed edges used more than once
    pub same_direction: usize,
}

/// Count how each edge of `surface` is used
pub fn edge_stats(surface: &Surface) -> EdgeStats {
    let mut directed: FxHashMap<(usize, usize), usize> = FxHashMap::default();
    for face in surface.faces() {
        for ring in face {
            let n = ring.len();
            for i in 0..n {
                *directed.entry((ring[i], ring[(i + 1) % n])).or_default() += 1;
            }
        }
    }

    let mut stats = EdgeStats::default();
    for (&(a, b), &count) in &directed {
        if count > 1 {
            stats.same_direction += 1;
        }
        // visit each undirected edge once, from its smaller end
        let reverse = directed.get(&(b, a)).copied().unwrap_or(0);
        if a < b || reverse == 0 {
            let total = count + reverse;
            if total == 1 {
                stats.boundary += 1;
            } else if total > 2 {
                stats.non_manifold += 1;
            }
        }
    }
    stats
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Number of groups of faces connected through shared edges
pub fn connected_components(surface: &Surface) -> usize {
    let faces = surface.faces();
    let mut parent: Vec<usize> = (0..faces.len()).collect();
    let mut edge_owner: FxHashMap<(usize, usize), usize> = FxHashMap::default();

    for (f, face) in faces.iter().enumerate() {
        for ring in face {
            let n = ring.len();
            for i in 0..n {
                let (a, b) = (ring[i], ring[(i + 1) % n]);
                let key = (a.min(b), a.max(b));
                match edge_owner.get(&key) {
                    Some(&other) => {
                        let ra = find(&mut parent, f);
                        let rb = find(&mut parent, other);
                        if ra != rb {
                            parent[ra] = rb;
                        }
                    }
                    None => {
                        edge_owner.insert(key, f);
                    }
                }
            }
        }
    }

    (0..faces.len())
        .filter(|&i| find(&mut parent, i) == i)
        .count()
}

/// Signed volume enclosed by a closed surface
///
/// Positive when the polygons are oriented outwards.
pub fn signed_volume(surface: &Surface) -> f64 {
    let mut volume = 0.0;
    for face in surface.faces() {
        let Some(outer) = face.first() else {
            continue;
        };
        let Some(&anchor) = outer.first() else {
            continue;
        };
        // inner rings run the other way, so summing subtracts the holes
        let area2: Vector3<f64> = face
            .iter()
            .map(|ring| newell_normal(&surface.ring_points(ring)))
            .sum();
        volume += surface.point(anchor).coords.dot(&area2);
    }
    volume / 6.0
}

/// Crossing-number test of a point against a closed surface
pub fn point_in_shell(p: &Point3<f64>, surface: &Surface) -> bool {
    let dir = Vector3::new(RAY_DIRECTION[0], RAY_DIRECTION[1], RAY_DIRECTION[2]);
    let mut crossings = 0usize;

    for face in surface.faces() {
        let rings: Vec<Vec<Point3<f64>>> = face.iter().map(|r| surface.ring_points(r)).collect();
        let Some(outer) = rings.first() else {
            continue;
        };
        let normal = newell_normal(outer);
        let len = normal.norm();
        if len == 0.0 {
            continue;
        }
        let normal = normal / len;

        let denom = normal.dot(&dir);
        if denom.abs() < 1e-12 {
            continue;
        }
        let t = normal.dot(&(outer[0] - p)) / denom;
        if t <= 0.0 {
            continue;
        }
        let hit = p + dir * t;

        let (u, v) = plane_basis(&normal);
        let origin = outer[0];
        let hit_2d = project_to_2d_with_basis(&[hit], &u, &v, &origin)[0];
        let inside_outer = point_in_ring(&hit_2d, &project_to_2d_with_basis(outer, &u, &v, &origin));
        let inside_hole = rings[1..]
            .iter()
            .any(|hole| point_in_ring(&hit_2d, &project_to_2d_with_basis(hole, &u, &v, &origin)));
        if inside_outer && !inside_hole {
            crossings += 1;
        }
    }

    crossings % 2 == 1
}

/// Validate one shell: its polygons, then its topology
///
/// Orientation of the shell as a whole is left to the caller, since inner
/// shells of a solid must face the other way. Returns `true` when no error
/// was found.
pub fn validate_shell(
    surface: &Surface,
    loc: &str,
    opts: &ValidationOptions,
    errors: &mut Vec<ErrorEntry>,
) -> bool {
    let before = errors.len();

    for face in 0..surface.number_of_faces() {
        validate_polygon(surface, face, loc, opts, errors);
    }
    if errors.len() > before {
        return false;
    }

    let id = loc.trim_end_matches("; ").to_string();

    if surface.number_of_faces() < 4 {
        errors.push(ErrorEntry::new(
            ErrorCode::TooFewPolygons,
            &id,
            format!("{} polygons", surface.number_of_faces()),
        ));
        return false;
    }

    let stats = edge_stats(surface);
    if stats.boundary > 0 {
        errors.push(ErrorEntry::new(
            ErrorCode::ShellNotClosed,
            &id,
            format!("{} edges used by a single polygon", stats.boundary),
        ));
    }
    if stats.non_manifold > 0 {
        errors.push(ErrorEntry::new(
            ErrorCode::NonManifoldCase,
            &id,
            format!("{} edges used by more than two polygons", stats.non_manifold),
        ));
    }
    if errors.len() > before {
        return false;
    }

    let components = connected_components(surface);
    if components > 1 {
        errors.push(ErrorEntry::new(
            ErrorCode::MultipleConnectedComponents,
            &id,
            format!("{} components", components),
        ));
        return false;
    }

    if stats.same_direction > 0 {
        errors.push(ErrorEntry::new(
            ErrorCode::PolygonWronglyOriented,
            &id,
            format!("{} edges used twice in the same direction", stats.same_direction),
        ));
        return false;
    }

    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Outward-oriented faces of the unit cube, as vertex indices
    pub(crate) const CUBE_FACES: [[usize; 4]; 6] = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [0, 4, 7, 3],
        [1, 2, 6, 5],
    ];

    pub(crate) fn cube_points(origin: [f64; 3], size: f64) -> Vec<Point3<f64>> {
        let [x, y, z] = origin;
        vec![
            Point3::new(x, y, z),
            Point3::new(x + size, y, z),
            Point3::new(x + size, y + size, z),
            Point3::new(x, y + size, z),
            Point3::new(x, y, z + size),
            Point3::new(x + size, y, z + size),
            Point3::new(x + size, y + size, z + size),
            Point3::new(x, y + size, z + size),
        ]
    }

    pub(crate) fn cube_surface(origin: [f64; 3], size: f64, flip: bool) -> Surface {
        let pts = cube_points(origin, size);
        let mut s = Surface::new(Some(0), 0.001);
        for face in CUBE_FACES {
            let mut ring: Vec<Point3<f64>> = face.iter().map(|&i| pts[i]).collect();
            if flip {
                ring.reverse();
            }
            s.add_face_points(&[ring]);
        }
        s
    }

    fn codes(surface: &Surface) -> Vec<ErrorCode> {
        let mut errors = Vec::new();
        validate_shell(surface, "shell: 0; ", &ValidationOptions::default(), &mut errors);
        errors.into_iter().map(|e| e.code).collect()
    }

    #[test]
    fn test_cube_is_closed_and_oriented() {
        let cube = cube_surface([0.0, 0.0, 0.0], 1.0, false);
        assert!(codes(&cube).is_empty());
        assert_eq!(edge_stats(&cube), EdgeStats::default());
        assert_relative_eq!(signed_volume(&cube), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flipped_cube_has_negative_volume() {
        let cube = cube_surface([0.0, 0.0, 0.0], 2.0, true);
        assert!(codes(&cube).is_empty());
        assert_relative_eq!(signed_volume(&cube), -8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_open_cube() {
        let pts = cube_points([0.0, 0.0, 0.0], 1.0);
        let mut s = Surface::new(Some(0), 0.001);
        for face in &CUBE_FACES[..5] {
            s.add_face_points(&[face.iter().map(|&i| pts[i]).collect()]);
        }
        assert_eq!(codes(&s), vec![ErrorCode::ShellNotClosed]);
    }

    #[test]
    fn test_one_face_flipped() {
        let pts = cube_points([0.0, 0.0, 0.0], 1.0);
        let mut s = Surface::new(Some(0), 0.001);
        for (k, face) in CUBE_FACES.iter().enumerate() {
            let mut ring: Vec<_> = face.iter().map(|&i| pts[i]).collect();
            if k == 1 {
                ring.reverse();
            }
            s.add_face_points(&[ring]);
        }
        assert_eq!(codes(&s), vec![ErrorCode::PolygonWronglyOriented]);
    }

    #[test]
    fn test_too_few_polygons() {
        let pts = cube_points([0.0, 0.0, 0.0], 1.0);
        let mut s = Surface::new(Some(0), 0.001);
        for face in &CUBE_FACES[..3] {
            s.add_face_points(&[face.iter().map(|&i| pts[i]).collect()]);
        }
        assert_eq!(codes(&s), vec![ErrorCode::TooFewPolygons]);
    }

    #[test]
    fn test_two_cubes_in_one_shell() {
        let mut s = cube_surface([0.0, 0.0, 0.0], 1.0, false);
        let far = cube_surface([5.0, 0.0, 0.0], 1.0, false);
        for face in far.faces() {
            let rings: Vec<Vec<Point3<f64>>> = face.iter().map(|r| far.ring_points(r)).collect();
            s.add_face_points(&rings);
        }
        assert_eq!(connected_components(&s), 2);
        assert_eq!(codes(&s), vec![ErrorCode::MultipleConnectedComponents]);
    }

    #[test]
    fn test_cubes_touching_along_an_edge() {
        // the second cube shares the vertical edge at (1, 1)
        let mut s = cube_surface([0.0, 0.0, 0.0], 1.0, false);
        let other = cube_surface([1.0, 1.0, 0.0], 1.0, false);
        for face in other.faces() {
            let rings: Vec<Vec<Point3<f64>>> = face.iter().map(|r| other.ring_points(r)).collect();
            s.add_face_points(&rings);
        }
        let stats = edge_stats(&s);
        assert_eq!(stats.non_manifold, 1);
        assert_eq!(stats.boundary, 0);
        assert_eq!(codes(&s), vec![ErrorCode::NonManifoldCase]);
    }

    #[test]
    fn test_fin_is_open_and_non_manifold() {
        let mut s = cube_surface([0.0, 0.0, 0.0], 1.0, false);
        s.add_face_points(&[vec![
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ]]);
        assert_eq!(
            codes(&s),
            vec![ErrorCode::ShellNotClosed, ErrorCode::NonManifoldCase]
        );
    }

    #[test]
    fn test_point_in_shell() {
        let cube = cube_surface([0.0, 0.0, 0.0], 4.0, false);
        assert!(point_in_shell(&Point3::new(1.0, 1.0, 1.0), &cube));
        assert!(point_in_shell(&Point3::new(2.0, 2.0, 2.0), &cube));
        assert!(!point_in_shell(&Point3::new(6.0, 1.0, 1.0), &cube));
        assert!(!point_in_shell(&Point3::new(-1.0, 2.0, 2.0), &cube));
    }
}

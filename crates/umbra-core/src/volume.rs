//! Shadow volume geometry for one (mesh, light) pair.

use glam::{Vec3, Vec4};

use crate::edge_set::EdgeSet;
use crate::structure::Winding;

/// Primitive used for the side faces of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideKind {
    /// Four vertices per silhouette edge. Used for point lights.
    Quads,
    /// Three vertices per silhouette edge, the third one shared at infinity.
    /// Used for directional lights.
    Triangles,
}

impl SideKind {
    /// Vertices per side face.
    #[must_use]
    pub fn vertices_per_face(self) -> usize {
        match self {
            SideKind::Quads => 4,
            SideKind::Triangles => 3,
        }
    }
}

/// Projects a finite point away from `source` to infinity.
///
/// Returns `(x * w - l.xyz, 0)`: for a point light the direction from the
/// light through `x`, for a directional light the light's travel direction.
#[must_use]
pub fn extrude(point: Vec3, source: Vec4) -> Vec4 {
    (point * source.w - source.truncate()).extend(0.0)
}

/// The shadow volume cast by one mesh from one light.
///
/// Built once from an [`EdgeSet`] and a homogeneous light vector in the mesh's
/// local frame, then immutable. All geometry shares the edge set's winding.
#[derive(Debug, Clone)]
pub struct Volume {
    source: Vec4,
    winding: Winding,
    side_kind: SideKind,
    silhouette: Vec<(Vec3, Vec3)>,
    edges: Vec<Vec4>,
    forward_indices: Vec<u32>,
    backward_points: Option<Vec<Vec4>>,
}

impl Volume {
    /// Computes the volume of `edge_set` for the light vector `source`.
    ///
    /// `source.w != 0` is a point light, `source.w == 0` a directional one.
    #[must_use]
    pub fn calculate(edge_set: &EdgeSet, source: Vec4) -> Self {
        let positional = source.w != 0.0;
        let side_kind = if positional {
            SideKind::Quads
        } else {
            SideKind::Triangles
        };

        let facing: Vec<bool> = edge_set
            .plane_equations()
            .iter()
            .map(|plane| plane.dot(source) > 0.0)
            .collect();

        // Silhouette edges, ordered so the lit triangle winds start -> end
        // backwards.
        let mut silhouette = Vec::new();
        for edge in edge_set.boundary_edges() {
            if facing[edge.triangle] {
                silhouette.push((edge.start, edge.end));
            }
        }
        for edge in edge_set.interior_edges() {
            match (facing[edge.triangles[0]], facing[edge.triangles[1]]) {
                (true, false) => silhouette.push((edge.b, edge.a)),
                (false, true) => silhouette.push((edge.a, edge.b)),
                _ => {}
            }
        }

        if silhouette.is_empty() {
            return Self {
                source,
                winding: edge_set.winding(),
                side_kind,
                silhouette,
                edges: Vec::new(),
                forward_indices: Vec::new(),
                backward_points: positional.then(Vec::new),
            };
        }

        let mut edges = Vec::with_capacity(silhouette.len() * side_kind.vertices_per_face());
        match side_kind {
            SideKind::Quads => {
                for &(start, end) in &silhouette {
                    edges.extend([
                        start.extend(1.0),
                        end.extend(1.0),
                        extrude(end, source),
                        extrude(start, source),
                    ]);
                }
            }
            SideKind::Triangles => {
                // `+ 0.0` folds negative zero.
                let apex = (Vec3::ZERO - source.truncate() + 0.0).extend(0.0);
                for &(start, end) in &silhouette {
                    edges.extend([start.extend(1.0), end.extend(1.0), apex]);
                }
            }
        }

        let mut forward_indices = Vec::new();
        for (triangle, _) in facing.iter().enumerate().filter(|(_, lit)| **lit) {
            #[allow(clippy::cast_possible_truncation)]
            let base = (triangle * 3) as u32;
            forward_indices.extend([base, base + 1, base + 2]);
        }

        let backward_points = positional.then(|| {
            let points = edge_set.points();
            let mut boot = Vec::new();
            if edge_set.boundary_edges().is_empty() {
                // Closed mesh: the unlit half already closes the far end.
                for (tri, _) in points
                    .chunks_exact(3)
                    .zip(&facing)
                    .filter(|(_, lit)| !**lit)
                {
                    boot.extend(tri.iter().map(|&p| extrude(p, source)));
                }
            } else {
                // Open mesh: mirror the cap, reversing its winding.
                for (tri, _) in points.chunks_exact(3).zip(&facing).filter(|(_, lit)| **lit) {
                    boot.extend([
                        extrude(tri[0], source),
                        extrude(tri[2], source),
                        extrude(tri[1], source),
                    ]);
                }
            }
            boot
        });

        Self {
            source,
            winding: edge_set.winding(),
            side_kind,
            silhouette,
            edges,
            forward_indices,
            backward_points,
        }
    }

    /// The light vector this volume was built for.
    pub fn source_vector(&self) -> Vec4 {
        self.source
    }

    /// Winding of every face of the volume.
    pub fn winding(&self) -> Winding {
        self.winding
    }

    /// Primitive of the side faces.
    pub fn side_kind(&self) -> SideKind {
        self.side_kind
    }

    /// Silhouette edges as `(start, end)` pairs.
    pub fn silhouette(&self) -> &[(Vec3, Vec3)] {
        &self.silhouette
    }

    /// Flat homogeneous vertex array of the side faces.
    pub fn edges(&self) -> &[Vec4] {
        &self.edges
    }

    /// Point indices into the edge set's soup selecting the light cap.
    pub fn forward_indices(&self) -> &[u32] {
        &self.forward_indices
    }

    /// Triangles of the far cap at infinity. `None` for directional lights.
    pub fn backward_points(&self) -> Option<&[Vec4]> {
        self.backward_points.as_deref()
    }

    /// Number of side faces.
    pub fn num_side_faces(&self) -> usize {
        self.edges.len() / self.side_kind.vertices_per_face()
    }

    /// Number of cap triangles.
    pub fn num_cap_triangles(&self) -> usize {
        self.forward_indices.len() / 3
    }

    /// Number of boot triangles.
    pub fn num_boot_triangles(&self) -> usize {
        self.backward_points.as_ref().map_or(0, |points| points.len() / 3)
    }

    /// Whether the volume casts no shadow.
    pub fn is_empty(&self) -> bool {
        self.silhouette.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::UVec3;
    use proptest::prelude::*;

    use super::*;
    use crate::light::Light;
    use crate::mesh::cube;
    use crate::registry::Registry;

    fn soup(vertices: &[Vec3], faces: &[UVec3]) -> Vec<Vec3> {
        faces
            .iter()
            .flat_map(|f| f.to_array().map(|i| vertices[i as usize]))
            .collect()
    }

    fn cube_set(min: Vec3, max: Vec3) -> EdgeSet {
        let (vertices, faces) = cube(min, max);
        EdgeSet::new(soup(&vertices, &faces), Winding::CounterClockwise).unwrap()
    }

    fn unit_triangle() -> EdgeSet {
        EdgeSet::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], Winding::CounterClockwise).unwrap()
    }

    #[test]
    fn test_point_light_over_triangle() {
        let set = unit_triangle();
        let volume = Volume::calculate(&set, Vec4::new(1.0 / 3.0, 1.0 / 3.0, 5.0, 1.0));
        assert_eq!(volume.side_kind(), SideKind::Quads);
        assert_eq!(volume.num_side_faces(), 3);
        assert_eq!(volume.edges().len(), 12);
        assert_eq!(volume.forward_indices(), &[0, 1, 2]);
        assert_eq!(volume.backward_points().map(<[Vec4]>::len), Some(3));
        assert!(!volume.is_empty());
    }

    #[test]
    fn test_point_light_below_triangle_is_empty() {
        let set = unit_triangle();
        let volume = Volume::calculate(&set, Vec4::new(0.2, 0.2, -5.0, 1.0));
        assert!(volume.is_empty());
        assert!(volume.edges().is_empty());
        assert!(volume.forward_indices().is_empty());
        assert_eq!(volume.num_boot_triangles(), 0);
    }

    #[test]
    fn test_side_quad_layout() {
        let set = unit_triangle();
        let source = Vec4::new(0.25, 0.25, 2.0, 1.0);
        let volume = Volume::calculate(&set, source);
        // First boundary edge is 0 -> X, emitted reversed.
        let quad = &volume.edges()[0..4];
        assert_eq!(quad[0], Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(quad[1], Vec4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(quad[2], extrude(Vec3::ZERO, source));
        assert_eq!(quad[3], extrude(Vec3::X, source));
    }

    #[test]
    fn test_open_boot_reverses_cap() {
        let set = unit_triangle();
        let source = Vec4::new(0.25, 0.25, 2.0, 1.0);
        let volume = Volume::calculate(&set, source);
        let boot = volume.backward_points().unwrap();
        assert_eq!(boot[0], extrude(Vec3::ZERO, source));
        assert_eq!(boot[1], extrude(Vec3::Y, source));
        assert_eq!(boot[2], extrude(Vec3::X, source));
    }

    #[test]
    fn test_directional_light_on_cube_face() {
        let set = cube_set(Vec3::ZERO, Vec3::ONE);
        let light = Light::directional(Vec3::NEG_Y);
        let volume = Volume::calculate(&set, light.world_vector());

        assert_eq!(volume.side_kind(), SideKind::Triangles);
        // Only the four top edges separate lit from unlit faces.
        assert_eq!(volume.silhouette().len(), 4);
        assert_eq!(volume.num_side_faces(), 4);
        for &(start, end) in volume.silhouette() {
            assert_eq!(start.y, 1.0);
            assert_eq!(end.y, 1.0);
        }
        // The cap is the two triangles of the +Y face.
        assert_eq!(volume.forward_indices(), &[18, 19, 20, 21, 22, 23]);
        assert!(volume.backward_points().is_none());
        // Every side triangle meets at the point at infinity below the cube.
        for face in volume.edges().chunks_exact(3) {
            assert_eq!(face[2], Vec4::new(0.0, -1.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_apex_has_no_negative_zero() {
        let set = cube_set(Vec3::ZERO, Vec3::ONE);
        let volume = Volume::calculate(&set, Vec4::new(0.0, 1.0, 0.0, 0.0));
        let apex = volume.edges()[2];
        assert!(apex.x.is_sign_positive());
        assert!(apex.z.is_sign_positive());
    }

    #[test]
    fn test_closed_cube_boot_is_unlit_half() {
        let set = cube_set(Vec3::splat(-0.5), Vec3::splat(0.5));
        let volume = Volume::calculate(&set, Vec4::new(0.0, 5.0, 0.0, 1.0));
        assert_eq!(volume.num_cap_triangles(), 2);
        assert_eq!(volume.num_boot_triangles(), 10);
        assert_eq!(volume.silhouette().len(), 4);
    }

    #[test]
    fn test_extrusion_round_trip() {
        let source = Vec4::new(1.0, 4.0, -2.0, 1.0);
        let point = Vec3::new(0.5, 0.25, 0.75);
        let far = extrude(point, source);
        assert_eq!(far.w, 0.0);
        // Walking from the light along the far vertex's direction reaches the
        // original point at a positive distance.
        let light = source.truncate();
        let direction = far.truncate();
        let s = direction.dot(point - light) / direction.length_squared();
        assert!(s > 0.0);
        assert!((light + s * direction).abs_diff_eq(point, 1e-5));
    }

    #[test]
    fn test_directional_extrusion_is_parallel_to_light() {
        let light = Light::directional(Vec3::new(1.0, -2.0, 0.5));
        let source = light.world_vector();
        let far = extrude(Vec3::new(3.0, 1.0, -1.0), source);
        assert_eq!(far.w, 0.0);
        let travel = Vec3::new(1.0, -2.0, 0.5);
        assert!(far.truncate().cross(travel).length() < 1e-6);
        assert!(far.truncate().dot(travel) > 0.0);
    }

    #[test]
    fn test_light_delta_invalidates_cache() {
        let mut set = unit_triangle();
        let mut registry = Registry::new();
        let id = registry.register_light("lamp", Light::point(Vec3::ZERO));

        let before = set.volume(id, Vec4::new(0.25, 0.25, 2.0, 1.0));
        let after = set.volume(id, Vec4::new(0.25, 0.25, 2.0 + f32::EPSILON * 4.0, 1.0));
        assert!(!Arc::ptr_eq(&before, &after));
        assert_ne!(before.edges(), after.edges());

        let again = set.volume(id, after.source_vector());
        assert!(Arc::ptr_eq(&after, &again));
    }

    /// Signed count of volume faces crossed by the segment `eye -> target`,
    /// +1 for faces seen from the front, -1 for faces seen from behind.
    ///
    /// Points at infinity are pulled in to a large finite distance from the
    /// light, which keeps the volume closed.
    fn stencil_count(set: &EdgeSet, volume: &Volume, eye: Vec3, target: Vec3) -> i32 {
        let light = volume.source_vector().truncate();
        let finite = |v: Vec4| {
            if v.w == 0.0 {
                light + v.truncate() * 1000.0
            } else {
                v.truncate() / v.w
            }
        };

        let mut triangles: Vec<[Vec3; 3]> = Vec::new();
        for cap in volume.forward_indices().chunks_exact(3) {
            let p = set.points();
            triangles.push([
                p[cap[0] as usize],
                p[cap[1] as usize],
                p[cap[2] as usize],
            ]);
        }
        for quad in volume.edges().chunks_exact(4) {
            let q = quad.iter().copied().map(&finite).collect::<Vec<_>>();
            triangles.push([q[0], q[1], q[2]]);
            triangles.push([q[0], q[2], q[3]]);
        }
        for boot in volume.backward_points().unwrap_or_default().chunks_exact(3) {
            triangles.push([finite(boot[0]), finite(boot[1]), finite(boot[2])]);
        }

        let dir = target - eye;
        let mut count = 0;
        for [a, b, c] in triangles {
            let e1 = b - a;
            let e2 = c - a;
            let p = dir.cross(e2);
            let det = e1.dot(p);
            if det.abs() < 1e-9 {
                continue;
            }
            let s = eye - a;
            let u = s.dot(p) / det;
            let q = s.cross(e1);
            let v = dir.dot(q) / det;
            let t = e2.dot(q) / det;
            if u < 0.0 || v < 0.0 || u + v > 1.0 || t <= 0.0 || t >= 1.0 {
                continue;
            }
            let normal = e1.cross(e2);
            count += if normal.dot(dir) < 0.0 { 1 } else { -1 };
        }
        count
    }

    #[test]
    fn test_stencil_parity_inside_and_outside() {
        let set = cube_set(Vec3::splat(-0.5), Vec3::splat(0.5));
        let volume = Volume::calculate(&set, Vec4::new(0.0, 5.0, 0.0, 1.0));
        let eye = Vec3::new(4.1, 0.3, 3.7);

        assert_eq!(stencil_count(&set, &volume, eye, Vec3::new(0.05, -2.0, 0.1)), 1);
        assert_eq!(stencil_count(&set, &volume, eye, Vec3::new(2.0, -2.0, 0.3)), 0);
        assert_eq!(stencil_count(&set, &volume, eye, Vec3::new(-3.0, -1.0, 0.2)), 0);
    }

    proptest! {
        #[test]
        fn prop_stencil_parity_for_points_below_cube(
            x in -0.3f32..0.3,
            z in -0.3f32..0.3,
            depth in 1.0f32..6.0,
        ) {
            let set = cube_set(Vec3::splat(-0.5), Vec3::splat(0.5));
            let volume = Volume::calculate(&set, Vec4::new(0.0, 5.0, 0.0, 1.0));
            let eye = Vec3::new(4.1, 0.3, 3.7);
            let target = Vec3::new(x, -depth, z);
            prop_assert_eq!(stencil_count(&set, &volume, eye, target), 1);
        }

        #[test]
        fn prop_volume_is_deterministic(
            lx in -5.0f32..5.0,
            ly in 1.0f32..5.0,
            lz in -5.0f32..5.0,
        ) {
            let set = cube_set(Vec3::splat(-0.5), Vec3::splat(0.5));
            let source = Vec4::new(lx, ly, lz, 1.0);
            let a = Volume::calculate(&set, source);
            let b = Volume::calculate(&set, source);
            prop_assert_eq!(a.edges(), b.edges());
            prop_assert_eq!(a.forward_indices(), b.forward_indices());
            prop_assert_eq!(a.silhouette().len() * 4, a.edges().len());
        }
    }
}

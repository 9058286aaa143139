//! Low-poly mesh generation
//!
//! Every mesh is a non-indexed triangle list with flat normals, centered on
//! the origin. Face winding is fixed up so normals always point outward.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

use super::vertex::Vertex;
use crate::sim::Layer;

/// Segments around and rings along the wish sphere
const SPHERE_SEGMENTS: u32 = 12;
const SPHERE_RINGS: u32 = 12;

/// Push one flat-shaded triangle, flipped if it faces the origin
fn triangle(out: &mut Vec<Vertex>, a: Vec3, b: Vec3, c: Vec3) {
    let mut normal = (b - a).cross(c - a).normalize_or_zero();
    if normal == Vec3::ZERO {
        return;
    }
    let (b, c) = if normal.dot(a + b + c) < 0.0 {
        normal = -normal;
        (c, b)
    } else {
        (b, c)
    };
    let n = normal.to_array();
    out.push(Vertex::new(a.to_array(), n));
    out.push(Vertex::new(b.to_array(), n));
    out.push(Vertex::new(c.to_array(), n));
}

/// Regular octahedron with unit circumradius (leaves, burst)
pub fn octahedron() -> Vec<Vertex> {
    let mut out = Vec::with_capacity(24);
    for sx in [1.0, -1.0] {
        for sy in [1.0, -1.0] {
            for sz in [1.0, -1.0] {
                triangle(&mut out, Vec3::X * sx, Vec3::Y * sy, Vec3::Z * sz);
            }
        }
    }
    out
}

/// Unit cube (edge length 1)
pub fn cube() -> Vec<Vertex> {
    let mut out = Vec::with_capacity(36);
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        // Two in-plane directions for this face pair
        let u = axis.any_orthonormal_vector();
        let v = axis.cross(u);
        for sign in [0.5, -0.5] {
            let center = axis * sign;
            let (u, v) = (u * 0.5, v * 0.5);
            let corners = [center - u - v, center + u - v, center + u + v, center - u + v];
            triangle(&mut out, corners[0], corners[1], corners[2]);
            triangle(&mut out, corners[0], corners[2], corners[3]);
        }
    }
    out
}

/// Regular tetrahedron with unit circumradius (ribbon)
pub fn tetrahedron() -> Vec<Vertex> {
    let v = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
    ]
    .map(Vec3::normalize);
    let mut out = Vec::with_capacity(12);
    for [a, b, c] in [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]] {
        triangle(&mut out, v[a], v[b], v[c]);
    }
    out
}

/// Regular icosahedron with unit circumradius (ornaments)
pub fn icosahedron() -> Vec<Vertex> {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let v = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .map(Vec3::normalize);
    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    let mut out = Vec::with_capacity(60);
    for [a, b, c] in FACES {
        triangle(&mut out, v[a], v[b], v[c]);
    }
    out
}

/// Unit UV sphere (wish particles)
pub fn sphere(segments: u32, rings: u32) -> Vec<Vertex> {
    let point = |seg: u32, ring: u32| {
        // Exact poles, so pole triangles degenerate cleanly
        if ring == 0 {
            return Vec3::Y;
        }
        if ring == rings {
            return Vec3::NEG_Y;
        }
        let theta = seg as f32 / segments as f32 * TAU;
        let phi = ring as f32 / rings as f32 * PI;
        Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin())
    };
    let mut out = Vec::with_capacity((segments * rings * 6) as usize);
    for ring in 0..rings {
        for seg in 0..segments {
            let a = point(seg, ring);
            let b = point(seg + 1, ring);
            let c = point(seg + 1, ring + 1);
            let d = point(seg, ring + 1);
            // Pole quads collapse to one triangle; degenerate halves are skipped
            triangle(&mut out, a, b, c);
            triangle(&mut out, a, c, d);
        }
    }
    out
}

/// Mesh drawn for each render layer
pub fn mesh_for(layer: Layer) -> Vec<Vertex> {
    match layer {
        Layer::Leaves | Layer::Burst => octahedron(),
        Layer::Cubes => cube(),
        Layer::Icosahedra => icosahedron(),
        Layer::Ribbon => tetrahedron(),
        Layer::Wish => sphere(SPHERE_SEGMENTS, SPHERE_RINGS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_closed_convex(mesh: &[Vertex]) {
        assert_eq!(mesh.len() % 3, 0);
        for tri in mesh.chunks(3) {
            let n = Vec3::from_array(tri[0].normal);
            assert!((n.length() - 1.0).abs() < 1e-4, "normal not unit: {:?}", n);
            let centroid = tri
                .iter()
                .map(|v| Vec3::from_array(v.position))
                .sum::<Vec3>()
                / 3.0;
            assert!(n.dot(centroid) > 0.0, "normal points inward");

            // Winding agrees with the stored normal
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from_array(tri[i].position));
            assert!((b - a).cross(c - a).dot(n) > 0.0);
        }
    }

    #[test]
    fn test_platonic_triangle_counts() {
        assert_eq!(tetrahedron().len(), 4 * 3);
        assert_eq!(octahedron().len(), 8 * 3);
        assert_eq!(cube().len(), 12 * 3);
        assert_eq!(icosahedron().len(), 20 * 3);
    }

    #[test]
    fn test_normals_outward() {
        for mesh in [tetrahedron(), octahedron(), cube(), icosahedron(), sphere(12, 12)] {
            assert_closed_convex(&mesh);
        }
    }

    #[test]
    fn test_unit_circumradius() {
        for mesh in [tetrahedron(), octahedron(), icosahedron(), sphere(8, 6)] {
            for v in &mesh {
                assert!((Vec3::from_array(v.position).length() - 1.0).abs() < 1e-4);
            }
        }
        for v in cube() {
            let p = Vec3::from_array(v.position);
            assert!((p.abs().max_element() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_skips_pole_slivers() {
        // Each pole ring contributes one triangle per segment instead of two
        let mesh = sphere(12, 12);
        assert_eq!(mesh.len() / 3, 12 * 12 * 2 - 2 * 12);
    }

    #[test]
    fn test_every_layer_has_a_mesh() {
        for layer in Layer::ALL {
            assert!(!mesh_for(layer).is_empty());
        }
    }
}

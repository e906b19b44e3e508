//! Procedural bodies for benchmarks and testing.
//!
//! These generators produce deterministic, resolution-configurable vertex
//! sets with their spring networks. Rest lengths are the initial
//! distances, so every body starts at rest.

use glam::Vec3;
use tress_solver::{Face, Spring, SpringKind};

/// Vertices, springs and (for cloth) faces of one simulated body.
#[derive(Debug, Clone, Default)]
pub struct Body {
    /// Initial world-space positions.
    pub positions: Vec<Vec3>,
    pub springs: Vec<Spring>,
    /// Empty for hair.
    pub faces: Vec<Face>,
}

impl Body {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    /// Mean rest length of the structural springs (1 if there are none).
    pub fn avg_structural_length(&self) -> f32 {
        let lengths: Vec<f32> = self
            .springs
            .iter()
            .filter(|s| s.kind == SpringKind::Structural)
            .map(|s| s.rest_length)
            .collect();
        if lengths.is_empty() {
            1.0
        } else {
            lengths.iter().sum::<f32>() / lengths.len() as f32
        }
    }

    /// Adds a spring of `kind` between `i` and `j` at its current length.
    fn connect(&mut self, kind: SpringKind, i: usize, j: usize) {
        let rest_length = (self.positions[j] - self.positions[i]).length();
        self.springs.push(Spring::new(kind, i, j, rest_length));
    }

    pub fn count_kind(&self, kind: SpringKind) -> usize {
        self.springs.iter().filter(|s| s.kind == kind).count()
    }
}

/// Generates a rectangular cloth grid in the XZ plane at height `y`.
///
/// The grid spans `[-width/2, width/2]` in X and `[0, depth]` in Z. Row
/// `0` (the edge at `z = 0`) comes first, so its vertices are
/// `0..=cols`.
///
/// Springs: structural along rows and columns, shear along both cell
/// diagonals, bending across every second vertex. Faces are one quad per
/// cell.
///
/// # Example
/// ```
/// use tress_bench::generators::cloth_grid;
/// let body = cloth_grid(2, 2, 1.0, 1.0, 0.0);
/// assert_eq!(body.vertex_count(), 9);
/// assert_eq!(body.faces.len(), 4);
/// ```
pub fn cloth_grid(cols: usize, rows: usize, width: f32, depth: f32, y: f32) -> Body {
    let verts_x = cols + 1;
    let verts_z = rows + 1;
    let index = |i: usize, j: usize| j * verts_x + i;

    let mut body = Body::default();
    let half_w = width / 2.0;
    for j in 0..verts_z {
        for i in 0..verts_x {
            let u = i as f32 / cols as f32;
            let v = j as f32 / rows as f32;
            body.positions.push(Vec3::new(-half_w + u * width, y, v * depth));
        }
    }

    for j in 0..verts_z {
        for i in 0..verts_x {
            if i + 1 < verts_x {
                body.connect(SpringKind::Structural, index(i, j), index(i + 1, j));
            }
            if j + 1 < verts_z {
                body.connect(SpringKind::Structural, index(i, j), index(i, j + 1));
            }
            if i + 1 < verts_x && j + 1 < verts_z {
                body.connect(SpringKind::Shear, index(i, j), index(i + 1, j + 1));
                body.connect(SpringKind::Shear, index(i + 1, j), index(i, j + 1));
                body.faces.push(Face::Quad([
                    index(i, j),
                    index(i + 1, j),
                    index(i + 1, j + 1),
                    index(i, j + 1),
                ]));
            }
            if i + 2 < verts_x {
                body.connect(SpringKind::Bending, index(i, j), index(i + 2, j));
            }
            if j + 2 < verts_z {
                body.connect(SpringKind::Bending, index(i, j), index(i, j + 2));
            }
        }
    }
    body
}

/// Generates a straight hair strand of `segments` edges starting at
/// `root` and running along `direction`.
///
/// Vertex `0` is the root. Springs: structural between neighbours,
/// bending across every second vertex.
pub fn hair_strand(segments: usize, length: f32, root: Vec3, direction: Vec3) -> Body {
    let step = direction.normalize_or_zero() * (length / segments as f32);
    let mut body = Body {
        positions: (0..=segments).map(|k| root + step * k as f32).collect(),
        ..Default::default()
    };
    for k in 0..segments {
        body.connect(SpringKind::Structural, k, k + 1);
        if k + 2 <= segments {
            body.connect(SpringKind::Bending, k, k + 2);
        }
    }
    body
}

/// Two vertices `stretch` apart joined by one structural spring of rest
/// length `rest_length`.
pub fn spring_pair(rest_length: f32, stretch: f32) -> Body {
    Body {
        positions: vec![Vec3::ZERO, Vec3::new(stretch, 0.0, 0.0)],
        springs: vec![Spring::structural(0, 1, rest_length)],
        faces: Vec::new(),
    }
}

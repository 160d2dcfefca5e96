//! TIN (Triangulated Irregular Network) interpolation
//!
//! Builds a Delaunay triangulation of the sample points (incremental
//! Bowyer-Watson) and interpolates linearly inside each triangle with
//! barycentric weights. A plane sampled at three or more points is
//! reproduced exactly inside the convex hull.

use crate::maybe_rayon::*;
use topografia_core::raster::Raster;
use topografia_core::{Error, Result};

use super::{GridSpec, SamplePoint};

/// Parameters for TIN interpolation
#[derive(Debug, Clone, Default)]
pub struct TinParams {
    /// Output grid
    pub grid: GridSpec,
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    /// Circumcentre and squared circumradius
    cc: (f64, f64, f64),
}

impl Triangle {
    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

fn circumcircle(a: &SamplePoint, b: &SamplePoint, c: &SamplePoint) -> Option<(f64, f64, f64)> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return None;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    Some((ux, uy, a.dist_sq(ux, uy)))
}

/// Barycentric weights of (px, py) in triangle (a, b, c)
fn barycentric(px: f64, py: f64, a: &SamplePoint, b: &SamplePoint, c: &SamplePoint) -> (f64, f64, f64) {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    let u = ((b.y - c.y) * (px - c.x) + (c.x - b.x) * (py - c.y)) / det;
    let v = ((c.y - a.y) * (px - c.x) + (a.x - c.x) * (py - c.y)) / det;
    (u, v, 1.0 - u - v)
}

/// Delaunay triangulation; returned indices refer to `points`
fn delaunay(points: &[SamplePoint]) -> Vec<[usize; 3]> {
    if points.len() < 3 {
        return Vec::new();
    }

    let Some((min_x, min_y, max_x, max_y)) = super::points_extent(points) else {
        return Vec::new();
    };
    let delta = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;

    // Super-triangle occupies indices 0..3
    let mut vertices = vec![
        SamplePoint::new(min_x - 20.0 * delta, min_y - delta, 0.0),
        SamplePoint::new(mid_x, max_y + 20.0 * delta, 0.0),
        SamplePoint::new(max_x + 20.0 * delta, min_y - delta, 0.0),
    ];
    vertices.extend_from_slice(points);

    let make = |v: [usize; 3], verts: &[SamplePoint]| {
        circumcircle(&verts[v[0]], &verts[v[1]], &verts[v[2]]).map(|cc| Triangle { v, cc })
    };

    let mut triangles: Vec<Triangle> = make([0, 1, 2], &vertices).into_iter().collect();

    for vi in 3..vertices.len() {
        let p = vertices[vi];

        let (bad, good): (Vec<Triangle>, Vec<Triangle>) = triangles
            .into_iter()
            .partition(|t| p.dist_sq(t.cc.0, t.cc.1) <= t.cc.2);
        triangles = good;

        // Hole boundary: edges of removed triangles not shared with another removed one
        let mut boundary: Vec<(usize, usize)> = Vec::new();
        for (i, t) in bad.iter().enumerate() {
            for (a, b) in t.edges() {
                let shared = bad.iter().enumerate().any(|(j, o)| {
                    j != i && o.edges().iter().any(|&(c, d)| (c == b && d == a) || (c == a && d == b))
                });
                if !shared {
                    boundary.push((a, b));
                }
            }
        }

        triangles.extend(boundary.into_iter().filter_map(|(a, b)| make([a, b, vi], &vertices)));
    }

    triangles
        .into_iter()
        .filter(|t| t.v.iter().all(|&i| i >= 3))
        .map(|t| [t.v[0] - 3, t.v[1] - 3, t.v[2] - 3])
        .collect()
}

/// Interpolate scattered points onto a grid through a TIN.
///
/// Requires at least 3 non-collinear points. Cells whose centre falls
/// outside the convex hull of the points are NaN.
pub fn tin_interpolation(points: &[SamplePoint], params: TinParams) -> Result<Raster<f64>> {
    if points.len() < 3 {
        return Err(Error::Algorithm(
            "TIN requires at least 3 sample points".into(),
        ));
    }

    let triangles = delaunay(points);
    if triangles.is_empty() {
        return Err(Error::Algorithm(
            "Failed to build triangulation (collinear points?)".into(),
        ));
    }
    tracing::debug!("TIN: {} points, {} triangles", points.len(), triangles.len());

    // Bounding boxes for a cheap rejection test per cell
    let boxes: Vec<(f64, f64, f64, f64)> = triangles
        .iter()
        .map(|t| {
            let (a, b, c) = (&points[t[0]], &points[t[1]], &points[t[2]]);
            (
                a.x.min(b.x).min(c.x),
                a.y.min(b.y).min(c.y),
                a.x.max(b.x).max(c.x),
                a.y.max(b.y).max(c.y),
            )
        })
        .collect();

    let GridSpec {
        rows,
        cols,
        transform,
    } = params.grid;
    const EPS: f64 = -1e-10;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, cell) in row_data.iter_mut().enumerate() {
                let (px, py) = transform.pixel_to_geo(col, row);

                let hit = triangles.iter().zip(&boxes).find_map(|(t, bb)| {
                    if px < bb.0 || py < bb.1 || px > bb.2 || py > bb.3 {
                        return None;
                    }
                    let (a, b, c) = (&points[t[0]], &points[t[1]], &points[t[2]]);
                    let (u, v, w) = barycentric(px, py, a, b, c);
                    (u >= EPS && v >= EPS && w >= EPS).then(|| u * a.value + v * b.value + w * c.value)
                });

                if let Some(z) = hit {
                    *cell = z;
                }
            }

            row_data
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(transform);
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}

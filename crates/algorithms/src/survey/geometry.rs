//! Planar vertex geometry shared by the polygon and line tools

use geo::{Area, Coord, Distance, Euclidean, Geometry, Length, LineString, Point, Polygon};
use std::f64::consts::TAU;

/// Interior and exterior angle at a vertex, in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAngles {
    pub interior: f64,
    pub exterior: f64,
}

/// Angles at `vertex` between the previous and next points.
///
/// The interior angle is measured counter-clockwise from `vertex → prev` to
/// `vertex → next`, in `[0, 2π)`. For rings traversed clockwise this is the
/// angle inside the polygon. `interior + exterior == 2π`.
pub fn vertex_angles(prev: Coord<f64>, vertex: Coord<f64>, next: Coord<f64>) -> VertexAngles {
    let v1 = prev - vertex;
    let v2 = next - vertex;
    let dot = v1.x * v2.x + v1.y * v2.y;
    let det = v1.x * v2.y - v1.y * v2.x;

    let mut angle = det.atan2(dot);
    if angle < 0.0 {
        angle += TAU;
    }

    VertexAngles {
        interior: angle,
        exterior: TAU - angle,
    }
}

/// Euclidean distance in coordinate units
#[inline]
pub fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Euclidean::distance(Point::from(a), Point::from(b))
}

/// Length of a ring closed back to its first vertex
pub fn ring_perimeter(ring: &[Coord<f64>]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    let mut closed = LineString::from(ring.to_vec());
    closed.close();
    closed.length::<Euclidean>()
}

/// Shoelace area of a ring; positive when counter-clockwise
pub fn signed_area(ring: &[Coord<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    Polygon::new(LineString::from(ring.to_vec()), vec![]).signed_area()
}

/// Number of different coordinates in `vertices`
pub fn distinct_vertex_count(vertices: &[Coord<f64>]) -> usize {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    sorted.len()
}

/// Ring vertices without the repeated closing vertex
fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut coords = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

/// Rings of a polygonal geometry, each without its closing vertex.
///
/// A polygon contributes its exterior ring; a multipolygon contributes every
/// ring of every part. Other geometry types give no rings.
pub fn polygon_rings(geometry: &Geometry<f64>) -> Vec<Vec<Coord<f64>>> {
    match geometry {
        Geometry::Polygon(p) => vec![open_ring(p.exterior())],
        Geometry::MultiPolygon(mp) => mp
            .0
            .iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .map(open_ring)
            .collect(),
        Geometry::Rect(r) => vec![open_ring(r.to_polygon().exterior())],
        Geometry::Triangle(t) => vec![open_ring(t.to_polygon().exterior())],
        _ => Vec::new(),
    }
}

/// Vertex lists of a linear geometry, one per part.
///
/// Segments only join consecutive vertices of the same part; there is never
/// a segment from the end of one part to the start of the next.
pub fn line_parts(geometry: &Geometry<f64>) -> Vec<Vec<Coord<f64>>> {
    match geometry {
        Geometry::LineString(ls) => vec![ls.0.clone()],
        Geometry::MultiLineString(mls) => mls.0.iter().map(|ls| ls.0.clone()).collect(),
        Geometry::Line(l) => vec![vec![l.start, l.end]],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{polygon, MultiPolygon};
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn square() -> Vec<Coord<f64>> {
        vec![c(0.0, 0.0), c(10.0, 0.0), c(10.0, 10.0), c(0.0, 10.0)]
    }

    #[test]
    fn test_right_angle() {
        let a = vertex_angles(c(1.0, 0.0), c(0.0, 0.0), c(0.0, 1.0));
        assert_relative_eq!(a.interior, FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(a.exterior, 3.0 * FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_straight_angle() {
        let a = vertex_angles(c(-1.0, 0.0), c(0.0, 0.0), c(1.0, 0.0));
        assert_relative_eq!(a.interior, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_square_perimeter_and_area() {
        assert_relative_eq!(ring_perimeter(&square()), 40.0);
        assert_relative_eq!(signed_area(&square()), 100.0);

        let mut cw = square();
        cw.reverse();
        assert_relative_eq!(signed_area(&cw), -100.0);
    }

    #[test]
    fn test_degenerate_rings() {
        assert_eq!(ring_perimeter(&[c(1.0, 1.0)]), 0.0);
        assert_eq!(signed_area(&[c(0.0, 0.0), c(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_polygon_rings_drop_closing_vertex() {
        let p = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let rings = polygon_rings(&Geometry::Polygon(p.clone()));
        assert_eq!(rings, vec![square()]);

        let mp = MultiPolygon::new(vec![p.clone(), p]);
        let rings = polygon_rings(&Geometry::MultiPolygon(mp));
        assert_eq!(rings.len(), 2);
        assert!(rings.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn test_line_parts_stay_separate() {
        let mls = geo::MultiLineString::new(vec![
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            LineString::from(vec![(100.0, 100.0), (101.0, 100.0), (101.0, 101.0)]),
        ]);
        let parts = line_parts(&Geometry::MultiLineString(mls));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], vec![c(0.0, 0.0), c(1.0, 0.0)]);
        assert_eq!(parts[1].len(), 3);
        assert!(line_parts(&Geometry::Point(geo::Point::new(0.0, 0.0))).is_empty());
    }

    #[test]
    fn test_distinct_vertex_count() {
        assert_eq!(distinct_vertex_count(&square()), 4);
        let folded = [c(0.0, 0.0), c(10.0, 0.0), c(10.0, 0.0)];
        assert_eq!(distinct_vertex_count(&folded), 2);
        assert_eq!(distinct_vertex_count(&[]), 0);
    }

    #[test]
    fn test_unclosed_and_closed_ring_same_perimeter() {
        let mut closed = square();
        closed.push(c(0.0, 0.0));
        assert_relative_eq!(ring_perimeter(&closed), ring_perimeter(&square()));
        assert_relative_eq!(signed_area(&closed), 100.0);
    }

    #[test]
    fn test_clockwise_convex_angle_sum() {
        // Regular hexagon traversed clockwise
        let ring: Vec<Coord<f64>> = (0..6)
            .map(|k| {
                let t = -(k as f64) * TAU / 6.0;
                c(100.0 * t.cos(), 100.0 * t.sin())
            })
            .collect();
        let n = ring.len();
        let sum: f64 = (0..n)
            .map(|i| vertex_angles(ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]).interior)
            .sum();
        assert_relative_eq!(sum, (n as f64 - 2.0) * PI, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn prop_interior_plus_exterior(
            ax in -1e4f64..1e4, ay in -1e4f64..1e4,
            bx in -1e4f64..1e4, by in -1e4f64..1e4,
            cx in -1e4f64..1e4, cy in -1e4f64..1e4,
        ) {
            let a = vertex_angles(c(ax, ay), c(bx, by), c(cx, cy));
            prop_assert!((0.0..TAU).contains(&a.interior));
            prop_assert!((a.interior + a.exterior - TAU).abs() < 1e-12);
        }

        #[test]
        fn prop_regular_polygon_angle_sum(n in 3usize..40, radius in 1.0f64..1e4) {
            let ring: Vec<Coord<f64>> = (0..n)
                .map(|k| {
                    let t = -(k as f64) * TAU / n as f64;
                    c(radius * t.cos(), radius * t.sin())
                })
                .collect();
            let sum: f64 = (0..n)
                .map(|i| vertex_angles(ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]).interior)
                .sum();
            prop_assert!((sum - (n as f64 - 2.0) * PI).abs() < 1e-6);
        }
    }
}

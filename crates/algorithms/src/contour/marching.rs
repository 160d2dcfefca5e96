//! Marching squares on cell centres
//!
//! Each 2×2 block of cell centres is classified against the level
//! (`value >= level` counts as above), crossings are placed on the block
//! sides by linear interpolation and the resulting segments are stitched
//! into polylines through the grid sides they share.

use std::collections::{HashMap, VecDeque};

use geo::{Coord, LineString};
use ndarray::Array2;

use crate::maybe_rayon::*;
use topografia_core::raster::{GeoTransform, Raster};
use topografia_core::{Error, Result};

use super::{ContourLine, ContourParams};

const MAX_LEVELS: i64 = 100_000;

/// Side between two adjacent cell centres.
///
/// `H(r, c)` joins (r, c) and (r, c + 1); `V(r, c)` joins (r, c) and (r + 1, c).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Side {
    H(usize, usize),
    V(usize, usize),
}

type Segment = (Side, Side);

/// Fraction along a→b where the level is crossed
#[inline]
fn crossing(a: f64, b: f64, level: f64) -> f64 {
    let d = b - a;
    if d.abs() < f64::EPSILON {
        0.5
    } else {
        ((level - a) / d).clamp(0.0, 1.0)
    }
}

/// Trace contour lines through a raster.
///
/// Values are multiplied by `z_factor` first. Levels run over
/// `base + k * interval` within the data range. NaN and nodata cells
/// break the lines: any block touching one is skipped.
pub fn contour_lines(dem: &Raster<f64>, params: &ContourParams) -> Result<Vec<ContourLine>> {
    params.validate()?;

    let (rows, cols) = dem.shape();
    let grid: Array2<f64> = dem.data().mapv(|v| {
        if v.is_nan() || dem.is_nodata(v) {
            f64::NAN
        } else {
            v * params.z_factor
        }
    });

    let Some((min, max)) = value_range(&grid) else {
        tracing::debug!("contour: raster has no valid cells");
        return Ok(Vec::new());
    };
    if rows < 2 || cols < 2 {
        return Ok(Vec::new());
    }

    let k_min = ((min - params.base) / params.interval).ceil() as i64;
    let k_max = ((max - params.base) / params.interval).floor() as i64;
    if k_max < k_min {
        return Ok(Vec::new());
    }
    if k_max - k_min + 1 > MAX_LEVELS {
        return Err(Error::InvalidParameter {
            name: "interval",
            value: params.interval.to_string(),
            reason: format!("would produce {} contour levels", k_max - k_min + 1),
        });
    }
    tracing::debug!(
        "contour: range [{}, {}], levels k = {}..={}",
        min,
        max,
        k_min,
        k_max
    );

    let transform = *dem.transform();
    let per_level: Vec<Vec<ContourLine>> = (k_min..=k_max)
        .into_par_iter()
        .map(|k| {
            let level = params.level(k);
            let major = params.is_major(k);
            trace_level(&grid, level, &transform)
                .into_iter()
                .map(|geometry| ContourLine {
                    geometry,
                    elevation: level,
                    level_index: k,
                    major,
                })
                .collect()
        })
        .collect();

    Ok(per_level.into_iter().flatten().collect())
}

fn value_range(grid: &Array2<f64>) -> Option<(f64, f64)> {
    grid.iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Polylines for one level, in map coordinates
fn trace_level(grid: &Array2<f64>, level: f64, transform: &GeoTransform) -> Vec<LineString<f64>> {
    let (rows, cols) = grid.dim();
    let mut segments: Vec<Segment> = Vec::new();
    // Crossing position in fractional pixel space (col, row) of the cell centres
    let mut points: HashMap<Side, (f64, f64)> = HashMap::new();

    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let tl = grid[[r, c]];
            let tr = grid[[r, c + 1]];
            let br = grid[[r + 1, c + 1]];
            let bl = grid[[r + 1, c]];
            if tl.is_nan() || tr.is_nan() || br.is_nan() || bl.is_nan() {
                continue;
            }

            let case = ((tl >= level) as u8) << 3
                | ((tr >= level) as u8) << 2
                | ((br >= level) as u8) << 1
                | (bl >= level) as u8;
            if case == 0 || case == 15 {
                continue;
            }

            let top = Side::H(r, c);
            let bottom = Side::H(r + 1, c);
            let left = Side::V(r, c);
            let right = Side::V(r, c + 1);
            let centre_above = (tl + tr + br + bl) / 4.0 >= level;

            let cell_segments: [Option<Segment>; 2] = match case {
                1 | 14 => [Some((left, bottom)), None],
                2 | 13 => [Some((bottom, right)), None],
                3 | 12 => [Some((left, right)), None],
                4 | 11 => [Some((top, right)), None],
                6 | 9 => [Some((top, bottom)), None],
                7 | 8 => [Some((left, top)), None],
                // Saddles: the centre decides which diagonal pair stays connected
                5 if centre_above => [Some((left, top)), Some((bottom, right))],
                5 => [Some((top, right)), Some((left, bottom))],
                10 if centre_above => [Some((top, right)), Some((left, bottom))],
                10 => [Some((left, top)), Some((bottom, right))],
                _ => [None, None],
            };

            for (a, b) in cell_segments.into_iter().flatten() {
                for side in [a, b] {
                    points.entry(side).or_insert_with(|| side_point(grid, side, level));
                }
                segments.push((a, b));
            }
        }
    }

    stitch(&segments)
        .into_iter()
        .filter_map(|chain| {
            let mut coords: Vec<Coord<f64>> = chain
                .iter()
                .filter_map(|side| points.get(side))
                .map(|&(col, row)| {
                    let (x, y) = transform.fractional_to_geo(col + 0.5, row + 0.5);
                    Coord { x, y }
                })
                .collect();
            coords.dedup();
            (coords.len() >= 2).then(|| LineString::new(coords))
        })
        .collect()
}

fn side_point(grid: &Array2<f64>, side: Side, level: f64) -> (f64, f64) {
    match side {
        Side::H(r, c) => {
            let t = crossing(grid[[r, c]], grid[[r, c + 1]], level);
            (c as f64 + t, r as f64)
        }
        Side::V(r, c) => {
            let t = crossing(grid[[r, c]], grid[[r + 1, c]], level);
            (c as f64, r as f64 + t)
        }
    }
}

/// Join segments sharing a side into chains; closed chains repeat their first side
fn stitch(segments: &[Segment]) -> Vec<Vec<Side>> {
    let mut adjacency: HashMap<Side, Vec<usize>> = HashMap::new();
    for (i, &(a, b)) in segments.iter().enumerate() {
        adjacency.entry(a).or_default().push(i);
        adjacency.entry(b).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        let mut chain = VecDeque::from([a, b]);

        while let Some(next) = chain
            .back()
            .and_then(|&end| follow(&adjacency, segments, &mut used, end))
        {
            chain.push_back(next);
        }
        while let Some(prev) = chain
            .front()
            .and_then(|&end| follow(&adjacency, segments, &mut used, end))
        {
            chain.push_front(prev);
        }

        chains.push(chain.into());
    }

    chains
}

fn follow(
    adjacency: &HashMap<Side, Vec<usize>>,
    segments: &[Segment],
    used: &mut [bool],
    at: Side,
) -> Option<Side> {
    let i = adjacency.get(&at)?.iter().copied().find(|&i| !used[i])?;
    used[i] = true;
    let (a, b) = segments[i];
    Some(if a == at { b } else { a })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Values increase by one per row going south
    fn ramp(rows: usize, cols: usize) -> Raster<f64> {
        let data: Vec<f64> = (0..rows)
            .flat_map(|r| (0..cols).map(move |_| r as f64))
            .collect();
        let mut dem = Raster::from_vec(data, rows, cols).unwrap();
        dem.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        dem
    }

    /// Cone peaking at the centre
    fn cone(size: usize) -> Raster<f64> {
        let mid = (size as f64 - 1.0) / 2.0;
        let data: Vec<f64> = (0..size)
            .flat_map(|r| {
                (0..size).map(move |c| {
                    let d = ((r as f64 - mid).powi(2) + (c as f64 - mid).powi(2)).sqrt();
                    100.0 - d * 10.0
                })
            })
            .collect();
        let mut dem = Raster::from_vec(data, size, size).unwrap();
        dem.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
        dem
    }

    #[test]
    fn test_ramp_gives_one_straight_line_per_level() {
        let dem = ramp(20, 10);
        let params = ContourParams {
            interval: 5.0,
            ..Default::default()
        };
        let lines = contour_lines(&dem, &params).unwrap();

        let elevations: Vec<f64> = lines.iter().map(|l| l.elevation).collect();
        assert_eq!(elevations, vec![5.0, 10.0, 15.0]);

        for line in &lines {
            let coords = &line.geometry.0;
            assert_eq!(coords.len(), 10);
            // Row r holds value r, its centre sits at y = 20 - r - 0.5
            let expected_y = 20.0 - line.elevation - 0.5;
            for p in coords {
                assert_relative_eq!(p.y, expected_y, epsilon = 1e-9);
            }
            assert!(!line.is_closed());
        }
    }

    #[test]
    fn test_interpolated_crossing() {
        let dem = ramp(4, 3);
        let params = ContourParams {
            interval: 1.0,
            base: 0.5,
            ..Default::default()
        };
        let lines = contour_lines(&dem, &params).unwrap();
        assert_eq!(lines.len(), 3);
        // 0.5 lies halfway between rows 0 and 1: y = 4 - 1.0
        assert_relative_eq!(lines[0].geometry.0[0].y, 3.0, epsilon = 1e-9);
        assert_relative_eq!(lines[0].geometry.0[0].x, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_cone_gives_closed_rings() {
        let dem = cone(21);
        let params = ContourParams {
            interval: 20.0,
            ..Default::default()
        };
        let lines = contour_lines(&dem, &params).unwrap();
        assert!(!lines.is_empty());

        // Levels whose circle fits inside the grid close on themselves
        for line in lines.iter().filter(|l| l.elevation >= 20.0) {
            assert!(line.is_closed(), "level {} is open", line.elevation);
        }
    }

    #[test]
    fn test_z_factor_and_major_flag() {
        let dem = ramp(11, 4);
        let params = ContourParams {
            interval: 10.0,
            z_factor: 10.0,
            major_every: 5,
            ..Default::default()
        };
        let lines = contour_lines(&dem, &params).unwrap();
        // Scaled range 0..100 gives levels 10..=100; 0 never crosses
        assert_eq!(lines.len(), 10);
        let majors: Vec<f64> = lines.iter().filter(|l| l.major).map(|l| l.elevation).collect();
        assert_eq!(majors, vec![50.0, 100.0]);
    }

    #[test]
    fn test_nan_cells_break_lines() {
        let mut dem = ramp(10, 9);
        for r in 0..10 {
            dem.set(r, 4, f64::NAN).unwrap();
        }
        let params = ContourParams {
            interval: 5.0,
            ..Default::default()
        };
        let lines = contour_lines(&dem, &params).unwrap();
        let level_five: Vec<_> = lines.iter().filter(|l| l.elevation == 5.0).collect();
        assert_eq!(level_five.len(), 2);
        for line in level_five {
            assert!(line.geometry.0.iter().all(|p| (p.x - 4.5).abs() > 0.5));
        }
    }

    #[test]
    fn test_nodata_value_skipped() {
        let mut dem = ramp(6, 6);
        dem.set_nodata(Some(-9999.0));
        for c in 0..6 {
            dem.set(0, c, -9999.0).unwrap();
        }
        let params = ContourParams {
            interval: 1.0,
            ..Default::default()
        };
        let lines = contour_lines(&dem, &params).unwrap();
        // Row 0 is gone, so level 1 is the lowest and never crosses
        assert!(lines.iter().all(|l| l.elevation >= 2.0));
    }

    #[test]
    fn test_flat_and_empty_rasters() {
        let flat = Raster::filled(5, 5, 42.0);
        assert!(contour_lines(&flat, &ContourParams::default()).unwrap().is_empty());

        let nan = Raster::filled(5, 5, f64::NAN);
        assert!(contour_lines(&nan, &ContourParams::default()).unwrap().is_empty());
    }

    #[test]
    fn test_saddle_resolved_by_centre() {
        // tl and br high, tr and bl low
        let mut dem = Raster::from_vec(vec![10.0, 0.0, 0.0, 10.0], 2, 2).unwrap();
        dem.set_transform(GeoTransform::new(0.0, 2.0, 1.0, -1.0));
        let params = ContourParams {
            interval: 4.0,
            base: 0.0,
            ..Default::default()
        };
        // Centre 5.0: above level 4 (high corners joined), below level 8
        let lines = contour_lines(&dem, &params).unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.geometry.0.len() == 2));
    }

    #[test]
    fn test_too_many_levels() {
        let dem = ramp(10, 10);
        let params = ContourParams {
            interval: 1e-6,
            ..Default::default()
        };
        assert!(contour_lines(&dem, &params).is_err());
    }

    #[test]
    fn test_stitch_joins_chain() {
        let segs = vec![
            (Side::V(0, 1), Side::V(0, 2)),
            (Side::V(0, 0), Side::V(0, 1)),
            (Side::V(0, 2), Side::V(0, 3)),
        ];
        let chains = stitch(&segs);
        assert_eq!(chains.len(), 1);
        assert_eq!(
            chains[0],
            vec![Side::V(0, 0), Side::V(0, 1), Side::V(0, 2), Side::V(0, 3)]
        );
    }
}

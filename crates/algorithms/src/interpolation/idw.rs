//! Inverse Distance Weighting (IDW) interpolation
//!
//! Estimates values at unknown locations as a weighted average of nearby
//! sample points, where weights are inversely proportional to distance
//! raised to a power parameter.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use crate::maybe_rayon::*;
use topografia_core::raster::Raster;
use topografia_core::{Error, Result};

use super::{GridSpec, SamplePoint};

/// Parameters for IDW interpolation
#[derive(Debug, Clone)]
pub struct IdwParams {
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby points.
    pub power: f64,
    /// Maximum search radius. `None` means all points are used (global IDW).
    pub max_radius: Option<f64>,
    /// Maximum number of nearest points to use.
    pub max_points: Option<usize>,
    /// A sample closer than this to a cell centre is copied as is
    pub snap_distance: f64,
    /// Output grid
    pub grid: GridSpec,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_radius: None,
            max_points: None,
            snap_distance: 1e-10,
            grid: GridSpec::default(),
        }
    }
}

/// Perform IDW interpolation from scattered points to a raster grid.
///
/// ```text
/// z(x,y) = Σ(wi * zi) / Σ(wi)
/// where wi = 1 / d(x,y, xi,yi)^p
/// ```
///
/// Cells with no points within `max_radius` are NaN.
pub fn idw(points: &[SamplePoint], params: IdwParams) -> Result<Raster<f64>> {
    if points.is_empty() {
        return Err(Error::Algorithm("No sample points provided".into()));
    }
    if !(params.power > 0.0) {
        return Err(Error::InvalidParameter {
            name: "power",
            value: params.power.to_string(),
            reason: "must be positive".into(),
        });
    }

    let GridSpec {
        rows,
        cols,
        transform,
    } = params.grid;
    let snap_sq = params.snap_distance * params.snap_distance;
    let max_radius_sq = params.max_radius.map(|r| r * r);

    let estimate = |cx: f64, cy: f64| -> f64 {
        let mut candidates: Vec<(f64, f64)> = Vec::new();

        for pt in points {
            let dsq = pt.dist_sq(cx, cy);
            if dsq < snap_sq {
                return pt.value;
            }
            if max_radius_sq.is_some_and(|max_sq| dsq > max_sq) {
                continue;
            }
            candidates.push((dsq, pt.value));
        }

        if let Some(k) = params.max_points {
            if candidates.len() > k {
                candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
                candidates.truncate(k);
            }
        }

        let (sum_w, sum_wz) = candidates
            .iter()
            .fold((0.0, 0.0), |(sw, swz), &(dsq, val)| {
                let w = 1.0 / dsq.sqrt().powf(params.power);
                (sw + w, swz + w * val)
            });

        if sum_w > 0.0 {
            sum_wz / sum_w
        } else {
            f64::NAN
        }
    };

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let (cx, cy) = transform.pixel_to_geo(col, row);
                    estimate(cx, cy)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(transform);
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}

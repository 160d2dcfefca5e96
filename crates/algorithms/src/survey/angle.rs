//! Angle display formats
//!
//! Every computed angle is stored twice in the output tables: as text in
//! the chosen format and as a number (degrees for the degree-based formats,
//! radians for [`AngleFormat::Radians`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// How angles are written in attribute tables and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleFormat {
    /// `123.4567°`
    #[default]
    DecimalDegrees,
    /// `123° 27' 24.1200"`
    Dms,
    /// `2.1547 rad`
    Radians,
}

/// An angle rendered for output: display text plus its numeric companion
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedAngle {
    pub text: String,
    pub value: f64,
}

/// Format an angle given in radians.
///
/// Degree-based formats wrap the angle into `[0°, 360°)` first.
pub fn format_angle(angle_rad: f64, format: AngleFormat, precision: usize) -> FormattedAngle {
    let degrees = angle_rad.to_degrees().rem_euclid(360.0);
    match format {
        AngleFormat::DecimalDegrees => FormattedAngle {
            text: format!("{:.*}°", precision, degrees),
            value: degrees,
        },
        AngleFormat::Dms => FormattedAngle {
            text: Dms::from_degrees(degrees, precision).to_string(),
            value: degrees,
        },
        AngleFormat::Radians => FormattedAngle {
            text: format!("{:.*} rad", precision, angle_rad),
            value: angle_rad,
        },
    }
}

/// Degrees, minutes and seconds with seconds rounded to a fixed precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub negative: bool,
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
    pub precision: usize,
}

impl Dms {
    /// Split decimal degrees, rounding seconds to `precision` decimals.
    ///
    /// Rounding that reaches 60 seconds carries into the minutes, and
    /// 60 minutes carry into the degrees.
    pub fn from_degrees(decimal: f64, precision: usize) -> Self {
        let abs = decimal.abs();
        let mut degrees = abs.floor() as u32;
        let minutes_f = (abs - degrees as f64) * 60.0;
        let mut minutes = minutes_f.floor() as u32;
        let mut seconds = round_to((minutes_f - minutes as f64) * 60.0, precision);

        if seconds >= 60.0 {
            seconds -= 60.0;
            minutes += 1;
        }
        if minutes >= 60 {
            minutes -= 60;
            degrees += 1;
        }

        Self {
            negative: decimal < 0.0,
            degrees,
            minutes,
            seconds,
            precision,
        }
    }

    /// Back to decimal degrees
    pub fn to_degrees(&self) -> f64 {
        let value = self.degrees as f64 + self.minutes as f64 / 60.0 + self.seconds / 3600.0;
        if self.negative {
            -value
        } else {
            value
        }
    }
}

impl fmt::Display for Dms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}° {}' {:.*}\"",
            if self.negative { "-" } else { "" },
            self.degrees,
            self.minutes,
            self.precision,
            self.seconds
        )
    }
}

fn round_to(value: f64, precision: usize) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

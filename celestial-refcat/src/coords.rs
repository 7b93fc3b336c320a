//! Sky positions, sexagesimal conversion and angular distance.
//!
//! Coordinates enter the crate either as decimal degrees or as colon-separated
//! sexagesimal strings:
//!
//! ```text
//! Right ascension:  187.5        12:30:00       12:30:00.123
//! Declination:      -5.375       -05:22:30      +38:47:01.5
//! ```
//!
//! Right ascension in sexagesimal form is in hours (1h = 15°). For declination
//! the sign is taken from the first field, so `-00:30:00` is negative.
//! Parsed values are rounded to 6 decimal places of a degree.
//!
//! ```
//! use celestial_refcat::coords::{decimal_to_sexagesimal, sexagesimal_to_decimal, Axis};
//!
//! let ra = sexagesimal_to_decimal("12:30:00", Axis::RightAscension).unwrap();
//! assert_eq!(ra, 187.5);
//! assert_eq!(decimal_to_sexagesimal(ra, Axis::RightAscension), "12:30:00.000");
//! ```

use crate::errors::{RefCatError, RefCatResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Which celestial coordinate a value describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    RightAscension,
    Declination,
}

static SEXAGESIMAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^\s*
        ([+-])?                 # optional sign
        (\d+(?:\.\d*)?)         # hours or degrees
        :
        (\d+(?:\.\d*)?)         # minutes
        :
        (\d+(?:\.\d*)?)         # seconds
        \s*$
        ",
    )
    .unwrap()
});

/// A validated position on the celestial sphere, in degrees.
///
/// Right ascension lies in `[0, 360)` and declination in `[-90, 90]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    ra_deg: f64,
    dec_deg: f64,
}

impl SkyPosition {
    pub fn new(ra_deg: f64, dec_deg: f64) -> RefCatResult<Self> {
        if !ra_deg.is_finite() || !(0.0..360.0).contains(&ra_deg) {
            return Err(RefCatError::format_error(format!(
                "right ascension {} outside [0, 360)",
                ra_deg
            )));
        }
        if !dec_deg.is_finite() || !(-90.0..=90.0).contains(&dec_deg) {
            return Err(RefCatError::format_error(format!(
                "declination {} outside [-90, 90]",
                dec_deg
            )));
        }
        Ok(Self { ra_deg, dec_deg })
    }

    /// Build a position from decimal or sexagesimal text for each axis.
    pub fn parse(ra: &str, dec: &str) -> RefCatResult<Self> {
        let ra_deg = sexagesimal_to_decimal(ra, Axis::RightAscension)?;
        let dec_deg = sexagesimal_to_decimal(dec, Axis::Declination)?;
        Self::new(ra_deg, dec_deg)
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec_deg
    }
}

impl fmt::Display for SkyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            decimal_to_sexagesimal(self.ra_deg, Axis::RightAscension),
            decimal_to_sexagesimal(self.dec_deg, Axis::Declination)
        )
    }
}

/// Parse a decimal numeral or an `H:M:S` / `±D:M:S` string into degrees.
///
/// # Errors
/// Returns [`RefCatError::Format`] if the text is neither a number nor three
/// colon-separated numeric fields, if minutes or seconds are 60 or more, or
/// if a right ascension carries a minus sign.
pub fn sexagesimal_to_decimal(text: &str, axis: Axis) -> RefCatResult<f64> {
    if let Ok(value) = text.trim().parse::<f64>() {
        if value.is_finite() {
            return Ok(round6(value));
        }
    }

    let caps = SEXAGESIMAL_REGEX.captures(text).ok_or_else(|| {
        RefCatError::format_error(format!(
            "'{}' is neither decimal nor colon-separated sexagesimal",
            text
        ))
    })?;

    let negative = caps.get(1).map(|m| m.as_str() == "-").unwrap_or(false);
    let field = |i: usize| -> RefCatResult<f64> {
        caps[i].parse::<f64>().map_err(|_| {
            RefCatError::format_error(format!("bad field '{}' in '{}'", &caps[i], text))
        })
    };
    let whole = field(2)?;
    let minutes = field(3)?;
    let seconds = field(4)?;

    if minutes >= 60.0 || seconds >= 60.0 {
        return Err(RefCatError::format_error(format!(
            "minutes and seconds must be below 60 in '{}'",
            text
        )));
    }

    let magnitude = whole + minutes / 60.0 + seconds / 3600.0;
    let value = match axis {
        Axis::RightAscension => {
            if negative {
                return Err(RefCatError::format_error(format!(
                    "right ascension '{}' cannot be negative",
                    text
                )));
            }
            magnitude * 15.0
        }
        Axis::Declination if negative => -magnitude,
        Axis::Declination => magnitude,
    };

    Ok(round6(value))
}

/// Format degrees as `HH:MM:SS.sss` (right ascension) or `±DD:MM:SS.ss`
/// (declination).
///
/// Rounding happens on the smallest printed unit before the fields are split,
/// so a value never prints as `60` seconds.
pub fn decimal_to_sexagesimal(value: f64, axis: Axis) -> String {
    match axis {
        Axis::RightAscension => {
            const MS_PER_DAY: i64 = 24 * 3600 * 1000;
            let hours = value.rem_euclid(360.0) / 15.0;
            let total_ms = ((hours * 3_600_000.0).round() as i64).rem_euclid(MS_PER_DAY);
            let h = total_ms / 3_600_000;
            let m = (total_ms / 60_000) % 60;
            let s = (total_ms / 1000) % 60;
            let ms = total_ms % 1000;
            format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
        }
        Axis::Declination => {
            let sign = if value < 0.0 { '-' } else { '+' };
            let total_cs = (value.abs() * 360_000.0).round() as i64;
            let d = total_cs / 360_000;
            let m = (total_cs / 6000) % 60;
            let s = (total_cs / 100) % 60;
            let cs = total_cs % 100;
            format!("{}{:02}:{:02}:{:02}.{:02}", sign, d, m, s, cs)
        }
    }
}

/// Great-circle distance between two positions, in degrees (haversine).
pub fn angular_distance(a: &SkyPosition, b: &SkyPosition) -> f64 {
    let (ra1, dec1) = (a.ra_deg.to_radians(), a.dec_deg.to_radians());
    let (ra2, dec2) = (b.ra_deg.to_radians(), b.dec_deg.to_radians());

    let half_ddec = ((dec2 - dec1) / 2.0).sin();
    let half_dra = ((ra2 - ra1) / 2.0).sin();
    let h = half_ddec * half_ddec + dec1.cos() * dec2.cos() * half_dra * half_dra;

    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

/// Split a combined `RA±DEC` argument such as `150.1+2.2` or
/// `10:00:28.6-05:12:00` and parse both halves.
///
/// The first `+` or `-` after the leading character separates the two
/// coordinates; the sign belongs to the declination.
pub fn parse_coordinate_pair(text: &str) -> RefCatResult<SkyPosition> {
    let text = text.trim();
    let split = text
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i)
        .ok_or_else(|| {
            RefCatError::format_error(format!(
                "'{}' is not of the form RA+DEC or RA-DEC",
                text
            ))
        })?;

    let (ra, dec) = text.split_at(split);
    SkyPosition::parse(ra, dec)
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

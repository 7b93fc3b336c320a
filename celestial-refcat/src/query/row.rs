//! Normalized output rows and the shared row filters.
//!
//! Every adapter reduces its service's response to [`CatalogRow`]s. A row
//! only exists if its position and magnitude are numeric; the magnitude error
//! is optional because several catalogs (USNO-B1, Gaia DR1) do not publish
//! one. Rows keep the order the service returned them in.

use crate::coords::{angular_distance, SkyPosition};
use std::io::{self, Write};

/// Ordered rows of one successful catalog query. Empty means "no detections".
pub type ResultSet = Vec<CatalogRow>;

/// One reference star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogRow {
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub mag: f64,
    pub mag_err: Option<f64>,
}

impl CatalogRow {
    /// Build a row from `[ra, dec, mag, err?]` text fields.
    ///
    /// Returns `None` if fewer than three fields are present or any of
    /// RA, Dec and magnitude is blank or not a finite number. A blank or
    /// unparsable error field becomes `None`.
    pub fn from_fields(fields: &[&str]) -> Option<Self> {
        if fields.len() < 3 {
            return None;
        }
        let ra_deg = parse_finite(fields[0])?;
        let dec_deg = parse_finite(fields[1])?;
        let mag = parse_finite(fields[2])?;
        let mag_err = fields.get(3).and_then(|f| parse_finite(f));
        Some(Self {
            ra_deg,
            dec_deg,
            mag,
            mag_err,
        })
    }

    /// `ra\tdec\tmag\terr` with an empty last field when there is no error.
    pub fn to_tsv_line(&self) -> String {
        let err = self.mag_err.map(|e| e.to_string()).unwrap_or_default();
        format!("{}\t{}\t{}\t{}", self.ra_deg, self.dec_deg, self.mag, err)
    }

    pub fn position(&self) -> Option<SkyPosition> {
        SkyPosition::new(self.ra_deg, self.dec_deg).ok()
    }
}

/// Write one newline-terminated TSV line per row.
pub fn write_tsv<W: Write>(rows: &[CatalogRow], mut out: W) -> io::Result<()> {
    for row in rows {
        writeln!(out, "{}", row.to_tsv_line())?;
    }
    out.flush()
}

fn parse_finite(field: &str) -> Option<f64> {
    let value = field.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// SDSS photometric flag bits used to reject unreliable detections.
pub mod sdss_flags {
    /// Object detected in BINNED1.
    pub const BINNED1: u64 = 0x1000_0000;
    /// EDGE, PEAKCENTER, NOPROFILE, SATURATED, NOTCHECKED,
    /// BAD_COUNTS_ERROR and PSF_FLUX_INTERP.
    pub const BAD_PHOTOMETRY: u64 = 0x8100_000c_00a4;
    /// Deblended child without a peak of its own.
    pub const DEBLEND_NOPEAK: u64 = 0x4000_0000_0000;
    /// Interpolation affected the centre of the object.
    pub const INTERP_CENTER: u64 = 0x1000_0000_0000;
    /// Cosmic ray.
    pub const COSMIC_RAY: u64 = 0x1000;
}

/// Clean-photometry test applied to SDSS objects.
///
/// Mirrors the SQL gateway query:
///
/// ```text
/// (flags & BINNED1) != 0
/// AND (flags & BAD_PHOTOMETRY) = 0
/// AND (flags & DEBLEND_NOPEAK) = 0
/// AND ((flags & INTERP_CENTER) = 0 OR (flags & COSMIC_RAY) = 0)
/// ```
pub fn sdss_flags_acceptable(flags: u64) -> bool {
    use sdss_flags::*;
    flags & BINNED1 != 0
        && flags & BAD_PHOTOMETRY == 0
        && flags & DEBLEND_NOPEAK == 0
        && (flags & INTERP_CENTER == 0 || flags & COSMIC_RAY == 0)
}

/// The brightest row of a result set and how far it lies from a center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightestSource {
    pub row: CatalogRow,
    pub distance_arcmin: f64,
}

/// Find the brightest (numerically smallest magnitude) row.
///
/// Rows with an out-of-range position are skipped. Ties keep the first row.
pub fn brightest(rows: &[CatalogRow], center: &SkyPosition) -> Option<BrightestSource> {
    let mut best: Option<(CatalogRow, SkyPosition)> = None;
    for row in rows {
        let Some(pos) = row.position() else {
            continue;
        };
        match best {
            Some((b, _)) if b.mag <= row.mag => {}
            _ => best = Some((*row, pos)),
        }
    }
    best.map(|(row, pos)| BrightestSource {
        row,
        distance_arcmin: angular_distance(center, &pos) * 60.0,
    })
}

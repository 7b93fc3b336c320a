//! Per-service query construction and response parsing.
//!
//! Every catalog family implements [`CatalogAdapter`]: build one
//! [`MirrorRequest`], say which response bodies are worth keeping, and turn a
//! kept body into rows. The provided [`CatalogAdapter::query`] wires those
//! three steps to a [`MirrorClient`]; adapters with extra steps (SDSS gateway
//! with VizieR fallback, Pan-STARRS coverage cutoff) override it.
//!
//! - [`vizier`] — USNO-B1, 2MASS, DENIS, APASS and Gaia through VizieR mirrors
//! - [`sdss`] — SDSS through the SkyServer SQL gateway, falling back to VizieR
//! - [`panstarrs`] — Pan-STARRS through the MAST search service

pub mod panstarrs;
pub mod sdss;
pub mod vizier;

pub use panstarrs::PanStarrsAdapter;
pub use sdss::{Footprint, SdssAdapter};
pub use vizier::VizierAdapter;

use super::mirror::{FetchOutcome, MirrorClient, MirrorRequest};
use super::request::Band;
use super::row::ResultSet;
use crate::coords::SkyPosition;
use crate::errors::RefCatResult;

pub trait CatalogAdapter {
    /// Service name for logs.
    fn name(&self) -> &'static str;

    fn build_request(
        &self,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<MirrorRequest>;

    /// Whether a mirror's answer carries a usable payload. Rejected bodies
    /// make the mirror client move on to the next mirror.
    fn accepts(&self, body: &str) -> bool {
        !body.trim().is_empty()
    }

    fn parse(&self, body: &str) -> RefCatResult<ResultSet>;

    fn query(
        &self,
        client: &MirrorClient,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<ResultSet> {
        let request = self.build_request(position, radius_arcmin, band)?;
        match client.fetch(&request, |body| self.accepts(body))? {
            FetchOutcome::Fetched { body, .. } => self.parse(&body),
            FetchOutcome::Empty => Ok(ResultSet::new()),
        }
    }
}

/// VizieR `-c` value: `RRR.rrr±DD.ddd`.
pub(crate) fn vizier_center(position: &SkyPosition) -> String {
    format!("{:.3}{:+.3}", position.ra_deg(), position.dec_deg())
}

/// VizieR `-c.bm` value: a square box whose side is the search diameter.
pub(crate) fn vizier_box(radius_arcmin: f64) -> String {
    let side = 2.0 * radius_arcmin;
    format!("{}x{}", side, side)
}

/// Data lines of a VizieR tab-separated response.
///
/// Everything up to and including the `---` divider (comments, column names,
/// units) is skipped; the table ends at the first line whose first three
/// characters are blank.
pub(crate) fn vizier_data_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .map(|line| line.trim_end_matches('\r'))
        .skip_while(|line| !line.starts_with("---"))
        .skip(1)
        .take_while(|line| !line.chars().chain("   ".chars()).take(3).all(char::is_whitespace))
}

//! Pan-STARRS DR1 mean photometry through the MAST search form.
//!
//! The service only covers the sky north of roughly −30° declination;
//! positions south of [`ResolverConfig::panstarrs_dec_cutoff_deg`] are
//! answered with an empty result set without touching the network.

use super::CatalogAdapter;
use crate::config::ResolverConfig;
use crate::coords::SkyPosition;
use crate::errors::{RefCatError, RefCatResult};
use crate::query::mirror::{FetchOutcome, HttpMethod, MirrorClient, MirrorRequest};
use crate::query::request::{Band, CatalogKind};
use crate::query::row::{CatalogRow, ResultSet};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PanStarrsAdapter {
    mirrors: Vec<String>,
    timeout: Duration,
    min_detections: u32,
    dec_cutoff_deg: f64,
    max_records: u32,
}

impl PanStarrsAdapter {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            mirrors: config.panstarrs_mirrors.clone(),
            timeout: config.panstarrs_timeout(),
            min_detections: config.panstarrs_min_detections,
            dec_cutoff_deg: config.panstarrs_dec_cutoff_deg,
            max_records: config.panstarrs_max_records,
        }
    }

    pub fn covers(&self, position: &SkyPosition) -> bool {
        position.dec_deg() >= self.dec_cutoff_deg
    }
}

impl CatalogAdapter for PanStarrsAdapter {
    fn name(&self) -> &'static str {
        "Pan-STARRS"
    }

    fn build_request(
        &self,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<MirrorRequest> {
        if !CatalogKind::PanStarrs.supports(band) {
            return Err(RefCatError::format_error(format!(
                "band '{}' is not a Pan-STARRS band",
                band
            )));
        }
        let b = band.as_char();
        Ok(
            MirrorRequest::new(self.name(), &self.mirrors, HttpMethod::Post, self.timeout)
                .param("RA", format!("{:.4}", position.ra_deg()))
                .param("DEC", format!("{:.4}", position.dec_deg()))
                .param("max_records", self.max_records.to_string())
                .param("radius", format!("{:?}", radius_arcmin))
                .param("outputformat", "TSV")
                .param(
                    "selectedColumnsCsv",
                    format!("raMean,decMean,{b}MeanApMag,{b}MeanApMagErr", b = b),
                )
                .param("nDetections", format!(">{}", self.min_detections))
                .param("action", "Search"),
        )
    }

    /// Keep lines with exactly four fields, a right ascension and a positive
    /// magnitude. MAST marks missing photometry with `-999`.
    fn parse(&self, body: &str) -> RefCatResult<ResultSet> {
        Ok(body
            .lines()
            .filter_map(|line| {
                let fields: Vec<&str> = line.trim().split('\t').collect();
                if fields.len() != 4 || fields[0].trim().is_empty() {
                    return None;
                }
                CatalogRow::from_fields(&fields).filter(|row| row.mag > 0.0)
            })
            .collect())
    }

    fn query(
        &self,
        client: &MirrorClient,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<ResultSet> {
        if !self.covers(position) {
            info!(
                dec = position.dec_deg(),
                cutoff = self.dec_cutoff_deg,
                "position is south of the Pan-STARRS footprint"
            );
            return Ok(ResultSet::new());
        }
        let request = self.build_request(position, radius_arcmin, band)?;
        match client.fetch(&request, |body| self.accepts(body))? {
            FetchOutcome::Fetched { body, .. } => self.parse(&body),
            FetchOutcome::Empty => Ok(ResultSet::new()),
        }
    }
}

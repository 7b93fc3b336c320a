//! SDSS photometry through the SkyServer SQL gateway, with a VizieR fallback.
//!
//! The gateway accepts SQL text in the `cmd` parameter and answers CSV.
//! Two queries go through it:
//!
//! 1. a footprint check ([`SdssAdapter::footprint`]) asking for the
//!    `run, camcol, field` of any star within 1′, under a short timeout;
//! 2. the photometry query ([`photometry_sql`]), which applies the clean
//!    photometry flag cuts in SQL and orders by distance.
//!
//! If the gateway fails in any way (unreachable, SQL error, no rows) the
//! adapter repeats the search on the SDSS DR9 VizieR table `V/139/sdss9` and
//! applies the same flag cuts locally with
//! [`sdss_flags_acceptable`](crate::query::row::sdss_flags_acceptable).

use super::{vizier_box, vizier_center, vizier_data_lines, CatalogAdapter};
use crate::config::ResolverConfig;
use crate::coords::SkyPosition;
use crate::errors::{RefCatError, RefCatResult};
use crate::query::mirror::{FetchOutcome, HttpMethod, MirrorClient, MirrorRequest};
use crate::query::request::{Band, CatalogKind};
use crate::query::row::{sdss_flags, sdss_flags_acceptable, CatalogRow, ResultSet};
use std::time::Duration;
use tracing::{info, warn};

const GATEWAY: &str = "SDSS SkyServer";
const VIZIER: &str = "VizieR (SDSS)";

/// Largest PSF magnitude error kept, in both query paths.
pub const MAX_PSF_MAG_ERR: f64 = 0.18;

/// Imaging run, camera column and field covering a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub run: u32,
    pub camcol: u32,
    pub field: u32,
}

/// SQL for the footprint check.
pub fn footprint_sql(position: &SkyPosition) -> String {
    format!(
        "select p.run, p.camcol, p.field from STAR as p \
         inner join dbo.fGetNearbyObjEq({},{},1) as N on p.objid = N.objid",
        position.ra_deg(),
        position.dec_deg()
    )
}

/// SQL for clean stellar photometry in one band within `radius_arcmin`.
pub fn photometry_sql(position: &SkyPosition, radius_arcmin: f64, band: Band) -> String {
    use sdss_flags::*;
    let b = band.as_char();
    format!(
        "select p.ra, p.dec, p.{b}, p.Err_{b} from STAR as p \
         inner join dbo.fGetNearbyObjEq({ra},{dec},{radius}) as N on p.objid = N.objid \
         where ((p.flags & {binned1:#x}) != 0) \
         AND ((p.flags & {bad:#x}) = 0) \
         AND (((p.flags & {nopeak:#x}) = 0) AND (p.psfmagerr_{b} <= {maxerr})) \
         AND (((p.flags & {interp:#x}) = 0) or (p.flags & {cr:#x}) = 0) \
         order by N.distance",
        b = b,
        ra = position.ra_deg(),
        dec = position.dec_deg(),
        radius = radius_arcmin,
        binned1 = BINNED1,
        bad = BAD_PHOTOMETRY,
        nopeak = DEBLEND_NOPEAK,
        interp = INTERP_CENTER,
        cr = COSMIC_RAY,
        maxerr = MAX_PSF_MAG_ERR,
    )
}

/// Non-comment, non-blank CSV lines of a gateway answer.
///
/// A line starting with `ERROR` means the gateway rejected the query.
fn gateway_lines(body: &str) -> RefCatResult<Vec<&str>> {
    let mut lines = Vec::new();
    for line in body.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.to_ascii_uppercase().starts_with("ERROR") || line.starts_with('<') {
            return Err(RefCatError::service(GATEWAY, line.to_string()));
        }
        lines.push(line);
    }
    Ok(lines)
}

/// A gateway answer is usable if it is not blank and not an error document.
fn gateway_accepts(body: &str) -> bool {
    !body.trim().is_empty() && gateway_lines(body).is_ok()
}

fn parse_footprint(body: &str) -> RefCatResult<Option<Footprint>> {
    let found = gateway_lines(body)?.into_iter().find_map(|line| {
        let mut fields = line.split(',').map(|f| f.trim().parse::<u32>());
        match (fields.next(), fields.next(), fields.next()) {
            (Some(Ok(run)), Some(Ok(camcol)), Some(Ok(field))) => Some(Footprint {
                run,
                camcol,
                field,
            }),
            _ => None,
        }
    });
    Ok(found)
}

#[derive(Debug, Clone)]
pub struct SdssAdapter {
    gateways: Vec<String>,
    vizier_mirrors: Vec<String>,
    gateway_timeout: Duration,
    footprint_timeout: Duration,
    vizier_timeout: Duration,
    vizier_max_rows: u32,
}

impl SdssAdapter {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            gateways: config.sdss_sql_gateways.clone(),
            vizier_mirrors: config.sdss_vizier_mirrors.clone(),
            gateway_timeout: config.request_timeout(),
            footprint_timeout: config.footprint_timeout(),
            vizier_timeout: config.sdss_vizier_timeout(),
            vizier_max_rows: config.vizier_max_rows,
        }
    }

    fn gateway_request(&self, sql: String, timeout: Duration) -> MirrorRequest {
        MirrorRequest::new(GATEWAY, &self.gateways, HttpMethod::Get, timeout)
            .param("cmd", sql)
            .param("format", "csv")
    }

    /// Look up the imaging field covering `position`.
    ///
    /// Gateways answering with an error document are skipped in favour of the
    /// next one. If none can answer, the position is reported as not covered:
    /// the check only exists to skip a full query that would come back empty.
    pub fn footprint(&self, client: &MirrorClient, position: &SkyPosition) -> Option<Footprint> {
        let request = self.gateway_request(footprint_sql(position), self.footprint_timeout);
        let body = match client.fetch(&request, gateway_accepts) {
            Ok(FetchOutcome::Fetched { body, .. }) => body,
            Ok(FetchOutcome::Empty) => return None,
            Err(e) => {
                warn!("SDSS footprint check failed, treating as uncovered: {}", e);
                return None;
            }
        };
        match parse_footprint(&body) {
            Ok(footprint) => footprint,
            Err(e) => {
                warn!("SDSS footprint check failed, treating as uncovered: {}", e);
                None
            }
        }
    }

    /// Request for the DR9 VizieR table; the flags column comes last.
    pub fn vizier_request(
        &self,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> MirrorRequest {
        let b = band.as_char();
        MirrorRequest::new(VIZIER, &self.vizier_mirrors, HttpMethod::Post, self.vizier_timeout)
            .param("-out.max", self.vizier_max_rows.to_string())
            .param("-out.form", "Tab-Separated-Values")
            .param("-order", "I")
            .param("-c", vizier_center(position))
            .param("-c.eq", "J2000")
            .param("-oc.form", "dec")
            .param("-c.bm", vizier_box(radius_arcmin))
            .param("-c.u", "arcmin")
            .param("-sort", "_r")
            .param("-out", "RAJ2000")
            .param("RAJ2000", "")
            .param("-out", "DEJ2000")
            .param("DEJ2000", "")
            .param("-source", "V/139/sdss9")
            .param("-out", format!("{}mag", b))
            .param("-out", format!("e_{}mag", b))
            .param(format!("e_{}pmag", b), format!("<= {}", MAX_PSF_MAG_ERR))
            .param("-out", "flags")
    }

    /// Parse the DR9 VizieR table, keeping rows with clean photometry flags.
    pub fn parse_vizier(&self, body: &str) -> ResultSet {
        vizier_data_lines(body)
            .filter_map(|line| {
                let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
                let (flags, values) = fields.split_last()?;
                let hex = flags.trim_start_matches("0x").trim_start_matches("0X");
                let flags = u64::from_str_radix(hex, 16).ok()?;
                if !sdss_flags_acceptable(flags) {
                    return None;
                }
                CatalogRow::from_fields(values)
            })
            .collect()
    }

    pub fn query_vizier(
        &self,
        client: &MirrorClient,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<ResultSet> {
        let request = self.vizier_request(position, radius_arcmin, band);
        match client.fetch(&request, |body| !body.trim().is_empty())? {
            FetchOutcome::Fetched { body, .. } => Ok(self.parse_vizier(&body)),
            FetchOutcome::Empty => Ok(ResultSet::new()),
        }
    }
}

impl CatalogAdapter for SdssAdapter {
    fn name(&self) -> &'static str {
        GATEWAY
    }

    fn build_request(
        &self,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<MirrorRequest> {
        if !CatalogKind::Sdss.supports(band) {
            return Err(RefCatError::format_error(format!(
                "band '{}' is not an SDSS band",
                band
            )));
        }
        Ok(self.gateway_request(
            photometry_sql(position, radius_arcmin, band),
            self.gateway_timeout,
        ))
    }

    fn accepts(&self, body: &str) -> bool {
        gateway_accepts(body)
    }

    fn parse(&self, body: &str) -> RefCatResult<ResultSet> {
        Ok(gateway_lines(body)?
            .into_iter()
            .filter_map(|line| {
                let fields: Vec<&str> = line.split(',').collect();
                CatalogRow::from_fields(&fields)
            })
            .collect())
    }

    /// Gateway first; VizieR when every gateway fails, errors or finds nothing.
    fn query(
        &self,
        client: &MirrorClient,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<ResultSet> {
        let request = self.build_request(position, radius_arcmin, band)?;
        let gateway = client
            .fetch(&request, |body| self.accepts(body))
            .and_then(|outcome| match outcome {
                FetchOutcome::Fetched { body, .. } => self.parse(&body),
                FetchOutcome::Empty => Ok(ResultSet::new()),
            });

        match gateway {
            Ok(rows) if !rows.is_empty() => {
                info!(rows = rows.len(), "SDSS gateway query succeeded");
                return Ok(rows);
            }
            Ok(_) => warn!("SDSS gateway returned no rows, trying VizieR"),
            Err(e) if e.is_recoverable() => {
                warn!("SDSS gateway query failed, trying VizieR: {}", e)
            }
            Err(e) => return Err(e),
        }

        // Transport failures past this point are not forgiven.
        self.query_vizier(client, position, radius_arcmin, band)
    }
}

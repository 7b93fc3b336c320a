//! The catalog fallback chain.
//!
//! A [`Resolver`] starts at the requested `(catalog, band)` and walks the
//! transitions of [`next_step`] until a catalog returns rows or a terminal
//! catalog comes back empty:
//!
//! ```text
//! PANSTARRS ──(south / empty)──▶ SDSS (band remapped)
//! SDSS ──(non-SDSS band)──▶ USNO
//! SDSS ──(outside footprint, band g/r/i)──▶ APASS
//! SDSS ──(outside footprint, band u/z / empty)──▶ USNO (band remapped)
//! APASS, GAIA ──(empty)──▶ USNO (band remapped)
//! DENIS ──(empty)──▶ USNO for I, 2MASS for J/K
//! USNO, 2MASS ──(empty)──▶ exhausted
//! ```
//!
//! Every edge points further down the chain, so a resolution visits each
//! catalog at most once. Transport failures abort the resolution. The SDSS
//! SQL gateways are the one exception: when they fail the SDSS step retries
//! on VizieR, and a failure there is fatal like anywhere else.

use super::adapters::{CatalogAdapter, PanStarrsAdapter, SdssAdapter, VizierAdapter};
use super::mirror::MirrorClient;
use super::request::{Band, CatalogKind, QueryRequest};
use super::row::ResultSet;
use crate::config::ResolverConfig;
use crate::coords::SkyPosition;
use crate::errors::{RefCatError, RefCatResult};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// One `(catalog, band)` pair visited during a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub catalog: CatalogKind,
    pub band: Band,
}

impl Step {
    pub fn new(catalog: CatalogKind, band: Band) -> Self {
        Self { catalog, band }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.catalog, self.band)
    }
}

/// Why a step produced no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    /// The catalog answered without usable rows.
    Empty,
    /// The position lies outside the catalog's sky coverage.
    OutOfCoverage,
    /// The band reached this catalog through a remap it cannot serve.
    NotApplicable,
}

/// Where to go after `step` missed, or `None` when the chain is exhausted.
pub fn next_step(step: Step, miss: Miss) -> Option<Step> {
    let equivalent = step.band.fallback_equivalent();
    match step.catalog {
        CatalogKind::PanStarrs => Some(Step::new(CatalogKind::Sdss, equivalent)),
        CatalogKind::Sdss => match miss {
            Miss::OutOfCoverage if "gri".contains(step.band.as_char()) => {
                Some(Step::new(CatalogKind::Apass, step.band))
            }
            _ => Some(Step::new(CatalogKind::Usno, equivalent)),
        },
        CatalogKind::Apass | CatalogKind::Gaia => {
            Some(Step::new(CatalogKind::Usno, equivalent))
        }
        CatalogKind::Denis => match step.band.as_char() {
            'J' | 'K' => Some(Step::new(CatalogKind::TwoMass, step.band)),
            _ => Some(Step::new(CatalogKind::Usno, step.band)),
        },
        CatalogKind::Usno | CatalogKind::TwoMass => None,
    }
}

/// Rows from the catalog that finally answered, and the path taken.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub catalog: CatalogKind,
    pub band: Band,
    pub rows: ResultSet,
    /// Every step visited, the successful one last.
    pub trail: Vec<Step>,
}

/// Runs the fallback chain for validated [`QueryRequest`]s.
///
/// Holds no per-query state and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
    client: MirrorClient,
    sdss: SdssAdapter,
    panstarrs: PanStarrsAdapter,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> RefCatResult<Self> {
        config.validate()?;
        let client = MirrorClient::new(&config.user_agent)?;
        Ok(Self {
            sdss: SdssAdapter::new(&config),
            panstarrs: PanStarrsAdapter::new(&config),
            client,
            config,
        })
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::new()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Walk the chain from the request's catalog until some catalog returns
    /// rows.
    ///
    /// # Errors
    /// [`RefCatError::Transport`] when the last mirror of any service other
    /// than the SDSS SQL gateways fails, and [`RefCatError::Exhausted`] when a
    /// terminal catalog returns nothing.
    pub fn resolve(&self, request: &QueryRequest) -> RefCatResult<Resolution> {
        let position = request.position();
        let radius = request.radius_arcmin();
        let mut step = Step::new(request.catalog(), request.band());
        let mut trail = Vec::new();

        loop {
            trail.push(step);
            info!(step = %step, radius_arcmin = radius, "querying catalog");

            let miss = match self.run_step(step, position, radius)? {
                Ok(rows) if !rows.is_empty() => {
                    info!(step = %step, rows = rows.len(), "catalog answered");
                    return Ok(Resolution {
                        catalog: step.catalog,
                        band: step.band,
                        rows,
                        trail,
                    });
                }
                Ok(_) => Miss::Empty,
                Err(miss) => miss,
            };

            // Each catalog appears at most once on any path.
            let next = next_step(step, miss).filter(|_| trail.len() < CatalogKind::ALL.len());
            match next {
                Some(next) => {
                    warn!(from = %step, to = %next, reason = ?miss, "falling back");
                    step = next;
                }
                None => {
                    return Err(RefCatError::exhausted(format!(
                        "{} returned no rows in band {} (tried {})",
                        step.catalog,
                        step.band,
                        trail
                            .iter()
                            .map(Step::to_string)
                            .collect::<Vec<_>>()
                            .join(" -> ")
                    )));
                }
            }
        }
    }

    /// Rows of one step, or the reason it missed. The outer error is fatal.
    fn run_step(
        &self,
        step: Step,
        position: &SkyPosition,
        radius: f64,
    ) -> RefCatResult<Result<ResultSet, Miss>> {
        match step.catalog {
            CatalogKind::PanStarrs => {
                if !self.panstarrs.covers(position) {
                    return Ok(Err(Miss::OutOfCoverage));
                }
                Ok(Ok(self.panstarrs.query(&self.client, position, radius, step.band)?))
            }
            CatalogKind::Sdss => self.run_sdss(step, position, radius),
            catalog => {
                let adapter = VizierAdapter::new(catalog, &self.config);
                Ok(Ok(adapter.query(&self.client, position, radius, step.band)?))
            }
        }
    }

    fn run_sdss(
        &self,
        step: Step,
        position: &SkyPosition,
        radius: f64,
    ) -> RefCatResult<Result<ResultSet, Miss>> {
        if !CatalogKind::Sdss.supports(step.band) {
            return Ok(Err(Miss::NotApplicable));
        }
        match self.sdss.footprint(&self.client, position) {
            Some(footprint) => info!(
                run = footprint.run,
                camcol = footprint.camcol,
                field = footprint.field,
                "position is inside the SDSS footprint"
            ),
            None => return Ok(Err(Miss::OutOfCoverage)),
        }
        Ok(Ok(self.sdss.query(&self.client, position, radius, step.band)?))
    }
}

/// Builder for a [`Resolver`] starting from [`ResolverConfig::default`].
#[derive(Debug, Clone)]
pub struct ResolverBuilder {
    config: ResolverConfig,
}

impl ResolverBuilder {
    pub fn new() -> Self {
        Self {
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_vizier_mirrors<S: Into<String>>(
        mut self,
        mirrors: impl IntoIterator<Item = S>,
    ) -> Self {
        self.config.vizier_mirrors = mirrors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sdss_vizier_mirrors<S: Into<String>>(
        mut self,
        mirrors: impl IntoIterator<Item = S>,
    ) -> Self {
        self.config.sdss_vizier_mirrors = mirrors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sdss_gateways<S: Into<String>>(
        mut self,
        gateways: impl IntoIterator<Item = S>,
    ) -> Self {
        self.config.sdss_sql_gateways = gateways.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_panstarrs_mirrors<S: Into<String>>(
        mut self,
        mirrors: impl IntoIterator<Item = S>,
    ) -> Self {
        self.config.panstarrs_mirrors = mirrors.into_iter().map(Into::into).collect();
        self
    }

    /// Same timeout for every service, footprint check included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs_f64();
        self.config.request_timeout_secs = secs;
        self.config.vizier_timeout_secs = secs;
        self.config.sdss_vizier_timeout_secs = secs;
        self.config.panstarrs_timeout_secs = secs;
        self.config.footprint_timeout_secs = secs;
        self
    }

    pub fn with_panstarrs_min_detections(mut self, detections: u32) -> Self {
        self.config.panstarrs_min_detections = detections;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> RefCatResult<Resolver> {
        Resolver::new(self.config)
    }
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Service endpoints, timeouts and thresholds for a [`Resolver`](crate::Resolver).
//!
//! [`ResolverConfig::default`] points at the public services. Every field can
//! be overridden from a JSON file; missing keys keep their defaults:
//!
//! ```json
//! {
//!   "vizier_mirrors": ["http://vizier.cfa.harvard.edu/viz-bin/asu-tsv"],
//!   "request_timeout_secs": 60
//! }
//! ```

use crate::errors::{RefCatError, RefCatResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const VIZIER_MIRRORS: &[&str] = &[
    "http://vizier.u-strasbg.fr/viz-bin/asu-tsv",
    "http://vizier.cfa.harvard.edu/viz-bin/asu-tsv",
    "http://vizier.nao.ac.jp/viz-bin/asu-tsv",
    "http://vizier.hia.nrc.ca/viz-bin/asu-tsv",
    "http://archive.ast.cam.ac.uk/viz-bin/asu-tsv",
    "http://urania.iucaa.ernet.in/viz-bin/asu-tsv",
    "http://data.bao.ac.cn/viz-bin/asu-tsv",
    "http://www.ukirt.jach.hawaii.edu/viz-bin/asu-tsv",
];

pub const SDSS_VIZIER_MIRRORS: &[&str] = &[
    "http://vizier.u-strasbg.fr/viz-bin/asu-tsv",
    "http://vizier.nao.ac.jp/viz-bin/asu-tsv",
    "http://vizier.hia.nrc.ca/viz-bin/asu-tsv",
    "http://archive.ast.cam.ac.uk/viz-bin/asu-tsv",
    "http://urania.iucaa.ernet.in/viz-bin/asu-tsv",
    "http://data.bao.ac.cn/viz-bin/asu-tsv",
    "http://vizier.cfa.harvard.edu/viz-bin/asu-tsv",
    "http://www.ukirt.jach.hawaii.edu/viz-bin/asu-tsv",
];

pub const SDSS_SQL_GATEWAYS: &[&str] = &[
    "http://skyserver.sdss.org/dr12/en/tools/search/x_sql.aspx",
    "http://cas.sdss.org/dr9/en/tools/search/x_sql.asp",
];

pub const PANSTARRS_MIRRORS: &[&str] = &[
    "http://archive.stsci.edu/panstarrs/search.php",
    "http://archive.stsci.edu/panstarrs/search.php",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub vizier_mirrors: Vec<String>,

    pub sdss_vizier_mirrors: Vec<String>,

    pub sdss_sql_gateways: Vec<String>,

    pub panstarrs_mirrors: Vec<String>,

    /// Timeout for a single SQL gateway query.
    pub request_timeout_secs: f64,

    pub vizier_timeout_secs: f64,

    pub sdss_vizier_timeout_secs: f64,

    pub panstarrs_timeout_secs: f64,

    /// Timeout for the SDSS footprint pre-check. Kept short: an uncovered
    /// position should not cost a full query timeout.
    pub footprint_timeout_secs: f64,

    /// Pan-STARRS objects need strictly more detections than this.
    pub panstarrs_min_detections: u32,

    /// Pan-STARRS is skipped below this declination (degrees).
    pub panstarrs_dec_cutoff_deg: f64,

    pub panstarrs_max_records: u32,

    pub vizier_max_rows: u32,

    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            vizier_mirrors: to_strings(VIZIER_MIRRORS),
            sdss_vizier_mirrors: to_strings(SDSS_VIZIER_MIRRORS),
            sdss_sql_gateways: to_strings(SDSS_SQL_GATEWAYS),
            panstarrs_mirrors: to_strings(PANSTARRS_MIRRORS),
            request_timeout_secs: 30.0,
            vizier_timeout_secs: 20.0,
            sdss_vizier_timeout_secs: 20.0,
            panstarrs_timeout_secs: 45.0,
            footprint_timeout_secs: 5.0,
            panstarrs_min_detections: 10,
            panstarrs_dec_cutoff_deg: -30.0,
            panstarrs_max_records: 1000,
            vizier_max_rows: 682_666,
            user_agent: format!("celestial-refcat/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ResolverConfig {
    /// Load overrides from a JSON file and validate the result.
    pub fn from_json_file(path: impl AsRef<Path>) -> RefCatResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            RefCatError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> RefCatResult<Self> {
        let config: Self = serde_json::from_str(data)
            .map_err(|e| RefCatError::config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty mirror lists and non-positive timeouts.
    pub fn validate(&self) -> RefCatResult<()> {
        let lists = [
            ("vizier_mirrors", &self.vizier_mirrors),
            ("sdss_vizier_mirrors", &self.sdss_vizier_mirrors),
            ("sdss_sql_gateways", &self.sdss_sql_gateways),
            ("panstarrs_mirrors", &self.panstarrs_mirrors),
        ];
        for (name, list) in lists {
            if list.is_empty() {
                return Err(RefCatError::config(format!("{} must not be empty", name)));
            }
        }

        let timeouts = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("vizier_timeout_secs", self.vizier_timeout_secs),
            ("sdss_vizier_timeout_secs", self.sdss_vizier_timeout_secs),
            ("panstarrs_timeout_secs", self.panstarrs_timeout_secs),
            ("footprint_timeout_secs", self.footprint_timeout_secs),
        ];
        for (name, secs) in timeouts {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(RefCatError::config(format!(
                    "{} must be positive, got {}",
                    name, secs
                )));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }

    pub fn vizier_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.vizier_timeout_secs)
    }

    pub fn sdss_vizier_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.sdss_vizier_timeout_secs)
    }

    pub fn panstarrs_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.panstarrs_timeout_secs)
    }

    pub fn footprint_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.footprint_timeout_secs)
    }
}

fn to_strings(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

//! Box queries against VizieR `asu-tsv` mirrors.
//!
//! One adapter serves every VizieR-backed catalog; the `(catalog, band)` pair
//! selects the VizieR table and output columns:
//!
//! | Catalog | Table | Magnitude | Error |
//! |---------|-------|-----------|-------|
//! | USNO | `I/284/out` (USNO-B1.0) | `B2mag` / `R2mag` / `Imag` | — |
//! | 2MASS | `II/246/out` | `Jmag` / `Hmag` / `Kmag` | `e_<band>mag` |
//! | DENIS | `B/denis/denis` | `Imag` / `Jmag` / `Kmag` | `e_<band>mag` |
//! | APASS | `II/336/apass9` | `Bmag` `Vmag` `g'mag` `r'mag` `i'mag` | `e_<column>` |
//! | GAIA | `I/337/gaia` (DR1) | `<Gmag>` | — |
//!
//! Every query asks for `RAJ2000`, `DEJ2000` in decimal degrees first, so the
//! magnitude is always the third column and its error, when present, the
//! fourth. Results are sorted by distance from the center (`-sort _r`).

use super::{vizier_box, vizier_center, vizier_data_lines, CatalogAdapter};
use crate::config::ResolverConfig;
use crate::coords::SkyPosition;
use crate::errors::{RefCatError, RefCatResult};
use crate::query::mirror::{HttpMethod, MirrorRequest};
use crate::query::request::{Band, CatalogKind};
use crate::query::row::{CatalogRow, ResultSet};
use std::time::Duration;

/// Table and columns for one `(catalog, band)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VizierTable {
    pub source: &'static str,
    pub magnitude: String,
    pub error: Option<String>,
    /// Extra `-out.add` columns the table needs to produce J2000 positions.
    pub out_add: Option<&'static str>,
}

impl VizierTable {
    /// Resolve the table for a catalog/band pair, or `None` if the catalog
    /// is not served through VizieR or lacks that band.
    pub fn lookup(catalog: CatalogKind, band: Band) -> Option<Self> {
        if !catalog.supports(band) {
            return None;
        }
        let b = band.as_char();
        let table = match catalog {
            CatalogKind::Usno => {
                let magnitude = match b {
                    'B' => "B2mag",
                    'R' => "R2mag",
                    _ => "Imag",
                };
                VizierTable {
                    source: "I/284/out",
                    magnitude: magnitude.to_string(),
                    error: None,
                    out_add: None,
                }
            }
            CatalogKind::TwoMass => with_error("II/246/out", format!("{}mag", b)),
            CatalogKind::Denis => with_error("B/denis/denis", format!("{}mag", b)),
            CatalogKind::Apass => {
                let magnitude = if b.is_ascii_lowercase() {
                    format!("{}'mag", b)
                } else {
                    format!("{}mag", b)
                };
                with_error("II/336/apass9", magnitude)
            }
            CatalogKind::Gaia => VizierTable {
                source: "I/337/gaia",
                magnitude: "<Gmag>".to_string(),
                error: None,
                out_add: Some("_RAJ,_DEJ"),
            },
            CatalogKind::Sdss | CatalogKind::PanStarrs => return None,
        };
        Some(table)
    }
}

fn with_error(source: &'static str, magnitude: String) -> VizierTable {
    VizierTable {
        source,
        error: Some(format!("e_{}", magnitude)),
        magnitude,
        out_add: None,
    }
}

/// VizieR-backed adapter for one catalog.
#[derive(Debug, Clone)]
pub struct VizierAdapter {
    catalog: CatalogKind,
    mirrors: Vec<String>,
    timeout: Duration,
    max_rows: u32,
}

impl VizierAdapter {
    pub fn new(catalog: CatalogKind, config: &ResolverConfig) -> Self {
        Self {
            catalog,
            mirrors: config.vizier_mirrors.clone(),
            timeout: config.vizier_timeout(),
            max_rows: config.vizier_max_rows,
        }
    }
}

impl CatalogAdapter for VizierAdapter {
    fn name(&self) -> &'static str {
        "VizieR"
    }

    fn build_request(
        &self,
        position: &SkyPosition,
        radius_arcmin: f64,
        band: Band,
    ) -> RefCatResult<MirrorRequest> {
        let table = VizierTable::lookup(self.catalog, band).ok_or_else(|| {
            RefCatError::format_error(format!(
                "no VizieR table for {} band '{}'",
                self.catalog, band
            ))
        })?;

        let mut request = MirrorRequest::new("VizieR", &self.mirrors, HttpMethod::Get, self.timeout)
            .param("-to", "4")
            .param("-from", "-2")
            .param("-this", "-2")
            .param("-out.max", self.max_rows.to_string())
            .param("-out.form", "Tab-Separated-Values")
            .param("-order", "I")
            .param("-c", vizier_center(position))
            .param("-c.eq", "J2000")
            .param("-oc.form", "dec")
            .param("-c.bm", vizier_box(radius_arcmin))
            .param("-sort", "_r")
            .param("-out", "RAJ2000")
            .param("RAJ2000", "")
            .param("-out", "DEJ2000")
            .param("DEJ2000", "")
            .param("-file", ".")
            .param("-meta", "2")
            .param("-source", table.source)
            .param("-out", table.magnitude.as_str())
            .param(table.magnitude.as_str(), "");

        if let Some(error) = &table.error {
            request = request.param("-out", error.as_str()).param(error.as_str(), "");
        }
        if let Some(extra) = table.out_add {
            request = request.param("-out.add", extra);
        }
        Ok(request)
    }

    /// A mirror answered with a table if it sent more than one line and not
    /// only `#` comments.
    fn accepts(&self, body: &str) -> bool {
        body.lines().nth(1).is_some() && body.lines().any(|line| !line.starts_with('#'))
    }

    fn parse(&self, body: &str) -> RefCatResult<ResultSet> {
        Ok(vizier_data_lines(body)
            .filter_map(|line| {
                let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
                CatalogRow::from_fields(&fields)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::mirror::MirrorClient;
    use mockito::Matcher;

    fn band(c: char) -> Band {
        Band::new(c).unwrap()
    }

    fn adapter(catalog: CatalogKind) -> VizierAdapter {
        VizierAdapter::new(catalog, &ResolverConfig::default())
    }

    const USNO_BODY: &str = "\
#
#   VizieR Astronomical Server vizier.u-strasbg.fr
#RESOURCE=yCat_1284
#Table\tI_284_out:
RAJ2000\tDEJ2000\tR2mag
deg\tdeg\tmag
-----------\t-----------\t-----
150.099870\t+02.199940\t
150.100420\t+02.200810\t18.30
150.101100\t+02.198000\t17.92

#END#
";

    #[test]
    fn test_table_lookup() {
        let t = VizierTable::lookup(CatalogKind::Usno, band('R')).unwrap();
        assert_eq!((t.source, t.magnitude.as_str(), t.error), ("I/284/out", "R2mag", None));

        let t = VizierTable::lookup(CatalogKind::TwoMass, band('K')).unwrap();
        assert_eq!(t.magnitude, "Kmag");
        assert_eq!(t.error.as_deref(), Some("e_Kmag"));

        let t = VizierTable::lookup(CatalogKind::Apass, band('g')).unwrap();
        assert_eq!(t.magnitude, "g'mag");
        assert_eq!(t.error.as_deref(), Some("e_g'mag"));

        let t = VizierTable::lookup(CatalogKind::Apass, band('V')).unwrap();
        assert_eq!(t.magnitude, "Vmag");

        let t = VizierTable::lookup(CatalogKind::Denis, band('I')).unwrap();
        assert_eq!(t.source, "B/denis/denis");

        let t = VizierTable::lookup(CatalogKind::Gaia, band('G')).unwrap();
        assert_eq!(t.out_add, Some("_RAJ,_DEJ"));

        assert!(VizierTable::lookup(CatalogKind::Usno, band('J')).is_none());
        assert!(VizierTable::lookup(CatalogKind::Sdss, band('g')).is_none());
    }

    #[test]
    fn test_build_request() {
        let pos = SkyPosition::new(150.1, 2.2).unwrap();
        let req = adapter(CatalogKind::TwoMass)
            .build_request(&pos, 5.0, band('J'))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.get("-c"), Some("150.100+2.200"));
        assert_eq!(req.get("-c.bm"), Some("10x10"));
        assert_eq!(req.get("-source"), Some("II/246/out"));
        let outs: Vec<&str> = req
            .params
            .iter()
            .filter(|(k, _)| k == "-out")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(outs, vec!["RAJ2000", "DEJ2000", "Jmag", "e_Jmag"]);
    }

    #[test]
    fn test_build_request_rejects_foreign_band() {
        let pos = SkyPosition::new(150.1, 2.2).unwrap();
        let err = adapter(CatalogKind::Usno)
            .build_request(&pos, 5.0, band('g'))
            .unwrap_err();
        assert!(matches!(err, RefCatError::Format { .. }));
    }

    #[test]
    fn test_parse_drops_blank_magnitudes() {
        let rows = adapter(CatalogKind::Usno).parse(USNO_BODY).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mag, 18.3);
        assert_eq!(rows[0].mag_err, None);
        assert_eq!(rows[1].ra_deg, 150.1011);
    }

    #[test]
    fn test_parse_with_error_column() {
        let body = "Jmag\n---\n10.5\t-3.25\t12.345\t0.021\n10.6\t-3.26\t13.001\t\n";
        let rows = adapter(CatalogKind::TwoMass).parse(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mag_err, Some(0.021));
        assert_eq!(rows[1].mag_err, None);
    }

    #[test]
    fn test_accepts() {
        let a = adapter(CatalogKind::Usno);
        assert!(a.accepts(USNO_BODY));
        assert!(!a.accepts("#only a comment\n"));
        assert!(!a.accepts("#one\n#two\n"));
        assert!(!a.accepts(""));
    }

    #[test]
    fn test_query_against_mirror() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/viz-bin/asu-tsv")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("-source".into(), "I/284/out".into()),
                Matcher::UrlEncoded("-out".into(), "R2mag".into()),
            ]))
            .with_body(USNO_BODY)
            .expect(1)
            .create();

        let config = ResolverConfig {
            vizier_mirrors: vec![format!("{}/viz-bin/asu-tsv", server.url())],
            ..ResolverConfig::default()
        };
        let client = MirrorClient::new(&config.user_agent).unwrap();
        let pos = SkyPosition::new(150.1, 2.2).unwrap();
        let rows = VizierAdapter::new(CatalogKind::Usno, &config)
            .query(&client, &pos, 5.0, band('R'))
            .unwrap();
        assert_eq!(rows.len(), 2);
        mock.assert();
    }
}

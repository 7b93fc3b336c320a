use celestial_refcat::query::adapters::sdss::{footprint_sql, photometry_sql};
use celestial_refcat::query::Step;
use celestial_refcat::{Band, CatalogKind, QueryRequest, RefCatError, Resolver, SkyPosition};
use mockito::{Matcher, Server, ServerGuard};
use std::time::Duration;

const DEAD_MIRROR: &str = "http://127.0.0.1:1/viz-bin/asu-tsv";

const USNO_BODY: &str = "\
#RESOURCE=yCat_1284
#Table\tI_284_out:
RAJ2000\tDEJ2000\tR2mag
deg\tdeg\tmag
-----------\t-----------\t-----
150.099870\t+02.199940\t
150.100420\t+02.200810\t18.30

#END#
";

const NO_TABLE: &str = "#\n#INFO\tNo table found\n";

fn band(c: char) -> Band {
    Band::new(c).unwrap()
}

fn request(ra: f64, dec: f64, radius: f64, catalog: CatalogKind, b: char) -> QueryRequest {
    QueryRequest::new(SkyPosition::new(ra, dec).unwrap(), radius, catalog, band(b)).unwrap()
}

fn resolver_for(server: &ServerGuard) -> Resolver {
    let url = server.url();
    Resolver::builder()
        .with_vizier_mirrors([format!("{}/viz-bin/asu-tsv", url)])
        .with_sdss_vizier_mirrors([format!("{}/sdss/asu-tsv", url)])
        .with_sdss_gateways([format!("{}/x_sql.aspx", url)])
        .with_panstarrs_mirrors([format!("{}/panstarrs/search.php", url)])
        .with_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn vizier_source(source: &str, column: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("-source".into(), source.into()),
        Matcher::UrlEncoded("-out".into(), column.into()),
    ])
}

fn steps(trail: &[Step]) -> Vec<String> {
    trail.iter().map(Step::to_string).collect()
}

#[test]
fn test_invalid_band_rejected_before_network() {
    let pos = SkyPosition::new(150.1, 2.2).unwrap();
    let err = QueryRequest::new(pos, 5.0, CatalogKind::Usno, band('g')).unwrap_err();
    assert!(matches!(err, RefCatError::Format { .. }));

    let err = QueryRequest::new(pos, 5.0, CatalogKind::TwoMass, band('K'))
        .and(QueryRequest::new(pos, 0.0, CatalogKind::TwoMass, band('K')))
        .unwrap_err();
    assert!(matches!(err, RefCatError::Format { .. }));
    assert!(Band::new('x').is_err());
}

#[test]
fn test_usno_end_to_end_drops_blank_magnitude() {
    let mut server = Server::new();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("-source".into(), "I/284/out".into()),
            Matcher::UrlEncoded("-out".into(), "R2mag".into()),
            Matcher::UrlEncoded("-c".into(), "150.100+2.200".into()),
            Matcher::UrlEncoded("-c.bm".into(), "10x10".into()),
        ]))
        .with_body(USNO_BODY)
        .expect(1)
        .create();

    let resolution = resolver_for(&server)
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Usno, 'R'))
        .unwrap();

    assert_eq!(resolution.catalog, CatalogKind::Usno);
    assert_eq!(resolution.rows.len(), 1);
    assert_eq!(resolution.rows[0].mag, 18.3);
    assert_eq!(resolution.rows[0].mag_err, None);
    assert_eq!(resolution.rows[0].to_tsv_line(), "150.10042\t2.20081\t18.3\t");
    usno.assert();
}

#[test]
fn test_dead_first_mirror_is_skipped() {
    let mut server = Server::new();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("I/284/out", "R2mag"))
        .with_body(USNO_BODY)
        .expect(1)
        .create();

    let resolver = Resolver::builder()
        .with_vizier_mirrors([
            DEAD_MIRROR.to_string(),
            format!("{}/viz-bin/asu-tsv", server.url()),
        ])
        .build()
        .unwrap();
    let resolution = resolver
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Usno, 'R'))
        .unwrap();
    assert_eq!(resolution.rows.len(), 1);
    usno.assert();
}

#[test]
fn test_all_vizier_mirrors_down_is_transport_failure() {
    let resolver = Resolver::builder()
        .with_vizier_mirrors([DEAD_MIRROR, DEAD_MIRROR])
        .with_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let err = resolver
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Usno, 'R'))
        .unwrap_err();
    assert!(matches!(err, RefCatError::Transport { .. }), "got {}", err);
}

#[test]
fn test_terminal_catalog_empty_is_exhausted() {
    let mut server = Server::new();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("I/284/out", "Imag"))
        .with_body(NO_TABLE)
        .expect(1)
        .create();

    let err = resolver_for(&server)
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Usno, 'I'))
        .unwrap_err();
    assert!(matches!(err, RefCatError::Exhausted { .. }), "got {}", err);
    usno.assert();
}

#[test]
fn test_panstarrs_south_falls_back_through_sdss_to_usno() {
    let mut server = Server::new();
    let panstarrs = server
        .mock("POST", "/panstarrs/search.php")
        .expect(0)
        .create();
    let gateway = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::Any)
        .expect(0)
        .create();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("I/284/out", "B2mag"))
        .with_body(USNO_BODY.replace("R2mag", "B2mag"))
        .expect(1)
        .create();

    let resolution = resolver_for(&server)
        .resolve(&request(10.0, -60.0, 5.0, CatalogKind::PanStarrs, 'g'))
        .unwrap();

    assert_eq!(steps(&resolution.trail), vec!["PANSTARRS/g", "SDSS/B", "USNO/B"]);
    assert_eq!(resolution.catalog, CatalogKind::Usno);
    assert_eq!(resolution.band, band('B'));
    panstarrs.assert();
    gateway.assert();
    usno.assert();
}

#[test]
fn test_panstarrs_north_answers_directly() {
    let mut server = Server::new();
    let panstarrs = server
        .mock("POST", "/panstarrs/search.php")
        .match_body(Matcher::UrlEncoded(
            "selectedColumnsCsv".into(),
            "raMean,decMean,rMeanApMag,rMeanApMagErr".into(),
        ))
        .with_body("raMean\tdecMean\trMeanApMag\trMeanApMagErr\n150.1001\t2.2001\t17.25\t0.004\n")
        .expect(1)
        .create();

    let resolution = resolver_for(&server)
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::PanStarrs, 'r'))
        .unwrap();
    assert_eq!(resolution.catalog, CatalogKind::PanStarrs);
    assert_eq!(resolution.rows.len(), 1);
    assert_eq!(resolution.trail.len(), 1);
    panstarrs.assert();
}

#[test]
fn test_uncovered_sdss_position_goes_to_apass_without_full_query() {
    let pos = SkyPosition::new(200.0, -40.0).unwrap();
    let mut server = Server::new();
    let footprint = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded("cmd".into(), footprint_sql(&pos)))
        .with_body("#Table1\nrun,camcol,field\n")
        .expect(1)
        .create();
    let full_query = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded(
            "cmd".into(),
            photometry_sql(&pos, 5.0, band('r')),
        ))
        .expect(0)
        .create();
    let sdss_vizier = server.mock("POST", "/sdss/asu-tsv").expect(0).create();
    let apass = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("II/336/apass9", "r'mag"))
        .with_body(
            "#RESOURCE=yCat_2336\nRAJ2000\tDEJ2000\tr'mag\te_r'mag\n\
             ----\t----\t----\t----\n200.0001\t-40.0002\t14.120\t0.030\n",
        )
        .expect(1)
        .create();

    let resolution = resolver_for(&server)
        .resolve(&request(200.0, -40.0, 5.0, CatalogKind::Sdss, 'r'))
        .unwrap();

    assert_eq!(steps(&resolution.trail), vec!["SDSS/r", "APASS/r"]);
    assert_eq!(resolution.rows[0].mag_err, Some(0.03));
    footprint.assert();
    full_query.assert();
    sdss_vizier.assert();
    apass.assert();
}

#[test]
fn test_sdss_failure_falls_back_to_usno() {
    let pos = SkyPosition::new(150.1, 2.2).unwrap();
    let mut server = Server::new();
    let footprint = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded("cmd".into(), footprint_sql(&pos)))
        .with_body("run,camcol,field\n756,3,102\n")
        .expect(1)
        .create();
    let full_query = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded(
            "cmd".into(),
            photometry_sql(&pos, 5.0, band('g')),
        ))
        .with_status(500)
        .expect(1)
        .create();
    let sdss_vizier = server
        .mock("POST", "/sdss/asu-tsv")
        .with_body(NO_TABLE)
        .expect(1)
        .create();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("I/284/out", "B2mag"))
        .with_body(USNO_BODY.replace("R2mag", "B2mag"))
        .expect(1)
        .create();

    let resolution = resolver_for(&server)
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Sdss, 'g'))
        .unwrap();

    assert_eq!(steps(&resolution.trail), vec!["SDSS/g", "USNO/B"]);
    footprint.assert();
    full_query.assert();
    sdss_vizier.assert();
    usno.assert();
}

#[test]
fn test_denis_near_infrared_falls_back_to_2mass() {
    let mut server = Server::new();
    let denis = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("B/denis/denis", "Jmag"))
        .with_body(NO_TABLE)
        .expect(1)
        .create();
    let twomass = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("II/246/out", "Jmag"))
        .with_body(
            "#RESOURCE=yCat_2246\nRAJ2000\tDEJ2000\tJmag\te_Jmag\n\
             ---\t---\t---\t---\n150.1001\t+02.2001\t12.345\t0.021\n",
        )
        .expect(1)
        .create();

    let resolution = resolver_for(&server)
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Denis, 'J'))
        .unwrap();
    assert_eq!(steps(&resolution.trail), vec!["DENIS/J", "2MASS/J"]);
    assert_eq!(resolution.rows[0].mag, 12.345);
    denis.assert();
    twomass.assert();
}

#[test]
fn test_uncovered_sdss_z_goes_to_usno_without_full_query() {
    let pos = SkyPosition::new(200.0, -40.0).unwrap();
    let mut server = Server::new();
    let footprint = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded("cmd".into(), footprint_sql(&pos)))
        .with_body("#Table1\nrun,camcol,field\n")
        .expect(1)
        .create();
    let full_query = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded(
            "cmd".into(),
            photometry_sql(&pos, 5.0, band('z')),
        ))
        .expect(0)
        .create();
    let sdss_vizier = server.mock("POST", "/sdss/asu-tsv").expect(0).create();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("I/284/out", "Imag"))
        .with_body(USNO_BODY.replace("R2mag", "Imag"))
        .expect(1)
        .create();

    let resolution = resolver_for(&server)
        .resolve(&request(200.0, -40.0, 5.0, CatalogKind::Sdss, 'z'))
        .unwrap();

    assert_eq!(steps(&resolution.trail), vec!["SDSS/z", "USNO/I"]);
    assert_eq!(resolution.catalog, CatalogKind::Usno);
    footprint.assert();
    full_query.assert();
    sdss_vizier.assert();
    usno.assert();
}

#[test]
fn test_footprint_answered_by_second_gateway() {
    let pos = SkyPosition::new(150.1, 2.2).unwrap();
    let mut server = Server::new();
    let broken = server
        .mock("GET", "/dr12/x_sql.aspx")
        .match_query(Matcher::Any)
        .with_body("<html><body>Server Error in '/' Application.</body></html>")
        .expect_at_least(1)
        .create();
    let footprint = server
        .mock("GET", "/dr9/x_sql.aspx")
        .match_query(Matcher::UrlEncoded("cmd".into(), footprint_sql(&pos)))
        .with_body("run,camcol,field\n756,3,102\n")
        .expect(1)
        .create();
    let full_query = server
        .mock("GET", "/dr9/x_sql.aspx")
        .match_query(Matcher::UrlEncoded(
            "cmd".into(),
            photometry_sql(&pos, 5.0, band('r')),
        ))
        .with_body("ra,dec,mag,err\n150.1001,2.2001,16.512,0.004\n")
        .expect(1)
        .create();
    let apass = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    let url = server.url();
    let resolver = Resolver::builder()
        .with_vizier_mirrors([format!("{}/viz-bin/asu-tsv", url)])
        .with_sdss_gateways([
            format!("{}/dr12/x_sql.aspx", url),
            format!("{}/dr9/x_sql.aspx", url),
        ])
        .with_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let resolution = resolver
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Sdss, 'r'))
        .unwrap();

    assert_eq!(steps(&resolution.trail), vec!["SDSS/r"]);
    assert_eq!(resolution.catalog, CatalogKind::Sdss);
    assert_eq!(resolution.rows.len(), 1);
    broken.assert();
    footprint.assert();
    full_query.assert();
    apass.assert();
}

#[test]
fn test_sdss_vizier_mirrors_down_is_transport_failure() {
    let pos = SkyPosition::new(150.1, 2.2).unwrap();
    let mut server = Server::new();
    let footprint = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded("cmd".into(), footprint_sql(&pos)))
        .with_body("run,camcol,field\n756,3,102\n")
        .expect(1)
        .create();
    let full_query = server
        .mock("GET", "/x_sql.aspx")
        .match_query(Matcher::UrlEncoded(
            "cmd".into(),
            photometry_sql(&pos, 5.0, band('g')),
        ))
        .with_body("ERROR: Timeout expired\n")
        .expect(1)
        .create();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    let url = server.url();
    let resolver = Resolver::builder()
        .with_vizier_mirrors([format!("{}/viz-bin/asu-tsv", url)])
        .with_sdss_vizier_mirrors([DEAD_MIRROR, DEAD_MIRROR])
        .with_sdss_gateways([format!("{}/x_sql.aspx", url)])
        .with_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let err = resolver
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Sdss, 'g'))
        .unwrap_err();

    assert!(matches!(err, RefCatError::Transport { .. }), "got {}", err);
    footprint.assert();
    full_query.assert();
    usno.assert();
}

#[test]
fn test_apass_transport_failure_is_fatal() {
    let mut server = Server::new();
    let apass = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("II/336/apass9", "Vmag"))
        .with_status(503)
        .expect(1)
        .create();
    let usno = server
        .mock("GET", "/viz-bin/asu-tsv")
        .match_query(vizier_source("I/284/out", "R2mag"))
        .with_body(USNO_BODY)
        .expect(0)
        .create();

    let err = resolver_for(&server)
        .resolve(&request(150.1, 2.2, 5.0, CatalogKind::Apass, 'V'))
        .unwrap_err();

    assert!(matches!(err, RefCatError::Transport { .. }), "got {}", err);
    apass.assert();
    usno.assert();
}

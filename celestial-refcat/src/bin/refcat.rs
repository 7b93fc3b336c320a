use anyhow::Context;
use celestial_refcat::coords::parse_coordinate_pair;
use celestial_refcat::query::{brightest, write_tsv};
use celestial_refcat::{Band, CatalogKind, QueryRequest, Resolver, ResolverConfig, SkyPosition};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// HAWK-I acquisition preset: 2MASS within 3.9 arcmin.
const HAWKI_RADIUS_ARCMIN: f64 = 3.9;

/// Reference stars brighter than this are candidates for the HAWK-I report.
const HAWKI_MAX_MAG: f64 = 20.0;

#[derive(Parser)]
#[command(name = "refcat")]
#[command(about = "Retrieve photometric reference stars around a sky position")]
#[command(version)]
struct Cli {
    /// Combined position, e.g. 150.1+2.2 or 10:00:24-05:12:00
    #[arg(short = 'c', long, conflicts_with_all = ["ra", "dec"], required_unless_present = "ra")]
    coords: Option<String>,

    /// Right ascension (degrees, or H:M:S)
    #[arg(long, requires = "dec", allow_hyphen_values = true)]
    ra: Option<String>,

    /// Declination (degrees, or ±D:M:S)
    #[arg(long, requires = "ra", allow_hyphen_values = true)]
    dec: Option<String>,

    /// Search radius in arcminutes
    #[arg(short, long, required_unless_present = "hawki")]
    radius: Option<f64>,

    /// Catalog: SDSS, USNO, 2MASS, DENIS, APASS, GAIA or PS
    #[arg(short = 's', long, required_unless_present = "hawki")]
    catalog: Option<CatalogKind>,

    /// Band letter, valid for the catalog (case-sensitive)
    #[arg(short, long)]
    band: Band,

    /// Output file (standard output if omitted)
    #[arg(short = 'f', long)]
    output: Option<PathBuf>,

    /// JSON file overriding mirrors, timeouts and thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// HAWK-I preset: 2MASS, 3.9 arcmin, report the brightest star
    #[arg(long)]
    hawki: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let position = match (&cli.coords, &cli.ra, &cli.dec) {
        (Some(pair), _, _) => parse_coordinate_pair(pair)?,
        (None, Some(ra), Some(dec)) => SkyPosition::parse(ra, dec)?,
        _ => anyhow::bail!("a position is required: use -c RA±DEC or --ra/--dec"),
    };

    let (radius, catalog) = if cli.hawki {
        (HAWKI_RADIUS_ARCMIN, CatalogKind::TwoMass)
    } else {
        match (cli.radius, cli.catalog) {
            (Some(radius), Some(catalog)) => (radius, catalog),
            _ => anyhow::bail!("both --radius and --catalog are required"),
        }
    };

    let request = QueryRequest::new(position, radius, catalog, cli.band)?;

    let config = match &cli.config {
        Some(path) => ResolverConfig::from_json_file(path)?,
        None => ResolverConfig::default(),
    };
    let resolver = Resolver::builder().with_config(config).build()?;

    let resolution = resolver.resolve(&request)?;

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            write_tsv(&resolution.rows, BufWriter::new(file))?;
        }
        None => write_tsv(&resolution.rows, io::stdout().lock())?,
    }

    eprintln!("{}", resolution.catalog);

    if cli.hawki {
        let candidates: Vec<_> = resolution
            .rows
            .iter()
            .copied()
            .filter(|row| row.mag < HAWKI_MAX_MAG)
            .collect();
        match brightest(&candidates, &position) {
            Some(source) => {
                let at = source
                    .row
                    .position()
                    .map(|p| p.to_string())
                    .unwrap_or_default();
                eprintln!("Brightest source at {} with {:.2} mag", at, source.row.mag);
                eprintln!("Distance = {:.1} arcmin", source.distance_arcmin);
            }
            None => eprintln!("No source brighter than {} mag", HAWKI_MAX_MAG),
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

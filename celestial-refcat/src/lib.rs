//! Photometric reference stars from public catalog services.
//!
//! Given a sky position, a search radius and a `(catalog, band)` pair, a
//! [`Resolver`] queries SDSS, USNO-B1, 2MASS, DENIS, APASS, Gaia or
//! Pan-STARRS and returns `(ra, dec, mag, mag_err)` rows. Each service is
//! reached through a list of redundant mirrors. When a catalog has nothing
//! for the position the resolver falls back along a fixed chain that ends at
//! USNO-B1 or 2MASS.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`coords`] | [`SkyPosition`], sexagesimal parsing and formatting, angular distance |
//! | [`query::request`] | [`CatalogKind`], [`Band`], [`QueryRequest`] validation |
//! | [`query::mirror`] | [`MirrorClient`](query::MirrorClient) ordered failover with per-request timeouts |
//! | [`query::adapters`] | VizieR, SDSS SQL gateway and Pan-STARRS request builders and parsers |
//! | [`query::resolve`] | [`Resolver`] and the fallback transition table |
//! | [`query::row`] | [`CatalogRow`], TSV output, SDSS photometry flags |
//! | [`config`] | [`ResolverConfig`] mirrors, timeouts and thresholds |
//!
//! # Quick Start
//!
//! ```ignore
//! use celestial_refcat::{Band, CatalogKind, QueryRequest, Resolver, SkyPosition};
//!
//! let resolver = Resolver::builder().build()?;
//! let position = SkyPosition::parse("10:00:24", "+02:12:00")?;
//! let request = QueryRequest::new(position, 5.0, CatalogKind::Sdss, Band::new('r')?)?;
//!
//! let resolution = resolver.resolve(&request)?;
//! println!("{} rows from {}", resolution.rows.len(), resolution.catalog);
//! ```
//!
//! # Features
//!
//! - **`cli`** — Enables the `refcat` binary.

pub mod config;
pub mod coords;
pub mod errors;
pub mod query;

pub use config::ResolverConfig;
pub use coords::{angular_distance, Axis, SkyPosition};
pub use errors::{RefCatError, RefCatResult};
pub use query::{
    Band, CatalogKind, CatalogRow, QueryRequest, Resolution, Resolver, ResolverBuilder, ResultSet,
};

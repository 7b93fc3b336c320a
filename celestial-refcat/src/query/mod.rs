//! Query surface: requests, mirror failover, per-service adapters and the
//! fallback chain.
//!
//! - [`request`] — [`CatalogKind`], [`Band`] and validated [`QueryRequest`]s
//! - [`mirror`] — ordered failover across redundant endpoints
//! - [`adapters`] — one [`CatalogAdapter`] per service family
//! - [`resolve`] — the [`Resolver`] and its transition table
//! - [`row`] — normalized [`CatalogRow`]s, TSV output, SDSS flag filter

pub mod adapters;
pub mod mirror;
pub mod request;
pub mod resolve;
pub mod row;

pub use adapters::{CatalogAdapter, Footprint, PanStarrsAdapter, SdssAdapter, VizierAdapter};
pub use mirror::{FetchOutcome, HttpMethod, MirrorClient, MirrorRequest};
pub use request::{Band, CatalogKind, QueryRequest};
pub use resolve::{next_step, Miss, Resolution, Resolver, ResolverBuilder, Step};
pub use row::{brightest, write_tsv, BrightestSource, CatalogRow, ResultSet};

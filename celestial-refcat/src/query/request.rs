//! Catalog identities, photometric bands and validated query requests.
//!
//! Band letters are case-sensitive: Sloan `g`/`i` are different filters from
//! Gaia `G` and Johnson/Cousins `I`. Each [`CatalogKind`] accepts only the
//! letters of its own photometric system:
//!
//! | Catalog | Bands |
//! |---------|-------|
//! | SDSS | `u g r i z` |
//! | USNO | `B R I` |
//! | 2MASS | `J H K` |
//! | DENIS | `I J K` |
//! | APASS | `B V g r i` |
//! | GAIA | `G` |
//! | PANSTARRS | `g r i z y` |

use crate::coords::SkyPosition;
use crate::errors::{RefCatError, RefCatResult};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Sdss,
    Usno,
    TwoMass,
    Denis,
    Apass,
    Gaia,
    PanStarrs,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 7] = [
        CatalogKind::Sdss,
        CatalogKind::Usno,
        CatalogKind::TwoMass,
        CatalogKind::Denis,
        CatalogKind::Apass,
        CatalogKind::Gaia,
        CatalogKind::PanStarrs,
    ];

    /// Band letters this catalog can be queried in.
    pub fn bands(self) -> &'static str {
        match self {
            CatalogKind::Sdss => "ugriz",
            CatalogKind::Usno => "BRI",
            CatalogKind::TwoMass => "JHK",
            CatalogKind::Denis => "IJK",
            CatalogKind::Apass => "BVgri",
            CatalogKind::Gaia => "G",
            CatalogKind::PanStarrs => "grizy",
        }
    }

    pub fn supports(self, band: Band) -> bool {
        self.bands().contains(band.as_char())
    }

    pub fn name(self) -> &'static str {
        match self {
            CatalogKind::Sdss => "SDSS",
            CatalogKind::Usno => "USNO",
            CatalogKind::TwoMass => "2MASS",
            CatalogKind::Denis => "DENIS",
            CatalogKind::Apass => "APASS",
            CatalogKind::Gaia => "GAIA",
            CatalogKind::PanStarrs => "PANSTARRS",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CatalogKind {
    type Err = RefCatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SDSS" => Ok(CatalogKind::Sdss),
            "USNO" | "USNOB1" | "USNO-B1" => Ok(CatalogKind::Usno),
            "2MASS" | "TWOMASS" => Ok(CatalogKind::TwoMass),
            "DENIS" => Ok(CatalogKind::Denis),
            "APASS" => Ok(CatalogKind::Apass),
            "GAIA" => Ok(CatalogKind::Gaia),
            "PS" | "PS1" | "PANSTARRS" | "PAN-STARRS" => Ok(CatalogKind::PanStarrs),
            _ => Err(RefCatError::format_error(format!(
                "unknown catalog '{}' (expected one of SDSS, USNO, 2MASS, DENIS, APASS, GAIA, PS)",
                s
            ))),
        }
    }
}

/// A single photometric filter letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Band(char);

impl Band {
    /// Every letter used by any catalog.
    const KNOWN: &'static str = "ugrizyBVRIJHKG";

    pub fn new(letter: char) -> RefCatResult<Self> {
        if Self::KNOWN.contains(letter) {
            Ok(Band(letter))
        } else {
            Err(RefCatError::format_error(format!(
                "unknown band '{}'",
                letter
            )))
        }
    }

    pub fn as_char(self) -> char {
        self.0
    }

    /// Nearest USNO / 2MASS band used when falling back to the terminal
    /// catalogs. Sloan and Pan-STARRS letters map onto the Johnson/Cousins
    /// system (`g→B, r→R, i→I, z→I, u→B, y→I`), Gaia `G` onto `R`, APASS
    /// `V` onto `R`; everything else is already a USNO or 2MASS band.
    ///
    /// The mapping ignores colour terms between photometric systems.
    pub fn fallback_equivalent(self) -> Band {
        match self.0 {
            'g' | 'u' | 'B' => Band('B'),
            'r' | 'R' | 'G' | 'V' => Band('R'),
            'i' | 'z' | 'y' | 'I' => Band('I'),
            other => Band(other),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Band {
    type Err = RefCatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Band::new(c),
            _ => Err(RefCatError::format_error(format!(
                "band must be a single letter, got '{}'",
                s
            ))),
        }
    }
}

/// A fully validated retrieval request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRequest {
    position: SkyPosition,
    radius_arcmin: f64,
    catalog: CatalogKind,
    band: Band,
}

impl QueryRequest {
    /// # Errors
    /// Returns [`RefCatError::Format`] if the radius is not a positive finite
    /// number or the band is not offered by `catalog`.
    pub fn new(
        position: SkyPosition,
        radius_arcmin: f64,
        catalog: CatalogKind,
        band: Band,
    ) -> RefCatResult<Self> {
        if !radius_arcmin.is_finite() || radius_arcmin <= 0.0 {
            return Err(RefCatError::format_error(format!(
                "radius must be positive, got {} arcmin",
                radius_arcmin
            )));
        }
        if !catalog.supports(band) {
            return Err(RefCatError::format_error(format!(
                "band '{}' is not valid for {}; expected one of {}",
                band,
                catalog,
                catalog.bands()
            )));
        }
        Ok(Self {
            position,
            radius_arcmin,
            catalog,
            band,
        })
    }

    pub fn position(&self) -> &SkyPosition {
        &self.position
    }

    pub fn radius_arcmin(&self) -> f64 {
        self.radius_arcmin
    }

    pub fn catalog(&self) -> CatalogKind {
        self.catalog
    }

    pub fn band(&self) -> Band {
        self.band
    }
}

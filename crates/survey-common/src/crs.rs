//! Coordinate reference system identifiers and resolution.
//!
//! A [`ReferenceSystem`] is the canonical form of whatever identifier a
//! dataset or caller supplies (EPSG code, datum name or WKT). Two systems are
//! equivalent exactly when their canonical forms are equal, which is what the
//! transformer's identity fast path relies on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{SurveyError, SurveyResult};

/// Geodetic datums supported for survey data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datum {
    /// World Geodetic System 1984
    Wgs84,
    /// Geocentric Datum of Australia 1994
    Gda94,
    /// Geocentric Datum of Australia 2020
    Gda2020,
}

impl Datum {
    /// Ellipsoid semi-major axis in metres.
    pub fn semi_major_axis(&self) -> f64 {
        6378137.0
    }

    /// Ellipsoid inverse flattening.
    pub fn inverse_flattening(&self) -> f64 {
        match self {
            Datum::Wgs84 => 298.257223563,
            // GRS 1980
            Datum::Gda94 | Datum::Gda2020 => 298.257222101,
        }
    }

    /// EPSG code of the geographic (lon/lat) system on this datum.
    pub fn geographic_epsg(&self) -> u32 {
        match self {
            Datum::Wgs84 => 4326,
            Datum::Gda94 => 4283,
            Datum::Gda2020 => 7844,
        }
    }

    /// UTM zones with an EPSG definition on this datum, and whether the
    /// datum defines northern-hemisphere zones.
    fn utm_zone_range(&self) -> (std::ops::RangeInclusive<u8>, bool) {
        match self {
            Datum::Wgs84 => (1..=60, true),
            Datum::Gda94 => (48..=58, false),
            Datum::Gda2020 => (46..=59, false),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Datum::Wgs84 => "WGS 84",
            Datum::Gda94 => "GDA94",
            Datum::Gda2020 => "GDA2020",
        }
    }

    fn wkt_datum(&self) -> &'static str {
        match self {
            Datum::Wgs84 => "WGS_1984",
            Datum::Gda94 => "Geocentric_Datum_of_Australia_1994",
            Datum::Gda2020 => "Geocentric_Datum_of_Australia_2020",
        }
    }

    fn wkt_spheroid(&self) -> &'static str {
        match self {
            Datum::Wgs84 => "WGS 84",
            Datum::Gda94 | Datum::Gda2020 => "GRS 1980",
        }
    }

    /// Detect a datum name inside an upper-cased identifier or WKT string.
    fn detect(upper: &str) -> Option<Datum> {
        if upper.contains("GDA2020") || upper.contains("AUSTRALIA_2020") {
            Some(Datum::Gda2020)
        } else if upper.contains("GDA94")
            || upper.contains("GDA_1994")
            || upper.contains("AUSTRALIA_1994")
        {
            Some(Datum::Gda94)
        } else if upper.contains("WGS 84") || upper.contains("WGS84") || upper.contains("WGS_1984")
        {
            Some(Datum::Wgs84)
        } else {
            None
        }
    }
}

/// Canonical coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReferenceSystem {
    /// Longitude/latitude in degrees
    Geographic { datum: Datum },
    /// Universal Transverse Mercator (MGA on the GDA datums), metres
    Utm { datum: Datum, zone: u8, south: bool },
    /// Spherical Web Mercator (EPSG:3857), metres
    WebMercator,
}

impl ReferenceSystem {
    pub const WGS84: ReferenceSystem = ReferenceSystem::Geographic {
        datum: Datum::Wgs84,
    };
    pub const GDA94: ReferenceSystem = ReferenceSystem::Geographic {
        datum: Datum::Gda94,
    };
    pub const GDA2020: ReferenceSystem = ReferenceSystem::Geographic {
        datum: Datum::Gda2020,
    };

    /// Create a validated UTM system.
    pub fn utm(datum: Datum, zone: u8, south: bool) -> SurveyResult<Self> {
        let (zones, has_north) = datum.utm_zone_range();
        if !zones.contains(&zone) || (!south && !has_north) {
            return Err(SurveyError::UnresolvedSystem(format!(
                "{} has no UTM zone {}{}",
                datum.name(),
                zone,
                if south { 'S' } else { 'N' }
            )));
        }
        Ok(ReferenceSystem::Utm { datum, zone, south })
    }

    /// UTM zone containing a geographic location.
    ///
    /// Falls back to WGS 84 UTM when `datum` defines no zone there (for
    /// example GDA94 north of the equator).
    pub fn utm_for_location(lon: f64, lat: f64, datum: Datum) -> Self {
        let lon = ((lon + 180.0).rem_euclid(360.0)) - 180.0;
        let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8;
        let south = lat < 0.0;
        Self::utm(datum, zone, south).unwrap_or(ReferenceSystem::Utm {
            datum: Datum::Wgs84,
            zone,
            south,
        })
    }

    /// Resolve an identifier into a canonical system.
    ///
    /// Accepts `EPSG:n`, a bare EPSG code, `CRS:84`, datum names and WKT
    /// (version 1 `AUTHORITY` or version 2 `ID` tags, or recognisable
    /// datum/zone names when no authority is present).
    pub fn resolve(identifier: &str) -> SurveyResult<Self> {
        let trimmed = identifier.trim();
        let upper = trimmed.to_uppercase();
        let unresolved = || SurveyError::UnresolvedSystem(truncate(trimmed, 80));

        if upper.is_empty() {
            return Err(unresolved());
        }
        if upper == "CRS:84" || upper == "OGC:CRS84" {
            return Ok(Self::WGS84);
        }
        if let Some(code) = upper.strip_prefix("EPSG:") {
            let code = code.trim().parse::<u32>().map_err(|_| unresolved())?;
            return Self::from_epsg(code);
        }
        if let Ok(code) = upper.parse::<u32>() {
            return Self::from_epsg(code);
        }

        let is_wkt = upper.starts_with("GEOGCS")
            || upper.starts_with("PROJCS")
            || upper.starts_with("GEOGCRS")
            || upper.starts_with("PROJCRS")
            || upper.starts_with("GEODCRS");
        if !is_wkt {
            return match upper.as_str() {
                "WGS84" | "WGS 84" => Ok(Self::WGS84),
                "GDA94" => Ok(Self::GDA94),
                "GDA2020" => Ok(Self::GDA2020),
                _ => Err(unresolved()),
            };
        }

        if let Some(code) = top_level_epsg(&upper) {
            return Self::from_epsg(code);
        }

        let datum = Datum::detect(&upper).ok_or_else(unresolved)?;
        if upper.starts_with("PROJ") {
            if upper.contains("MERCATOR_1SP") || upper.contains("PSEUDO-MERCATOR") {
                return Ok(ReferenceSystem::WebMercator);
            }
            let (zone, south) = zone_from_name(&upper).ok_or_else(unresolved)?;
            // MGA zones are always southern
            let south = south || upper.contains("MGA");
            return Self::utm(datum, zone, south);
        }
        Ok(ReferenceSystem::Geographic { datum })
    }

    /// Resolve an EPSG code.
    pub fn from_epsg(code: u32) -> SurveyResult<Self> {
        let utm = |datum, zone: u32, south| {
            u8::try_from(zone)
                .map_err(|_| SurveyError::UnresolvedSystem(format!("EPSG:{}", code)))
                .and_then(|zone| Self::utm(datum, zone, south))
        };
        match code {
            4326 => Ok(Self::WGS84),
            4283 => Ok(Self::GDA94),
            7844 => Ok(Self::GDA2020),
            3857 | 900913 => Ok(ReferenceSystem::WebMercator),
            32601..=32660 => utm(Datum::Wgs84, code - 32600, false),
            32701..=32760 => utm(Datum::Wgs84, code - 32700, true),
            28348..=28358 => utm(Datum::Gda94, code - 28300, true),
            7846..=7859 => utm(Datum::Gda2020, code - 7800, true),
            _ => Err(SurveyError::UnresolvedSystem(format!("EPSG:{}", code))),
        }
    }

    /// Canonical EPSG code.
    pub fn epsg(&self) -> u32 {
        match *self {
            ReferenceSystem::Geographic { datum } => datum.geographic_epsg(),
            ReferenceSystem::WebMercator => 3857,
            ReferenceSystem::Utm { datum, zone, south } => {
                let zone = zone as u32;
                match (datum, south) {
                    (Datum::Wgs84, false) => 32600 + zone,
                    (Datum::Wgs84, true) => 32700 + zone,
                    (Datum::Gda94, _) => 28300 + zone,
                    (Datum::Gda2020, _) => 7800 + zone,
                }
            }
        }
    }

    /// Datum of the system. Web Mercator is defined on WGS 84.
    pub fn datum(&self) -> Datum {
        match *self {
            ReferenceSystem::Geographic { datum } | ReferenceSystem::Utm { datum, .. } => datum,
            ReferenceSystem::WebMercator => Datum::Wgs84,
        }
    }

    /// Whether coordinates are angular (degrees) rather than linear.
    pub fn is_geographic(&self) -> bool {
        matches!(self, ReferenceSystem::Geographic { .. })
    }

    /// Whether two systems share a canonical form.
    pub fn is_equivalent(&self, other: &ReferenceSystem) -> bool {
        self == other
    }

    /// Human-readable name, e.g. "GDA94 / MGA zone 54".
    pub fn name(&self) -> String {
        match *self {
            ReferenceSystem::Geographic { datum } => datum.name().to_string(),
            ReferenceSystem::WebMercator => "WGS 84 / Pseudo-Mercator".to_string(),
            ReferenceSystem::Utm {
                datum: Datum::Wgs84,
                zone,
                south,
            } => format!("WGS 84 / UTM zone {}{}", zone, if south { 'S' } else { 'N' }),
            ReferenceSystem::Utm { datum, zone, .. } => format!("{} / MGA zone {}", datum.name(), zone),
        }
    }

    /// Well-known text (version 1) for this system.
    pub fn to_wkt(&self) -> String {
        let datum = self.datum();
        let geogcs = format!(
            "GEOGCS[\"{}\",DATUM[\"{}\",SPHEROID[\"{}\",{},{}]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433],AUTHORITY[\"EPSG\",\"{}\"]]",
            datum.name(),
            datum.wkt_datum(),
            datum.wkt_spheroid(),
            datum.semi_major_axis(),
            datum.inverse_flattening(),
            datum.geographic_epsg()
        );
        match *self {
            ReferenceSystem::Geographic { .. } => geogcs,
            ReferenceSystem::WebMercator => format!(
                "PROJCS[\"{}\",{},PROJECTION[\"Mercator_1SP\"],PARAMETER[\"central_meridian\",0],PARAMETER[\"scale_factor\",1],PARAMETER[\"false_easting\",0],PARAMETER[\"false_northing\",0],UNIT[\"metre\",1],AUTHORITY[\"EPSG\",\"3857\"]]",
                self.name(),
                geogcs
            ),
            ReferenceSystem::Utm { zone, south, .. } => format!(
                "PROJCS[\"{}\",{},PROJECTION[\"Transverse_Mercator\"],PARAMETER[\"latitude_of_origin\",0],PARAMETER[\"central_meridian\",{}],PARAMETER[\"scale_factor\",0.9996],PARAMETER[\"false_easting\",500000],PARAMETER[\"false_northing\",{}],UNIT[\"metre\",1],AUTHORITY[\"EPSG\",\"{}\"]]",
                self.name(),
                geogcs,
                zone as i32 * 6 - 183,
                if south { 10000000 } else { 0 },
                self.epsg()
            ),
        }
    }
}

impl fmt::Display for ReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for ReferenceSystem {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl TryFrom<String> for ReferenceSystem {
    type Error = SurveyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::resolve(&value)
    }
}

impl From<ReferenceSystem> for String {
    fn from(value: ReferenceSystem) -> Self {
        value.to_string()
    }
}

/// The EPSG code attached to the outermost WKT node.
///
/// In WKT the outermost node's authority is its last element, so the last
/// EPSG tag in the string is the one that identifies the whole system.
fn top_level_epsg(upper: &str) -> Option<u32> {
    let wkt1 = upper.rfind("AUTHORITY[\"EPSG\",").map(|pos| (pos, "AUTHORITY[\"EPSG\",".len()));
    let wkt2 = upper.rfind("ID[\"EPSG\",").map(|pos| (pos, "ID[\"EPSG\",".len()));
    let (pos, len) = match (wkt1, wkt2) {
        (Some(a), Some(b)) => {
            if a.0 > b.0 {
                a
            } else {
                b
            }
        }
        (a, b) => a.or(b)?,
    };
    let digits: String = upper[pos + len..]
        .chars()
        .skip_while(|c| *c == '"' || c.is_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Zone number and hemisphere from names like "MGA ZONE 54" or "UTM ZONE 33N".
fn zone_from_name(upper: &str) -> Option<(u8, bool)> {
    let pos = upper.find("ZONE")?;
    let rest = upper[pos + 4..].trim_start_matches([' ', '_']);
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let zone = digits.parse::<u8>().ok()?;
    let south = rest[digits.len()..].starts_with('S');
    Some((zone, south))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

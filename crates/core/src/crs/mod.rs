//! Coordinate Reference System handling
//!
//! Output layers keep the coordinates of their input. The CRS decides how
//! lengths and areas are measured: geographic coordinates go straight to the
//! ellipsoid, projected ones are first taken back to longitude/latitude
//! through their PROJ definition (see [`CRS::proj_definition`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// EPSG codes of common geographic (lon/lat) systems.
const GEOGRAPHIC_EPSG: &[u32] = &[
    4326, // WGS 84
    4258, // ETRS89
    4269, // NAD83
    4267, // NAD27
    4674, // SIRGAS 2000
    4190, // POSGAR 98
    4170, // SIRGAS
    4248, // PSAD56
    4283, // GDA94
    7844, // GDA2020
];

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326), the GeoJSON default
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Whether coordinates are longitude/latitude in degrees.
    ///
    /// Unknown systems are treated as projected.
    pub fn is_geographic(&self) -> bool {
        if let Some(code) = self.epsg {
            return GEOGRAPHIC_EPSG.contains(&code);
        }
        if let Some(proj) = &self.proj {
            return proj.contains("+proj=longlat") || proj.contains("+proj=latlong");
        }
        if let Some(wkt) = &self.wkt {
            let head = wkt.trim_start().to_ascii_uppercase();
            return head.starts_with("GEOGCS") || head.starts_with("GEOGCRS");
        }
        false
    }

    /// PROJ definition usable for coordinate transformation.
    ///
    /// Explicit PROJ strings are returned as given. EPSG codes are resolved
    /// for WGS 84 (4326), WGS 84 / UTM (326xx north, 327xx south) and Web
    /// Mercator (3857). WKT is not parsed.
    pub fn proj_definition(&self) -> Option<String> {
        if let Some(proj) = &self.proj {
            return Some(proj.clone());
        }
        match self.epsg? {
            4326 => Some("+proj=longlat +datum=WGS84 +no_defs".to_string()),
            code @ 32601..=32660 => Some(format!(
                "+proj=utm +zone={} +datum=WGS84 +units=m +no_defs",
                code - 32600
            )),
            code @ 32701..=32760 => Some(format!(
                "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
                code - 32700
            )),
            3857 => Some(
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }
        false
    }

    /// Get a string identifier for this CRS (`EPSG:xxxx` when known)
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt.char_indices().nth(50).map_or(wkt.len(), |(i, _)| i);
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }

    /// Name suitable for a GeoJSON `crs` member, `urn:ogc:def:crs:EPSG::xxxx`
    pub fn urn(&self) -> Option<String> {
        self.epsg.map(|code| format!("urn:ogc:def:crs:EPSG::{}", code))
    }
}

impl FromStr for CRS {
    type Err = Error;

    /// Parse `EPSG:32719`, `epsg:4326`, `32719`, OGC URNs
    /// (`urn:ogc:def:crs:EPSG::32719`, `urn:ogc:def:crs:OGC:1.3:CRS84`),
    /// PROJ strings (`+proj=...`) or WKT.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidParameter {
                name: "crs",
                value: String::new(),
                reason: "empty CRS definition".into(),
            });
        }
        if s.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }
        if s.starts_with('+') {
            return Ok(Self::from_proj(s));
        }
        let upper = s.to_ascii_uppercase();
        if upper.starts_with("GEOGCS")
            || upper.starts_with("GEOGCRS")
            || upper.starts_with("PROJCS")
            || upper.starts_with("PROJCRS")
        {
            return Ok(Self::from_wkt(s));
        }

        let code = upper
            .rsplit(':')
            .next()
            .unwrap_or(&upper)
            .parse::<u32>()
            .map_err(|_| Error::InvalidParameter {
                name: "crs",
                value: s.to_string(),
                reason: "expected EPSG code, OGC URN, PROJ string or WKT".into(),
            })?;
        Ok(Self::from_epsg(code))
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(32719);
        assert_eq!(crs.epsg(), Some(32719));
        assert_eq!(crs.identifier(), "EPSG:32719");
        assert!(!crs.is_geographic());
    }

    #[test]
    fn test_crs_equivalence() {
        let a = CRS::from_epsg(4326);
        let b = CRS::wgs84();
        assert!(a.is_equivalent(&b));
        assert!(b.is_geographic());
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("EPSG:32718".parse::<CRS>().unwrap().epsg(), Some(32718));
        assert_eq!("epsg:4326".parse::<CRS>().unwrap().epsg(), Some(4326));
        assert_eq!("3857".parse::<CRS>().unwrap().epsg(), Some(3857));
        assert_eq!(
            "urn:ogc:def:crs:EPSG::32719".parse::<CRS>().unwrap().epsg(),
            Some(32719)
        );
        assert_eq!(
            "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<CRS>().unwrap().epsg(),
            Some(4326)
        );
        assert!("not a crs".parse::<CRS>().is_err());
        assert!("".parse::<CRS>().is_err());
    }

    #[test]
    fn test_geographic_detection() {
        assert!(CRS::from_proj("+proj=longlat +datum=WGS84").is_geographic());
        assert!(!CRS::from_proj("+proj=utm +zone=19 +south").is_geographic());
        assert!(CRS::from_wkt("GEOGCS[\"WGS 84\"]").is_geographic());
        assert!(!CRS::from_wkt("PROJCS[\"UTM 19S\"]").is_geographic());
    }

    #[test]
    fn test_proj_definition() {
        assert_eq!(
            CRS::from_epsg(32719).proj_definition().as_deref(),
            Some("+proj=utm +zone=19 +south +datum=WGS84 +units=m +no_defs")
        );
        assert_eq!(
            CRS::from_epsg(32614).proj_definition().as_deref(),
            Some("+proj=utm +zone=14 +datum=WGS84 +units=m +no_defs")
        );
        assert!(CRS::from_epsg(3857).proj_definition().is_some());
        assert_eq!(
            CRS::from_proj("+proj=tmerc +lon_0=-72").proj_definition().as_deref(),
            Some("+proj=tmerc +lon_0=-72")
        );
        assert_eq!(CRS::from_epsg(2193).proj_definition(), None);
        assert_eq!(CRS::from_wkt("PROJCS[\"UTM 19S\"]").proj_definition(), None);
    }

    #[test]
    fn test_urn() {
        assert_eq!(
            CRS::from_epsg(32719).urn().as_deref(),
            Some("urn:ogc:def:crs:EPSG::32719")
        );
        assert_eq!(CRS::from_proj("+proj=utm").urn(), None);
    }
}

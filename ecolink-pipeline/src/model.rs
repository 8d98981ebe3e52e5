//! Core record types for the integration pipeline.
//!
//! Both record kinds are created once per run from raw source rows,
//! mutated only by the normalizer/aggregator/resolver stages in strict
//! sequence, and dropped once the final record set is emitted.

use ecolink_resolve::{ExternalId, ReferenceCategory};
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// Country of an administrative boundary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "CA")]
    Ca,
    #[serde(rename = "MX")]
    Mx,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Ca => "CA",
            Country::Mx => "MX",
        }
    }

    /// Parse the country tag injected during normalization.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "US" => Some(Country::Us),
            "CA" => Some(Country::Ca),
            "MX" => Some(Country::Mx),
            _ => None,
        }
    }

    /// Knowledge-base identifier of the country entity itself.
    pub fn external_id(&self) -> ExternalId {
        match self {
            Country::Us => ExternalId::new("Q30"),
            Country::Ca => ExternalId::new("Q16"),
            Country::Mx => ExternalId::new("Q96"),
        }
    }

    /// Reference category its subdivisions are listed under.
    pub fn reference_category(&self) -> ReferenceCategory {
        match self {
            Country::Us => ReferenceCategory::Us,
            Country::Ca => ReferenceCategory::Ca,
            Country::Mx => ReferenceCategory::Mx,
        }
    }
}

/// The five ecoregion classification levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionLevel {
    #[serde(rename = "NA-L1")]
    NaL1,
    #[serde(rename = "NA-L2")]
    NaL2,
    #[serde(rename = "NA-L3")]
    NaL3,
    #[serde(rename = "US-L3")]
    UsL3,
    #[serde(rename = "US-L4")]
    UsL4,
}

impl RegionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLevel::NaL1 => "NA-L1",
            RegionLevel::NaL2 => "NA-L2",
            RegionLevel::NaL3 => "NA-L3",
            RegionLevel::UsL3 => "US-L3",
            RegionLevel::UsL4 => "US-L4",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NA-L1" => Some(RegionLevel::NaL1),
            "NA-L2" => Some(RegionLevel::NaL2),
            "NA-L3" => Some(RegionLevel::NaL3),
            "US-L3" => Some(RegionLevel::UsL3),
            "US-L4" => Some(RegionLevel::UsL4),
            _ => None,
        }
    }

    /// Column tag carrying this level's native code in the source tables,
    /// and the prefix of its contextual identifiers.
    pub fn code_tag(&self) -> &'static str {
        match self {
            RegionLevel::NaL1 => "NA_L1CODE",
            RegionLevel::NaL2 => "NA_L2CODE",
            RegionLevel::NaL3 => "NA_L3CODE",
            RegionLevel::UsL3 => "US_L3CODE",
            RegionLevel::UsL4 => "US_L4CODE",
        }
    }

    /// Ancestor code tags in hierarchy order (top level first). Ancestors
    /// always sit at strictly lower levels, so the hierarchy is acyclic.
    pub fn ancestor_tags(&self) -> &'static [&'static str] {
        match self {
            RegionLevel::NaL1 => &[],
            RegionLevel::NaL2 => &["NA_L1CODE"],
            RegionLevel::NaL3 => &["NA_L1CODE", "NA_L2CODE"],
            RegionLevel::UsL3 => &["NA_L1CODE", "NA_L2CODE", "NA_L3CODE"],
            RegionLevel::UsL4 => &["NA_L1CODE", "NA_L2CODE", "NA_L3CODE", "US_L3CODE"],
        }
    }

    /// Compose a contextual identifier for a native code at this level.
    pub fn contextual_id(&self, code: &str) -> String {
        format!("{}:{}", self.code_tag(), code)
    }

    /// Only the US levels have pre-existing knowledge-base entities worth
    /// resolving against.
    pub fn resolvable(&self) -> bool {
        matches!(self, RegionLevel::UsL3 | RegionLevel::UsL4)
    }
}

/// One administrative unit (state, province, territory).
#[derive(Debug, Clone)]
pub struct BoundaryRecord {
    pub name: String,
    /// Source-native code (FIPS-style), absent for sources without one.
    pub identifier: Option<String>,
    pub abbreviation: Option<String>,
    pub country: Country,
    pub geometry: Geometry<f64>,
    pub external_id: Option<ExternalId>,
    pub country_external_id: Option<ExternalId>,
}

/// One dissolved ecoregion unit.
#[derive(Debug, Clone)]
pub struct RegionRecord {
    /// Composite key, globally unique across all levels.
    pub contextual_identifier: String,
    /// Title-cased display name.
    pub common_name: String,
    pub source_dataset: RegionLevel,
    /// Serialized `;`-delimited ancestor identifiers; parsed into an
    /// ordered sequence by the result assembler.
    pub part_of: Option<String>,
    /// Centroid (x, y) of the dissolved geometry.
    pub representative_point: (f64, f64),
    pub geometry: Geometry<f64>,
    pub external_id: Option<ExternalId>,
}

/// Title-case a display name: first letter of every word upper, the rest
/// lower. The continental source datasets ship names in all caps.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("GREAT PLAINS"), "Great Plains");
        assert_eq!(title_case("chihuahuan deserts"), "Chihuahuan Deserts");
        assert_eq!(
            title_case("SOUTHERN SEMIARID HIGHLANDS"),
            "Southern Semiarid Highlands"
        );
        assert_eq!(title_case("cross-timbers"), "Cross-Timbers");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_contextual_id() {
        assert_eq!(RegionLevel::NaL1.contextual_id("5"), "NA_L1CODE:5");
        assert_eq!(RegionLevel::UsL4.contextual_id("23a"), "US_L4CODE:23a");
    }

    #[test]
    fn test_ancestors_are_lower_levels_only() {
        let levels = [
            RegionLevel::NaL1,
            RegionLevel::NaL2,
            RegionLevel::NaL3,
            RegionLevel::UsL3,
            RegionLevel::UsL4,
        ];
        for (i, level) in levels.iter().enumerate() {
            for tag in level.ancestor_tags() {
                let ancestor_pos = levels.iter().position(|l| l.code_tag() == *tag).unwrap();
                assert!(ancestor_pos < i, "{} has non-ancestor tag {}", level.as_str(), tag);
            }
        }
    }

    #[test]
    fn test_only_us_levels_resolvable() {
        assert!(RegionLevel::UsL3.resolvable());
        assert!(RegionLevel::UsL4.resolvable());
        assert!(!RegionLevel::NaL1.resolvable());
        assert!(!RegionLevel::NaL2.resolvable());
        assert!(!RegionLevel::NaL3.resolvable());
    }

    #[test]
    fn test_level_parse_roundtrip() {
        for level in [
            RegionLevel::NaL1,
            RegionLevel::NaL2,
            RegionLevel::NaL3,
            RegionLevel::UsL3,
            RegionLevel::UsL4,
        ] {
            assert_eq!(RegionLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(RegionLevel::parse("bogus"), None);
    }
}

//! Texas county reference list used to name counties and match program lists.

use crate::domain::ValidationReport;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TexasCounty {
    #[serde(rename = "CNTY_NM")]
    pub name: String,
    #[serde(rename = "FIPS_ST_CNTY_CD")]
    pub stcntyfips: u32,
}

pub fn normalize_county_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn check_county_count(
    counties: &[TexasCounty],
    expected: usize,
    code: &'static str,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    if counties.len() != expected {
        report.push(
            code,
            format!(
                "expected {} Texas counties, found {}",
                expected,
                counties.len()
            ),
        );
    }
    report
}

pub fn county_names_by_fips(counties: &[TexasCounty]) -> HashMap<u32, String> {
    counties
        .iter()
        .map(|county| (county.stcntyfips, county.name.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TexasCounty, check_county_count, county_names_by_fips, normalize_county_name};

    #[test]
    fn county_list_length_is_checked() {
        let counties = vec![TexasCounty {
            name: " Harris ".to_string(),
            stcntyfips: 48_201,
        }];
        assert!(check_county_count(&counties, 1, "QUANTITY.COUNTY_COUNT").is_clean());
        assert!(
            check_county_count(&counties, 254, "QUANTITY.COUNTY_COUNT")
                .has_code("QUANTITY.COUNTY_COUNT")
        );
        assert_eq!(
            county_names_by_fips(&counties).get(&48_201).map(String::as_str),
            Some("Harris")
        );
        assert_eq!(normalize_county_name("  El Paso "), "el paso");
    }
}

use crate::domain::CarrierClass;
use serde::Deserialize;
use std::collections::BTreeSet;

/// One row of the rail-link table. Up to three owners and nine trackage-rights
/// holders may operate on a link.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawRailLink {
    pub fraarcid: i64,
    pub stateab: String,
    pub stcntyfips: u32,
    pub net: String,
    pub miles: f64,
    #[serde(default)]
    pub yardname: Option<String>,
    #[serde(default)]
    pub rrowner1: Option<String>,
    #[serde(default)]
    pub rrowner2: Option<String>,
    #[serde(default)]
    pub rrowner3: Option<String>,
    #[serde(default)]
    pub trkrghts1: Option<String>,
    #[serde(default)]
    pub trkrghts2: Option<String>,
    #[serde(default)]
    pub trkrghts3: Option<String>,
    #[serde(default)]
    pub trkrghts4: Option<String>,
    #[serde(default)]
    pub trkrghts5: Option<String>,
    #[serde(default)]
    pub trkrghts6: Option<String>,
    #[serde(default)]
    pub trkrghts7: Option<String>,
    #[serde(default)]
    pub trkrghts8: Option<String>,
    #[serde(default)]
    pub trkrghts9: Option<String>,
}

impl RawRailLink {
    /// Distinct operator marks across owner and trackage-rights columns, with
    /// aliases already mapped to their canonical mark.
    pub fn operators(&self) -> BTreeSet<String> {
        [
            &self.rrowner1,
            &self.rrowner2,
            &self.rrowner3,
            &self.trkrghts1,
            &self.trkrghts2,
            &self.trkrghts3,
            &self.trkrghts4,
            &self.trkrghts5,
            &self.trkrghts6,
            &self.trkrghts7,
            &self.trkrghts8,
            &self.trkrghts9,
        ]
        .into_iter()
        .filter_map(|operator| non_blank(operator.as_deref()))
        .map(|operator| normalize_carrier(&operator))
        .collect()
    }

    pub fn recorded_yard_name(&self) -> Option<String> {
        non_blank(self.yardname.as_deref())
    }
}

pub fn normalize_carrier(operator: &str) -> String {
    match operator {
        "TRE" => "TREX".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct YardNameFill {
    pub fraarcid: i64,
    pub net: String,
    #[serde(default)]
    pub yardname_filled: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CarrierGroupRow {
    pub carrier: String,
    pub rr_group: CarrierClass,
}

pub(super) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

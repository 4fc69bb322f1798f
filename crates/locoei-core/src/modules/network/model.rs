use super::parser::{CarrierGroupRow, RawRailLink, YardNameFill, non_blank};
use crate::common::constants::{
    AMTRAK_CARRIER, DART_CARRIER, DART_SERVICE_COUNTY_FIPS, NO_SERVICE_OPERATOR,
};
use crate::domain::{CarrierClass, FuelCategory, NetworkGroup, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A rail link as operated by one carrier.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkLink {
    pub fraarcid: i64,
    pub stcntyfips: u32,
    pub net: String,
    pub network_group: NetworkGroup,
    pub fuel_category: FuelCategory,
    pub miles: f64,
    pub carrier: String,
    pub rr_group: Option<CarrierClass>,
    pub yardname: Option<String>,
}

/// DART is inventoried only in Denton County and Amtrak only on freight main
/// lines; every other carrier operates wherever the link table says it does.
pub fn passes_jurisdiction(carrier: &str, stcntyfips: u32, group: NetworkGroup) -> bool {
    match carrier {
        DART_CARRIER => stcntyfips == DART_SERVICE_COUNTY_FIPS,
        AMTRAK_CARRIER => group == NetworkGroup::Freight,
        _ => true,
    }
}

pub fn build_network_links(
    raw_links: &[RawRailLink],
    fills: &[YardNameFill],
    carrier_groups: &[CarrierGroupRow],
    state_filter: &[String],
) -> (Vec<NetworkLink>, ValidationReport) {
    let yard_fills: HashMap<(i64, &str), String> = fills
        .iter()
        .filter_map(|fill| {
            non_blank(fill.yardname_filled.as_deref())
                .map(|name| ((fill.fraarcid, fill.net.trim()), name))
        })
        .collect();
    let carrier_classes: HashMap<&str, CarrierClass> = carrier_groups
        .iter()
        .map(|row| (row.carrier.trim(), row.rr_group))
        .collect();

    let mut report = ValidationReport::new();
    let mut links = Vec::new();
    let mut seen = HashSet::new();
    let mut unknown_carriers: BTreeMap<String, usize> = BTreeMap::new();
    let mut unnamed_yard_links = BTreeSet::new();
    let mut dropped_by_group = 0_usize;

    for raw in raw_links {
        if !state_filter
            .iter()
            .any(|state| state.eq_ignore_ascii_case(raw.stateab.trim()))
        {
            continue;
        }

        let net = raw.net.trim();
        let Some((group, fuel_category)) = NetworkGroup::from_code(net)
            .and_then(|group| group.fuel_category().map(|category| (group, category)))
        else {
            dropped_by_group += 1;
            continue;
        };

        let yardname = yard_fills
            .get(&(raw.fraarcid, net))
            .cloned()
            .or_else(|| raw.recorded_yard_name());
        if group == NetworkGroup::Yard && yardname.is_none() {
            unnamed_yard_links.insert(raw.fraarcid);
        }

        for carrier in raw.operators() {
            if carrier == NO_SERVICE_OPERATOR {
                continue;
            }
            if !passes_jurisdiction(&carrier, raw.stcntyfips, group) {
                continue;
            }
            if !seen.insert((raw.fraarcid, carrier.clone())) {
                report.push(
                    "NETWORK.DUPLICATE_LINK_CARRIER",
                    format!("link {} lists carrier {} more than once", raw.fraarcid, carrier),
                );
                continue;
            }

            let rr_group = carrier_classes.get(carrier.as_str()).copied();
            if rr_group.is_none() {
                *unknown_carriers.entry(carrier.clone()).or_default() += 1;
            }

            links.push(NetworkLink {
                fraarcid: raw.fraarcid,
                stcntyfips: raw.stcntyfips,
                net: net.to_string(),
                network_group: group,
                fuel_category,
                miles: raw.miles,
                carrier,
                rr_group,
                yardname: yardname.clone(),
            });
        }
    }

    for (carrier, rows) in unknown_carriers {
        report.push(
            "NETWORK.UNKNOWN_CARRIER",
            format!("carrier {carrier} on {rows} link(s) has no rail group"),
        );
    }
    if !unnamed_yard_links.is_empty() {
        report.push(
            "NETWORK.MISSING_YARD_NAME",
            format!(
                "{} yard link(s) have no yard name after imputation: {:?}",
                unnamed_yard_links.len(),
                unnamed_yard_links
            ),
        );
    }
    debug!(
        dropped_by_group,
        kept = links.len(),
        "dropped transit, other and unknown network codes"
    );

    (links, report)
}

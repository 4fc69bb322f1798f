use super::parser::{CountyPctRow, ProjectionFactorRow, StatewideFuelRow};
use crate::domain::{
    CarrierClass, FuelCategory, ProjectionSeries, SourceCategory, ValidationReport,
};
use crate::modules::network::NetworkLink;
use crate::numerics::{NumericTolerance, compare_with_tolerance, is_close, kahan_sum};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct StatewideFuel {
    pub carrier: String,
    pub fuel_category: FuelCategory,
    pub gallons: f64,
}

pub fn statewide_fuel_long(rows: &[StatewideFuelRow]) -> Vec<StatewideFuel> {
    rows.iter()
        .flat_map(|row| {
            [
                (FuelCategory::LineHaul, row.line_haul),
                (FuelCategory::IndustrialYard, row.yard),
            ]
            .into_iter()
            .filter_map(|(fuel_category, gallons)| {
                gallons.map(|gallons| StatewideFuel {
                    carrier: row.carrier.clone(),
                    fuel_category,
                    gallons,
                })
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationMethod {
    CountyPercentage,
    MileMix,
}

/// Grouping whose link shares must sum to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MileMixKey {
    County {
        stcntyfips: u32,
        fuel_category: FuelCategory,
    },
    Carrier {
        carrier: String,
        fuel_category: FuelCategory,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkFuel {
    pub fraarcid: i64,
    pub stcntyfips: u32,
    pub carrier: String,
    pub rr_group: CarrierClass,
    pub fuel_category: FuelCategory,
    pub miles: f64,
    pub milemx: f64,
    pub method: AllocationMethod,
    pub link_fuel: f64,
}

impl LinkFuel {
    pub fn milemix_key(&self) -> MileMixKey {
        match self.method {
            AllocationMethod::CountyPercentage => MileMixKey::County {
                stcntyfips: self.stcntyfips,
                fuel_category: self.fuel_category,
            },
            AllocationMethod::MileMix => MileMixKey::Carrier {
                carrier: self.carrier.clone(),
                fuel_category: self.fuel_category,
            },
        }
    }
}

fn is_large(large_carriers: &[String], carrier: &str) -> bool {
    large_carriers.iter().any(|large| large == carrier)
}

pub fn statewide_large_carrier_freight(
    statewide: &[StatewideFuel],
    large_carriers: &[String],
) -> f64 {
    kahan_sum(
        statewide
            .iter()
            .filter(|fuel| {
                fuel.fuel_category == FuelCategory::LineHaul
                    && is_large(large_carriers, &fuel.carrier)
            })
            .map(|fuel| fuel.gallons),
    )
}

fn push_set<T: std::fmt::Debug>(
    report: &mut ValidationReport,
    code: &'static str,
    what: &str,
    items: &BTreeSet<T>,
) {
    if !items.is_empty() {
        report.push(code, format!("{} {}: {:?}", items.len(), what, items));
    }
}

/// Large carriers' freight fuel: the combined statewide total is split over
/// counties by the percentage table, then over each county's large-carrier
/// freight links by mileage.
pub fn allocate_large_carrier_freight(
    links: &[NetworkLink],
    statewide: &[StatewideFuel],
    county_pct: &[CountyPctRow],
    large_carriers: &[String],
) -> (Vec<LinkFuel>, ValidationReport) {
    let statewide_total = statewide_large_carrier_freight(statewide, large_carriers);
    let carriers_with_fuel: BTreeSet<&str> = statewide
        .iter()
        .filter(|fuel| fuel.fuel_category == FuelCategory::LineHaul)
        .map(|fuel| fuel.carrier.as_str())
        .collect();
    let percentages: HashMap<u32, f64> = county_pct
        .iter()
        .map(|row| (row.stcntyfips, row.county_pct))
        .collect();

    let candidates: Vec<&NetworkLink> = links
        .iter()
        .filter(|link| {
            link.fuel_category == FuelCategory::LineHaul
                && is_large(large_carriers, &link.carrier)
        })
        .collect();
    let mut county_miles: BTreeMap<u32, f64> = BTreeMap::new();
    for link in &candidates {
        *county_miles.entry(link.stcntyfips).or_default() += link.miles;
    }

    let mut report = ValidationReport::new();
    let mut missing_pct = BTreeSet::new();
    let mut missing_fuel = BTreeSet::new();
    let mut unclassified = BTreeSet::new();
    let mut zero_mileage = BTreeSet::new();
    let mut allocated = Vec::with_capacity(candidates.len());

    for link in candidates {
        if !carriers_with_fuel.contains(link.carrier.as_str()) {
            missing_fuel.insert(link.carrier.clone());
            continue;
        }
        let Some(rr_group) = link.rr_group else {
            unclassified.insert(link.carrier.clone());
            continue;
        };
        let Some(&pct) = percentages.get(&link.stcntyfips) else {
            missing_pct.insert(link.stcntyfips);
            continue;
        };
        let total_miles = county_miles
            .get(&link.stcntyfips)
            .copied()
            .unwrap_or_default();
        if total_miles <= 0.0 {
            zero_mileage.insert(link.stcntyfips);
            continue;
        }

        let milemx = link.miles / total_miles;
        allocated.push(LinkFuel {
            fraarcid: link.fraarcid,
            stcntyfips: link.stcntyfips,
            carrier: link.carrier.clone(),
            rr_group,
            fuel_category: link.fuel_category,
            miles: link.miles,
            milemx,
            method: AllocationMethod::CountyPercentage,
            link_fuel: milemx * statewide_total * pct,
        });
    }

    push_set(
        &mut report,
        "FUEL.MISSING_COUNTY_PCT",
        "county(ies) with large-carrier freight links are absent from the percentage table",
        &missing_pct,
    );
    push_set(
        &mut report,
        "FUEL.MISSING_STATEWIDE_FUEL",
        "large carrier(s) have freight links but no statewide line-haul fuel",
        &missing_fuel,
    );
    push_set(
        &mut report,
        "FUEL.UNCLASSIFIED_CARRIER",
        "carrier(s) have no rail group",
        &unclassified,
    );
    push_set(
        &mut report,
        "FUEL.ZERO_MILEAGE_GROUP",
        "county group(s) have zero large-carrier freight miles",
        &zero_mileage,
    );

    (allocated, report)
}

/// Every other (carrier, fuel category): statewide fuel split by each link's
/// share of that carrier's network miles in the category.
pub fn allocate_by_mile_mix(
    links: &[NetworkLink],
    statewide: &[StatewideFuel],
    large_carriers: &[String],
) -> (Vec<LinkFuel>, ValidationReport) {
    let fuel_by_carrier: HashMap<(&str, FuelCategory), f64> = statewide
        .iter()
        .map(|fuel| ((fuel.carrier.as_str(), fuel.fuel_category), fuel.gallons))
        .collect();

    let mut dropped_without_fuel = 0_usize;
    let candidates: Vec<(&NetworkLink, f64)> = links
        .iter()
        .filter(|link| {
            link.fuel_category == FuelCategory::IndustrialYard
                || !is_large(large_carriers, &link.carrier)
        })
        .filter_map(|link| {
            let gallons = fuel_by_carrier
                .get(&(link.carrier.as_str(), link.fuel_category))
                .copied();
            if gallons.is_none() {
                dropped_without_fuel += 1;
            }
            gallons.map(|gallons| (link, gallons))
        })
        .collect();

    let mut group_miles: HashMap<(&str, FuelCategory), f64> = HashMap::new();
    for (link, _) in &candidates {
        *group_miles
            .entry((link.carrier.as_str(), link.fuel_category))
            .or_default() += link.miles;
    }

    let mut report = ValidationReport::new();
    let mut unclassified = BTreeSet::new();
    let mut zero_mileage = BTreeSet::new();
    let mut allocated = Vec::with_capacity(candidates.len());

    for (link, gallons) in candidates {
        let Some(rr_group) = link.rr_group else {
            unclassified.insert(link.carrier.clone());
            continue;
        };
        let total_miles = group_miles
            .get(&(link.carrier.as_str(), link.fuel_category))
            .copied()
            .unwrap_or_default();
        if total_miles <= 0.0 {
            zero_mileage.insert(format!("{}/{}", link.carrier, link.fuel_category));
            continue;
        }

        let milemx = link.miles / total_miles;
        allocated.push(LinkFuel {
            fraarcid: link.fraarcid,
            stcntyfips: link.stcntyfips,
            carrier: link.carrier.clone(),
            rr_group,
            fuel_category: link.fuel_category,
            miles: link.miles,
            milemx,
            method: AllocationMethod::MileMix,
            link_fuel: milemx * gallons,
        });
    }

    push_set(
        &mut report,
        "FUEL.UNCLASSIFIED_CARRIER",
        "carrier(s) have no rail group",
        &unclassified,
    );
    push_set(
        &mut report,
        "FUEL.ZERO_MILEAGE_GROUP",
        "carrier group(s) have zero network miles",
        &zero_mileage,
    );
    debug!(
        dropped_without_fuel,
        "links whose carrier and category have no statewide fuel"
    );

    (allocated, report)
}

pub fn check_milemix_sums(link_fuel: &[LinkFuel]) -> ValidationReport {
    let mut shares: BTreeMap<MileMixKey, Vec<f64>> = BTreeMap::new();
    for link in link_fuel {
        shares.entry(link.milemix_key()).or_default().push(link.milemx);
    }

    let mut report = ValidationReport::new();
    for (key, values) in shares {
        let total = kahan_sum(values);
        let comparison = compare_with_tolerance(1.0, total, NumericTolerance::SHARE_SUM);
        if !comparison.passes {
            report.push(
                "FUEL.MILEMIX_SUM",
                format!("mile-mix shares for {:?} sum to {}", key, total),
            );
        }
    }
    report
}

/// Recomputes each county's share of the combined large-carrier freight fuel
/// from the allocated links and compares it with the percentage table.
pub fn check_county_percentages(
    link_fuel: &[LinkFuel],
    statewide: &[StatewideFuel],
    county_pct: &[CountyPctRow],
    large_carriers: &[String],
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let statewide_total = statewide_large_carrier_freight(statewide, large_carriers);
    if statewide_total <= 0.0 {
        return report;
    }

    let mut county_fuel: BTreeMap<u32, f64> = BTreeMap::new();
    for link in link_fuel
        .iter()
        .filter(|link| link.method == AllocationMethod::CountyPercentage)
    {
        *county_fuel.entry(link.stcntyfips).or_default() += link.link_fuel;
    }

    let percentages: HashMap<u32, f64> = county_pct
        .iter()
        .map(|row| (row.stcntyfips, row.county_pct))
        .collect();
    for (county, fuel) in county_fuel {
        let recomputed = fuel / statewide_total;
        let Some(&expected) = percentages.get(&county) else {
            continue;
        };
        if !is_close(expected, recomputed, NumericTolerance::ALLCLOSE) {
            report.push(
                "FUEL.COUNTY_PCT_MISMATCH",
                format!(
                    "county {} receives {:.8} of large-carrier freight fuel, table says {:.8}",
                    county, recomputed, expected
                ),
            );
        }
    }
    report
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelDiscrepancy {
    pub carrier: String,
    pub fuel_category: FuelCategory,
    pub statewide_gallons: f64,
    pub allocated_gallons: f64,
}

/// (carrier, category) pairs whose allocated fuel differs from the statewide
/// survey. Percentage-table counties without network miles are the usual cause.
pub fn statewide_discrepancies(
    link_fuel: &[LinkFuel],
    statewide: &[StatewideFuel],
) -> Vec<FuelDiscrepancy> {
    let mut allocated: HashMap<(&str, FuelCategory), f64> = HashMap::new();
    for link in link_fuel {
        *allocated
            .entry((link.carrier.as_str(), link.fuel_category))
            .or_default() += link.link_fuel;
    }

    statewide
        .iter()
        .filter_map(|fuel| {
            let allocated_gallons = allocated
                .get(&(fuel.carrier.as_str(), fuel.fuel_category))
                .copied()
                .unwrap_or_default();
            (!is_close(fuel.gallons, allocated_gallons, NumericTolerance::ALLCLOSE)).then(|| {
                FuelDiscrepancy {
                    carrier: fuel.carrier.clone(),
                    fuel_category: fuel.fuel_category,
                    statewide_gallons: fuel.gallons,
                    allocated_gallons,
                }
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FuelAllocationRecord {
    pub year: i32,
    pub stcntyfips: u32,
    pub carrier: String,
    pub rr_group: CarrierClass,
    pub fuel_category: FuelCategory,
    pub source_category: SourceCategory,
    pub scc: u64,
    pub fuel_gallons: f64,
}

/// Scales base-year link fuel by the projection factor of each analysis year
/// and aggregates to (year, county, carrier, rail group, category, source).
pub fn project_link_fuel(
    link_fuel: &[LinkFuel],
    projection: &[ProjectionFactorRow],
    years: RangeInclusive<i32>,
) -> (Vec<FuelAllocationRecord>, ValidationReport) {
    let factors: BTreeMap<i32, &ProjectionFactorRow> =
        projection.iter().map(|row| (row.year, row)).collect();

    let mut report = ValidationReport::new();
    let missing_years: BTreeSet<i32> = years
        .clone()
        .filter(|year| !factors.contains_key(year))
        .collect();
    push_set(
        &mut report,
        "FUEL.MISSING_PROJECTION",
        "analysis year(s) have no projection factors",
        &missing_years,
    );

    let mut outside_crosswalk = 0_usize;
    let categorized: Vec<(&LinkFuel, SourceCategory)> = link_fuel
        .iter()
        .filter_map(|link| {
            let category = SourceCategory::from_crosswalk(link.rr_group, link.fuel_category);
            if category.is_none() {
                outside_crosswalk += 1;
            }
            category.map(|category| (link, category))
        })
        .collect();
    if outside_crosswalk > 0 {
        warn!(
            outside_crosswalk,
            "dropped link fuel with no source-category crosswalk"
        );
    }

    type AllocationKey<'a> = (i32, u32, &'a str, CarrierClass, FuelCategory, SourceCategory);
    let mut totals: BTreeMap<AllocationKey<'_>, f64> = BTreeMap::new();
    for year in years {
        let Some(factor_row) = factors.get(&year) else {
            continue;
        };
        for (link, category) in &categorized {
            let factor = match link.rr_group.projection_series() {
                ProjectionSeries::Freight => factor_row.freight,
                ProjectionSeries::Passenger => factor_row.passenger,
            };
            let key = (
                year,
                link.stcntyfips,
                link.carrier.as_str(),
                link.rr_group,
                link.fuel_category,
                *category,
            );
            *totals.entry(key).or_default() += link.link_fuel * factor;
        }
    }

    let records = totals
        .into_iter()
        .map(
            |((year, stcntyfips, carrier, rr_group, fuel_category, source_category), gallons)| {
                FuelAllocationRecord {
                    year,
                    stcntyfips,
                    carrier: carrier.to_string(),
                    rr_group,
                    fuel_category,
                    source_category,
                    scc: source_category.scc(),
                    fuel_gallons: gallons,
                }
            },
        )
        .collect();

    (records, report)
}

use super::parser::{DeriBenefitRow, DeriRegions};
use crate::common::constants::{GRAMS_PER_US_TON, NOX};
use crate::domain::{PollutantType, SourceCategory, ValidationReport};
use crate::modules::counties::{TexasCounty, normalize_county_name};
use crate::modules::quantity::EmissionQuantity;
use crate::numerics::round_to_decimals;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;

/// Normalized TxLED county names that match the Texas county list.
pub fn txled_counties(
    cells: &[String],
    texas: &[TexasCounty],
    expected: usize,
) -> (BTreeSet<String>, ValidationReport) {
    let listed: Vec<String> = cells
        .iter()
        .map(|cell| normalize_county_name(cell))
        .filter(|name| !name.is_empty())
        .collect();
    let texas_names: BTreeSet<String> = texas
        .iter()
        .map(|county| normalize_county_name(&county.name))
        .collect();

    let mut report = ValidationReport::new();
    if listed.len() != expected {
        report.push(
            "CONTROL.TXLED_COUNT",
            format!(
                "expected {} TxLED counties, found {}",
                expected,
                listed.len()
            ),
        );
    }

    let (matched, unmatched): (BTreeSet<String>, BTreeSet<String>) = listed
        .into_iter()
        .partition(|name| texas_names.contains(name));
    if !unmatched.is_empty() {
        report.push(
            "CONTROL.TXLED_UNMATCHED",
            format!(
                "{} TxLED county name(s) match no Texas county: {:?}",
                unmatched.len(),
                unmatched
            ),
        );
    }
    (matched, report)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControlledQuantity {
    pub year: i32,
    pub stcntyfips: u32,
    pub county_name: String,
    pub source_category: SourceCategory,
    pub scc: u64,
    pub yardname: Option<String>,
    pub eis_facility_id: Option<String>,
    pub pollutant: String,
    pub pol_type: PollutantType,
    pub pol_desc: String,
    pub em_fac: f64,
    pub fuel_gallons: f64,
    pub em_quant: f64,
    pub txled_fac: f64,
    pub controlled_em_quant: f64,
    pub controlled_em_quant_ton: f64,
}

pub fn txled_factor(quantity: &EmissionQuantity, counties: &BTreeSet<String>, pct: f64) -> f64 {
    let listed = counties.contains(&normalize_county_name(&quantity.county_name));
    if quantity.pollutant == NOX && listed {
        1.0 - pct / 100.0
    } else {
        1.0
    }
}

/// TxLED-controlled masses. With `enabled` false every factor is 1.
pub fn apply_txled(
    quantities: &[EmissionQuantity],
    counties: &BTreeSet<String>,
    reduction_pct: f64,
    enabled: bool,
) -> Vec<ControlledQuantity> {
    quantities
        .iter()
        .map(|quantity| {
            let txled_fac = if enabled {
                txled_factor(quantity, counties, reduction_pct)
            } else {
                1.0
            };
            let controlled_em_quant = quantity.em_quant * txled_fac;
            ControlledQuantity {
                year: quantity.year,
                stcntyfips: quantity.stcntyfips,
                county_name: quantity.county_name.clone(),
                source_category: quantity.source_category,
                scc: quantity.scc,
                yardname: quantity.yardname.clone(),
                eis_facility_id: quantity.eis_facility_id.clone(),
                pollutant: quantity.pollutant.clone(),
                pol_type: quantity.pol_type,
                pol_desc: quantity.pol_desc.clone(),
                em_fac: quantity.em_fac,
                fuel_gallons: quantity.fuel_gallons,
                em_quant: quantity.em_quant,
                txled_fac,
                controlled_em_quant,
                controlled_em_quant_ton: controlled_em_quant / GRAMS_PER_US_TON,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionalCredit {
    pub region: String,
    pub year: i32,
    pub nox_tons: f64,
}

/// Annualized DERI credits summed by (region, year) inside `years`.
pub fn regional_deri_credits(
    benefits: &[DeriBenefitRow],
    area_regions: &BTreeMap<String, String>,
    years: RangeInclusive<i32>,
) -> (Vec<RegionalCredit>, ValidationReport) {
    let mut report = ValidationReport::new();
    let mut unknown_areas = BTreeSet::new();
    let mut totals: BTreeMap<(String, i32), f64> = BTreeMap::new();

    for benefit in benefits {
        let Some(region) = area_regions.get(benefit.area.trim()) else {
            unknown_areas.insert(benefit.area.trim().to_string());
            continue;
        };
        if benefit.activity_life <= 0.0 {
            report.push(
                "CONTROL.DERI_ACTIVITY_LIFE",
                format!(
                    "{} grant starting {} has activity life {}",
                    benefit.area, benefit.year, benefit.activity_life
                ),
            );
            continue;
        }

        let annual = benefit.total_nox_reduction_tons / benefit.activity_life;
        for year in benefit.year..benefit.benefits_expiry_year {
            if years.contains(&year) {
                *totals.entry((region.clone(), year)).or_default() += annual;
            }
        }
    }

    if !unknown_areas.is_empty() {
        report.push(
            "CONTROL.DERI_UNKNOWN_AREA",
            format!(
                "{} DERI area(s) map to no region: {:?}",
                unknown_areas.len(),
                unknown_areas
            ),
        );
    }

    let credits = totals
        .into_iter()
        .map(|((region, year), nox_tons)| RegionalCredit {
            region,
            year,
            nox_tons,
        })
        .collect();
    (credits, report)
}

/// Compares a credit total with the published literature total at four decimals.
pub fn check_deri_total(total: f64, expected: f64, what: &str) -> ValidationReport {
    let mut report = ValidationReport::new();
    if round_to_decimals(total, 4) != round_to_decimals(expected, 4) {
        report.push(
            "CONTROL.DERI_TOTAL",
            format!(
                "{what} DERI credit {total:.4} tons differs from literature total {expected:.4}"
            ),
        );
    }
    report
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UncontrolledQuantity {
    pub year: i32,
    pub stcntyfips: u32,
    pub county_name: String,
    pub source_category: SourceCategory,
    pub scc: u64,
    pub yardname: Option<String>,
    pub eis_facility_id: Option<String>,
    pub pollutant: String,
    pub pol_type: PollutantType,
    pub pol_desc: String,
    pub em_fac: f64,
    pub fuel_gallons: f64,
    pub em_quant: f64,
    pub region: Option<String>,
    pub em_quant_ton: f64,
    pub deri_credit_ton: f64,
    pub uncontrolled_em_quant_ton: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeriYardCredit {
    pub year: i32,
    pub region: String,
    pub stcntyfips: u32,
    pub county_name: String,
    pub yardname: Option<String>,
    pub eis_facility_id: Option<String>,
    pub region_credit_ton: f64,
    pub region_yard_pairs: usize,
    pub yard_credit_ton: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeriApplication {
    pub uncontrolled: Vec<UncontrolledQuantity>,
    pub yard_credits: Vec<DeriYardCredit>,
    pub applied_tons: f64,
}

fn region_for<'r>(
    county_regions: &HashMap<String, &'r str>,
    quantity: &EmissionQuantity,
) -> Option<&'r str> {
    county_regions
        .get(&normalize_county_name(&quantity.county_name))
        .copied()
}

fn is_deri_target(quantity: &EmissionQuantity) -> bool {
    quantity.source_category == SourceCategory::Yard && quantity.pollutant == NOX
}

/// Adds regional DERI credits back onto yard NOX tons. Each (region, year)
/// credit is split evenly over the distinct (county, yard) pairs carrying yard
/// NOX records in that region and year.
pub fn apply_deri(
    quantities: &[EmissionQuantity],
    credits: &[RegionalCredit],
    regions: &DeriRegions,
    enabled: bool,
) -> (DeriApplication, ValidationReport) {
    let mut report = ValidationReport::new();
    let mut county_regions: HashMap<String, &str> = HashMap::new();
    for (region, definition) in regions {
        for county in &definition.counties {
            let county = normalize_county_name(county);
            if let Some(previous) = county_regions.insert(county.clone(), region.as_str()) {
                report.push(
                    "CONTROL.DERI_REGION_OVERLAP",
                    format!("county {county} is listed in both {previous} and {region}"),
                );
            }
        }
    }
    let credit_by_region_year: HashMap<(&str, i32), f64> = credits
        .iter()
        .map(|credit| ((credit.region.as_str(), credit.year), credit.nox_tons))
        .collect();

    let mut pairs: BTreeMap<(&str, i32), BTreeSet<(String, Option<String>)>> = BTreeMap::new();
    if enabled {
        for quantity in quantities.iter().filter(|quantity| is_deri_target(quantity)) {
            if let Some(region) = region_for(&county_regions, quantity) {
                if credit_by_region_year.contains_key(&(region, quantity.year)) {
                    pairs.entry((region, quantity.year)).or_default().insert((
                        normalize_county_name(&quantity.county_name),
                        quantity.yardname.clone(),
                    ));
                }
            }
        }
    }

    let mut application = DeriApplication::default();
    for quantity in quantities {
        let region = region_for(&county_regions, quantity);
        let em_quant_ton = quantity.em_quant / GRAMS_PER_US_TON;
        let mut deri_credit_ton = 0.0;

        if let Some(region) = region.filter(|_| enabled && is_deri_target(quantity)) {
            let key = (region, quantity.year);
            if let (Some(&region_credit_ton), Some(yard_pairs)) =
                (credit_by_region_year.get(&key), pairs.get(&key))
            {
                deri_credit_ton = region_credit_ton / yard_pairs.len() as f64;
                application.yard_credits.push(DeriYardCredit {
                    year: quantity.year,
                    region: region.to_string(),
                    stcntyfips: quantity.stcntyfips,
                    county_name: quantity.county_name.clone(),
                    yardname: quantity.yardname.clone(),
                    eis_facility_id: quantity.eis_facility_id.clone(),
                    region_credit_ton,
                    region_yard_pairs: yard_pairs.len(),
                    yard_credit_ton: deri_credit_ton,
                });
            }
        }
        application.applied_tons += deri_credit_ton;

        application.uncontrolled.push(UncontrolledQuantity {
            year: quantity.year,
            stcntyfips: quantity.stcntyfips,
            county_name: quantity.county_name.clone(),
            source_category: quantity.source_category,
            scc: quantity.scc,
            yardname: quantity.yardname.clone(),
            eis_facility_id: quantity.eis_facility_id.clone(),
            pollutant: quantity.pollutant.clone(),
            pol_type: quantity.pol_type,
            pol_desc: quantity.pol_desc.clone(),
            em_fac: quantity.em_fac,
            fuel_gallons: quantity.fuel_gallons,
            em_quant: quantity.em_quant,
            region: region.map(str::to_string),
            em_quant_ton,
            deri_credit_ton,
            uncontrolled_em_quant_ton: em_quant_ton + deri_credit_ton,
        });
    }

    if enabled {
        let unapplied: Vec<String> = credits
            .iter()
            .filter(|credit| !pairs.contains_key(&(credit.region.as_str(), credit.year)))
            .map(|credit| format!("{}/{}", credit.region, credit.year))
            .collect();
        if !unapplied.is_empty() {
            report.push(
                "CONTROL.DERI_UNAPPLIED",
                format!(
                    "{} regional credit(s) have no yard NOX records: {:?}",
                    unapplied.len(),
                    unapplied
                ),
            );
        }
    }

    (application, report)
}

use super::parser::ReferenceYard;
use crate::domain::{PollutantType, SourceCategory, ValidationReport};
use crate::modules::counties::{TexasCounty, county_names_by_fips};
use crate::modules::fuel::FuelAllocationRecord;
use crate::modules::rates::EmissionFactor;
use crate::numerics::{NumericTolerance, RunningMean, is_close};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountyEmissionKey {
    pub year: i32,
    pub stcntyfips: u32,
    pub source_category: SourceCategory,
    pub pollutant: String,
}

/// Carrier detail collapsed to one county row per source category and
/// pollutant: fuel and mass summed, rate averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyEmission {
    pub key: CountyEmissionKey,
    pub pol_type: PollutantType,
    pub pol_desc: String,
    pub em_fac: f64,
    pub fuel_gallons: f64,
    pub em_quant: f64,
}

#[derive(Debug, Clone)]
struct CountyAccumulator {
    pol_type: PollutantType,
    pol_desc: String,
    rate: RunningMean,
    fuel_gallons: f64,
    em_quant: f64,
}

pub fn collapse_carrier_emissions(
    fuel: &[FuelAllocationRecord],
    rates: &[EmissionFactor],
) -> (Vec<CountyEmission>, ValidationReport) {
    let mut rates_by_key: HashMap<(SourceCategory, i32), Vec<&EmissionFactor>> = HashMap::new();
    for factor in rates {
        rates_by_key
            .entry((factor.source_category, factor.year))
            .or_default()
            .push(factor);
    }

    let mut missing = BTreeSet::new();
    let mut totals: BTreeMap<CountyEmissionKey, CountyAccumulator> = BTreeMap::new();
    for record in fuel {
        let Some(factors) = rates_by_key.get(&(record.source_category, record.year)) else {
            missing.insert(format!("{}/{}", record.source_category, record.year));
            continue;
        };
        for factor in factors {
            let key = CountyEmissionKey {
                year: record.year,
                stcntyfips: record.stcntyfips,
                source_category: record.source_category,
                pollutant: factor.pollutant.clone(),
            };
            let accumulator = totals.entry(key).or_insert_with(|| CountyAccumulator {
                pol_type: factor.pol_type,
                pol_desc: factor.pol_desc.clone(),
                rate: RunningMean::default(),
                fuel_gallons: 0.0,
                em_quant: 0.0,
            });
            accumulator.rate.push(factor.em_fac);
            accumulator.fuel_gallons += record.fuel_gallons;
            accumulator.em_quant += record.fuel_gallons * factor.em_fac;
        }
    }

    let mut report = ValidationReport::new();
    if !missing.is_empty() {
        report.push(
            "QUANTITY.MISSING_RATE",
            format!(
                "{} source category/year pair(s) have fuel but no rates: {:?}",
                missing.len(),
                missing
            ),
        );
    }

    let rows = totals
        .into_iter()
        .map(|(key, accumulator)| CountyEmission {
            key,
            pol_type: accumulator.pol_type,
            pol_desc: accumulator.pol_desc,
            em_fac: accumulator.rate.mean().unwrap_or_default(),
            fuel_gallons: accumulator.fuel_gallons,
            em_quant: accumulator.em_quant,
        })
        .collect();
    (rows, report)
}

#[derive(Debug, Clone, PartialEq)]
pub struct YardShare {
    pub yardname: String,
    pub eis_facility_id: Option<String>,
    pub share: f64,
}

/// Each reference yard's fraction of its county's 2017 yard fuel.
pub fn yard_shares(
    yards: &[ReferenceYard],
) -> (BTreeMap<u32, Vec<YardShare>>, ValidationReport) {
    let mut by_county: BTreeMap<u32, Vec<&ReferenceYard>> = BTreeMap::new();
    for yard in yards {
        by_county.entry(yard.stcntyfips).or_default().push(yard);
    }

    let mut report = ValidationReport::new();
    let mut shares = BTreeMap::new();
    for (county, county_yards) in by_county {
        let county_fuel: f64 = county_yards.iter().map(|yard| yard.fuel_2017).sum();
        let equal_share = 1.0 / county_yards.len() as f64;
        if county_fuel <= 0.0 {
            report.push(
                "YARD.ZERO_REFERENCE_FUEL",
                format!("county {county} reference yards report no 2017 fuel; splitting evenly"),
            );
        }
        let county_shares = county_yards
            .into_iter()
            .map(|yard| YardShare {
                yardname: yard.yardname.trim().to_string(),
                eis_facility_id: yard.eis_facility_id.clone(),
                share: if county_fuel > 0.0 {
                    yard.fuel_2017 / county_fuel
                } else {
                    equal_share
                },
            })
            .collect();
        shares.insert(county, county_shares);
    }
    (shares, report)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmissionQuantity {
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
}

/// Splits yard-locomotive rows over the county's reference yards. Counties
/// without reference yards keep one county-level row.
pub fn redistribute_yard_emissions(
    county_rows: &[CountyEmission],
    shares: &BTreeMap<u32, Vec<YardShare>>,
    counties: &[TexasCounty],
) -> (Vec<EmissionQuantity>, ValidationReport) {
    let names = county_names_by_fips(counties);
    let mut unknown_counties = BTreeSet::new();
    let mut quantities = Vec::with_capacity(county_rows.len());

    for row in county_rows {
        let key = &row.key;
        let county_name = names.get(&key.stcntyfips).cloned().unwrap_or_else(|| {
            unknown_counties.insert(key.stcntyfips);
            String::new()
        });
        let quantity = |yardname: Option<String>, eis_facility_id: Option<String>, share: f64| {
            EmissionQuantity {
                year: key.year,
                stcntyfips: key.stcntyfips,
                county_name: county_name.clone(),
                source_category: key.source_category,
                scc: key.source_category.scc(),
                yardname,
                eis_facility_id,
                pollutant: key.pollutant.clone(),
                pol_type: row.pol_type,
                pol_desc: row.pol_desc.clone(),
                em_fac: row.em_fac,
                fuel_gallons: row.fuel_gallons * share,
                em_quant: row.em_quant * share,
            }
        };

        match shares.get(&key.stcntyfips) {
            Some(county_yards) if key.source_category == SourceCategory::Yard => {
                quantities.extend(county_yards.iter().map(|yard| {
                    quantity(
                        Some(yard.yardname.clone()),
                        yard.eis_facility_id.clone(),
                        yard.share,
                    )
                }));
            }
            _ => quantities.push(quantity(None, None, 1.0)),
        }
    }

    let mut report = ValidationReport::new();
    if !unknown_counties.is_empty() {
        report.push(
            "QUANTITY.UNKNOWN_COUNTY",
            format!(
                "{} FIPS code(s) are not Texas counties: {:?}",
                unknown_counties.len(),
                unknown_counties
            ),
        );
    }
    (quantities, report)
}

/// Yard fuel summed back over yards must reproduce each county total.
pub fn check_yard_round_trip(
    county_rows: &[CountyEmission],
    quantities: &[EmissionQuantity],
) -> ValidationReport {
    let mut before: BTreeMap<(i32, u32, &str), f64> = BTreeMap::new();
    for row in county_rows
        .iter()
        .filter(|row| row.key.source_category == SourceCategory::Yard)
    {
        *before
            .entry((row.key.year, row.key.stcntyfips, row.key.pollutant.as_str()))
            .or_default() += row.fuel_gallons;
    }

    let mut after: BTreeMap<(i32, u32, &str), f64> = BTreeMap::new();
    for quantity in quantities
        .iter()
        .filter(|quantity| quantity.source_category == SourceCategory::Yard)
    {
        *after
            .entry((quantity.year, quantity.stcntyfips, quantity.pollutant.as_str()))
            .or_default() += quantity.fuel_gallons;
    }

    let mut report = ValidationReport::new();
    let mismatched: Vec<String> = before
        .iter()
        .filter(|(key, total)| {
            let redistributed = after.get(*key).copied().unwrap_or_default();
            !is_close(**total, redistributed, NumericTolerance::ALLCLOSE)
        })
        .map(|((year, county, pollutant), _)| format!("{year}/{county}/{pollutant}"))
        .collect();
    if !mismatched.is_empty() {
        report.push(
            "YARD.ROUND_TRIP",
            format!(
                "{} yard group(s) lose fuel in redistribution: {:?}",
                mismatched.len(),
                mismatched
            ),
        );
    }
    report
}

pub fn compute_emission_quantities(
    fuel: &[FuelAllocationRecord],
    rates: &[EmissionFactor],
    counties: &[TexasCounty],
    yards: &[ReferenceYard],
) -> (Vec<EmissionQuantity>, ValidationReport) {
    let (county_rows, mut report) = collapse_carrier_emissions(fuel, rates);
    let (shares, share_report) = yard_shares(yards);
    report.extend(share_report);

    let (quantities, redistribution_report) =
        redistribute_yard_emissions(&county_rows, &shares, counties);
    report.extend(redistribution_report);
    report.extend(check_yard_round_trip(&county_rows, &quantities));

    (quantities, report)
}

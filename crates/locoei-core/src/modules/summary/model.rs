use crate::common::constants::{CO, DAYS_PER_YEAR, LEAD};
use crate::domain::{PollutantType, SourceCategory};
use crate::modules::control::{ControlledQuantity, UncontrolledQuantity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatewideFuelSummary {
    pub year: i32,
    pub source_category: SourceCategory,
    pub scc: u64,
    pub fuel_gallons: f64,
}

/// Statewide gallons per source category. Every pollutant row carries the same
/// fuel, so the CO rows are summed.
pub fn statewide_fuel_summary(
    uncontrolled: &[UncontrolledQuantity],
    years: &[i32],
) -> Vec<StatewideFuelSummary> {
    let mut totals: BTreeMap<(i32, SourceCategory), f64> = BTreeMap::new();
    for row in uncontrolled
        .iter()
        .filter(|row| row.pollutant == CO && years.contains(&row.year))
    {
        *totals.entry((row.year, row.source_category)).or_default() += row.fuel_gallons;
    }

    totals
        .into_iter()
        .map(|((year, source_category), fuel_gallons)| StatewideFuelSummary {
            year,
            source_category,
            scc: source_category.scc(),
            fuel_gallons,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CountySummaryRow {
    pub year: i32,
    pub stcntyfips: u32,
    pub county_name: String,
    pub source_category: SourceCategory,
    pub scc: u64,
    pub pollutant: String,
    pub pol_type: PollutantType,
    pub controlled_ton: f64,
    pub uncontrolled_ton: f64,
    pub controlled_ozone_day_ton: f64,
    pub uncontrolled_ozone_day_ton: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct CountyKey {
    year: i32,
    stcntyfips: u32,
    source_category: SourceCategory,
    pollutant: String,
}

#[derive(Debug, Clone)]
struct CountyTotals {
    county_name: String,
    pol_type: PollutantType,
    controlled_ton: f64,
    uncontrolled_ton: f64,
}

fn county_entry<'m>(
    totals: &'m mut BTreeMap<CountyKey, CountyTotals>,
    key: CountyKey,
    county_name: &str,
    pol_type: PollutantType,
) -> &'m mut CountyTotals {
    totals.entry(key).or_insert_with(|| CountyTotals {
        county_name: county_name.to_string(),
        pol_type,
        controlled_ton: 0.0,
        uncontrolled_ton: 0.0,
    })
}

fn is_reported(pol_type: PollutantType) -> bool {
    matches!(pol_type, PollutantType::Cap | PollutantType::Ghg)
}

/// Pollutant label used in the summary tables; lead is reported by name.
fn reported_pollutant(pollutant: &str) -> String {
    if pollutant == LEAD {
        "Lead".to_string()
    } else {
        pollutant.to_string()
    }
}

/// County CAP and GHG tons for the reporting years, yards collapsed. A
/// (year, county, scc) group whose every value is zero is left out.
pub fn county_summary(
    controlled: &[ControlledQuantity],
    uncontrolled: &[UncontrolledQuantity],
    years: &[i32],
) -> Vec<CountySummaryRow> {
    let mut totals: BTreeMap<CountyKey, CountyTotals> = BTreeMap::new();
    for row in controlled
        .iter()
        .filter(|row| is_reported(row.pol_type) && years.contains(&row.year))
    {
        let key = CountyKey {
            year: row.year,
            stcntyfips: row.stcntyfips,
            source_category: row.source_category,
            pollutant: reported_pollutant(&row.pollutant),
        };
        county_entry(&mut totals, key, &row.county_name, row.pol_type).controlled_ton +=
            row.controlled_em_quant_ton;
    }
    for row in uncontrolled
        .iter()
        .filter(|row| is_reported(row.pol_type) && years.contains(&row.year))
    {
        let key = CountyKey {
            year: row.year,
            stcntyfips: row.stcntyfips,
            source_category: row.source_category,
            pollutant: reported_pollutant(&row.pollutant),
        };
        county_entry(&mut totals, key, &row.county_name, row.pol_type).uncontrolled_ton +=
            row.uncontrolled_em_quant_ton;
    }

    let nonzero_groups: BTreeSet<(i32, u32, SourceCategory)> = totals
        .iter()
        .filter(|(_, values)| values.controlled_ton != 0.0 || values.uncontrolled_ton != 0.0)
        .map(|(key, _)| (key.year, key.stcntyfips, key.source_category))
        .collect();

    totals
        .into_iter()
        .filter(|(key, _)| {
            nonzero_groups.contains(&(key.year, key.stcntyfips, key.source_category))
        })
        .map(|(key, values)| CountySummaryRow {
            year: key.year,
            stcntyfips: key.stcntyfips,
            county_name: values.county_name,
            source_category: key.source_category,
            scc: key.source_category.scc(),
            pollutant: key.pollutant,
            pol_type: values.pol_type,
            controlled_ton: values.controlled_ton,
            uncontrolled_ton: values.uncontrolled_ton,
            controlled_ozone_day_ton: values.controlled_ton / DAYS_PER_YEAR,
            uncontrolled_ozone_day_ton: values.uncontrolled_ton / DAYS_PER_YEAR,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatewideEmissionRow {
    pub year: i32,
    pub source_category: SourceCategory,
    pub scc: u64,
    pub pollutant: String,
    pub pol_type: PollutantType,
    pub controlled_ton: f64,
    pub uncontrolled_ton: f64,
}

#[derive(Debug, Clone, Copy)]
struct StatewideTotals {
    pol_type: PollutantType,
    controlled_ton: f64,
    uncontrolled_ton: f64,
}

/// Statewide CAP and GHG tons per (year, source category, pollutant) for the
/// reporting years, summed over counties and yards.
pub fn statewide_emission_summary(
    controlled: &[ControlledQuantity],
    uncontrolled: &[UncontrolledQuantity],
    years: &[i32],
) -> Vec<StatewideEmissionRow> {
    let mut totals: BTreeMap<(i32, SourceCategory, String), StatewideTotals> = BTreeMap::new();
    let blank = |pol_type| StatewideTotals {
        pol_type,
        controlled_ton: 0.0,
        uncontrolled_ton: 0.0,
    };

    for row in controlled
        .iter()
        .filter(|row| is_reported(row.pol_type) && years.contains(&row.year))
    {
        let key = (row.year, row.source_category, reported_pollutant(&row.pollutant));
        totals
            .entry(key)
            .or_insert_with(|| blank(row.pol_type))
            .controlled_ton += row.controlled_em_quant_ton;
    }
    for row in uncontrolled
        .iter()
        .filter(|row| is_reported(row.pol_type) && years.contains(&row.year))
    {
        let key = (row.year, row.source_category, reported_pollutant(&row.pollutant));
        totals
            .entry(key)
            .or_insert_with(|| blank(row.pol_type))
            .uncontrolled_ton += row.uncontrolled_em_quant_ton;
    }

    totals
        .into_iter()
        .map(
            |((year, source_category, pollutant), values)| StatewideEmissionRow {
                year,
                source_category,
                scc: source_category.scc(),
                pollutant,
                pol_type: values.pol_type,
                controlled_ton: values.controlled_ton,
                uncontrolled_ton: values.uncontrolled_ton,
            },
        )
        .collect()
}

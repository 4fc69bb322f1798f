mod model;
mod parser;

use super::StageExecutor;
use super::counties::{TexasCounty, check_county_count};
use super::fuel::{FUEL_OUTPUT_STEM, FuelAllocationRecord};
use super::helpers::validate_stage_request;
use super::rates::{EmissionFactor, RATES_OUTPUT_STEM};
use super::serialization::{latest_stage_output, read_csv_records, write_stage_output};
use crate::common::config::RunConfig;
use crate::domain::{PipelineStage, StageOutput, StageRequest, StageResult};
use tracing::info;

pub use model::{
    CountyEmission, CountyEmissionKey, EmissionQuantity, YardShare, check_yard_round_trip,
    collapse_carrier_emissions, compute_emission_quantities, redistribute_yard_emissions,
    yard_shares,
};
pub use parser::ReferenceYard;

pub const QUANTITY_OUTPUT_STEM: &str = "emis_quant_agg";

pub struct QuantityStage;

impl StageExecutor for QuantityStage {
    fn execute(&self, request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput> {
        validate_stage_request(request, PipelineStage::Quantity)?;

        let fuel: Vec<FuelAllocationRecord> =
            read_csv_records(&latest_stage_output(&config.interim_dir, FUEL_OUTPUT_STEM)?)?;
        let rates: Vec<EmissionFactor> =
            read_csv_records(&latest_stage_output(&config.interim_dir, RATES_OUTPUT_STEM)?)?;
        let counties: Vec<TexasCounty> =
            read_csv_records(&config.raw_path(&config.inputs.texas_counties))?;
        let yards: Vec<ReferenceYard> =
            read_csv_records(&config.raw_path(&config.inputs.yard_reference))?;
        info!(
            fuel_rows = fuel.len(),
            rate_rows = rates.len(),
            reference_yards = yards.len(),
            "loaded emission quantity inputs"
        );

        let mut report = check_county_count(
            &counties,
            config.expected_texas_counties,
            "QUANTITY.COUNTY_COUNT",
        );
        let (quantities, quantity_report) =
            compute_emission_quantities(&fuel, &rates, &counties, &yards);
        report.extend(quantity_report);
        report.enforce(config.on_violation, PipelineStage::Quantity)?;

        let artifact = write_stage_output(
            &config.processed_dir,
            QUANTITY_OUTPUT_STEM,
            &request.run_stamp,
            &quantities,
        )?;
        info!(rows = artifact.rows, path = %artifact.path.display(), "wrote emission quantities");

        Ok(StageOutput {
            artifacts: vec![artifact],
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ReferenceYard, check_yard_round_trip, collapse_carrier_emissions,
        compute_emission_quantities, yard_shares,
    };
    use crate::domain::{CarrierClass, FuelCategory, PollutantType, SourceCategory};
    use crate::modules::counties::TexasCounty;
    use crate::modules::fuel::FuelAllocationRecord;
    use crate::modules::rates::EmissionFactor;

    fn fuel(
        county: u32,
        carrier: &str,
        rr_group: CarrierClass,
        fuel_category: FuelCategory,
        gallons: f64,
    ) -> FuelAllocationRecord {
        let source_category = SourceCategory::from_crosswalk(rr_group, fuel_category)
            .expect("fixture combinations are in the crosswalk");
        FuelAllocationRecord {
            year: 2020,
            stcntyfips: county,
            carrier: carrier.to_string(),
            rr_group,
            fuel_category,
            source_category,
            scc: source_category.scc(),
            fuel_gallons: gallons,
        }
    }

    fn rates() -> Vec<EmissionFactor> {
        SourceCategory::ALL
            .into_iter()
            .flat_map(|category| {
                [
                    EmissionFactor::new(
                        category,
                        "NOX",
                        PollutantType::Cap,
                        "Nitrogen Oxides",
                        2020,
                        100.0,
                    ),
                    EmissionFactor::new(
                        category,
                        "CO2",
                        PollutantType::Ghg,
                        "Carbon Dioxide",
                        2020,
                        10_000.0,
                    ),
                ]
            })
            .collect()
    }

    fn counties() -> Vec<TexasCounty> {
        vec![
            TexasCounty {
                name: "Dallas".to_string(),
                stcntyfips: 48_113,
            },
            TexasCounty {
                name: "Harris".to_string(),
                stcntyfips: 48_201,
            },
        ]
    }

    fn yard(county: u32, name: &str, fuel_2017: f64) -> ReferenceYard {
        ReferenceYard {
            stcntyfips: county,
            eis_facility_id: Some(format!("EIS-{name}")),
            yardname: name.to_string(),
            fuel_2017,
            site_latitude: None,
            site_longitude: None,
        }
    }

    #[test]
    fn two_carriers_collapse_to_summed_mass() {
        let records = vec![
            fuel(48_113, "BNSF", CarrierClass::ClassI, FuelCategory::LineHaul, 500.0),
            fuel(48_113, "UP", CarrierClass::ClassI, FuelCategory::LineHaul, 700.0),
            fuel(48_201, "UP", CarrierClass::ClassI, FuelCategory::LineHaul, 300.0),
        ];
        let (rows, report) = collapse_carrier_emissions(&records, &rates());
        assert!(report.is_clean());
        assert_eq!(rows.len(), 4);

        let dallas_nox = rows
            .iter()
            .find(|row| row.key.stcntyfips == 48_113 && row.key.pollutant == "NOX")
            .expect("Dallas NOX should exist");
        assert!((dallas_nox.fuel_gallons - 1_200.0).abs() < 1.0e-9);
        assert!((dallas_nox.em_quant - 120_000.0).abs() < 1.0e-6);
        assert_eq!(dallas_nox.em_fac, 100.0);
    }

    #[test]
    fn fuel_without_rates_is_reported() {
        let mut records = vec![fuel(
            48_113,
            "UP",
            CarrierClass::ClassI,
            FuelCategory::LineHaul,
            1.0,
        )];
        records[0].year = 2031;
        let (rows, report) = collapse_carrier_emissions(&records, &rates());
        assert!(rows.is_empty());
        assert!(report.has_code("QUANTITY.MISSING_RATE"));
    }

    #[test]
    fn yard_shares_follow_2017_fuel() {
        let (shares, report) = yard_shares(&[
            yard(48_113, "Miller Yard", 300.0),
            yard(48_113, "Dallas Yard", 100.0),
        ]);
        assert!(report.is_clean());
        let dallas = &shares[&48_113];
        assert_eq!(dallas[0].share, 0.75);
        assert_eq!(dallas[1].share, 0.25);
    }

    #[test]
    fn yard_fuel_is_redistributed_and_round_trips() {
        let records = vec![
            fuel(48_113, "BNSF", CarrierClass::ClassI, FuelCategory::IndustrialYard, 100.0),
            fuel(48_113, "DGNO", CarrierClass::ClassIII, FuelCategory::IndustrialYard, 20.0),
            fuel(48_201, "UP", CarrierClass::ClassI, FuelCategory::IndustrialYard, 300.0),
            fuel(48_201, "UP", CarrierClass::ClassI, FuelCategory::LineHaul, 50.0),
        ];
        let yards = vec![
            yard(48_113, "Miller Yard", 300.0),
            yard(48_113, "Dallas Yard", 100.0),
        ];
        let (quantities, report) =
            compute_emission_quantities(&records, &rates(), &counties(), &yards);
        assert!(report.is_clean(), "{:?}", report.violations());

        let miller = quantities
            .iter()
            .find(|row| row.yardname.as_deref() == Some("Miller Yard") && row.pollutant == "NOX")
            .expect("Miller Yard NOX should exist");
        assert!((miller.fuel_gallons - 90.0).abs() < 1.0e-9);
        assert!((miller.em_quant - 9_000.0).abs() < 1.0e-6);
        assert_eq!(miller.county_name, "Dallas");
        assert_eq!(miller.eis_facility_id.as_deref(), Some("EIS-Miller Yard"));

        let harris_yard: Vec<_> = quantities
            .iter()
            .filter(|row| {
                row.stcntyfips == 48_201
                    && row.source_category == SourceCategory::Yard
                    && row.pollutant == "NOX"
            })
            .collect();
        assert_eq!(harris_yard.len(), 1);
        assert_eq!(harris_yard[0].yardname, None);
        assert!((harris_yard[0].fuel_gallons - 300.0).abs() < 1.0e-9);

        let line_haul = quantities
            .iter()
            .filter(|row| row.source_category == SourceCategory::ClassILineHaul)
            .count();
        assert_eq!(line_haul, 2);
    }

    #[test]
    fn lost_yard_fuel_fails_round_trip() {
        let records = vec![fuel(
            48_113,
            "BNSF",
            CarrierClass::ClassI,
            FuelCategory::IndustrialYard,
            100.0,
        )];
        let (county_rows, _) = collapse_carrier_emissions(&records, &rates());
        let (mut quantities, _) = compute_emission_quantities(
            &records,
            &rates(),
            &counties(),
            &[yard(48_113, "Miller Yard", 1.0)],
        );
        assert!(check_yard_round_trip(&county_rows, &quantities).is_clean());

        quantities[0].fuel_gallons *= 0.5;
        assert!(check_yard_round_trip(&county_rows, &quantities).has_code("YARD.ROUND_TRIP"));
    }

    #[test]
    fn unknown_fips_is_reported() {
        let records = vec![fuel(
            48_999,
            "UP",
            CarrierClass::ClassI,
            FuelCategory::LineHaul,
            1.0,
        )];
        let (_, report) = compute_emission_quantities(&records, &rates(), &counties(), &[]);
        assert!(report.has_code("QUANTITY.UNKNOWN_COUNTY"));
    }
}

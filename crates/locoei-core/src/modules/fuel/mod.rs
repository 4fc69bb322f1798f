mod model;
mod parser;

use super::StageExecutor;
use super::helpers::validate_stage_request;
use super::network::{NETWORK_OUTPUT_STEM, NetworkLink};
use super::serialization::{latest_stage_output, read_csv_records, write_stage_output};
use crate::common::config::RunConfig;
use crate::domain::{PipelineStage, StageOutput, StageRequest, StageResult};
use crate::numerics::{NumericTolerance, is_close};
use tracing::{info, warn};

pub use model::{
    AllocationMethod, FuelAllocationRecord, FuelDiscrepancy, LinkFuel, MileMixKey,
    StatewideFuel, allocate_by_mile_mix, allocate_large_carrier_freight,
    check_county_percentages, check_milemix_sums, project_link_fuel,
    statewide_discrepancies, statewide_fuel_long, statewide_large_carrier_freight,
};
pub use parser::{CountyPctRow, ProjectionFactorRow, StatewideFuelRow};

pub const FUEL_OUTPUT_STEM: &str = "fuel_allocation";

pub struct FuelStage;

impl StageExecutor for FuelStage {
    fn execute(&self, request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput> {
        validate_stage_request(request, PipelineStage::Fuel)?;

        let network_path = latest_stage_output(&config.interim_dir, NETWORK_OUTPUT_STEM)?;
        let links: Vec<NetworkLink> = read_csv_records(&network_path)?;
        let statewide_rows: Vec<StatewideFuelRow> =
            read_csv_records(&config.raw_path(&config.inputs.statewide_fuel))?;
        let county_pct: Vec<CountyPctRow> =
            read_csv_records(&config.raw_path(&config.inputs.class1_county_pct))?;
        let projection: Vec<ProjectionFactorRow> =
            read_csv_records(&config.raw_path(&config.inputs.projection_factors))?;
        info!(
            links = links.len(),
            network = %network_path.display(),
            "loaded fuel allocation inputs"
        );

        let statewide = statewide_fuel_long(&statewide_rows);
        let (mut link_fuel, mut report) = allocate_large_carrier_freight(
            &links,
            &statewide,
            &county_pct,
            &config.large_carriers,
        );
        let (mile_mix, mile_mix_report) =
            allocate_by_mile_mix(&links, &statewide, &config.large_carriers);
        link_fuel.extend(mile_mix);
        report.extend(mile_mix_report);
        report.extend(check_milemix_sums(&link_fuel));
        report.extend(check_county_percentages(
            &link_fuel,
            &statewide,
            &county_pct,
            &config.large_carriers,
        ));

        for discrepancy in statewide_discrepancies(&link_fuel, &statewide) {
            warn!(
                carrier = %discrepancy.carrier,
                category = %discrepancy.fuel_category,
                statewide = discrepancy.statewide_gallons,
                allocated = discrepancy.allocated_gallons,
                "allocated fuel differs from statewide survey"
            );
        }
        warn_if_base_year_is_scaled(&projection, config.fuel_base_year);

        let (records, projection_report) =
            project_link_fuel(&link_fuel, &projection, config.analysis_years());
        report.extend(projection_report);
        report.enforce(config.on_violation, PipelineStage::Fuel)?;

        let artifact = write_stage_output(
            &config.interim_dir,
            FUEL_OUTPUT_STEM,
            &request.run_stamp,
            &records,
        )?;
        info!(rows = artifact.rows, path = %artifact.path.display(), "wrote fuel allocation");

        Ok(StageOutput {
            artifacts: vec![artifact],
            report,
        })
    }
}

fn warn_if_base_year_is_scaled(projection: &[ProjectionFactorRow], base_year: i32) {
    if let Some(row) = projection.iter().find(|row| row.year == base_year) {
        let unit = NumericTolerance::ALLCLOSE;
        if !is_close(1.0, row.freight, unit) || !is_close(1.0, row.passenger, unit) {
            warn!(
                base_year,
                freight = row.freight,
                passenger = row.passenger,
                "projection factors for the fuel base year are not 1.0"
            );
        }
    }
}

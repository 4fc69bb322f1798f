mod model;
mod parser;

use super::StageExecutor;
use super::helpers::validate_stage_request;
use super::serialization::{read_csv_records, write_stage_output};
use crate::common::config::RunConfig;
use crate::domain::{PipelineStage, StageOutput, StageRequest, StageResult};
use tracing::info;

pub use model::{
    EmissionFactor, EpaSeries, build_emission_factors, co_g_per_gal, derived_factors,
    epa_series, epa_table_factors, fixed_rate_factors, hap_factors, pollutant_description,
};
pub use parser::{EpaRateRow, SpeciationRow};

pub const RATES_OUTPUT_STEM: &str = "emission_factor";

pub struct RatesStage;

impl StageExecutor for RatesStage {
    fn execute(&self, request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput> {
        validate_stage_request(request, PipelineStage::Rates)?;

        let epa_rows: Vec<EpaRateRow> =
            read_csv_records(&config.raw_path(&config.inputs.epa_rates))?;
        let speciation: Vec<SpeciationRow> =
            read_csv_records(&config.raw_path(&config.inputs.hap_speciation))?;

        let (factors, report) =
            build_emission_factors(&epa_rows, &speciation, config.analysis_years());
        report.enforce(config.on_violation, PipelineStage::Rates)?;

        let artifact = write_stage_output(
            &config.interim_dir,
            RATES_OUTPUT_STEM,
            &request.run_stamp,
            &factors,
        )?;
        info!(
            rows = artifact.rows,
            epa_rows = epa_rows.len(),
            speciation_rows = speciation.len(),
            path = %artifact.path.display(),
            "wrote emission factors"
        );

        Ok(StageOutput {
            artifacts: vec![artifact],
            report,
        })
    }
}

pub mod categories;
pub mod errors;
pub mod validation;

pub use categories::{
    CarrierClass, FuelCategory, NetworkGroup, PollutantType, ProjectionSeries, SourceCategory,
};
pub use errors::{LocoError, LocoErrorCategory, LocoResult, StageResult};
pub use validation::{ValidationReport, Violation, ViolationPolicy};

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    #[default]
    Serial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineStage {
    Network,
    Fuel,
    Rates,
    Quantity,
    Control,
    Summary,
}

impl PipelineStage {
    pub const SERIAL_ORDER: [PipelineStage; 6] = [
        Self::Network,
        Self::Fuel,
        Self::Rates,
        Self::Quantity,
        Self::Control,
        Self::Summary,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::Fuel => "FUEL",
            Self::Rates => "RATES",
            Self::Quantity => "QUANTITY",
            Self::Control => "CONTROL",
            Self::Summary => "SUMMARY",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// One stage invocation. Every output written during a run shares `run_stamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub stage: PipelineStage,
    pub execution_mode: ExecutionMode,
    pub run_stamp: String,
}

impl StageRequest {
    pub fn new(stage: PipelineStage, run_stamp: impl Into<String>) -> Self {
        Self {
            stage,
            execution_mode: ExecutionMode::Serial,
            run_stamp: run_stamp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArtifact {
    pub path: PathBuf,
    pub rows: usize,
}

impl StageArtifact {
    pub fn new(path: impl Into<PathBuf>, rows: usize) -> Self {
        Self {
            path: path.into(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageOutput {
    pub artifacts: Vec<StageArtifact>,
    pub report: ValidationReport,
}

#[cfg(test)]
mod tests {
    use super::{ExecutionMode, PipelineStage, StageRequest};

    #[test]
    fn serial_order_starts_with_network_and_ends_with_summary() {
        assert_eq!(PipelineStage::SERIAL_ORDER[0], PipelineStage::Network);
        assert_eq!(PipelineStage::SERIAL_ORDER[5], PipelineStage::Summary);
        assert!(
            PipelineStage::SERIAL_ORDER
                .windows(2)
                .all(|pair| pair[0] < pair[1])
        );
    }

    #[test]
    fn requests_default_to_serial_execution() {
        let request = StageRequest::new(PipelineStage::Fuel, "2026-10-17");
        assert_eq!(request.execution_mode, ExecutionMode::Serial);
        assert_eq!(request.stage.to_string(), "FUEL");
    }
}

use locoei_core::domain::PipelineStage;

#[derive(Debug, Clone, Copy)]
pub(super) struct StageCommandSpec {
    pub(super) command: &'static str,
    pub(super) stage: PipelineStage,
    pub(super) summary: &'static str,
}

pub(super) const STAGE_COMMANDS: [StageCommandSpec; 6] = [
    StageCommandSpec {
        command: "network",
        stage: PipelineStage::Network,
        summary: "rail links by carrier",
    },
    StageCommandSpec {
        command: "fuel",
        stage: PipelineStage::Fuel,
        summary: "county fuel by carrier and year",
    },
    StageCommandSpec {
        command: "rates",
        stage: PipelineStage::Rates,
        summary: "emission factors by source category",
    },
    StageCommandSpec {
        command: "quantity",
        stage: PipelineStage::Quantity,
        summary: "county and yard emission quantities",
    },
    StageCommandSpec {
        command: "control",
        stage: PipelineStage::Control,
        summary: "TxLED-controlled and DERI-uncontrolled quantities",
    },
    StageCommandSpec {
        command: "summary",
        stage: PipelineStage::Summary,
        summary: "statewide fuel and county summary tables",
    },
];

pub(super) fn stage_command_spec(command: &str) -> Option<StageCommandSpec> {
    STAGE_COMMANDS
        .iter()
        .copied()
        .find(|spec| spec.command == command)
}

pub(super) fn stage_command_for_stage(stage: PipelineStage) -> Option<StageCommandSpec> {
    STAGE_COMMANDS
        .iter()
        .copied()
        .find(|spec| spec.stage == stage)
}

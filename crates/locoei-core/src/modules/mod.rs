pub mod control;
pub mod counties;
pub mod fuel;
pub mod network;
pub mod quantity;
pub mod rates;
pub mod serialization;
pub mod summary;

mod dispatch;
mod helpers;
mod traits;

pub use dispatch::{
    PipelineRun, execute_stage, run_pipeline, run_pipeline_with_stamp, run_stage, stage_executor,
};
pub use traits::StageExecutor;

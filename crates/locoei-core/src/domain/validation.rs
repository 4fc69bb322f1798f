use super::{LocoError, LocoResult, PipelineStage};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    #[default]
    Halt,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub code: &'static str,
    pub message: String,
}

/// Data-quality findings collected by a stage. Empty means every contract held.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: &'static str, message: impl Into<String>) {
        self.violations.push(Violation {
            code,
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.violations.iter().any(|violation| violation.code == code)
    }

    /// Applies `policy`: under `Halt` any violation fails the stage, under
    /// `Warn` each one is logged and the stage continues.
    pub fn enforce(&self, policy: ViolationPolicy, stage: PipelineStage) -> LocoResult<()> {
        if self.is_clean() {
            return Ok(());
        }

        match policy {
            ViolationPolicy::Warn => {
                for violation in &self.violations {
                    warn!(
                        stage = %stage,
                        code = violation.code,
                        "{}",
                        violation.message
                    );
                }
                Ok(())
            }
            ViolationPolicy::Halt => {
                let details = self
                    .violations
                    .iter()
                    .map(|violation| format!("{}: {}", violation.code, violation.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(LocoError::computation(
                    "RUN.VALIDATION_FAILED",
                    format!(
                        "{} stage failed {} check(s): {}",
                        stage,
                        self.violations.len(),
                        details
                    ),
                ))
            }
        }
    }
}

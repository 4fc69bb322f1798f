use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LocoResult<T> = Result<T, LocoError>;
pub type StageResult<T> = LocoResult<T>;

/// Failure class of a pipeline error. Each class owns one placeholder prefix
/// and one process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocoErrorCategory {
    /// Bad configuration, malformed input tables, CLI misuse.
    Input,
    /// Missing inputs, unreadable or unwritable files.
    Io,
    /// Validation halts and stage failures.
    Run,
    System,
}

impl LocoErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Input => 2,
            Self::Io => 3,
            Self::Run => 4,
            Self::System => 5,
        }
    }

    /// Leading segment of every placeholder in this class, e.g. `IO` in
    /// `IO.CSV_READ`.
    pub const fn placeholder_prefix(self) -> &'static str {
        match self {
            Self::Input => "INPUT",
            Self::Io => "IO",
            Self::Run => "RUN",
            Self::System => "SYS",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Input => "input error",
            Self::Io => "i/o error",
            Self::Run => "run halted",
            Self::System => "internal error",
        }
    }

    fn owns(self, placeholder: &str) -> bool {
        placeholder
            .split_once('.')
            .is_some_and(|(prefix, _)| prefix == self.placeholder_prefix())
    }
}

/// Pipeline failure carrying a stable dotted placeholder such as
/// `IO.CSV_READ` or `RUN.VALIDATION_FAILED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocoError {
    category: LocoErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl LocoError {
    fn new(
        category: LocoErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        debug_assert!(
            category.owns(placeholder),
            "placeholder {placeholder} does not belong to {category:?}"
        );
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(LocoErrorCategory::Input, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(LocoErrorCategory::Io, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(LocoErrorCategory::Run, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(LocoErrorCategory::System, placeholder, message)
    }

    pub const fn category(&self) -> LocoErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for LocoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for LocoError {}

use std::path::PathBuf;

use crate::errors::FlipError;
use rust_decimal::Decimal;
use serde::Serialize;

/// Which sign the balance should end up with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Force the balance negative.
    #[default]
    #[serde(rename = "flip")]
    Flip,
    /// Force the balance positive, reversing a previous flip.
    #[serde(rename = "undo")]
    Undo,
}

impl Mode {
    pub fn target(&self) -> &'static str {
        match self {
            Mode::Flip => "negative",
            Mode::Undo => "positive",
        }
    }
}

/// Coarse category of a failed file, so reporting can tell a statement
/// without a balance apart from a broken one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FieldNotFound,
    MalformedValue,
    Io,
    Rejected,
}

impl From<&FlipError> for FailureKind {
    fn from(error: &FlipError) -> Self {
        match error {
            FlipError::FieldNotFound { .. } => FailureKind::FieldNotFound,
            FlipError::MalformedValue { .. } | FlipError::SpanOutOfBounds { .. } => {
                FailureKind::MalformedValue
            }
            FlipError::Io(_) => FailureKind::Io,
            FlipError::NotAFile(_) | FlipError::FileTooLarge { .. } | FlipError::UnsupportedFormat => {
                FailureKind::Rejected
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// At least one balance was rewritten and the file saved.
    Updated { fields: usize, balances: Vec<Option<Decimal>> },
    /// Every balance already had the requested sign; the file was not touched.
    Unchanged { fields: usize, balances: Vec<Option<Decimal>> },
    Failed { kind: FailureKind, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ProcessingResult {
    pub fn failed(path: PathBuf, error: &FlipError) -> Self {
        Self {
            path,
            outcome: Outcome::Failed {
                kind: error.into(),
                error: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub mode: Mode,
    pub results: Vec<ProcessingResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(ProcessingResult::is_success)
    }
}

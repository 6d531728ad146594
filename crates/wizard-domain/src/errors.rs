use thiserror::Error;
use wizard_core::CoreEngineError;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DomainError {
    #[error("unknown question: {0}")] UnknownQuestion(i64),
    #[error("unknown action item {index} for question {question_id}")]
    UnknownActionItem { question_id: i64, index: usize },
    #[error("invalid action item ({field}): {reason}")]
    InvalidActionItem { field: &'static str, reason: String },
    #[error("invalid answer: {0}")] InvalidAnswer(String),
    #[error(transparent)] Core(#[from] CoreEngineError),
}

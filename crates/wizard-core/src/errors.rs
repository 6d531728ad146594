//! Errores del core. Los fallos de validación NO pasan por aquí: viajan como
//! datos (`ValidationErrors`) dentro de los resultados de navegación.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoreEngineError {
    #[error("wizard definition has no steps")] EmptyDefinition,
    #[error("duplicate step id: {0}")] DuplicateStep(String),
    #[error("required field '{field}' claimed by steps '{first}' and '{second}'")]
    DuplicateRequiredField { field: String, first: String, second: String },
    #[error("field '{field}' declared by steps '{first}' and '{second}'")]
    DuplicateField { field: String, first: String, second: String },
    #[error("step '{from}' transitions to unknown step '{to}'")]
    UnknownTransitionTarget { from: String, to: String },
    #[error("step '{from}' cannot transition backwards to '{to}'")]
    BackwardTransition { from: String, to: String },
    #[error("section '{0}' clashes with a field, a reserved key or another section")]
    SectionConflict(String),
    #[error("unknown field: {0}")] UnknownField(String),
    #[error("unknown step: {0}")] UnknownStep(String),
    #[error("already at the first step")] AtFirstStep,
    #[error("already at the last step, finalize instead")] AtLastStep,
    #[error("finalize is only allowed from the last step")] NotAtLastStep,
    #[error("finalize was not prepared or the session changed since")] FinalizeNotPrepared,
    #[error("finalize in progress, edits are locked")] FinalizeInProgress,
    #[error("session already submitted")] SessionSubmitted,
    #[error("remote id already assigned: {current}")] RemoteIdAlreadySet { current: String },
    #[error("access denied: missing permission {0}")] AccessDenied(String),
    #[error("invalid answer for '{field}': {reason}")] InvalidAnswer { field: String, reason: String },
    #[error("internal: {0}")] Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(CoreEngineError::AtFirstStep.to_string(), "already at the first step");
        let dup = CoreEngineError::DuplicateRequiredField { field: "area".into(),
                                                            first: "a".into(),
                                                            second: "b".into() };
        assert_eq!(dup.to_string(), "required field 'area' claimed by steps 'a' and 'b'");
    }
}

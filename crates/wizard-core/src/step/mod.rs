pub mod definition;
pub mod field;
pub mod status;
pub mod transition;

pub use definition::{FormStep, StepDefinition};
pub use field::FieldSpec;
pub use status::StepStatus;
pub use transition::{Target, Transition};

//! Builder para `WizardDefinition`.
//!
//! Dos estados: `DefinitionBuilderInit` (sin pasos) sólo permite declarar el
//! primer paso o dependencias; `DefinitionBuilder` acumula pasos y construye.
//! Así una definición vacía no compila por esta vía.
//!
//! ```ignore
//! let def = WizardDefinition::builder("desvio")
//!     .depends("contrato_id", &["letra_id", "equipe_id"])
//!     .first_step(FormStep::new("contexto", "Contexto"))
//!     .add_step(FormStep::new("finalizacao", "Finalização"))
//!     .section("anexos")
//!     .build()?;
//! ```

use crate::errors::CoreEngineError;
use crate::model::Dependencies;
use crate::step::StepDefinition;

use super::definition::{build_wizard_definition, WizardDefinition};

#[derive(Debug)]
pub struct DefinitionBuilderInit {
    name: String,
    dependencies: Dependencies,
}

impl DefinitionBuilderInit {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.to_string(),
               dependencies: Dependencies::new() }
    }

    /// Declara que cambiar `parent` reinicia `children`.
    pub fn depends(mut self, parent: &str, children: &[&str]) -> Self {
        self.dependencies.add(parent, children);
        self
    }

    pub fn first_step<S>(self, step: S) -> DefinitionBuilder
        where S: StepDefinition + 'static
    {
        DefinitionBuilder { name: self.name,
                            dependencies: self.dependencies,
                            steps: vec![Box::new(step)],
                            sections: Vec::new() }
    }
}

#[derive(Debug)]
pub struct DefinitionBuilder {
    name: String,
    dependencies: Dependencies,
    steps: Vec<Box<dyn StepDefinition>>,
    sections: Vec<String>,
}

impl DefinitionBuilder {
    pub fn add_step<S>(mut self, step: S) -> Self
        where S: StepDefinition + 'static
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn depends(mut self, parent: &str, children: &[&str]) -> Self {
        self.dependencies.add(parent, children);
        self
    }

    /// Declara una sección: registros estructurados que viajan en el
    /// borrador bajo `key`, fuera del store de campos.
    pub fn section(mut self, key: &str) -> Self {
        self.sections.push(key.to_string());
        self
    }

    pub fn build(self) -> Result<WizardDefinition, CoreEngineError> {
        build_wizard_definition(&self.name, self.steps, self.dependencies, self.sections)
    }
}

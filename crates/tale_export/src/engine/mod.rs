// Template Engines - Legacy placeholder substitution and scripting templates
//
// Both engines receive the same data and report into the same error
// collection. Which one renders a template is decided by the template's own
// engine flag, so one export can mix both.

mod legacy;
mod scripting;

pub use legacy::LegacyEngine;
pub use scripting::ScriptingEngine;

use std::sync::Arc;

use minijinja::Value;
use tale_types::{ExportTemplate, TemplateEngineKind};

use crate::document::{self, DialogData, FunctionData, LanguageFileData, StateMachineData};
use crate::scope::RenderScope;
use crate::steps::StepData;

/// Data one template is rendered with
#[derive(Debug, Clone, Copy)]
pub enum TemplateData<'a> {
    Step(&'a StepData),
    Function(&'a FunctionData),
    Dialog(&'a DialogData),
    StateMachine(&'a StateMachineData),
    LanguageFile(&'a LanguageFileData),
}

impl TemplateData<'_> {
    /// Variable the scripting engine exposes the data as
    pub fn root_variable(&self) -> &'static str {
        match self {
            TemplateData::Step(step) => step.root_variable(),
            TemplateData::Function(_) => "function",
            TemplateData::Dialog(_) => "dialog",
            TemplateData::StateMachine(_) => "state_machine",
            TemplateData::LanguageFile(_) => "language_file",
        }
    }

    /// Substitute the data into a legacy template
    pub fn fill_legacy(&self, code: &str, scope: &RenderScope) -> String {
        match self {
            TemplateData::Step(step) => step.fill_legacy(code, scope),
            TemplateData::Function(function) => document::dialog::fill_function(code, function),
            TemplateData::Dialog(dialog) => document::dialog::fill(code, dialog),
            TemplateData::StateMachine(machine) => document::state_machine::fill(code, machine),
            TemplateData::LanguageFile(file) => document::language_file::fill(code, file),
        }
    }

    /// Data as a scripting value
    pub fn to_value(&self) -> Value {
        match self {
            TemplateData::Step(step) => Value::from_serialize(step),
            TemplateData::Function(function) => Value::from_serialize(function),
            TemplateData::Dialog(dialog) => Value::from_serialize(dialog),
            TemplateData::StateMachine(machine) => Value::from_serialize(machine),
            TemplateData::LanguageFile(file) => Value::from_serialize(file),
        }
    }
}

/// Renders one template
///
/// Rendering never fails: problems are recorded in the scope's error
/// collection and degrade the output instead.
pub trait TemplateEngine: Send + Sync {
    fn kind(&self) -> TemplateEngineKind;

    fn render(&self, template: &ExportTemplate, data: TemplateData<'_>, scope: &RenderScope) -> String;
}

/// One engine per engine kind
#[derive(Clone)]
pub struct EngineSet {
    legacy: Arc<dyn TemplateEngine>,
    scripting: Arc<dyn TemplateEngine>,
}

impl Default for EngineSet {
    fn default() -> Self {
        Self {
            legacy: Arc::new(LegacyEngine),
            scripting: Arc::new(ScriptingEngine),
        }
    }
}

impl EngineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine for templates of `kind`
    pub fn engine(&self, kind: TemplateEngineKind) -> &dyn TemplateEngine {
        match kind {
            TemplateEngineKind::Legacy => self.legacy.as_ref(),
            TemplateEngineKind::Scripting => self.scripting.as_ref(),
        }
    }

    /// Render a template with the engine its flag selects
    pub fn render(&self, template: &ExportTemplate, data: TemplateData<'_>, scope: &RenderScope) -> String {
        self.engine(template.engine).render(template, data, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scope_with_objects;
    use tale_types::{ExportObject, ObjectType};

    #[test]
    fn test_engine_set_dispatches_on_template_flag() {
        let scope = scope_with_objects(vec![]);
        let engines = EngineSet::new();
        let function = FunctionData::from(&tale_types::ExportedFunction {
            name: "Dialog_Bob_Step2".into(),
            preview: None,
            code: "stop()".into(),
        });

        let legacy = ExportTemplate::legacy("function", "function {{Tale_Function_Name}}() {{Tale_Function_Content}} end");
        let scripting = ExportTemplate::scripting("function", "function {{ function.name }}() {{ function.code }} end");

        let expected = "function Dialog_Bob_Step2() stop() end";
        assert_eq!(engines.render(&legacy, TemplateData::Function(&function), &scope), expected);
        assert_eq!(engines.render(&scripting, TemplateData::Function(&function), &scope), expected);
        assert!(scope.errors.is_empty());
    }

    #[test]
    fn test_root_variables() {
        let dialog = DialogData {
            kind: "dialog",
            start: String::new(),
            start_function: String::new(),
            functions: Vec::new(),
            additional_functions: String::new(),
            object: crate::context::ObjectData::from(&ExportObject::new("n1", "Bob", ObjectType::Npc)),
        };
        assert_eq!(TemplateData::Dialog(&dialog).root_variable(), "dialog");
        assert_eq!(TemplateData::Dialog(&dialog).to_value().get_attr("kind").unwrap().as_str(), Some("dialog"));
    }
}

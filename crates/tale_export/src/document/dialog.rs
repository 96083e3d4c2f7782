// Dialog Document - Entry function plus auxiliary functions of one dialog

use serde::Serialize;
use tale_types::ExportedFunction;

use crate::catalog::PlaceholderDescription;
use crate::context::ObjectData;
use crate::placeholder::{render_conditional_range, replace_block_placeholders};

/// One function as seen by the `function` template
#[derive(Debug, Clone, Serialize)]
pub struct FunctionData {
    pub kind: &'static str,
    pub name: String,
    /// Preview of the branch leading here, empty for the entry function
    pub preview: String,
    pub has_preview: bool,
    /// Rendered steps of the function
    pub code: String,
}

impl From<&ExportedFunction> for FunctionData {
    fn from(function: &ExportedFunction) -> Self {
        Self {
            kind: "function",
            name: function.name.clone(),
            preview: function.preview.clone().unwrap_or_default(),
            has_preview: function.preview.is_some(),
            code: function.code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DialogData {
    pub kind: &'static str,
    /// Rendered steps of the entry function
    pub start: String,
    /// Name of the entry function, empty for an empty dialog
    pub start_function: String,
    pub functions: Vec<FunctionData>,
    /// Auxiliary functions, each rendered with the `function` template
    pub additional_functions: String,
    pub object: ObjectData,
}

pub fn fill_function(code: &str, data: &FunctionData) -> String {
    let code = render_conditional_range(code, "Tale_Function_HasPreview", data.has_preview);
    replace_block_placeholders(&code, |name| match name {
        "Tale_Function_Name" => Some(data.name.clone()),
        "Tale_Function_ParentPreview" => Some(data.preview.clone()),
        "Tale_Function_Content" => Some(data.code.clone()),
        _ => None,
    })
}

pub fn fill(code: &str, data: &DialogData) -> String {
    let code = render_conditional_range(code, "Tale_HasAdditionalFunctions", !data.functions.is_empty());
    replace_block_placeholders(&code, |name| match name {
        "Tale_Start" => Some(data.start.clone()),
        "Tale_Start_Function" => Some(data.start_function.clone()),
        "Tale_Additional_Functions" => Some(data.additional_functions.clone()),
        "Tale_ObjectName" => Some(data.object.name.clone()),
        "Tale_ObjectId" => Some(data.object.id.clone()),
        _ => None,
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_Start", "Code of the dialog's entry function"),
    PlaceholderDescription::new("Tale_Start_Function", "Name of the dialog's entry function"),
    PlaceholderDescription::new("Tale_Additional_Functions", "All auxiliary functions, rendered with the function template"),
    PlaceholderDescription::new(
        "Tale_HasAdditionalFunctions_Start",
        "Content rendered only if the dialog has auxiliary functions",
    ),
    PlaceholderDescription::new("Tale_HasAdditionalFunctions_End", "Ends Tale_HasAdditionalFunctions_Start"),
    PlaceholderDescription::new("Tale_Function_Name", "Name of the rendered function"),
    PlaceholderDescription::new("Tale_Function_ParentPreview", "Preview of the branch calling the function"),
    PlaceholderDescription::new("Tale_Function_Content", "Code of the rendered function"),
    PlaceholderDescription::new("Tale_Function_HasPreview_Start", "Content rendered only if the function has a preview"),
    PlaceholderDescription::new("Tale_Function_HasPreview_End", "Ends Tale_Function_HasPreview_Start"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("dialog.start", "Code of the entry function"),
    PlaceholderDescription::new("dialog.start_function", "Name of the entry function"),
    PlaceholderDescription::new("dialog.functions", "Auxiliary functions in the order they are first reached"),
    PlaceholderDescription::new("dialog.additional_functions", "Auxiliary functions rendered with the function template"),
    PlaceholderDescription::new("dialog.object", "Object owning the dialog"),
    PlaceholderDescription::new("function.name", "Name of the rendered function"),
    PlaceholderDescription::new("function.preview", "Preview of the branch calling the function"),
    PlaceholderDescription::new("function.has_preview", "Whether the function has a preview"),
    PlaceholderDescription::new("function.code", "Code of the rendered function"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use tale_types::{ExportObject, ObjectType};

    #[test]
    fn test_fill_dialog() {
        let function = FunctionData::from(&ExportedFunction {
            name: "Dialog_Bob_Step2".into(),
            preview: Some("No".into()),
            code: "say(\"Fine\")\nstop()".into(),
        });
        let function_code = fill_function(
            "-- {{Tale_Function_ParentPreview}}\nfunction {{Tale_Function_Name}}()\n    {{Tale_Function_Content}}\nend",
            &function,
        );
        assert_eq!(function_code, "-- No\nfunction Dialog_Bob_Step2()\n    say(\"Fine\")\n    stop()\nend");

        let data = DialogData {
            kind: "dialog",
            start: "ask()".into(),
            start_function: "Dialog_Bob_Step1".into(),
            functions: vec![function],
            additional_functions: function_code,
            object: ObjectData::from(&ExportObject::new("n1", "Bob", ObjectType::Npc)),
        };
        let code = "-- {{Tale_ObjectName}}\nfunction {{Tale_Start_Function}}()\n    {{Tale_Start}}\nend\n{{Tale_HasAdditionalFunctions_Start}}\n\n{{Tale_Additional_Functions}}\n{{Tale_HasAdditionalFunctions_End}}";
        assert_eq!(
            fill(code, &data),
            "-- Bob\nfunction Dialog_Bob_Step1()\n    ask()\nend\n-- No\nfunction Dialog_Bob_Step2()\n    say(\"Fine\")\n    stop()\nend"
        );
    }
}

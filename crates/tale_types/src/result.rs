// Export Results - Generated code returned to the caller

use serde::{Deserialize, Serialize};

use crate::{LanguageKeyEntry, TemplateError};

/// One generated, independently callable code block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedFunction {
    /// Unique generated name
    pub name: String,
    /// Preview of the branch that spawned this function (auxiliary functions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Rendered function content
    pub code: String,
}

/// Result of a dialog export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    /// The complete rendered dialog template
    pub code: String,
    /// Entry function of the dialog, if the graph has any content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<ExportedFunction>,
    /// Auxiliary functions in the order their branch points were first reached
    #[serde(default)]
    pub functions: Vec<ExportedFunction>,
    /// Errors in the order they were recorded
    #[serde(default)]
    pub errors: Vec<TemplateError>,
    /// Language keys generated while rendering
    #[serde(default)]
    pub language_keys: Vec<LanguageKeyEntry>,
}

impl ExportResult {
    /// Whether a fatal error was recorded
    pub fn has_fatal_error(&self) -> bool {
        self.errors.iter().any(TemplateError::is_fatal)
    }

    /// Primary function followed by all auxiliary functions
    pub fn all_functions(&self) -> impl Iterator<Item = &ExportedFunction> {
        self.primary.iter().chain(self.functions.iter())
    }
}

/// Export of one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedState {
    pub id: String,
    pub name: String,
    /// Entry function name, for node graph scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Rendered primary code of the state script
    pub code: String,
    /// Auxiliary functions of the state script
    #[serde(default)]
    pub functions: Vec<ExportedFunction>,
}

/// Result of a state machine export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateMachineExportResult {
    /// The complete rendered state machine template
    pub code: String,
    pub states: Vec<ExportedState>,
    #[serde(default)]
    pub errors: Vec<TemplateError>,
    #[serde(default)]
    pub language_keys: Vec<LanguageKeyEntry>,
}

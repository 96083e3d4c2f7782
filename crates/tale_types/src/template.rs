// Export Templates - User authored templates and their rendering engine flag

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which engine renders a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateEngineKind {
    /// Bracketed placeholder substitution (`{{Tale_Choice_Text}}`)
    #[default]
    Legacy,
    /// Embedded scripting language with expressions and control flow
    Scripting,
}

impl fmt::Display for TemplateEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateEngineKind::Legacy => write!(f, "legacy"),
            TemplateEngineKind::Scripting => write!(f, "scripting"),
        }
    }
}

/// One template source together with its engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTemplate {
    /// Template name, used in error locations
    pub name: String,
    #[serde(default)]
    pub engine: TemplateEngineKind,
    pub code: String,
}

impl ExportTemplate {
    /// Create a legacy template
    pub fn legacy(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: TemplateEngineKind::Legacy,
            code: code.into(),
        }
    }

    /// Create a scripting template
    pub fn scripting(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            engine: TemplateEngineKind::Scripting,
            code: code.into(),
        }
    }
}

/// All templates needed to export a dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogTemplates {
    /// Whole exported file; receives the primary and all auxiliary functions
    pub dialog: ExportTemplate,
    /// Wrapper of one auxiliary function
    pub function: ExportTemplate,
    pub npc_text_line: ExportTemplate,
    pub player_text_line: ExportTemplate,
    pub choice: ExportTemplate,
    pub condition: ExportTemplate,
    pub action: ExportTemplate,
    pub reference: ExportTemplate,
}

/// Templates needed to export a state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachineTemplates {
    /// Whole exported state machine; ranges over states and transitions
    pub state_machine: ExportTemplate,
    /// Templates used for states whose script is a node graph
    pub dialog: DialogTemplates,
}

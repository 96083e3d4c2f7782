// Step Renderers - Per node kind template data and legacy substitution
//
// Each node kind builds one serializable data value. The scripting engine
// exposes it under the kind's root variable; the legacy engine substitutes it
// through the kind's `fill` function.

pub mod action;
pub mod child;
pub mod choice;
pub mod condition;
pub mod reference;
pub mod text_line;

pub use action::ActionData;
pub use child::ChildNodeData;
pub use choice::{ChoiceData, ChoiceOptionData};
pub use condition::{ConditionBranchData, ConditionData};
pub use reference::ReferenceData;
pub use text_line::TextLineData;

use serde::Serialize;
use tale_types::{DialogTemplates, ExportTemplate, NodeKind, Speaker};

use crate::catalog::PlaceholderDescription;
use crate::condition::ConditionRenderer;
use crate::error::Result;
use crate::function::FunctionPlan;
use crate::parser::{NodePayload, ParsedGraph, ParsedStep};
use crate::scope::RenderScope;

/// Everything a step needs while building its data
pub struct StepContext<'a> {
    pub graph: &'a ParsedGraph,
    pub plan: &'a FunctionPlan,
    pub conditions: &'a ConditionRenderer,
    pub scope: &'a RenderScope,
}

impl StepContext<'_> {
    /// Continuation of a step's child
    pub fn child(&self, step: &ParsedStep, child_index: usize) -> ChildNodeData {
        ChildNodeData::resolve(self.graph, self.plan, step, child_index)
    }
}

/// Template data of one step
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StepData {
    TextLine(TextLineData),
    Choice(ChoiceData),
    Condition(ConditionData),
    Action(ActionData),
    Reference(ReferenceData),
}

impl StepData {
    /// Build the data of a step
    pub async fn build(step: &ParsedStep, ctx: &StepContext<'_>) -> Result<Self> {
        Ok(match &step.payload {
            NodePayload::TextLine(node) => StepData::TextLine(TextLineData::build(node, step, ctx)),
            NodePayload::Choice(node) => StepData::Choice(ChoiceData::build(node, step, ctx).await?),
            NodePayload::Condition(node) => StepData::Condition(ConditionData::build(node, step, ctx).await?),
            NodePayload::Action(node) => StepData::Action(ActionData::build(node, step, ctx).await?),
            NodePayload::Reference(node) => StepData::Reference(ReferenceData::build(node, step, ctx).await?),
        })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            StepData::TextLine(_) => NodeKind::TextLine,
            StepData::Choice(_) => NodeKind::Choice,
            StepData::Condition(_) => NodeKind::Condition,
            StepData::Action(_) => NodeKind::Action,
            StepData::Reference(_) => NodeKind::Reference,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            StepData::TextLine(d) => &d.id,
            StepData::Choice(d) => &d.id,
            StepData::Condition(d) => &d.id,
            StepData::Action(d) => &d.id,
            StepData::Reference(d) => &d.id,
        }
    }

    /// Variable the scripting engine exposes this data as
    pub fn root_variable(&self) -> &'static str {
        match self {
            StepData::TextLine(_) => "tale_text_line",
            StepData::Choice(_) => "tale_choice",
            StepData::Condition(_) => "tale_condition",
            StepData::Action(_) => "tale_action",
            StepData::Reference(_) => "tale_reference",
        }
    }

    /// Template rendering this step
    pub fn template<'t>(&self, templates: &'t DialogTemplates) -> &'t ExportTemplate {
        match self {
            StepData::TextLine(d) if d.speaker == Speaker::Player => &templates.player_text_line,
            StepData::TextLine(_) => &templates.npc_text_line,
            StepData::Choice(_) => &templates.choice,
            StepData::Condition(_) => &templates.condition,
            StepData::Action(_) => &templates.action,
            StepData::Reference(_) => &templates.reference,
        }
    }

    /// Substitute this step into a legacy template
    pub fn fill_legacy(&self, code: &str, scope: &RenderScope) -> String {
        let code = match self {
            StepData::TextLine(d) => text_line::fill(code, d, scope),
            StepData::Choice(d) => choice::fill(code, d, scope),
            StepData::Condition(d) => condition::fill(code, d, scope),
            StepData::Action(d) => action::fill(code, d, scope),
            StepData::Reference(d) => reference::fill(code, d, scope),
        };
        fill_common(&code, self, scope)
    }
}

/// Placeholders every step template understands
fn fill_common(code: &str, data: &StepData, scope: &RenderScope) -> String {
    crate::placeholder::replace_placeholders(code, |name| match name {
        "Tale_Step_Id" => Some(data.id().to_string()),
        "Tale_Step_Kind" => Some(data.kind().to_string()),
        "Tale_ObjectName" => Some(scope.owner.name.clone()),
        "Tale_ObjectId" => Some(scope.owner.id.clone()),
        _ => None,
    })
}

pub const COMMON_LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_Step_Id", "Node id of the rendered step"),
    PlaceholderDescription::new("Tale_Step_Kind", "Node kind of the rendered step"),
    PlaceholderDescription::new("Tale_ObjectName", "Name of the object owning the dialog"),
    PlaceholderDescription::new("Tale_ObjectId", "Id of the object owning the dialog"),
];

pub const COMMON_SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("owner", "Object owning the dialog or state machine"),
    PlaceholderDescription::new("owner.name", "Name of the owning object"),
    PlaceholderDescription::new("owner.fields.<Field>.value", "Value of a field of the owning object"),
    PlaceholderDescription::new("escape_text", "Filter escaping a text for string literals"),
    PlaceholderDescription::new("text_preview", "Filter shortening a text to a one line preview"),
];

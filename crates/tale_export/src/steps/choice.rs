// Choice Step - Player choice between options

use serde::Serialize;
use tale_types::{ChoiceNode, LanguageKeyCategory};

use super::{ChildNodeData, StepContext};
use crate::catalog::PlaceholderDescription;
use crate::error::Result;
use crate::language_key::LanguageKeyRequest;
use crate::parser::ParsedStep;
use crate::placeholder::{render_conditional_range, render_list_range, replace_placeholders};
use crate::scope::RenderScope;
use crate::text::{escape_text, text_preview};

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceOptionData {
    pub kind: &'static str,
    pub id: String,
    /// Node id of the choice
    pub node_id: String,
    pub index: usize,
    pub text: String,
    pub unescaped_text: String,
    pub text_preview: String,
    pub is_repeatable: bool,
    pub has_condition: bool,
    /// Rendered condition expression, empty without condition
    pub condition: String,
    pub child_node: ChildNodeData,
}

impl ChoiceOptionData {
    /// Reference id of the option text inside the owning object
    pub fn reference_id(&self) -> String {
        format!("{}_{}", self.node_id, self.id)
    }

    pub fn language_key(&self, scope: &RenderScope) -> String {
        let reference_id = self.reference_id();
        scope.language_keys.key(LanguageKeyRequest {
            object_id: &scope.owner.id,
            object_name: &scope.owner.name,
            category: LanguageKeyCategory::ChoiceText,
            reference_id: &reference_id,
            text: &self.unescaped_text,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceData {
    pub kind: &'static str,
    pub id: String,
    pub choices: Vec<ChoiceOptionData>,
}

impl ChoiceData {
    /// Build the choice data, rendering the condition of every guarded option
    pub async fn build(node: &ChoiceNode, step: &ParsedStep, ctx: &StepContext<'_>) -> Result<Self> {
        let settings = &ctx.scope.settings;
        let mut choices = Vec::with_capacity(node.choices.len());

        for (index, option) in node.choices.iter().enumerate() {
            let condition = match &option.condition {
                Some(condition) => {
                    let scope = ctx.scope.at(format!("choice option {}", option.id));
                    ctx.conditions.render(Some(condition), &scope).await?
                }
                None => String::new(),
            };
            let child_index = step
                .children
                .iter()
                .position(|c| matches!(&c.branch, crate::parser::BranchKey::Choice(id) if id == &option.id))
                .unwrap_or(index);

            choices.push(ChoiceOptionData {
                kind: "choice_option",
                id: option.id.clone(),
                node_id: node.id.clone(),
                index,
                text: escape_text(&option.text, settings),
                unescaped_text: option.text.clone(),
                text_preview: text_preview(&option.text, settings.preview_length),
                is_repeatable: option.is_repeatable,
                has_condition: option.condition.is_some(),
                condition,
                child_node: ctx.child(step, child_index),
            });
        }

        Ok(Self {
            kind: "choice",
            id: node.id.clone(),
            choices,
        })
    }
}

fn fill_option(code: &str, option: &ChoiceOptionData, scope: &RenderScope) -> String {
    let code = render_conditional_range(code, "Tale_Choice_HasCondition", option.has_condition);
    let code = render_conditional_range(&code, "Tale_Choice_HasNoCondition", !option.has_condition);
    let code = render_conditional_range(&code, "Tale_Choice_IsRepeatable", option.is_repeatable);
    let code = render_conditional_range(&code, "Tale_Choice_IsNotRepeatable", !option.is_repeatable);
    let code = option.child_node.fill_ranges(&code);

    replace_placeholders(&code, |name| match name {
        "Tale_Choice_Id" => Some(option.id.clone()),
        "Tale_Choice_Index" => Some(option.index.to_string()),
        "Tale_Choice_Text" => Some(option.text.clone()),
        "Tale_Choice_Text_Unescaped" => Some(option.unescaped_text.clone()),
        "Tale_Choice_Text_Preview" => Some(option.text_preview.clone()),
        "Tale_Choice_Text_LangKey" => Some(option.language_key(scope)),
        "Tale_Choice_Condition" => Some(option.condition.clone()),
        other => option.child_node.placeholder(other),
    })
}

pub fn fill(code: &str, data: &ChoiceData, scope: &RenderScope) -> String {
    render_list_range(code, "Tale_Choices", &data.choices, |inner, option, _| {
        fill_option(inner, option, scope)
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_Choices_Start", "Content rendered once per choice option"),
    PlaceholderDescription::new("Tale_Choices_End", "Ends Tale_Choices_Start"),
    PlaceholderDescription::new("Tale_Choice_Id", "Id of the option"),
    PlaceholderDescription::new("Tale_Choice_Index", "Zero based position of the option"),
    PlaceholderDescription::new("Tale_Choice_Text", "Escaped text of the option"),
    PlaceholderDescription::new("Tale_Choice_Text_Unescaped", "Raw text of the option"),
    PlaceholderDescription::new("Tale_Choice_Text_Preview", "Shortened one line preview of the option text"),
    PlaceholderDescription::new("Tale_Choice_Text_LangKey", "Language key of the option text"),
    PlaceholderDescription::new("Tale_Choice_Condition", "Rendered condition of the option"),
    PlaceholderDescription::new("Tale_Choice_HasCondition_Start", "Content rendered only for guarded options"),
    PlaceholderDescription::new("Tale_Choice_HasCondition_End", "Ends Tale_Choice_HasCondition_Start"),
    PlaceholderDescription::new("Tale_Choice_HasNoCondition_Start", "Content rendered only for unguarded options"),
    PlaceholderDescription::new("Tale_Choice_HasNoCondition_End", "Ends Tale_Choice_HasNoCondition_Start"),
    PlaceholderDescription::new("Tale_Choice_IsRepeatable_Start", "Content rendered only for repeatable options"),
    PlaceholderDescription::new("Tale_Choice_IsRepeatable_End", "Ends Tale_Choice_IsRepeatable_Start"),
    PlaceholderDescription::new(
        "Tale_Choice_IsNotRepeatable_Start",
        "Content rendered only for options that disappear once picked",
    ),
    PlaceholderDescription::new("Tale_Choice_IsNotRepeatable_End", "Ends Tale_Choice_IsNotRepeatable_Start"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("tale_choice.id", "Node id"),
    PlaceholderDescription::new("tale_choice.choices", "Options in authored order"),
    PlaceholderDescription::new("tale_choice.choices[i].id", "Id of the option"),
    PlaceholderDescription::new("tale_choice.choices[i].index", "Zero based position of the option"),
    PlaceholderDescription::new("tale_choice.choices[i].text", "Escaped text of the option"),
    PlaceholderDescription::new("tale_choice.choices[i].unescaped_text", "Raw text of the option"),
    PlaceholderDescription::new("tale_choice.choices[i].text_preview", "Shortened option text"),
    PlaceholderDescription::new("tale_choice.choices[i].is_repeatable", "Whether the option stays available"),
    PlaceholderDescription::new("tale_choice.choices[i].has_condition", "Whether the option is guarded"),
    PlaceholderDescription::new("tale_choice.choices[i].condition", "Rendered condition of the option"),
    PlaceholderDescription::new("tale_choice.choices[i].child_node", "Continuation of the option"),
];

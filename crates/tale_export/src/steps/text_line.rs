// Text Line Step - A line spoken by the npc or the player

use serde::Serialize;
use tale_types::{LanguageKeyCategory, Speaker, TextNode};

use super::{ChildNodeData, StepContext};
use crate::catalog::PlaceholderDescription;
use crate::language_key::LanguageKeyRequest;
use crate::parser::ParsedStep;
use crate::placeholder::replace_placeholders;
use crate::scope::RenderScope;
use crate::text::{escape_text, text_preview};

#[derive(Debug, Clone, Serialize)]
pub struct TextLineData {
    pub kind: &'static str,
    pub id: String,
    pub speaker: Speaker,
    /// Escaped for string literals
    pub text: String,
    pub unescaped_text: String,
    pub text_preview: String,
    pub child_node: ChildNodeData,
}

impl TextLineData {
    pub fn build(node: &TextNode, step: &ParsedStep, ctx: &StepContext<'_>) -> Self {
        let settings = &ctx.scope.settings;
        Self {
            kind: "text_line",
            id: node.id.clone(),
            speaker: node.speaker,
            text: escape_text(&node.text, settings),
            unescaped_text: node.text.clone(),
            text_preview: text_preview(&node.text, settings.preview_length),
            child_node: ctx.child(step, 0),
        }
    }

    pub fn language_key(&self, scope: &RenderScope) -> String {
        scope.language_keys.key(LanguageKeyRequest {
            object_id: &scope.owner.id,
            object_name: &scope.owner.name,
            category: LanguageKeyCategory::DialogLine,
            reference_id: &self.id,
            text: &self.unescaped_text,
        })
    }
}

pub fn fill(code: &str, data: &TextLineData, scope: &RenderScope) -> String {
    let code = data.child_node.fill_ranges(code);
    replace_placeholders(&code, |name| match name {
        "Tale_TextLine" => Some(data.text.clone()),
        "Tale_TextLine_Unescaped" => Some(data.unescaped_text.clone()),
        "Tale_TextLine_Preview" => Some(data.text_preview.clone()),
        "Tale_TextLine_LangKey" => Some(data.language_key(scope)),
        "Tale_TextLine_Speaker" => Some(
            match data.speaker {
                Speaker::Npc => "npc",
                Speaker::Player => "player",
            }
            .to_string(),
        ),
        other => data.child_node.placeholder(other),
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_TextLine", "Escaped text of the line"),
    PlaceholderDescription::new("Tale_TextLine_Unescaped", "Raw text of the line"),
    PlaceholderDescription::new("Tale_TextLine_Preview", "Shortened one line preview of the text"),
    PlaceholderDescription::new("Tale_TextLine_LangKey", "Language key of the text"),
    PlaceholderDescription::new("Tale_TextLine_Speaker", "npc or player"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("tale_text_line.id", "Node id"),
    PlaceholderDescription::new("tale_text_line.speaker", "npc or player"),
    PlaceholderDescription::new("tale_text_line.text", "Escaped text of the line"),
    PlaceholderDescription::new("tale_text_line.unescaped_text", "Raw text of the line"),
    PlaceholderDescription::new("tale_text_line.text_preview", "Shortened one line preview"),
    PlaceholderDescription::new("tale_text_line.child_node", "Continuation of the line"),
];

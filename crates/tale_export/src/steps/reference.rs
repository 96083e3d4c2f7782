// Reference Step - Cross reference to another export object

use serde::Serialize;
use tale_types::{LanguageKeyCategory, ReferenceNode};
use tracing::warn;

use super::{ChildNodeData, StepContext};
use crate::catalog::PlaceholderDescription;
use crate::context::ObjectData;
use crate::error::Result;
use crate::language_key::LanguageKeyRequest;
use crate::parser::ParsedStep;
use crate::placeholder::{render_conditional_range, replace_placeholders};
use crate::scope::RenderScope;
use crate::text::{escape_text, text_preview};

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceData {
    pub kind: &'static str,
    pub id: String,
    pub text: String,
    pub unescaped_text: String,
    pub text_preview: String,
    pub referenced_object: Option<ObjectData>,
    pub has_object: bool,
    pub child_node: ChildNodeData,
}

impl ReferenceData {
    pub async fn build(node: &ReferenceNode, step: &ParsedStep, ctx: &StepContext<'_>) -> Result<Self> {
        let referenced_object = match &node.referenced_object {
            Some(reference) => {
                let object = ctx.scope.object(&reference.object_id).await?;
                if object.is_none() {
                    warn!(step_id = %node.id, object_id = %reference.object_id, "Reference to unknown object");
                }
                object.as_ref().map(ObjectData::from)
            }
            None => None,
        };

        let settings = &ctx.scope.settings;
        Ok(Self {
            kind: "reference",
            id: node.id.clone(),
            text: escape_text(&node.reference_text, settings),
            unescaped_text: node.reference_text.clone(),
            text_preview: text_preview(&node.reference_text, settings.preview_length),
            has_object: referenced_object.is_some(),
            referenced_object,
            child_node: ctx.child(step, 0),
        })
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

pub fn fill(code: &str, data: &ReferenceData, scope: &RenderScope) -> String {
    let code = render_conditional_range(code, "Tale_Reference_HasObject", data.has_object);
    let code = data.child_node.fill_ranges(&code);

    let object = data.referenced_object.as_ref();
    replace_placeholders(&code, |name| match name {
        "Tale_Reference_Text" => Some(data.text.clone()),
        "Tale_Reference_Text_Unescaped" => Some(data.unescaped_text.clone()),
        "Tale_Reference_Text_Preview" => Some(data.text_preview.clone()),
        "Tale_Reference_Text_LangKey" => Some(data.language_key(scope)),
        "Tale_Reference_ObjectId" => Some(object.map(|o| o.id.clone()).unwrap_or_default()),
        "Tale_Reference_ObjectName" => Some(object.map(|o| o.name.clone()).unwrap_or_default()),
        "Tale_Reference_ObjectType" => Some(object.map(|o| o.object_type.to_string()).unwrap_or_default()),
        "Tale_Reference_ObjectName_LangKey" => {
            Some(object.map(|o| scope.language_keys.key(o.name_key_request())).unwrap_or_default())
        }
        other => data.child_node.placeholder(other),
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_Reference_Text", "Escaped reference text"),
    PlaceholderDescription::new("Tale_Reference_Text_Unescaped", "Raw reference text"),
    PlaceholderDescription::new("Tale_Reference_Text_Preview", "Shortened one line preview of the reference text"),
    PlaceholderDescription::new("Tale_Reference_Text_LangKey", "Language key of the reference text"),
    PlaceholderDescription::new("Tale_Reference_ObjectId", "Id of the referenced object"),
    PlaceholderDescription::new("Tale_Reference_ObjectName", "Name of the referenced object"),
    PlaceholderDescription::new("Tale_Reference_ObjectType", "Type of the referenced object"),
    PlaceholderDescription::new("Tale_Reference_ObjectName_LangKey", "Language key of the referenced object's name"),
    PlaceholderDescription::new("Tale_Reference_HasObject_Start", "Content rendered only if the object exists"),
    PlaceholderDescription::new("Tale_Reference_HasObject_End", "Ends Tale_Reference_HasObject_Start"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("tale_reference.id", "Node id"),
    PlaceholderDescription::new("tale_reference.text", "Escaped reference text"),
    PlaceholderDescription::new("tale_reference.unescaped_text", "Raw reference text"),
    PlaceholderDescription::new("tale_reference.text_preview", "Shortened reference text"),
    PlaceholderDescription::new("tale_reference.referenced_object", "Referenced object"),
    PlaceholderDescription::new("tale_reference.has_object", "Whether the referenced object exists"),
    PlaceholderDescription::new("tale_reference.child_node", "Continuation of the reference"),
];

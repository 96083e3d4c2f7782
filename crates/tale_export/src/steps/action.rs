// Action Step - Side effects triggered while the dialog runs

use serde::Serialize;
use serde_json::Value;
use tale_types::{ActionNode, LanguageKeyCategory};
use tracing::warn;

use super::{ChildNodeData, StepContext};
use crate::catalog::PlaceholderDescription;
use crate::context::ObjectData;
use crate::error::Result;
use crate::language_key::LanguageKeyRequest;
use crate::parser::ParsedStep;
use crate::placeholder::{render_conditional_range, replace_placeholders};
use crate::scope::RenderScope;
use crate::text::escape_text;

const PAYLOAD_PREFIX: &str = "Tale_Action_Payload_";

#[derive(Debug, Clone, Serialize)]
pub struct ActionData {
    pub kind: &'static str,
    pub id: String,
    pub action_type: String,
    pub payload: Value,
    /// Payload as compact JSON
    pub payload_json: String,
    pub related_object: Option<ObjectData>,
    pub has_related_object: bool,
    pub floating_text: String,
    pub unescaped_floating_text: String,
    pub has_floating_text: bool,
    pub child_node: ChildNodeData,
}

impl ActionData {
    pub async fn build(node: &ActionNode, step: &ParsedStep, ctx: &StepContext<'_>) -> Result<Self> {
        let related_object = match &node.related_object {
            Some(reference) => {
                let object = ctx.scope.object(&reference.object_id).await?;
                if object.is_none() {
                    warn!(
                        step_id = %node.id,
                        object_id = %reference.object_id,
                        "Action references an unknown object"
                    );
                }
                object.as_ref().map(ObjectData::from)
            }
            None => None,
        };

        let floating_text = node.floating_text().unwrap_or_default();
        Ok(Self {
            kind: "action",
            id: node.id.clone(),
            action_type: node.action_type.clone(),
            payload: node.payload.clone(),
            payload_json: node.payload.to_string(),
            has_related_object: related_object.is_some(),
            related_object,
            floating_text: escape_text(floating_text, &ctx.scope.settings),
            unescaped_floating_text: floating_text.to_string(),
            has_floating_text: !floating_text.is_empty(),
            child_node: ctx.child(step, 0),
        })
    }

    pub fn floating_text_key(&self, scope: &RenderScope) -> String {
        scope.language_keys.key(LanguageKeyRequest {
            object_id: &scope.owner.id,
            object_name: &scope.owner.name,
            category: LanguageKeyCategory::DialogLine,
            reference_id: &self.id,
            text: &self.unescaped_floating_text,
        })
    }

    /// Top level payload value, strings without quotes
    fn payload_value(&self, key: &str) -> Option<String> {
        match self.payload.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

pub fn fill(code: &str, data: &ActionData, scope: &RenderScope) -> String {
    let code = render_conditional_range(code, "Tale_Action_HasFloatingText", data.has_floating_text);
    let code = render_conditional_range(&code, "Tale_Action_HasObject", data.has_related_object);
    let code = data.child_node.fill_ranges(&code);

    let object = data.related_object.as_ref();
    replace_placeholders(&code, |name| match name {
        "Tale_Action_Type" => Some(data.action_type.clone()),
        "Tale_Action_Payload" => Some(data.payload_json.clone()),
        "Tale_Action_FloatingText" => Some(data.floating_text.clone()),
        "Tale_Action_FloatingText_Unescaped" => Some(data.unescaped_floating_text.clone()),
        "Tale_Action_FloatingText_LangKey" => Some(data.floating_text_key(scope)),
        "Tale_Action_Object_Id" => Some(object.map(|o| o.id.clone()).unwrap_or_default()),
        "Tale_Action_Object_Name" => Some(object.map(|o| o.name.clone()).unwrap_or_default()),
        "Tale_Action_Object_Name_LangKey" => {
            Some(object.map(|o| scope.language_keys.key(o.name_key_request())).unwrap_or_default())
        }
        other => match other.strip_prefix(PAYLOAD_PREFIX) {
            Some(key) => data.payload_value(key),
            None => data.child_node.placeholder(other),
        },
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_Action_Type", "Action identifier"),
    PlaceholderDescription::new("Tale_Action_Payload", "Action configuration as JSON"),
    PlaceholderDescription::new("Tale_Action_Payload_<Key>", "Top level value of the action configuration"),
    PlaceholderDescription::new("Tale_Action_FloatingText", "Escaped floating text shown by the action"),
    PlaceholderDescription::new("Tale_Action_FloatingText_Unescaped", "Raw floating text"),
    PlaceholderDescription::new("Tale_Action_FloatingText_LangKey", "Language key of the floating text"),
    PlaceholderDescription::new("Tale_Action_HasFloatingText_Start", "Content rendered only if the action shows text"),
    PlaceholderDescription::new("Tale_Action_HasFloatingText_End", "Ends Tale_Action_HasFloatingText_Start"),
    PlaceholderDescription::new("Tale_Action_Object_Id", "Id of the object the action operates on"),
    PlaceholderDescription::new("Tale_Action_Object_Name", "Name of the object the action operates on"),
    PlaceholderDescription::new("Tale_Action_Object_Name_LangKey", "Language key of that object's name"),
    PlaceholderDescription::new("Tale_Action_HasObject_Start", "Content rendered only if the action has an object"),
    PlaceholderDescription::new("Tale_Action_HasObject_End", "Ends Tale_Action_HasObject_Start"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("tale_action.id", "Node id"),
    PlaceholderDescription::new("tale_action.action_type", "Action identifier"),
    PlaceholderDescription::new("tale_action.payload", "Action configuration"),
    PlaceholderDescription::new("tale_action.payload_json", "Action configuration as JSON"),
    PlaceholderDescription::new("tale_action.related_object", "Object the action operates on"),
    PlaceholderDescription::new("tale_action.has_related_object", "Whether the action has an object"),
    PlaceholderDescription::new("tale_action.floating_text", "Escaped floating text"),
    PlaceholderDescription::new("tale_action.unescaped_floating_text", "Raw floating text"),
    PlaceholderDescription::new("tale_action.has_floating_text", "Whether the action shows text"),
    PlaceholderDescription::new("tale_action.child_node", "Continuation of the action"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scope_with_objects;
    use tale_types::{ExportObject, ObjectType};

    fn data(payload: Value, object: Option<&ExportObject>) -> ActionData {
        let floating = payload.get("floating_text").and_then(Value::as_str).unwrap_or_default().to_string();
        ActionData {
            kind: "action",
            id: "a1".into(),
            action_type: "show_floating_text".into(),
            payload_json: payload.to_string(),
            payload,
            has_related_object: object.is_some(),
            related_object: object.map(ObjectData::from),
            floating_text: floating.replace('"', "\\\""),
            has_floating_text: !floating.is_empty(),
            unescaped_floating_text: floating,
            child_node: ChildNodeData::default(),
        }
    }

    #[test]
    fn test_fill_payload_and_floating_text() {
        let scope = scope_with_objects(vec![]);
        let guard = ExportObject::new("n2", "Guard", ObjectType::Npc);
        let action = data(serde_json::json!({"floating_text": "Stop \"now\"", "duration": 3}), Some(&guard));
        let code = "{{Tale_Action_HasFloatingText_Start}}float(\"{{Tale_Action_Object_Id}}\", \"{{Tale_Action_FloatingText}}\", {{Tale_Action_Payload_duration}}){{Tale_Action_HasFloatingText_End}} -- {{Tale_Action_FloatingText_LangKey}}";

        assert_eq!(
            fill(code, &action, &scope),
            "float(\"n2\", \"Stop \\\"now\\\"\", 3) -- Bob_owner_Dialog_a1"
        );
        assert_eq!(scope.language_keys.entries()[0].text, "Stop \"now\"");
    }

    #[test]
    fn test_fill_without_text_or_object() {
        let scope = scope_with_objects(vec![]);
        let action = data(serde_json::json!({"value": "x"}), None);
        let code = "run(\"{{Tale_Action_Type}}\", {{Tale_Action_Payload}}){{Tale_Action_HasObject_Start}} on {{Tale_Action_Object_Name}}{{Tale_Action_HasObject_End}}";

        assert_eq!(fill(code, &action, &scope), "run(\"show_floating_text\", {\"value\":\"x\"})");
        assert_eq!(fill("{{Tale_Action_Payload_missing}}", &action, &scope), "{{Tale_Action_Payload_missing}}");
    }

    #[tokio::test]
    async fn test_build_resolves_related_object() {
        use crate::condition::ConditionRenderer;
        use crate::function::{DefaultSplitPolicy, FunctionPlan};
        use crate::parser::{NodeGraphParser, NodePayload};
        use tale_types::{Link, MarkerNode, NodeGraphSnippet, ObjectRef};

        let scope = scope_with_objects(vec![ExportObject::new("i1", "Sword", ObjectType::Item)]);
        let snippet = NodeGraphSnippet {
            start: vec![MarkerNode { id: "s".into() }],
            actions: vec![ActionNode {
                id: "a".into(),
                action_type: "spawn_item".into(),
                payload: serde_json::json!({}),
                related_object: Some(ObjectRef::new("i1", ObjectType::Item)),
            }],
            links: vec![Link::new("s", "a")],
            ..Default::default()
        };
        let graph = NodeGraphParser::parse(&snippet, &scope.errors, "test").unwrap();
        let plan = FunctionPlan::build(&graph, &DefaultSplitPolicy, 15);
        let conditions = ConditionRenderer::default();
        let ctx = StepContext {
            graph: &graph,
            plan: &plan,
            conditions: &conditions,
            scope: &scope,
        };
        let step = graph.step(0);
        let NodePayload::Action(node) = &step.payload else {
            panic!("not an action step");
        };

        let data = ActionData::build(node, step, &ctx).await.unwrap();
        assert!(data.has_related_object);
        assert_eq!(data.related_object.unwrap().name, "Sword");
        assert!(!data.has_floating_text);
        assert!(!data.child_node.has_child);
    }
}

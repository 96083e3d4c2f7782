// Scripting Engine - Jinja style templates with expressions and control flow
//
// The template sees its data under one root variable (`tale_choice`,
// `dialog`, ...) plus `owner`. `lang_key(path)` derives a key from where a
// string lives in that data rather than from the string itself.

use std::collections::BTreeMap;

use minijinja::{AutoEscape, Environment, State, Value};
use tale_types::{ExportTemplate, TemplateEngineKind, TemplateErrorKind};
use tracing::debug;

use super::{TemplateData, TemplateEngine};
use crate::context::ObjectData;
use crate::language_key::{
    LANG_KEY_FUNCTION, LanguageKeyPath, LanguageKeyRequest, PathToken, UNSUPPORTED_LANGUAGE_KEY, key_category,
    quote_lang_key_paths,
};
use crate::scope::RenderScope;
use crate::text::{escape_text, text_preview};

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptingEngine;

impl ScriptingEngine {
    fn environment<'source>(scope: &RenderScope) -> Environment<'source> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_: &str| AutoEscape::None);

        let settings = scope.settings.clone();
        env.add_filter("escape_text", move |value: String| escape_text(&value, &settings));
        let preview_length = scope.settings.preview_length;
        env.add_filter("text_preview", move |value: String, length: Option<usize>| {
            text_preview(&value, length.unwrap_or(preview_length))
        });

        let key_scope = scope.clone();
        env.add_function(LANG_KEY_FUNCTION, move |state: &State, path: String| {
            match language_key(&key_scope, state, &path) {
                Ok(key) => key,
                Err(message) => {
                    key_scope.report(TemplateErrorKind::CanNotGenerateLanguageKey, message);
                    UNSUPPORTED_LANGUAGE_KEY.to_string()
                }
            }
        });

        env
    }
}

impl TemplateEngine for ScriptingEngine {
    fn kind(&self) -> TemplateEngineKind {
        TemplateEngineKind::Scripting
    }

    fn render(&self, template: &ExportTemplate, data: TemplateData<'_>, scope: &RenderScope) -> String {
        let scope = scope.at(format!("template '{}'", template.name));
        let source = quote_lang_key_paths(&template.code);
        let env = Self::environment(&scope);

        let compiled = match env.template_from_str(&source) {
            Ok(compiled) => compiled,
            Err(err) => {
                debug!(template = %template.name, error = %err, "Template does not parse");
                let scope = match err.line() {
                    Some(line) => scope.at(format!("line {}", line)),
                    None => scope,
                };
                scope.report(TemplateErrorKind::TemplateParseError, err.to_string());
                return String::new();
            }
        };

        let mut context: BTreeMap<&str, Value> = BTreeMap::new();
        context.insert("owner", Value::from_serialize(ObjectData::from(scope.owner.as_ref())));
        context.insert(data.root_variable(), data.to_value());

        match compiled.render(context) {
            Ok(code) => code,
            Err(err) => {
                debug!(template = %template.name, error = %err, "Template failed to render");
                scope.report(TemplateErrorKind::TemplateUnsupportedOperation, err.to_string());
                format!("<<TEMPLATE ERROR: {}>>", err)
            }
        }
    }
}

fn text_attr(value: &Value, name: &str) -> Option<String> {
    value.get_attr(name).ok()?.as_str().map(str::to_string)
}

/// Key for the string at `path`, found by walking the render context
fn language_key(scope: &RenderScope, state: &State<'_, '_>, path: &str) -> Result<String, String> {
    let parsed = LanguageKeyPath::parse(path).ok_or_else(|| format!("'{}' is not a member path", path))?;
    let (parents, member) = parsed
        .split_last_member()
        .ok_or_else(|| format!("'{}' does not end in a member", path))?;

    let unresolved = || format!("'{}' does not resolve to a value", path);
    let mut parent = state
        .lookup(parsed.root())
        .filter(|value| !value.is_undefined())
        .ok_or_else(unresolved)?;
    for token in parents {
        let next = match token {
            PathToken::Member(name) => parent.get_attr(name),
            PathToken::Index(index) => parent.get_item_by_index(*index),
            PathToken::Key(key) => parent.get_item(&Value::from(key.as_str())),
        };
        parent = next
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_none())
            .ok_or_else(unresolved)?;
    }

    let unsupported = || format!("No language key can be generated for '{}'", path);
    let kind = text_attr(&parent, "kind").ok_or_else(unsupported)?;
    let object_type = text_attr(&parent, "object_type");
    let category = key_category(&kind, member, object_type.as_deref()).ok_or_else(unsupported)?;

    let attr = |name: &str| text_attr(&parent, name).ok_or_else(unsupported);
    let owner = scope.owner.as_ref();
    let (object_id, object_name, reference_id, text) = match kind.as_str() {
        "object" => {
            let id = attr("id")?;
            (id.clone(), attr("name")?, id, attr("name")?)
        }
        "field" => (attr("object_id")?, attr("object_name")?, attr("id")?, attr("value")?),
        "choice_option" => (
            owner.id.clone(),
            owner.name.clone(),
            format!("{}_{}", attr("node_id")?, attr("id")?),
            attr("unescaped_text")?,
        ),
        "action" => (owner.id.clone(), owner.name.clone(), attr("id")?, attr("unescaped_floating_text")?),
        _ => (owner.id.clone(), owner.name.clone(), attr("id")?, attr("unescaped_text")?),
    };

    Ok(scope.language_keys.key(LanguageKeyRequest {
        object_id: &object_id,
        object_name: &object_name,
        category,
        reference_id: &reference_id,
        text: &text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tale_types::{ExportSettings, LanguageKeyCategory, Speaker};
    use tokio_util::sync::CancellationToken;

    use crate::language_key::{DeterministicKeyGenerator, LanguageKeyRegistry};
    use crate::resolver::{CachedObjectResolver, InMemoryObjectStore};
    use crate::steps::{ChildNodeData, ChoiceData, ChoiceOptionData, StepData, TextLineData};
    use crate::test_support::{npc_with_fields, scope_with_objects};

    fn text_line(text: &str) -> StepData {
        StepData::TextLine(TextLineData {
            kind: "text_line",
            id: "t1".into(),
            speaker: Speaker::Npc,
            text: text.replace('"', "\\\""),
            unescaped_text: text.into(),
            text_preview: text.into(),
            child_node: ChildNodeData::default(),
        })
    }

    fn option(id: &str, text: &str) -> ChoiceOptionData {
        ChoiceOptionData {
            kind: "choice_option",
            id: id.into(),
            node_id: "c".into(),
            index: 0,
            text: text.into(),
            unescaped_text: text.into(),
            text_preview: text.into(),
            is_repeatable: false,
            has_condition: false,
            condition: String::new(),
            child_node: ChildNodeData::default(),
        }
    }

    #[test]
    fn test_render_text_line_with_key() {
        let scope = scope_with_objects(vec![]);
        let step = text_line("Hello \"you\"");
        let template = ExportTemplate::scripting(
            "npc_text_line",
            "say(\"{{ tale_text_line.text }}\", \"{{ lang_key(tale_text_line.text) }}\") -- {{ owner.name }}",
        );

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert_eq!(code, "say(\"Hello \\\"you\\\"\", \"Bob_owner_Dialog_t1\") -- Bob");
        assert!(scope.errors.is_empty());

        let entries = scope.language_keys.entries();
        assert_eq!(entries[0].text, "Hello \"you\"");
        assert_eq!(entries[0].category, LanguageKeyCategory::DialogLine);
    }

    #[test]
    fn test_loop_variable_keys() {
        let scope = scope_with_objects(vec![]);
        let step = StepData::Choice(ChoiceData {
            kind: "choice",
            id: "c".into(),
            choices: vec![option("1", "Yes"), option("2", "No")],
        });
        let template = ExportTemplate::scripting(
            "choice",
            "{% for choice in tale_choice.choices %}\n{{ lang_key(choice.text) }}\n{% endfor %}",
        );

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert_eq!(code, "Bob_owner_Choice_c_1\nBob_owner_Choice_c_2\n");
        assert_eq!(scope.language_keys.len(), 2);
    }

    #[test]
    fn test_owner_field_and_name_keys() {
        let owner = npc_with_fields("n1", "Bob", &[("Greeting", "Hi")]);
        let scope = RenderScope::new(
            "project",
            owner,
            ExportSettings::default(),
            Arc::new(CachedObjectResolver::new(Arc::new(InMemoryObjectStore::default()))),
            Arc::new(LanguageKeyRegistry::new(Arc::new(DeterministicKeyGenerator::new()))),
            CancellationToken::new(),
        );
        let step = text_line("x");
        let template = ExportTemplate::scripting(
            "npc_text_line",
            "{{ lang_key(owner.fields.Greeting.value) }} {{ lang_key(owner.name) }}",
        );

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert_eq!(code, "Bob_n1_Field_n1_f0 Bob_n1_Name_n1");

        let entries = scope.language_keys.entries();
        assert_eq!(entries[0].text, "Hi");
        assert_eq!(entries[0].category, LanguageKeyCategory::FieldValue);
        assert_eq!(entries[1].category, LanguageKeyCategory::ObjectName);
    }

    #[test]
    fn test_field_key_by_subscript() {
        let owner = npc_with_fields("n1", "Bob", &[("Greeting", "Hi")]);
        let scope = RenderScope::new(
            "project",
            owner,
            ExportSettings::default(),
            Arc::new(CachedObjectResolver::new(Arc::new(InMemoryObjectStore::default()))),
            Arc::new(LanguageKeyRegistry::new(Arc::new(DeterministicKeyGenerator::new()))),
            CancellationToken::new(),
        );
        let step = text_line("x");
        let template = ExportTemplate::scripting(
            "npc_text_line",
            r#"{{ lang_key(owner.fields["Greeting"].value) }} {{ lang_key(owner.fields['Greeting'].value) }}"#,
        );

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert_eq!(code, "Bob_n1_Field_n1_f0 Bob_n1_Field_n1_f0");
        assert!(scope.errors.is_empty());
        assert_eq!(scope.language_keys.len(), 1);
    }

    #[test]
    fn test_unsupported_key_path() {
        let scope = scope_with_objects(vec![]);
        let step = text_line("x");
        let template = ExportTemplate::scripting("npc_text_line", "{{ lang_key(tale_text_line.id) }}");

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert_eq!(code, UNSUPPORTED_LANGUAGE_KEY);

        let errors = scope.errors.entries();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, TemplateErrorKind::CanNotGenerateLanguageKey);
        assert!(scope.language_keys.is_empty());
    }

    #[test]
    fn test_parse_error_renders_nothing() {
        let scope = scope_with_objects(vec![]);
        let step = text_line("x");
        let template = ExportTemplate::scripting("npc_text_line", "{% if %}say(){% endif %}");

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert_eq!(code, "");

        let errors = scope.errors.entries();
        assert_eq!(errors[0].kind, TemplateErrorKind::TemplateParseError);
        assert!(errors[0].location.contains("template 'npc_text_line'"));
        assert!(scope.errors.has_fatal());
    }

    #[test]
    fn test_render_error_is_reported_inline() {
        let scope = scope_with_objects(vec![]);
        let step = text_line("x");
        let template = ExportTemplate::scripting("npc_text_line", "{{ not_a_function() }}");

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert!(code.starts_with("<<TEMPLATE ERROR:"));
        assert_eq!(scope.errors.entries()[0].kind, TemplateErrorKind::TemplateUnsupportedOperation);
    }

    #[test]
    fn test_filters() {
        let scope = scope_with_objects(vec![]);
        let step = text_line("A \"long\" line of text");
        let template = ExportTemplate::scripting(
            "npc_text_line",
            "{{ tale_text_line.unescaped_text | escape_text }}|{{ tale_text_line.unescaped_text | text_preview(4) }}",
        );

        let code = ScriptingEngine.render(&template, TemplateData::Step(&step), &scope);
        assert_eq!(code, "A \\\"long\\\" line of text|A \"l...");
    }
}

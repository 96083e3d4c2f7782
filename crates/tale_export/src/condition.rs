// Condition Renderer - Condition trees to target language boolean expressions
//
// Operators, comparators, literals and field access are all configurable so
// the same tree can be exported to any scripting language. Child groups are
// parenthesized only when their operator differs from the parent's.

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tale_types::{
    Comparator, Condition, ConditionElement, ConditionGroup, ExportObject, FieldComparison,
    FieldType, FlexField, GroupOperator, ObjectRef, Operand, TemplateErrorKind,
};
use tracing::debug;

use crate::error::Result;
use crate::placeholder::replace_placeholders;
use crate::scope::RenderScope;
use crate::text::escape_text;

/// Emitted in place of a comparison on an object that cannot be resolved
pub const OBJECT_NOT_FOUND: &str = "<<OBJECT NOT FOUND>>";
/// Emitted in place of a comparison on a field the object does not have
pub const FIELD_NOT_FOUND: &str = "<<FIELD NOT FOUND>>";

// ─────────────────────────────────────────────────────────────────────────────
// Syntax
// ─────────────────────────────────────────────────────────────────────────────

/// Target language syntax of boolean expressions
///
/// `field_access` is a legacy template receiving `Condition_ObjectId`,
/// `Condition_ObjectName`, `Condition_ObjectType`, `Condition_FieldName`,
/// `Condition_FieldId` and `Condition_FieldValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionSyntax {
    pub and_operator: String,
    pub or_operator: String,
    pub open_group: String,
    pub close_group: String,
    pub equal: String,
    pub not_equal: String,
    pub less: String,
    pub less_or_equal: String,
    pub greater: String,
    pub greater_or_equal: String,
    pub string_quote: String,
    pub true_literal: String,
    pub false_literal: String,
    pub null_literal: String,
    pub field_access: String,
}

impl Default for ConditionSyntax {
    fn default() -> Self {
        Self {
            and_operator: "and".to_string(),
            or_operator: "or".to_string(),
            open_group: "(".to_string(),
            close_group: ")".to_string(),
            equal: "==".to_string(),
            not_equal: "~=".to_string(),
            less: "<".to_string(),
            less_or_equal: "<=".to_string(),
            greater: ">".to_string(),
            greater_or_equal: ">=".to_string(),
            string_quote: "\"".to_string(),
            true_literal: "true".to_string(),
            false_literal: "false".to_string(),
            null_literal: "nil".to_string(),
            field_access:
                "get_{{Condition_ObjectType}}_value(\"{{Condition_ObjectId}}\", \"{{Condition_FieldName}}\")"
                    .to_string(),
        }
    }
}

impl ConditionSyntax {
    fn operator(&self, operator: GroupOperator) -> &str {
        match operator {
            GroupOperator::And => &self.and_operator,
            GroupOperator::Or => &self.or_operator,
        }
    }

    fn comparator(&self, comparator: Comparator) -> &str {
        match comparator {
            Comparator::Equal => &self.equal,
            Comparator::NotEqual => &self.not_equal,
            Comparator::Less => &self.less,
            Comparator::LessOrEqual => &self.less_or_equal,
            Comparator::Greater => &self.greater,
            Comparator::GreaterOrEqual => &self.greater_or_equal,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Renders condition trees for one export
#[derive(Debug, Clone, Default)]
pub struct ConditionRenderer {
    syntax: ConditionSyntax,
}

impl ConditionRenderer {
    pub fn new(syntax: ConditionSyntax) -> Self {
        Self { syntax }
    }

    pub fn syntax(&self) -> &ConditionSyntax {
        &self.syntax
    }

    /// Render a condition to a boolean expression
    ///
    /// A missing or empty condition is reported as `DialogConditionMissing` and
    /// rendered as an empty string. Unresolvable objects and fields are
    /// reported and rendered as visible markers. Only infrastructure failures
    /// are returned as errors.
    pub async fn render(&self, condition: Option<&Condition>, scope: &RenderScope) -> Result<String> {
        let Some(condition) = condition.filter(|c| !c.is_empty()) else {
            scope.report(TemplateErrorKind::DialogConditionMissing, "Condition has no elements");
            return Ok(String::new());
        };

        debug!(
            condition_id = condition.id.as_deref().unwrap_or(""),
            dependencies = condition.dependencies.len(),
            "Rendering condition"
        );
        self.render_group(&condition.root, scope).await
    }

    fn render_group<'a>(
        &'a self,
        group: &'a ConditionGroup,
        scope: &'a RenderScope,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            let mut parts = Vec::with_capacity(group.elements.len());

            for element in &group.elements {
                let part = match element {
                    ConditionElement::Compare(comparison) => {
                        self.render_comparison(comparison, scope).await?
                    }
                    ConditionElement::Group(child) => {
                        let inner = self.render_group(child, scope).await?;
                        if inner.is_empty() || child.operator == group.operator {
                            inner
                        } else {
                            format!("{}{}{}", self.syntax.open_group, inner, self.syntax.close_group)
                        }
                    }
                };
                if !part.is_empty() {
                    parts.push(part);
                }
            }

            let separator = format!(" {} ", self.syntax.operator(group.operator).trim());
            Ok(parts.join(&separator))
        }
        .boxed()
    }

    async fn render_comparison(&self, comparison: &FieldComparison, scope: &RenderScope) -> Result<String> {
        let Some((object, field)) = self.resolve_field(&comparison.object, &comparison.field, scope).await?
        else {
            return self.unresolved_marker(&comparison.object, &comparison.field, scope).await;
        };

        let left = self.field_access(&object, &field);
        let right = match &comparison.right {
            Operand::Literal { value } => self.literal(value, field.field_type, scope),
            Operand::Field {
                object: right_object,
                field: right_field,
            } => match self.resolve_field(right_object, right_field, scope).await? {
                Some((object, field)) => self.field_access(&object, &field),
                None => self.unresolved_marker(right_object, right_field, scope).await?,
            },
        };

        Ok(format!(
            "{} {} {}",
            left,
            self.syntax.comparator(comparison.comparator),
            right
        ))
    }

    /// Object and field of a comparison side, `None` if either is missing
    async fn resolve_field(
        &self,
        object: &ObjectRef,
        field: &str,
        scope: &RenderScope,
    ) -> Result<Option<(ExportObject, FlexField)>> {
        let Some(resolved) = scope.object(&object.object_id).await? else {
            return Ok(None);
        };
        let Some(flex_field) = resolved.field(field).cloned() else {
            return Ok(None);
        };
        Ok(Some((resolved, flex_field)))
    }

    /// Report why a comparison side cannot be resolved and return its marker
    async fn unresolved_marker(&self, object: &ObjectRef, field: &str, scope: &RenderScope) -> Result<String> {
        match scope.object(&object.object_id).await? {
            None => {
                scope.report(
                    TemplateErrorKind::ConditionObjectNotFound,
                    format!("{} '{}' does not exist", object.object_type, object.object_id),
                );
                Ok(OBJECT_NOT_FOUND.to_string())
            }
            Some(resolved) => {
                scope.report(
                    TemplateErrorKind::ConditionFieldNotFound,
                    format!("{} '{}' has no field '{}'", resolved.object_type, resolved.name, field),
                );
                Ok(FIELD_NOT_FOUND.to_string())
            }
        }
    }

    fn field_access(&self, object: &ExportObject, field: &FlexField) -> String {
        replace_placeholders(&self.syntax.field_access, |name| match name {
            "Condition_ObjectId" => Some(object.id.clone()),
            "Condition_ObjectName" => Some(object.name.clone()),
            "Condition_ObjectType" => Some(object.object_type.to_string()),
            "Condition_FieldName" => Some(field.name.clone()),
            "Condition_FieldId" => Some(field.id.clone()),
            "Condition_FieldValue" => Some(field.value.clone()),
            _ => None,
        })
    }

    fn literal(&self, value: &serde_json::Value, field_type: FieldType, scope: &RenderScope) -> String {
        use serde_json::Value;

        match value {
            Value::Null => self.syntax.null_literal.clone(),
            Value::Bool(true) => self.syntax.true_literal.clone(),
            Value::Bool(false) => self.syntax.false_literal.clone(),
            Value::Number(n) => n.to_string(),
            Value::String(s) if field_type == FieldType::Number && s.trim().parse::<f64>().is_ok() => {
                s.trim().to_string()
            }
            Value::String(s) => self.quoted(s, scope),
            other => self.quoted(&other.to_string(), scope),
        }
    }

    fn quoted(&self, text: &str, scope: &RenderScope) -> String {
        format!(
            "{quote}{}{quote}",
            escape_text(text, &scope.settings),
            quote = self.syntax.string_quote
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{npc_with_fields, scope_with_objects};
    use tale_types::ObjectType;

    fn compare(object: &str, field: &str, comparator: Comparator, right: Operand) -> FieldComparison {
        FieldComparison {
            object: ObjectRef::new(object, ObjectType::Npc),
            field: field.to_string(),
            comparator,
            right,
        }
    }

    fn renderer() -> ConditionRenderer {
        ConditionRenderer::new(ConditionSyntax {
            field_access: "{{Condition_ObjectName}}.{{Condition_FieldName}}".to_string(),
            ..ConditionSyntax::default()
        })
    }

    #[tokio::test]
    async fn test_missing_condition_reports_and_renders_empty() {
        let scope = scope_with_objects(vec![]);
        let out = renderer().render(None, &scope).await.unwrap();
        assert_eq!(out, "");

        let empty = Condition::new(ConditionGroup::new(GroupOperator::And));
        assert_eq!(renderer().render(Some(&empty), &scope).await.unwrap(), "");

        let kinds: Vec<_> = scope.errors.entries().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![TemplateErrorKind::DialogConditionMissing; 2]);
    }

    #[tokio::test]
    async fn test_parentheses_only_on_operator_change() {
        let scope = scope_with_objects(vec![npc_with_fields("n1", "Bob", &[("Gold", "10"), ("Mood", "happy")])]);
        let gold = compare("n1", "Gold", Comparator::Greater, Operand::literal(5));
        let mood = compare("n1", "Mood", Comparator::Equal, Operand::literal("angry"));

        let tree = ConditionGroup::new(GroupOperator::And)
            .compare(gold.clone())
            .group(ConditionGroup::new(GroupOperator::Or).compare(mood.clone()).compare(gold.clone()))
            .group(ConditionGroup::new(GroupOperator::And).compare(mood));

        let out = renderer().render(Some(&Condition::new(tree)), &scope).await.unwrap();
        assert_eq!(
            out,
            "Bob.Gold > 5 and (Bob.Mood == \"angry\" or Bob.Gold > 5) and Bob.Mood == \"angry\""
        );
        assert!(scope.errors.is_empty());
    }

    #[tokio::test]
    async fn test_number_field_literals_stay_unquoted() {
        let scope = scope_with_objects(vec![npc_with_fields("n1", "Bob", &[("Gold", "10")])]);
        let tree = ConditionGroup::new(GroupOperator::And).compare(compare(
            "n1",
            "Gold",
            Comparator::LessOrEqual,
            Operand::literal("20"),
        ));
        let out = renderer().render(Some(&Condition::new(tree)), &scope).await.unwrap();
        assert_eq!(out, "Bob.Gold <= 20");
    }

    #[tokio::test]
    async fn test_unresolved_objects_and_fields() {
        let scope = scope_with_objects(vec![npc_with_fields("n1", "Bob", &[])]);
        let tree = ConditionGroup::new(GroupOperator::Or)
            .compare(compare("ghost", "Gold", Comparator::Equal, Operand::literal(1)))
            .compare(compare("n1", "Gold", Comparator::Equal, Operand::literal(1)));

        let out = renderer().render(Some(&Condition::new(tree)), &scope).await.unwrap();
        assert_eq!(out, format!("{} or {}", OBJECT_NOT_FOUND, FIELD_NOT_FOUND));

        let kinds: Vec<_> = scope.errors.entries().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TemplateErrorKind::ConditionObjectNotFound,
                TemplateErrorKind::ConditionFieldNotFound
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_lookup_fails() {
        let scope = scope_with_objects(vec![npc_with_fields("n1", "Bob", &[("Gold", "1")])]);
        scope.cancel.cancel();
        let tree = ConditionGroup::new(GroupOperator::And)
            .compare(compare("n1", "Gold", Comparator::Equal, Operand::literal(1)));
        let result = renderer().render(Some(&Condition::new(tree)), &scope).await;
        assert!(matches!(result, Err(crate::ExportError::Cancelled)));
    }
}

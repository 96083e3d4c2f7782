// Condition Trees - Structured boolean guards on dialog branches
//
// A condition is a tree of AND/OR groups whose leaves compare a field of an
// external export object against a literal or another field.

use serde::{Deserialize, Serialize};

use crate::ObjectRef;

/// Boolean operator joining the elements of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

/// Comparison operator of an atomic condition element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    #[serde(alias = "==")]
    Equal,
    #[serde(alias = "!=")]
    NotEqual,
    #[serde(alias = "<")]
    Less,
    #[serde(alias = "<=")]
    LessOrEqual,
    #[serde(alias = ">")]
    Greater,
    #[serde(alias = ">=")]
    GreaterOrEqual,
}

/// Right hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operand {
    /// A literal JSON value (string, number, bool or null)
    Literal { value: serde_json::Value },
    /// Another field of an export object
    Field { object: ObjectRef, field: String },
}

impl Operand {
    /// Create a literal operand
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Operand::Literal {
            value: value.into(),
        }
    }
}

/// `<object>.<field> <comparator> <right>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub object: ObjectRef,
    /// Field name (or field id) on the referenced object
    pub field: String,
    pub comparator: Comparator,
    pub right: Operand,
}

/// Element of a condition group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionElement {
    Group(ConditionGroup),
    Compare(FieldComparison),
}

/// AND/OR group of elements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(default)]
    pub operator: GroupOperator,
    #[serde(default)]
    pub elements: Vec<ConditionElement>,
}

impl ConditionGroup {
    /// Create an empty group with the given operator
    pub fn new(operator: GroupOperator) -> Self {
        Self {
            operator,
            elements: Vec::new(),
        }
    }

    /// Add a comparison (builder style)
    pub fn compare(mut self, comparison: FieldComparison) -> Self {
        self.elements.push(ConditionElement::Compare(comparison));
        self
    }

    /// Add a nested group (builder style)
    pub fn group(mut self, group: ConditionGroup) -> Self {
        self.elements.push(ConditionElement::Group(group));
        self
    }

    /// Whether the group has no comparison anywhere below it
    pub fn is_empty(&self) -> bool {
        self.elements.iter().all(|e| match e {
            ConditionElement::Group(g) => g.is_empty(),
            ConditionElement::Compare(_) => false,
        })
    }

    fn collect_objects<'a>(&'a self, out: &mut Vec<&'a ObjectRef>) {
        for element in &self.elements {
            match element {
                ConditionElement::Group(group) => group.collect_objects(out),
                ConditionElement::Compare(cmp) => {
                    push_unique(out, &cmp.object);
                    if let Operand::Field { object, .. } = &cmp.right {
                        push_unique(out, object);
                    }
                }
            }
        }
    }
}

fn push_unique<'a>(out: &mut Vec<&'a ObjectRef>, object: &'a ObjectRef) {
    if !out.iter().any(|o| o.object_id == object.object_id) {
        out.push(object);
    }
}

/// A complete condition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub root: ConditionGroup,
    /// Objects this condition depends on, as stored by the authoring tool (for search)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ObjectRef>,
}

impl Condition {
    /// Create a condition from a root group
    pub fn new(root: ConditionGroup) -> Self {
        let mut condition = Self {
            id: None,
            root,
            dependencies: Vec::new(),
        };
        condition.dependencies = condition.referenced_objects().into_iter().cloned().collect();
        condition
    }

    /// All objects referenced anywhere in the tree, each once, in first-seen order
    pub fn referenced_objects(&self) -> Vec<&ObjectRef> {
        let mut out = Vec::new();
        self.root.collect_objects(&mut out);
        out
    }

    /// Whether the condition contains no comparison
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectType;

    fn cmp(object_id: &str, field: &str) -> FieldComparison {
        FieldComparison {
            object: ObjectRef::new(object_id, ObjectType::Npc),
            field: field.to_string(),
            comparator: Comparator::Equal,
            right: Operand::literal(1),
        }
    }

    #[test]
    fn test_referenced_objects_are_unique() {
        let mut nested = cmp("npc-2", "mood");
        nested.right = Operand::Field {
            object: ObjectRef::new("npc-1", ObjectType::Npc),
            field: "mood".to_string(),
        };

        let condition = Condition::new(
            ConditionGroup::new(GroupOperator::And)
                .compare(cmp("npc-1", "gold"))
                .group(ConditionGroup::new(GroupOperator::Or).compare(nested)),
        );

        let ids: Vec<_> = condition
            .referenced_objects()
            .iter()
            .map(|o| o.object_id.as_str())
            .collect();
        assert_eq!(ids, vec!["npc-1", "npc-2"]);
        assert_eq!(condition.dependencies.len(), 2);
    }

    #[test]
    fn test_empty_condition() {
        let condition = Condition::new(
            ConditionGroup::new(GroupOperator::And).group(ConditionGroup::new(GroupOperator::Or)),
        );
        assert!(condition.is_empty());
    }

    #[test]
    fn test_condition_json() {
        let json = r#"{
            "root": {
                "operator": "or",
                "elements": [
                    {"type": "compare", "object": {"object_id": "n", "object_type": "npc"},
                     "field": "gold", "comparator": ">=", "right": {"type": "literal", "value": 10}}
                ]
            }
        }"#;
        let condition: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(condition.root.operator, GroupOperator::Or);
        match &condition.root.elements[0] {
            ConditionElement::Compare(c) => assert_eq!(c.comparator, Comparator::GreaterOrEqual),
            other => panic!("unexpected element {:?}", other),
        }
    }
}

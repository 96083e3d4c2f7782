// Export Objects - External objects referenced by dialogs and conditions
//
// NPCs, the player, items, skills and quests are authored elsewhere; the export
// pipeline only reads their current snapshot through a resolver.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of an exported object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    #[default]
    Npc,
    Player,
    Item,
    Skill,
    Quest,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Npc => "npc",
            ObjectType::Player => "player",
            ObjectType::Item => "item",
            ObjectType::Skill => "skill",
            ObjectType::Quest => "quest",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an exported object by id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_id: String,
    #[serde(default)]
    pub object_type: ObjectType,
}

impl ObjectRef {
    pub fn new(object_id: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            object_id: object_id.into(),
            object_type,
        }
    }
}

/// Value type of a flex field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Option,
}

/// A user defined field on an export object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexField {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub value: String,
}

/// Snapshot of an exported object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub object_type: ObjectType,
    #[serde(default)]
    pub fields: Vec<FlexField>,
}

impl ExportObject {
    /// Create an object without fields
    pub fn new(id: impl Into<String>, name: impl Into<String>, object_type: ObjectType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            object_type,
            fields: Vec::new(),
        }
    }

    /// Add a field (builder style)
    pub fn with_field(mut self, field: FlexField) -> Self {
        self.fields.push(field);
        self
    }

    /// Find a field by name, falling back to id
    pub fn field(&self, name_or_id: &str) -> Option<&FlexField> {
        self.fields
            .iter()
            .find(|f| f.name == name_or_id)
            .or_else(|| self.fields.iter().find(|f| f.id == name_or_id))
    }

    /// Reference to this object
    pub fn to_ref(&self) -> ObjectRef {
        ObjectRef::new(self.id.clone(), self.object_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup_by_name_then_id() {
        let npc = ExportObject::new("n1", "Bob", ObjectType::Npc).with_field(FlexField {
            id: "f1".into(),
            name: "Mood".into(),
            field_type: FieldType::Text,
            value: "grumpy".into(),
        });

        assert_eq!(npc.field("Mood").map(|f| f.value.as_str()), Some("grumpy"));
        assert_eq!(npc.field("f1").map(|f| f.name.as_str()), Some("Mood"));
        assert!(npc.field("Gold").is_none());
        assert_eq!(npc.to_ref().object_type, ObjectType::Npc);
    }
}

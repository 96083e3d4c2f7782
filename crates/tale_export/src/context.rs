// Template Context - Tagged data shared by all templates
//
// Every context value carries a `kind` tag. Scripting templates expose it, and
// `lang_key` uses it to find out which part of the data model a string came
// from.

use std::collections::BTreeMap;

use serde::Serialize;
use tale_types::{ExportObject, FieldType, FlexField, LanguageKeyCategory, ObjectType};

use crate::language_key::LanguageKeyRequest;
use crate::text::sanitize_identifier;

/// Flex field of an object
#[derive(Debug, Clone, Serialize)]
pub struct FieldData {
    pub kind: &'static str,
    pub id: String,
    pub name: String,
    pub field_type: FieldType,
    pub value: String,
    pub object_id: String,
    pub object_name: String,
}

impl FieldData {
    fn new(object: &ExportObject, field: &FlexField) -> Self {
        Self {
            kind: "field",
            id: field.id.clone(),
            name: field.name.clone(),
            field_type: field.field_type,
            value: field.value.clone(),
            object_id: object.id.clone(),
            object_name: object.name.clone(),
        }
    }
}

/// Export object, fields keyed by identifier-safe field name
#[derive(Debug, Clone, Serialize)]
pub struct ObjectData {
    pub kind: &'static str,
    pub id: String,
    pub name: String,
    pub object_type: ObjectType,
    pub fields: BTreeMap<String, FieldData>,
}

impl From<&ExportObject> for ObjectData {
    fn from(object: &ExportObject) -> Self {
        Self {
            kind: "object",
            id: object.id.clone(),
            name: object.name.clone(),
            object_type: object.object_type,
            fields: object
                .fields
                .iter()
                .map(|field| (sanitize_identifier(&field.name), FieldData::new(object, field)))
                .collect(),
        }
    }
}

impl ObjectData {
    /// Key request for this object's name
    pub fn name_key_request(&self) -> LanguageKeyRequest<'_> {
        LanguageKeyRequest {
            object_id: &self.id,
            object_name: &self.name,
            category: if self.object_type == ObjectType::Quest {
                LanguageKeyCategory::QuestText
            } else {
                LanguageKeyCategory::ObjectName
            },
            reference_id: &self.id,
            text: &self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_data_tags_and_field_keys() {
        let quest = ExportObject::new("q1", "Lost Ring", ObjectType::Quest).with_field(FlexField {
            id: "f1".into(),
            name: "Reward Gold".into(),
            field_type: FieldType::Number,
            value: "50".into(),
        });
        let data = ObjectData::from(&quest);

        assert_eq!(data.kind, "object");
        assert_eq!(data.fields["Reward_Gold"].kind, "field");
        assert_eq!(data.fields["Reward_Gold"].object_name, "Lost Ring");
        assert_eq!(data.name_key_request().category, LanguageKeyCategory::QuestText);
    }
}

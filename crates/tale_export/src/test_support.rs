// Shared fixtures for unit tests

use std::sync::Arc;

use tale_types::{ExportObject, ExportSettings, FieldType, FlexField, ObjectType};
use tokio_util::sync::CancellationToken;

use crate::language_key::{DeterministicKeyGenerator, LanguageKeyRegistry};
use crate::resolver::{CachedObjectResolver, InMemoryObjectStore};
use crate::scope::RenderScope;

/// Npc with text or number fields, typed by whether the value parses as a number
pub fn npc_with_fields(id: &str, name: &str, fields: &[(&str, &str)]) -> ExportObject {
    fields
        .iter()
        .enumerate()
        .fold(ExportObject::new(id, name, ObjectType::Npc), |npc, (i, (field, value))| {
            npc.with_field(FlexField {
                id: format!("{}_f{}", id, i),
                name: field.to_string(),
                field_type: if value.parse::<f64>().is_ok() {
                    FieldType::Number
                } else {
                    FieldType::Text
                },
                value: value.to_string(),
            })
        })
}

/// Scope owned by an npc called "Bob", resolving the given objects
pub fn scope_with_objects(objects: Vec<ExportObject>) -> RenderScope {
    let store: InMemoryObjectStore = objects.into_iter().collect();
    RenderScope::new(
        "project",
        ExportObject::new("owner", "Bob", ObjectType::Npc),
        ExportSettings::default(),
        Arc::new(CachedObjectResolver::new(Arc::new(store))),
        Arc::new(LanguageKeyRegistry::new(Arc::new(DeterministicKeyGenerator::new()))),
        CancellationToken::new(),
    )
}

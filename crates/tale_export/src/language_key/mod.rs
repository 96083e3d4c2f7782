// Language Keys - Stable keys for translatable strings
//
// Templates emit keys instead of literal text; the key/text pairs of one export
// are collected so a language file can be written next to the code.

mod path;

pub use path::*;

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tale_types::{LanguageKeyCategory, LanguageKeyEntry};
use tracing::trace;

use crate::catalog::PlaceholderDescription;
use crate::text::sanitize_identifier;

/// Placeholder emitted when no key can be derived for a template expression
pub const UNSUPPORTED_LANGUAGE_KEY: &str = "<<UNSUPPORTED PROPERTY FOR LANGKEY>>";

/// Paths `lang_key` accepts in scripting templates
pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("lang_key(owner.name)", "Key of the owning object's name"),
    PlaceholderDescription::new("lang_key(owner.fields.<Field>.value)", "Key of a field value of the owning object"),
    PlaceholderDescription::new("lang_key(tale_text_line.text)", "Key of a text line"),
    PlaceholderDescription::new("lang_key(tale_choice.choices[i].text)", "Key of a choice option text"),
    PlaceholderDescription::new("lang_key(tale_action.floating_text)", "Key of an action's floating text"),
    PlaceholderDescription::new("lang_key(tale_action.related_object.name)", "Key of the name of an action's object"),
    PlaceholderDescription::new("lang_key(tale_reference.text)", "Key of a reference text"),
    PlaceholderDescription::new("lang_key(tale_reference.referenced_object.name)", "Key of the referenced object's name"),
];

/// Derives a language key from the identity of a text
///
/// Keys must be a pure function of their inputs, so exporting unchanged content
/// twice yields the same keys. The source text is passed for generators that
/// derive keys from content.
pub trait LanguageKeyGenerator: Send + Sync {
    fn get_key(
        &self,
        object_id: &str,
        object_name: &str,
        category: LanguageKeyCategory,
        reference_id: &str,
        source_text: &str,
    ) -> String;
}

/// `<ObjectName>_<ObjectId>_<Category>_<ReferenceId>`
///
/// The object id keeps keys of same-named objects apart. A name that
/// sanitizes to nothing is left out.
#[derive(Debug, Clone, Default)]
pub struct DeterministicKeyGenerator {
    /// Prepended to every key when set
    pub prefix: Option<String>,
}

impl DeterministicKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl LanguageKeyGenerator for DeterministicKeyGenerator {
    fn get_key(
        &self,
        object_id: &str,
        object_name: &str,
        category: LanguageKeyCategory,
        reference_id: &str,
        _source_text: &str,
    ) -> String {
        let name = sanitize_identifier(object_name);

        let mut key = String::new();
        if let Some(prefix) = &self.prefix {
            key.push_str(prefix);
            key.push('_');
        }
        if !name.is_empty() {
            key.push_str(&name);
            key.push('_');
        }
        key.push_str(&sanitize_identifier(object_id));
        key.push('_');
        key.push_str(category.key_segment());
        key.push('_');
        key.push_str(&sanitize_identifier(reference_id));
        key
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of one translatable text
#[derive(Debug, Clone, Copy)]
pub struct LanguageKeyRequest<'a> {
    pub object_id: &'a str,
    pub object_name: &'a str,
    pub category: LanguageKeyCategory,
    /// Field id or node id inside the object
    pub reference_id: &'a str,
    /// Current source text
    pub text: &'a str,
}

/// Generates keys for one export and records every key handed out
///
/// Each key is recorded once, in first-use order, with the text it was first
/// requested for.
pub struct LanguageKeyRegistry {
    generator: Arc<dyn LanguageKeyGenerator>,
    entries: Mutex<RegistryEntries>,
}

#[derive(Default)]
struct RegistryEntries {
    seen: HashSet<String>,
    ordered: Vec<LanguageKeyEntry>,
}

impl LanguageKeyRegistry {
    pub fn new(generator: Arc<dyn LanguageKeyGenerator>) -> Self {
        Self {
            generator,
            entries: Mutex::new(RegistryEntries::default()),
        }
    }

    /// Get the key for a text, recording it on first use
    pub fn key(&self, request: LanguageKeyRequest<'_>) -> String {
        let key = self.generator.get_key(
            request.object_id,
            request.object_name,
            request.category,
            request.reference_id,
            request.text,
        );

        let mut entries = self.entries.lock();
        if entries.seen.insert(key.clone()) {
            trace!(key = %key, category = %request.category, "Generated language key");
            entries.ordered.push(LanguageKeyEntry {
                key: key.clone(),
                text: request.text.to_string(),
                category: request.category,
                object_id: request.object_id.to_string(),
                reference_id: request.reference_id.to_string(),
            });
        }
        key
    }

    /// All recorded entries in first-use order
    pub fn entries(&self) -> Vec<LanguageKeyEntry> {
        self.entries.lock().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(reference_id: &'a str, text: &'a str) -> LanguageKeyRequest<'a> {
        LanguageKeyRequest {
            object_id: "npc-1",
            object_name: "Old Bob",
            category: LanguageKeyCategory::DialogLine,
            reference_id,
            text,
        }
    }

    #[test]
    fn test_key_format() {
        let generator = DeterministicKeyGenerator::new();
        let key = generator.get_key("npc-1", "Old Bob", LanguageKeyCategory::ChoiceText, "c1_2", "Yes");
        assert_eq!(key, "Old_Bob_npc_1_Choice_c1_2");

        let prefixed = DeterministicKeyGenerator::with_prefix("DLG");
        assert_eq!(
            prefixed.get_key("npc-1", "", LanguageKeyCategory::ObjectName, "npc-1", ""),
            "DLG_npc_1_Name_npc_1"
        );
    }

    #[test]
    fn test_same_named_objects_get_distinct_keys() {
        let generator = DeterministicKeyGenerator::new();
        let first = generator.get_key("npc-1", "Guard", LanguageKeyCategory::DialogLine, "t1", "Halt");
        let second = generator.get_key("npc-2", "Guard", LanguageKeyCategory::DialogLine, "t1", "Halt");
        assert_ne!(first, second);
        assert_eq!(first, "Guard_npc_1_Dialog_t1");
        assert_eq!(second, "Guard_npc_2_Dialog_t1");
    }

    #[test]
    fn test_keys_are_stable_across_registries() {
        let generator: Arc<dyn LanguageKeyGenerator> = Arc::new(DeterministicKeyGenerator::new());
        let first = LanguageKeyRegistry::new(generator.clone());
        let second = LanguageKeyRegistry::new(generator);

        let ids = ["t1", "t2", "t3"];
        let a: Vec<_> = ids.iter().map(|id| first.key(request(id, "Hello"))).collect();
        let b: Vec<_> = ids.iter().map(|id| second.key(request(id, "Hello"))).collect();
        assert_eq!(a, b);
        assert_eq!(first.entries(), second.entries());
    }

    #[test]
    fn test_registry_records_each_key_once() {
        let registry = LanguageKeyRegistry::new(Arc::new(DeterministicKeyGenerator::new()));
        registry.key(request("t1", "Hello"));
        registry.key(request("t2", "Bye"));
        registry.key(request("t1", "Hello again"));

        let entries = registry.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Hello");
        assert_eq!(entries[1].key, "Old_Bob_npc_1_Dialog_t2");
    }
}

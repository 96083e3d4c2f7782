// Language File Document - Key/text table collected during an export

use serde::Serialize;
use tale_types::{ExportSettings, LanguageKeyEntry};

use crate::catalog::PlaceholderDescription;
use crate::placeholder::{render_list_range, replace_block_placeholders, replace_placeholders};
use crate::text::escape_text;

#[derive(Debug, Clone, Serialize)]
pub struct LanguageKeyData {
    pub kind: &'static str,
    pub key: String,
    /// Escaped text
    pub value: String,
    pub unescaped_value: String,
    pub category: String,
    pub object_id: String,
}

impl LanguageKeyData {
    pub fn new(entry: &LanguageKeyEntry, settings: &ExportSettings) -> Self {
        Self {
            kind: "language_key",
            key: entry.key.clone(),
            value: escape_text(&entry.text, settings),
            unescaped_value: entry.text.clone(),
            category: entry.category.to_string(),
            object_id: entry.object_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageFileData {
    pub kind: &'static str,
    pub project_id: String,
    pub project_name: String,
    pub keys: Vec<LanguageKeyData>,
}

impl LanguageFileData {
    pub fn new(project_id: &str, project_name: &str, entries: &[LanguageKeyEntry], settings: &ExportSettings) -> Self {
        Self {
            kind: "language_file",
            project_id: project_id.to_string(),
            project_name: project_name.to_string(),
            keys: entries.iter().map(|entry| LanguageKeyData::new(entry, settings)).collect(),
        }
    }
}

pub fn fill(code: &str, data: &LanguageFileData) -> String {
    let code = render_list_range(code, "LangKeys", &data.keys, |inner, key, _| {
        replace_placeholders(inner, |name| match name {
            "LangKey_Key" => Some(key.key.clone()),
            "LangKey_Value" => Some(key.value.clone()),
            "LangKey_Value_Unescaped" => Some(key.unescaped_value.clone()),
            "LangKey_Category" => Some(key.category.clone()),
            "LangKey_ObjectId" => Some(key.object_id.clone()),
            _ => None,
        })
    });

    replace_block_placeholders(&code, |name| match name {
        "LangFile_ProjectId" => Some(data.project_id.clone()),
        "LangFile_ProjectName" => Some(data.project_name.clone()),
        _ => None,
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("LangFile_ProjectId", "Id of the exported project"),
    PlaceholderDescription::new("LangFile_ProjectName", "Name of the exported project"),
    PlaceholderDescription::new("LangKeys_Start", "Content rendered once per language key"),
    PlaceholderDescription::new("LangKeys_End", "Ends LangKeys_Start"),
    PlaceholderDescription::new("LangKey_Key", "Generated language key"),
    PlaceholderDescription::new("LangKey_Value", "Escaped text of the key"),
    PlaceholderDescription::new("LangKey_Value_Unescaped", "Raw text of the key"),
    PlaceholderDescription::new("LangKey_Category", "Category the key was generated for"),
    PlaceholderDescription::new("LangKey_ObjectId", "Id of the object the key belongs to"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("language_file.project_id", "Id of the exported project"),
    PlaceholderDescription::new("language_file.project_name", "Name of the exported project"),
    PlaceholderDescription::new("language_file.keys", "Language keys in the order they were generated"),
    PlaceholderDescription::new("language_file.keys[i].key", "Generated language key"),
    PlaceholderDescription::new("language_file.keys[i].value", "Escaped text of the key"),
    PlaceholderDescription::new("language_file.keys[i].unescaped_value", "Raw text of the key"),
    PlaceholderDescription::new("language_file.keys[i].category", "Category the key was generated for"),
];

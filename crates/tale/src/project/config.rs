//! Project Configuration Types
//!
//! Defines the structure of project files on disk.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tale_export::{ConditionSyntax, DeterministicKeyGenerator, FunctionNaming, SplitRule};
use tale_types::{ExportSettings, NodeGraphSnippet, TemplateEngineKind};

/// Project manifest (project.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub project: ProjectInfo,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub functions: FunctionsConfig,
    #[serde(default)]
    pub conditions: ConditionSyntax,
    #[serde(default)]
    pub language_keys: LanguageKeysConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Project information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
}

/// Function naming and split rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionsConfig {
    pub name_template: String,
    pub category_prefix: String,
    /// Evaluated in order, first match wins
    pub rules: Vec<SplitRule>,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        let naming = FunctionNaming::default();
        Self {
            name_template: naming.name_template,
            category_prefix: naming.category_prefix,
            rules: Vec::new(),
        }
    }
}

impl FunctionsConfig {
    pub fn naming(&self) -> FunctionNaming {
        FunctionNaming {
            name_template: self.name_template.clone(),
            category_prefix: self.category_prefix.clone(),
        }
    }
}

/// Language key generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageKeysConfig {
    /// Prepended to every generated key
    pub prefix: Option<String>,
}

impl LanguageKeysConfig {
    pub fn key_generator(&self) -> DeterministicKeyGenerator {
        match self.prefix.as_deref().filter(|p| !p.is_empty()) {
            Some(prefix) => DeterministicKeyGenerator::with_prefix(prefix),
            None => DeterministicKeyGenerator::new(),
        }
    }
}

/// Template engines and location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory of template files, relative to the project
    pub directory: String,
    /// File extension of template files
    pub extension: String,
    /// Engine of templates without an entry in `engines`
    pub engine: TemplateEngineKind,
    /// Engine per template name
    pub engines: HashMap<String, TemplateEngineKind>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: "templates".to_string(),
            extension: "tpl".to_string(),
            engine: TemplateEngineKind::Legacy,
            engines: HashMap::new(),
        }
    }
}

impl TemplatesConfig {
    /// Engine rendering the template `name`
    pub fn engine_for(&self, name: &str) -> TemplateEngineKind {
        self.engines.get(name).copied().unwrap_or(self.engine)
    }
}

/// Function counter database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the redb database, relative to the project
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "data/counters.redb".to_string(),
        }
    }
}

/// Generated files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File extension of generated code
    pub extension: String,
    /// File name of the language file
    pub language_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: "lua".to_string(),
            language_file: "language.lua".to_string(),
        }
    }
}

/// Dialog of one object (dialogs/*.json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    pub object_id: String,
    pub snippet: NodeGraphSnippet,
}

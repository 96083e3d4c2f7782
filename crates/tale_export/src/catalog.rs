// Placeholder Catalog - Static lists of every placeholder a template can use

use serde::Serialize;
use tale_types::TemplateEngineKind;

use crate::{document, language_key, steps};

/// A supported placeholder (legacy) or context path (scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaceholderDescription {
    pub name: &'static str,
    pub description: &'static str,
}

impl PlaceholderDescription {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

/// All placeholders supported by an engine, grouped by owner
pub fn placeholder_catalog(engine: TemplateEngineKind) -> Vec<PlaceholderDescription> {
    let groups: &[&[PlaceholderDescription]] = match engine {
        TemplateEngineKind::Legacy => &[
            steps::COMMON_LEGACY_PLACEHOLDERS,
            steps::text_line::LEGACY_PLACEHOLDERS,
            steps::choice::LEGACY_PLACEHOLDERS,
            steps::condition::LEGACY_PLACEHOLDERS,
            steps::action::LEGACY_PLACEHOLDERS,
            steps::reference::LEGACY_PLACEHOLDERS,
            steps::child::LEGACY_PLACEHOLDERS,
            document::dialog::LEGACY_PLACEHOLDERS,
            document::state_machine::LEGACY_PLACEHOLDERS,
            document::language_file::LEGACY_PLACEHOLDERS,
        ],
        TemplateEngineKind::Scripting => &[
            steps::COMMON_SCRIPTING_PLACEHOLDERS,
            steps::text_line::SCRIPTING_PLACEHOLDERS,
            steps::choice::SCRIPTING_PLACEHOLDERS,
            steps::condition::SCRIPTING_PLACEHOLDERS,
            steps::action::SCRIPTING_PLACEHOLDERS,
            steps::reference::SCRIPTING_PLACEHOLDERS,
            steps::child::SCRIPTING_PLACEHOLDERS,
            document::dialog::SCRIPTING_PLACEHOLDERS,
            document::state_machine::SCRIPTING_PLACEHOLDERS,
            document::language_file::SCRIPTING_PLACEHOLDERS,
            language_key::SCRIPTING_PLACEHOLDERS,
        ],
    };

    groups.iter().flat_map(|group| group.iter().copied()).collect()
}

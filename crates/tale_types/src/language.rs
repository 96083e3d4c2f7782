// Language Keys - Stable identifiers of translatable strings

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of text a language key identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageKeyCategory {
    /// Name of an npc, the player, an item or a skill
    ObjectName,
    /// Value of a flex field
    FieldValue,
    /// Text line or floating text of a dialog node
    DialogLine,
    /// Text of a choice option
    ChoiceText,
    /// Name of a quest
    QuestText,
}

impl LanguageKeyCategory {
    /// Segment used inside generated keys
    pub fn key_segment(&self) -> &'static str {
        match self {
            LanguageKeyCategory::ObjectName => "Name",
            LanguageKeyCategory::FieldValue => "Field",
            LanguageKeyCategory::DialogLine => "Dialog",
            LanguageKeyCategory::ChoiceText => "Choice",
            LanguageKeyCategory::QuestText => "Quest",
        }
    }
}

impl fmt::Display for LanguageKeyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_segment())
    }
}

/// A generated key together with the text it stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageKeyEntry {
    pub key: String,
    /// Source text at export time
    pub text: String,
    pub category: LanguageKeyCategory,
    /// Object owning the text
    pub object_id: String,
    /// Field id or node id inside the object
    pub reference_id: String,
}

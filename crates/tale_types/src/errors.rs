// Template Errors - Soft-failure error collection of one export
//
// Content authoring mistakes never abort an export. They are collected here and
// returned next to the (partially degraded) generated code.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Error Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of a template error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateErrorKind {
    /// The template could not be parsed; its output is empty
    TemplateParseError,
    /// The node graph has no single start node or links to unknown nodes
    GraphStructureInvalid,
    /// The node graph contains a cycle
    GraphCycleDetected,
    /// A condition branch has no condition
    DialogConditionMissing,
    /// A condition references an object that does not exist
    ConditionObjectNotFound,
    /// A condition references a field the object does not have
    ConditionFieldNotFound,
    /// No language key can be derived for a template expression
    CanNotGenerateLanguageKey,
    /// The template uses an operation the engine does not support
    TemplateUnsupportedOperation,
}

impl TemplateErrorKind {
    /// Fatal errors abort the rendering of a template or a whole export
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TemplateErrorKind::TemplateParseError
                | TemplateErrorKind::GraphStructureInvalid
                | TemplateErrorKind::GraphCycleDetected
        )
    }
}

impl fmt::Display for TemplateErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single error entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateError {
    pub kind: TemplateErrorKind,
    /// Human readable description
    pub message: String,
    /// Formatted source location (object, template, node, line)
    pub location: String,
}

impl TemplateError {
    pub fn new(
        kind: TemplateErrorKind,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            location: location.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.kind, self.message, self.location)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error Collection
// ─────────────────────────────────────────────────────────────────────────────

/// Append-only error collection of one export
///
/// Cloning yields a handle to the same collection, so template callbacks can
/// record errors while the engine renders. Concurrent renders of one export use
/// separate collections and merge them with [`extend_from`](Self::extend_from).
#[derive(Debug, Clone, Default)]
pub struct TemplateErrorCollection {
    entries: Arc<Mutex<Vec<TemplateError>>>,
}

impl TemplateErrorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    pub fn push(&self, error: TemplateError) {
        self.entries.lock().push(error);
    }

    /// Record an error from its parts
    pub fn add(&self, kind: TemplateErrorKind, message: impl Into<String>, location: impl Into<String>) {
        self.push(TemplateError::new(kind, message, location));
    }

    /// Append all entries of another collection, preserving their order
    pub fn extend_from(&self, other: &TemplateErrorCollection) {
        if Arc::ptr_eq(&self.entries, &other.entries) {
            return;
        }
        let other_entries = other.entries();
        self.entries.lock().extend(other_entries);
    }

    /// Snapshot of all entries in insertion order
    pub fn entries(&self) -> Vec<TemplateError> {
        self.entries.lock().clone()
    }

    /// Whether a fatal error was recorded
    pub fn has_fatal(&self) -> bool {
        self.entries.lock().iter().any(TemplateError::is_fatal)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_is_shared_between_clones() {
        let errors = TemplateErrorCollection::new();
        let handle = errors.clone();
        handle.add(TemplateErrorKind::DialogConditionMissing, "missing", "npc Bob");

        assert_eq!(errors.len(), 1);
        assert!(!errors.has_fatal());
    }

    #[test]
    fn test_extend_preserves_order() {
        let all = TemplateErrorCollection::new();
        all.add(TemplateErrorKind::DialogConditionMissing, "first", "a");

        let other = TemplateErrorCollection::new();
        other.add(TemplateErrorKind::TemplateParseError, "second", "b");
        other.add(TemplateErrorKind::CanNotGenerateLanguageKey, "third", "c");

        all.extend_from(&other);
        all.extend_from(&all.clone());

        let messages: Vec<_> = all.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert!(all.has_fatal());
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(TemplateErrorKind::GraphCycleDetected.is_fatal());
        assert!(!TemplateErrorKind::TemplateUnsupportedOperation.is_fatal());
    }
}

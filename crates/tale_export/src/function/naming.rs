// Function Naming - Collision free names from an atomic per-scope counter

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tale_types::ExportObject;
use tracing::debug;

use crate::error::Result;
use crate::placeholder::replace_placeholders;
use crate::scope::RenderScope;
use crate::text::sanitize_identifier;

/// Counter store failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum CounterError {
    #[error("Counter store unavailable: {0}")]
    Unavailable(String),
    #[error("Counter overflow in category {0}")]
    Overflow(String),
}

/// Persistent monotonically increasing counters
///
/// `next_value` must increment atomically: concurrent callers for the same
/// `(project_id, category)` never receive the same value. The first value of a
/// fresh counter is 1.
#[async_trait]
pub trait FunctionCounterStore: Send + Sync {
    async fn next_value(&self, project_id: &str, category: &str) -> Result<u64, CounterError>;
}

/// Counter store held in memory
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: DashMap<(String, String), u64>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, 0 if never incremented
    pub fn current(&self, project_id: &str, category: &str) -> u64 {
        self.counters
            .get(&(project_id.to_string(), category.to_string()))
            .map(|v| *v)
            .unwrap_or(0)
    }
}

#[async_trait]
impl FunctionCounterStore for InMemoryCounterStore {
    async fn next_value(&self, project_id: &str, category: &str) -> Result<u64, CounterError> {
        // The entry guard holds the shard lock for the whole increment
        let mut counter = self
            .counters
            .entry((project_id.to_string(), category.to_string()))
            .or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| CounterError::Overflow(category.to_string()))?;
        Ok(*counter)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Name Generator
// ─────────────────────────────────────────────────────────────────────────────

/// Function naming configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionNaming {
    /// Legacy template with `{{Counter}}`, `{{ObjectName}}`, `{{ObjectId}}` and `{{Category}}`
    pub name_template: String,
    /// Counter category of dialog functions
    pub category_prefix: String,
}

impl Default for FunctionNaming {
    fn default() -> Self {
        Self {
            name_template: "{{Category}}_{{ObjectName}}_Step{{Counter}}".to_string(),
            category_prefix: "Dialog".to_string(),
        }
    }
}

/// Counter category of state machine functions
pub const STATE_MACHINE_CATEGORY: &str = "StateMachine";

/// Allocates unique function names
pub struct FunctionNameGenerator {
    counters: Arc<dyn FunctionCounterStore>,
    naming: FunctionNaming,
}

impl FunctionNameGenerator {
    pub fn new(counters: Arc<dyn FunctionCounterStore>, naming: FunctionNaming) -> Self {
        Self { counters, naming }
    }

    pub fn naming(&self) -> &FunctionNaming {
        &self.naming
    }

    /// Counter scope of an object within a category
    pub fn counter_scope(category: &str, owner: &ExportObject) -> String {
        format!("{}_{}", category, owner.id)
    }

    /// Allocate the next name for the scope's owner
    ///
    /// Allocated counter values are never returned, even if the export fails
    /// later on. `{{ObjectName}}` falls back to the owner id when the name
    /// sanitizes to nothing.
    pub async fn next_name(&self, category: &str, scope: &RenderScope) -> Result<String> {
        let counter_scope = Self::counter_scope(category, &scope.owner);
        let counter = scope
            .cancellable(self.counters.next_value(&scope.project_id, &counter_scope))
            .await??;

        let name = replace_placeholders(&self.naming.name_template, |placeholder| match placeholder {
            "Counter" => Some(counter.to_string()),
            "ObjectName" => Some(owner_name(&scope.owner)),
            "ObjectId" => Some(sanitize_identifier(&scope.owner.id)),
            "Category" => Some(category.to_string()),
            _ => None,
        });
        let name = sanitize_identifier(&name);
        debug!(object_id = %scope.owner.id, function = %name, counter, "Allocated function name");
        Ok(name)
    }
}

fn owner_name(owner: &ExportObject) -> String {
    let name = sanitize_identifier(&owner.name);
    if name.is_empty() {
        sanitize_identifier(&owner.id)
    } else {
        name
    }
}

//! Tale Export - Renders node graph dialogs and state machines to code
//!
//! This crate parses authored node graphs, splits them into callable
//! functions, renders every node through user templates (legacy placeholders
//! or scripting templates) and collects language keys and authoring errors.

pub use tale_types;

pub mod catalog;
pub mod condition;
pub mod context;
pub mod document;
pub mod engine;
mod error;
pub mod function;
pub mod language_key;
mod orchestrator;
pub mod parser;
pub mod placeholder;
pub mod resolver;
mod scope;
pub mod steps;
pub mod text;

#[cfg(test)]
mod test_support;

pub use catalog::{PlaceholderDescription, placeholder_catalog};
pub use condition::{ConditionRenderer, ConditionSyntax};
pub use engine::{EngineSet, LegacyEngine, ScriptingEngine, TemplateData, TemplateEngine};
pub use error::*;
pub use function::{
    CounterError, DefaultSplitPolicy, FunctionCounterStore, FunctionNaming, FunctionSplitPolicy,
    InMemoryCounterStore, RuleSplitPolicy, STATE_MACHINE_CATEGORY, SplitRule,
};
pub use language_key::{DeterministicKeyGenerator, LanguageKeyGenerator, LanguageKeyRegistry};
pub use orchestrator::*;
pub use resolver::{CachedObjectResolver, InMemoryObjectStore, ObjectResolver, ResolveError};
pub use scope::RenderScope;

//! Tale Types - Core data structures for the dialog export pipeline
//!
//! This crate contains the pure data structures exchanged between the authoring
//! side (node graph snippets, export objects, templates) and the export pipeline
//! (functions, errors, language keys, results). It performs no I/O.

mod condition;
mod errors;
mod language;
mod object;
mod result;
mod settings;
mod snippet;
mod state_machine;
mod template;

pub use condition::*;
pub use errors::*;
pub use language::*;
pub use object::*;
pub use result::*;
pub use settings::*;
pub use snippet::*;
pub use state_machine::*;
pub use template::*;

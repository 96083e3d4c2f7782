// Documents - Templates wrapping rendered steps into complete files
//
// Step code is assembled into functions, functions into a dialog or state
// machine, and collected language keys into a language file.

pub mod dialog;
pub mod language_file;
pub mod state_machine;

pub use dialog::{DialogData, FunctionData};
pub use language_file::{LanguageFileData, LanguageKeyData};
pub use state_machine::{StateData, StateMachineData, TransitionData};

/// Separator between consecutive functions in a document
pub const FUNCTION_SEPARATOR: &str = "\n\n";

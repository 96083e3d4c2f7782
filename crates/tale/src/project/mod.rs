//! Project Management
//!
//! Handles loading tale projects from disk.

mod config;
mod loader;

pub use config::*;
pub use loader::*;

//! Tale - Node graph export for game narrative projects
//!
//! This crate provides the application around `tale_export`:
//! - Project loading with layered configuration
//! - Persistent function name counters via redb
//! - Export runs writing generated code and language files to disk

// Re-export core crates
pub use tale_export;

// Project management
pub mod project;

// Function counter persistence
pub mod store;

// Export runs
pub mod export;

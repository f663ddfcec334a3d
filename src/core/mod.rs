//! Core algorithms – listing, cursor bookkeeping, classification rules,
//! content sniffing and the directory census.
//!
//! Nothing in this module depends on any TUI or rendering crate.

pub mod active_set;
pub mod census;
pub mod fs;
pub mod rules;
pub mod signature;
pub mod tree;

//! Two-phase completion pipeline
//!
//! This module provides:
//! - Kind classification and commit characters for raw engine entries
//! - Completion list building with per-item opaque resolution data
//! - Parameter-list reconstruction from rendered signature display parts
//! - Lazy resolution: detail text, auto-import edits, call snippets

pub mod kinds;
pub mod list;
pub mod parameter_list;
pub mod resolve;

pub use kinds::{commit_characters, completion_item_kind, might_complete_call};
pub use list::{CompletionItemData, build_completion_list};
pub use parameter_list::{ParameterListParts, parameter_list_parts};
pub use resolve::{ResolveError, resolve_completion_item};

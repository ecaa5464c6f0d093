//! Builds the protocol completion list from raw engine entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{CompletionItem, CompletionList};

use crate::engine::CompletionInfo;
use crate::lsp::features::completion::kinds;

/// Opaque per-item payload round-tripped by the editor between the list and
/// resolve phases.
///
/// This is the only state carried across the two-phase protocol: the editor
/// returns it verbatim in `completionItem/resolve`, so the resolver needs no
/// session memory of the originating request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItemData {
    pub file_path: PathBuf,
    pub offset: usize,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub might_complete_call: bool,
}

/// Turn the engine's completion info into a protocol completion list.
///
/// Pure transform: label, sort text, preselect and insert text pass through;
/// kind and commit characters come from the classifier tables; the opaque
/// data payload records everything resolution needs. `is_incomplete` is
/// always false — the engine returns a complete candidate set per query.
pub fn build_completion_list(
    completions: &CompletionInfo,
    file_path: &Path,
    offset: usize,
) -> CompletionList {
    let items = completions
        .entries
        .iter()
        .map(|entry| {
            let kind = kinds::completion_item_kind(entry.kind);
            let data = CompletionItemData {
                file_path: file_path.to_path_buf(),
                offset,
                name: entry.name.clone(),
                source: entry.source.clone(),
                might_complete_call: kinds::might_complete_call(kind),
            };
            CompletionItem {
                label: entry.name.clone(),
                kind: Some(kind),
                sort_text: entry.sort_text.clone(),
                preselect: entry.is_recommended,
                insert_text: entry.insert_text.clone(),
                commit_characters: kinds::commit_characters(entry.kind),
                data: serde_json::to_value(&data).ok(),
                ..Default::default()
            }
        })
        .collect();
    CompletionList {
        is_incomplete: false,
        items,
    }
}

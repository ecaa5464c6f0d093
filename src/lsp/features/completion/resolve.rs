//! Lazy enrichment of a previously returned completion item.
//!
//! Resolution is driven entirely by the opaque data payload the editor hands
//! back: full entry details are fetched from the engine, detail and
//! documentation text are rendered from display parts, auto-import edits are
//! converted from engine spans into protocol text edits against the live
//! document, and — for callable kinds — the parameter-list scanner decides
//! whether to append a tab-stop call snippet and a parameter-hints trigger.
//! Every optional piece of engine data that is missing shrinks the
//! enrichment; it never fails the request.

use thiserror::Error;
use tower_lsp::lsp_types::{
    Command, CompletionItem, Documentation, InsertTextFormat, Range, TextEdit, Url,
};
use tracing::{debug, warn};

use crate::document::DocumentStore;
use crate::engine::{
    EngineError, FormatOptions, LanguageEngine, QuotePreference, SemicolonPreference,
    UserPreferences, display_parts_to_string,
};
use crate::lsp::features::completion::list::CompletionItemData;
use crate::lsp::features::completion::parameter_list::parameter_list_parts;

/// Command editors understand as "open the parameter-hint UI now".
const TRIGGER_PARAMETER_HINTS: &str = "editor.action.triggerParameterHints";

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The editor sent an item without the data payload attached at list
    /// time. That payload is the resolution contract; its absence means the
    /// protocol boundary was violated, so this fails fast instead of
    /// guessing.
    #[error("completion item carries no resolution data")]
    MissingData,
    #[error("completion item data is malformed: {0}")]
    InvalidData(#[from] serde_json::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Resolve a completion item against the engine and the live document.
///
/// Returns the item unchanged when the engine has no details for it.
pub async fn resolve_completion_item<E>(
    engine: &E,
    documents: &DocumentStore,
    mut item: CompletionItem,
) -> Result<CompletionItem, ResolveError>
where
    E: LanguageEngine + ?Sized,
{
    let data = item.data.as_ref().ok_or(ResolveError::MissingData)?;
    let data: CompletionItemData = serde_json::from_value(data.clone())?;

    let details = engine
        .get_completion_entry_details(
            &data.file_path,
            data.offset,
            &data.name,
            &FormatOptions {
                semicolons: SemicolonPreference::Remove,
            },
            data.source.as_deref(),
            &UserPreferences {
                quote_preference: QuotePreference::Single,
            },
        )
        .await?;
    let Some(details) = details else {
        debug!("No details for completion entry {:?}", data.name);
        return Ok(item);
    };

    let mut detail = display_parts_to_string(&details.display_parts);
    if let Some(source_parts) = &details.source {
        let import_path = display_parts_to_string(source_parts);
        detail = format!("Auto import from {import_path}\n{detail}");
    }
    item.detail = Some(detail);

    if let Some(documentation_parts) = &details.documentation {
        let documentation = display_parts_to_string(documentation_parts);
        if !documentation.is_empty() {
            item.documentation = Some(Documentation::String(documentation));
        }
    }

    if let Some(code_actions) = &details.code_actions {
        let additional_text_edits =
            convert_code_action_edits(documents, &data, code_actions).await;
        if !additional_text_edits.is_empty() {
            item.additional_text_edits = Some(additional_text_edits);
        }
    }

    if data.might_complete_call {
        let list_parts = parameter_list_parts(&details.display_parts);
        if !list_parts.is_function_call {
            return Ok(item);
        }

        let mut parameters = list_parts
            .parts
            .iter()
            .enumerate()
            .map(|(index, part)| format!("${{{}:{}}}", index + 1, part.text))
            .collect::<Vec<_>>()
            .join(", ");
        let mut parameter_count = list_parts.parts.len();
        if list_parts.has_optional_parameters {
            parameters.push_str("${0}");
            parameter_count += 1;
        }
        if parameter_count > 0 {
            item.command = Some(Command {
                title: "triggerParameterHints".to_string(),
                command: TRIGGER_PARAMETER_HINTS.to_string(),
                arguments: None,
            });
        }

        // Resolve is not guaranteed to finish before the item is accepted;
        // an early accept inserts the plain text without the parentheses.
        let base = item.insert_text.take().unwrap_or_else(|| item.label.clone());
        item.insert_text = Some(format!("{base}({parameters})"));
        item.insert_text_format = Some(InsertTextFormat::SNIPPET);
    }

    Ok(item)
}

/// Flatten auto-import code actions into protocol text edits, in engine
/// order (apply-order sensitive — reordering can corrupt the file).
///
/// The spans refer to the item's own file; when that document is no longer
/// open there is nothing to convert against, so the edits are dropped and
/// the rest of the enrichment stands.
async fn convert_code_action_edits(
    documents: &DocumentStore,
    data: &CompletionItemData,
    code_actions: &[crate::engine::CodeAction],
) -> Vec<TextEdit> {
    let Ok(uri) = Url::from_file_path(&data.file_path) else {
        warn!("Cannot form URI for {:?}; dropping code actions", data.file_path);
        return Vec::new();
    };
    let Some(document) = documents.get(&uri) else {
        warn!("Document {} closed before resolve; dropping code actions", uri);
        return Vec::new();
    };

    let mut edits = Vec::new();
    for action in code_actions {
        for change in &action.changes {
            for text_change in &change.text_changes {
                let span = text_change.span;
                let start = document.position_at(span.start).await;
                let end = document.position_at(span.start + span.length).await;
                edits.push(TextEdit {
                    range: Range { start, end },
                    new_text: text_change.new_text.clone(),
                });
            }
        }
    }
    edits
}

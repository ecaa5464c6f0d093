//! Pure mapping tables from the engine's symbol-kind taxonomy to protocol
//! completion kinds and commit characters.

use tower_lsp::lsp_types::CompletionItemKind;

use crate::engine::ScriptElementKind;

/// Map an engine symbol kind to the protocol completion kind.
///
/// Total: anything the table does not name falls back to `PROPERTY`.
pub fn completion_item_kind(kind: ScriptElementKind) -> CompletionItemKind {
    match kind {
        ScriptElementKind::PrimitiveType | ScriptElementKind::Keyword => {
            CompletionItemKind::KEYWORD
        }
        ScriptElementKind::Const => CompletionItemKind::CONSTANT,
        ScriptElementKind::Let
        | ScriptElementKind::Variable
        | ScriptElementKind::LocalVariable
        | ScriptElementKind::Alias => CompletionItemKind::VARIABLE,
        ScriptElementKind::MemberVariable
        | ScriptElementKind::MemberGetAccessor
        | ScriptElementKind::MemberSetAccessor => CompletionItemKind::FIELD,
        ScriptElementKind::Function | ScriptElementKind::LocalFunction => {
            CompletionItemKind::FUNCTION
        }
        ScriptElementKind::MemberFunction
        | ScriptElementKind::ConstructSignature
        | ScriptElementKind::CallSignature
        | ScriptElementKind::IndexSignature => CompletionItemKind::METHOD,
        ScriptElementKind::Enum => CompletionItemKind::ENUM,
        ScriptElementKind::Module | ScriptElementKind::ExternalModuleName => {
            CompletionItemKind::MODULE
        }
        ScriptElementKind::Class | ScriptElementKind::Type => CompletionItemKind::CLASS,
        ScriptElementKind::Interface => CompletionItemKind::INTERFACE,
        ScriptElementKind::Warning | ScriptElementKind::Script => CompletionItemKind::FILE,
        ScriptElementKind::Directory => CompletionItemKind::FOLDER,
        ScriptElementKind::String => CompletionItemKind::CONSTANT,
        _ => CompletionItemKind::PROPERTY,
    }
}

/// Characters that accept a highlighted item when typed next.
///
/// Accessor/signature-like kinds cannot be called or chained with `,`, so
/// they only commit on `.` and `;`. Kinds with no entry get no commit
/// characters at all (the field is omitted, never an empty list).
pub fn commit_characters(kind: ScriptElementKind) -> Option<Vec<String>> {
    let characters: &[&str] = match kind {
        ScriptElementKind::MemberGetAccessor
        | ScriptElementKind::MemberSetAccessor
        | ScriptElementKind::ConstructSignature
        | ScriptElementKind::CallSignature
        | ScriptElementKind::IndexSignature
        | ScriptElementKind::Enum
        | ScriptElementKind::Interface => &[".", ";"],
        ScriptElementKind::Module
        | ScriptElementKind::Alias
        | ScriptElementKind::Const
        | ScriptElementKind::Let
        | ScriptElementKind::Variable
        | ScriptElementKind::LocalVariable
        | ScriptElementKind::MemberVariable
        | ScriptElementKind::Class
        | ScriptElementKind::Function
        | ScriptElementKind::MemberFunction
        | ScriptElementKind::Keyword
        | ScriptElementKind::Parameter => &[".", ",", ";"],
        _ => return None,
    };
    Some(characters.iter().map(|c| c.to_string()).collect())
}

/// Whether resolve-time call-snippet synthesis is worth attempting for an
/// item of this protocol kind.
pub fn might_complete_call(kind: CompletionItemKind) -> bool {
    kind == CompletionItemKind::FUNCTION
        || kind == CompletionItemKind::METHOD
        || kind == CompletionItemKind::VARIABLE
        || kind == CompletionItemKind::CONSTANT
        || kind == CompletionItemKind::FIELD
}

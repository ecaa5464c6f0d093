//! Integration tests for the two-phase completion pipeline
//!
//! Drives the list builder and resolver end-to-end against a mock analysis
//! engine and a real document store:
//! - list building: kinds, commit characters, opaque data payload
//! - resolve: detail/documentation rendering, auto-import edit translation,
//!   call-snippet synthesis, graceful degradation

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, Documentation, InsertTextFormat, Position, Url,
};

use typescript_completion_server::document::DocumentStore;
use typescript_completion_server::engine::{
    CodeAction, CompletionEntry, CompletionEntryDetails, CompletionInfo, DisplayPartKind,
    EngineError, FileTextChanges, FormatOptions, GetCompletionsOptions, LanguageEngine,
    QuotePreference, ScriptElementKind, SemicolonPreference, SymbolDisplayPart, TextChange,
    TextSpan, UserPreferences,
};
use typescript_completion_server::lsp::features::completion::{
    ResolveError, build_completion_list, resolve_completion_item,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct DetailsRequest {
    file: PathBuf,
    offset: usize,
    name: String,
    source: Option<String>,
}

/// Engine double returning canned answers and recording what it was asked.
#[derive(Default)]
struct MockEngine {
    completions: Option<CompletionInfo>,
    details: Option<CompletionEntryDetails>,
    details_requests: Mutex<Vec<DetailsRequest>>,
}

#[async_trait]
impl LanguageEngine for MockEngine {
    async fn get_completions_at_position(
        &self,
        _file: &Path,
        _offset: usize,
        options: &GetCompletionsOptions,
    ) -> Result<Option<CompletionInfo>, EngineError> {
        assert!(options.include_completions_for_module_exports);
        Ok(self.completions.clone())
    }

    async fn get_completion_entry_details(
        &self,
        file: &Path,
        offset: usize,
        name: &str,
        format_options: &FormatOptions,
        source: Option<&str>,
        preferences: &UserPreferences,
    ) -> Result<Option<CompletionEntryDetails>, EngineError> {
        assert_eq!(format_options.semicolons, SemicolonPreference::Remove);
        assert_eq!(preferences.quote_preference, QuotePreference::Single);
        self.details_requests.lock().unwrap().push(DetailsRequest {
            file: file.to_path_buf(),
            offset,
            name: name.to_string(),
            source: source.map(str::to_string),
        });
        Ok(self.details.clone())
    }
}

fn part(kind: DisplayPartKind, text: &str) -> SymbolDisplayPart {
    SymbolDisplayPart::new(kind, text)
}

fn punct(text: &str) -> SymbolDisplayPart {
    part(DisplayPartKind::Punctuation, text)
}

fn space() -> SymbolDisplayPart {
    part(DisplayPartKind::Space, " ")
}

/// Display parts for `function foo(a: string, b: number): void`.
fn foo_signature_parts() -> Vec<SymbolDisplayPart> {
    vec![
        part(DisplayPartKind::Keyword, "function"),
        space(),
        part(DisplayPartKind::FunctionName, "foo"),
        punct("("),
        part(DisplayPartKind::ParameterName, "a"),
        punct(":"),
        space(),
        part(DisplayPartKind::Keyword, "string"),
        punct(","),
        space(),
        part(DisplayPartKind::ParameterName, "b"),
        punct(":"),
        space(),
        part(DisplayPartKind::Keyword, "number"),
        punct(")"),
        punct(":"),
        space(),
        part(DisplayPartKind::Keyword, "void"),
    ]
}

fn entry(name: &str, kind: ScriptElementKind) -> CompletionEntry {
    CompletionEntry {
        name: name.to_string(),
        kind,
        sort_text: None,
        is_recommended: None,
        insert_text: None,
        source: None,
    }
}

fn details_for(name: &str, display_parts: Vec<SymbolDisplayPart>) -> CompletionEntryDetails {
    CompletionEntryDetails {
        name: name.to_string(),
        kind: ScriptElementKind::Function,
        display_parts,
        documentation: None,
        source: None,
        code_actions: None,
    }
}

/// Build the list for a single entry and hand back the first item, the way
/// an editor would round-trip it into a resolve request.
fn listed_item(entry: CompletionEntry, file_path: &Path, offset: usize) -> CompletionItem {
    let info = CompletionInfo {
        entries: vec![entry],
        is_member_completion: None,
        is_new_identifier_location: None,
    };
    let list = build_completion_list(&info, file_path, offset);
    assert!(!list.is_incomplete);
    list.items.into_iter().next().unwrap()
}

#[tokio::test]
async fn resolve_synthesizes_call_snippet() {
    let documents = DocumentStore::new();
    let engine = MockEngine {
        details: Some(details_for("foo", foo_signature_parts())),
        ..Default::default()
    };
    let item = listed_item(
        entry("foo", ScriptElementKind::Function),
        Path::new("/project/a.ts"),
        25,
    );
    assert_eq!(item.kind, Some(CompletionItemKind::FUNCTION));

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    assert_eq!(
        resolved.detail.as_deref(),
        Some("function foo(a: string, b: number): void")
    );
    assert_eq!(
        resolved.insert_text.as_deref(),
        Some("foo(${1:a}, ${2:b})")
    );
    assert_eq!(resolved.insert_text_format, Some(InsertTextFormat::SNIPPET));
    let command = resolved.command.expect("parameter hints command");
    assert_eq!(command.command, "editor.action.triggerParameterHints");

    let requests = engine.details_requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![DetailsRequest {
            file: PathBuf::from("/project/a.ts"),
            offset: 25,
            name: "foo".to_string(),
            source: None,
        }]
    );
}

#[tokio::test]
async fn resolve_optional_parameter_appends_exit_stop() {
    // function foo(a: string, b?: number)
    let display_parts = vec![
        part(DisplayPartKind::Keyword, "function"),
        space(),
        part(DisplayPartKind::FunctionName, "foo"),
        punct("("),
        part(DisplayPartKind::ParameterName, "a"),
        punct(":"),
        space(),
        part(DisplayPartKind::Keyword, "string"),
        punct(","),
        space(),
        part(DisplayPartKind::ParameterName, "b"),
        punct("?"),
        punct(":"),
        space(),
        part(DisplayPartKind::Keyword, "number"),
        punct(")"),
    ];
    let documents = DocumentStore::new();
    let engine = MockEngine {
        details: Some(details_for("foo", display_parts)),
        ..Default::default()
    };
    let item = listed_item(
        entry("foo", ScriptElementKind::Function),
        Path::new("/project/a.ts"),
        0,
    );

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    assert_eq!(resolved.insert_text.as_deref(), Some("foo(${1:a}${0})"));
    assert!(resolved.command.is_some());
}

#[tokio::test]
async fn resolve_rest_parameter_keeps_snippet_empty() {
    // function foo(...args: number[])
    let display_parts = vec![
        part(DisplayPartKind::Keyword, "function"),
        space(),
        part(DisplayPartKind::FunctionName, "foo"),
        punct("("),
        punct("..."),
        part(DisplayPartKind::ParameterName, "args"),
        punct(":"),
        space(),
        part(DisplayPartKind::Keyword, "number"),
        punct("["),
        punct("]"),
        punct(")"),
    ];
    let documents = DocumentStore::new();
    let engine = MockEngine {
        details: Some(details_for("foo", display_parts)),
        ..Default::default()
    };
    let item = listed_item(
        entry("foo", ScriptElementKind::Function),
        Path::new("/project/a.ts"),
        0,
    );

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    // No individually addressable parameters, only the exit stop.
    assert_eq!(resolved.insert_text.as_deref(), Some("foo(${0})"));
    assert!(resolved.command.is_some());
}

#[tokio::test]
async fn resolve_plain_variable_gets_no_snippet() {
    // A candidate of a callable-looking protocol kind whose details render a
    // bare local variable: the scanner vetoes the snippet.
    let documents = DocumentStore::new();
    let engine = MockEngine {
        details: Some(CompletionEntryDetails {
            name: "x".to_string(),
            kind: ScriptElementKind::LocalVariable,
            display_parts: vec![part(DisplayPartKind::LocalName, "x")],
            documentation: None,
            source: None,
            code_actions: None,
        }),
        ..Default::default()
    };
    let item = listed_item(
        entry("x", ScriptElementKind::LocalVariable),
        Path::new("/project/a.ts"),
        0,
    );

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    assert_eq!(resolved.detail.as_deref(), Some("x"));
    assert!(resolved.insert_text.is_none());
    assert_eq!(resolved.insert_text_format, None);
    assert!(resolved.command.is_none());
}

#[tokio::test]
async fn resolve_translates_auto_import_edits() {
    let file_path = PathBuf::from("/project/main.ts");
    let uri = Url::from_file_path(&file_path).unwrap();
    let documents = DocumentStore::new();
    documents.open(uri, "0123456789abcdefghij\nconsole".to_string(), 3);

    let engine = MockEngine {
        details: Some(CompletionEntryDetails {
            source: Some(vec![part(DisplayPartKind::StringLiteral, "./foo-module")]),
            code_actions: Some(vec![CodeAction {
                description: "Add import from \"./foo-module\"".to_string(),
                changes: vec![FileTextChanges {
                    file_name: "/project/main.ts".to_string(),
                    text_changes: vec![TextChange {
                        span: TextSpan {
                            start: 10,
                            length: 5,
                        },
                        new_text: "Foo".to_string(),
                    }],
                }],
            }]),
            ..details_for("Foo", vec![part(DisplayPartKind::AliasName, "Foo")])
        }),
        ..Default::default()
    };
    let item = listed_item(
        CompletionEntry {
            source: Some("./foo-module".to_string()),
            ..entry("Foo", ScriptElementKind::Alias)
        },
        &file_path,
        7,
    );

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    // Detail carries the auto-import header line.
    assert_eq!(
        resolved.detail.as_deref(),
        Some("Auto import from ./foo-module\nFoo")
    );

    let edits = resolved.additional_text_edits.expect("auto-import edits");
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].new_text, "Foo");
    assert_eq!(edits[0].range.start, Position { line: 0, character: 10 });
    assert_eq!(edits[0].range.end, Position { line: 0, character: 15 });

    // The entry's module source must be echoed to the engine.
    let requests = engine.details_requests.lock().unwrap();
    assert_eq!(requests[0].source.as_deref(), Some("./foo-module"));
}

#[tokio::test]
async fn resolve_preserves_engine_edit_order() {
    let file_path = PathBuf::from("/project/main.ts");
    let uri = Url::from_file_path(&file_path).unwrap();
    let documents = DocumentStore::new();
    documents.open(uri, "0123456789abcdefghij".to_string(), 1);

    let text_changes = vec![
        TextChange {
            span: TextSpan {
                start: 12,
                length: 0,
            },
            new_text: "second".to_string(),
        },
        TextChange {
            span: TextSpan {
                start: 4,
                length: 2,
            },
            new_text: "first".to_string(),
        },
    ];
    let engine = MockEngine {
        details: Some(CompletionEntryDetails {
            code_actions: Some(vec![CodeAction {
                description: "imports".to_string(),
                changes: vec![FileTextChanges {
                    file_name: "/project/main.ts".to_string(),
                    text_changes,
                }],
            }]),
            ..details_for("Foo", vec![part(DisplayPartKind::AliasName, "Foo")])
        }),
        ..Default::default()
    };
    let item = listed_item(entry("Foo", ScriptElementKind::Alias), &file_path, 0);

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    let edits = resolved.additional_text_edits.unwrap();
    // Apply-order sensitive: engine order, not document order.
    assert_eq!(edits[0].new_text, "second");
    assert_eq!(edits[1].new_text, "first");
}

#[tokio::test]
async fn resolve_after_document_close_drops_edits_only() {
    let file_path = PathBuf::from("/project/gone.ts");
    let documents = DocumentStore::new();

    let engine = MockEngine {
        details: Some(CompletionEntryDetails {
            code_actions: Some(vec![CodeAction {
                description: "imports".to_string(),
                changes: vec![FileTextChanges {
                    file_name: "/project/gone.ts".to_string(),
                    text_changes: vec![TextChange {
                        span: TextSpan {
                            start: 0,
                            length: 0,
                        },
                        new_text: "import foo\n".to_string(),
                    }],
                }],
            }]),
            ..details_for("foo", foo_signature_parts())
        }),
        ..Default::default()
    };
    let item = listed_item(entry("foo", ScriptElementKind::Function), &file_path, 0);

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    // Position conversion has nothing to work against, but detail and the
    // snippet still arrive.
    assert!(resolved.additional_text_edits.is_none());
    assert!(resolved.detail.is_some());
    assert_eq!(
        resolved.insert_text.as_deref(),
        Some("foo(${1:a}, ${2:b})")
    );
}

#[tokio::test]
async fn resolve_renders_documentation() {
    let documents = DocumentStore::new();
    let engine = MockEngine {
        details: Some(CompletionEntryDetails {
            documentation: Some(vec![
                part(DisplayPartKind::Text, "Greets the given "),
                part(DisplayPartKind::Text, "user."),
            ]),
            ..details_for("foo", foo_signature_parts())
        }),
        ..Default::default()
    };
    let item = listed_item(
        entry("foo", ScriptElementKind::Function),
        Path::new("/project/a.ts"),
        0,
    );

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    assert_eq!(
        resolved.documentation,
        Some(Documentation::String("Greets the given user.".to_string()))
    );
}

#[tokio::test]
async fn resolve_without_details_returns_item_unchanged() {
    let documents = DocumentStore::new();
    let engine = MockEngine::default();
    let item = listed_item(
        entry("foo", ScriptElementKind::Function),
        Path::new("/project/a.ts"),
        0,
    );
    let expected = item.clone();

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    assert_eq!(resolved, expected);
}

#[tokio::test]
async fn resolve_without_data_fails_fast() {
    let documents = DocumentStore::new();
    let engine = MockEngine::default();
    let item = CompletionItem {
        label: "foo".to_string(),
        ..Default::default()
    };

    let result = resolve_completion_item(&engine, &documents, item).await;

    assert!(matches!(result, Err(ResolveError::MissingData)));
    // The engine must not have been consulted at all.
    assert!(engine.details_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn resolve_keeps_engine_insert_text_as_snippet_base() {
    let documents = DocumentStore::new();
    let engine = MockEngine {
        details: Some(details_for("log", foo_signature_parts())),
        ..Default::default()
    };
    let item = listed_item(
        CompletionEntry {
            insert_text: Some("?.log".to_string()),
            ..entry("log", ScriptElementKind::MemberFunction)
        },
        Path::new("/project/a.ts"),
        0,
    );

    let resolved = resolve_completion_item(&engine, &documents, item)
        .await
        .unwrap();

    assert_eq!(
        resolved.insert_text.as_deref(),
        Some("?.log(${1:a}, ${2:b})")
    );
}

//! tower-lsp frontend wiring the completion pipeline to an analysis engine.
//!
//! The backend owns the open-document store and a handle to the engine; the
//! handlers themselves stay thin. Process bootstrap is the embedder's
//! concern: construct an engine and hand it to [`serve_stdio`].

use std::sync::Arc;

use tower_lsp::jsonrpc;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionOptions, CompletionParams, CompletionResponse,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, ServerCapabilities,
    ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, error, info};

use crate::document::DocumentStore;
use crate::engine::{GetCompletionsOptions, LanguageEngine};
use crate::lsp::features::completion::{
    ResolveError, build_completion_list, resolve_completion_item,
};

/// Characters whose typing asks the editor to re-query completions.
const TRIGGER_CHARACTERS: &[&str] = &[".", ":", "<", "\"", "'", "/", "@", "*"];

pub struct Backend<E> {
    client: Client,
    documents: DocumentStore,
    engine: Arc<E>,
}

impl<E> Backend<E>
where
    E: LanguageEngine,
{
    pub fn new(client: Client, engine: Arc<E>) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            engine,
        }
    }
}

#[tower_lsp::async_trait]
impl<E> LanguageServer for Backend<E>
where
    E: LanguageEngine + 'static,
{
    async fn initialize(&self, _: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(true),
                    trigger_characters: Some(
                        TRIGGER_CHARACTERS.iter().map(|c| c.to_string()).collect(),
                    ),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "typescript-completion-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("Server initialized");
        self.client
            .log_message(MessageType::INFO, "typescript-completion-server ready")
            .await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let document = self
            .documents
            .open(uri.clone(), params.text_document.text, version);
        debug!(
            "Opened document: {}, id: {}, version: {}",
            uri, document.id, version
        );
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        if self
            .documents
            .apply_changes(&uri, params.content_changes, version)
            .await
            .is_some()
        {
            debug!("Updated document: {}, version: {}", uri, version);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.documents.close(&uri) {
            Some(document) => debug!("Closed document: {}, id: {}", uri, document.id),
            None => debug!("Closed document not found: {}", uri),
        }
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> jsonrpc::Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Ok(file_path) = uri.to_file_path() else {
            debug!("Completion requested for non-file URI: {}", uri);
            return Ok(None);
        };
        let Some(offset) = self.documents.offset_at(&uri, position).await else {
            debug!("Completion requested for unopened document: {}", uri);
            return Ok(None);
        };

        let completions = self
            .engine
            .get_completions_at_position(&file_path, offset, &GetCompletionsOptions::default())
            .await
            .map_err(|engine_error| {
                error!("Completions request failed: {}", engine_error);
                jsonrpc::Error::internal_error()
            })?;

        // "Nothing at this position" propagates as an absent result so the
        // editor does not cache an empty list.
        Ok(completions
            .map(|info| CompletionResponse::List(build_completion_list(&info, &file_path, offset))))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> jsonrpc::Result<CompletionItem> {
        match resolve_completion_item(self.engine.as_ref(), &self.documents, item).await {
            Ok(item) => Ok(item),
            Err(resolve_error @ (ResolveError::MissingData | ResolveError::InvalidData(_))) => {
                error!("Rejecting resolve request: {}", resolve_error);
                Err(jsonrpc::Error::invalid_params(resolve_error.to_string()))
            }
            Err(ResolveError::Engine(engine_error)) => {
                error!("Entry details request failed: {}", engine_error);
                Err(jsonrpc::Error::internal_error())
            }
        }
    }
}

/// Serve the language server over stdio with the given engine.
pub async fn serve_stdio<E>(engine: E)
where
    E: LanguageEngine + 'static,
{
    let engine = Arc::new(engine);
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(move |client| Backend::new(client, engine));

    Server::new(stdin, stdout, socket).serve(service).await;
}

//! Open-document store for the completion handlers.
//!
//! Tracks per-URI text and version for every document the editor has open and
//! converts between LSP line/character positions and the flat character
//! offsets the analysis engine works in. Versions are monotonically
//! non-decreasing per URI; a change event carrying a stale version is
//! rejected rather than replayed, so a text read is always consistent for the
//! duration of one request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use ropey::Rope;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};
use tracing::warn;

pub use crate::models::{LspDocument, LspDocumentState};

/// Convert an LSP position into a character offset, clamping positions past
/// the end of a line or past the last line to the document end.
pub fn position_to_offset(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return text.len_chars();
    }
    let offset = text.line_to_char(line) + position.character as usize;
    offset.min(text.len_chars())
}

/// Convert a character offset into an LSP position. Offsets past the end of
/// the document map to the position after the last character.
pub fn offset_to_position(offset: usize, text: &Rope) -> Position {
    let offset = offset.min(text.len_chars());
    let line = text.char_to_line(offset);
    let character = offset - text.line_to_char(line);
    Position {
        line: line as u32,
        character: character as u32,
    }
}

impl LspDocumentState {
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<(), String> {
        if version <= self.version {
            return Err(format!(
                "stale change for {}: version {} is not newer than {}",
                self.uri, version, self.version
            ));
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_offset(&range.start, &self.text);
                let end = position_to_offset(&range.end, &self.text);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
        Ok(())
    }
}

impl LspDocument {
    pub async fn uri(&self) -> Url {
        self.state.read().await.uri.clone()
    }

    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    pub async fn offset_at(&self, position: Position) -> usize {
        position_to_offset(&position, &self.state.read().await.text)
    }

    pub async fn position_at(&self, offset: usize) -> Position {
        offset_to_position(offset, &self.state.read().await.text)
    }

    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Option<String> {
        let mut state = self.state.write().await;
        match state.apply(changes, version) {
            Ok(()) => Some(state.text.to_string()),
            Err(message) => {
                warn!("Failed to apply changes: {}", message);
                None
            }
        }
    }
}

/// All documents the editor currently has open, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<LspDocument>>,
    serial_document_id: AtomicU32,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn open(&self, uri: Url, text: String, version: i32) -> Arc<LspDocument> {
        let document = Arc::new(LspDocument {
            id: self.next_document_id(),
            state: tokio::sync::RwLock::new(LspDocumentState {
                uri: uri.clone(),
                text: Rope::from_str(&text),
                version,
            }),
        });
        self.documents.insert(uri, Arc::clone(&document));
        document
    }

    pub fn close(&self, uri: &Url) -> Option<Arc<LspDocument>> {
        self.documents.remove(uri).map(|(_, document)| document)
    }

    pub fn has_document(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<LspDocument>> {
        self.documents.get(uri).map(|entry| Arc::clone(&entry))
    }

    pub async fn apply_changes(
        &self,
        uri: &Url,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Option<String> {
        match self.get(uri) {
            Some(document) => document.apply(changes, version).await,
            None => {
                warn!("Change for unopened document: {}", uri);
                None
            }
        }
    }

    pub async fn offset_at(&self, uri: &Url, position: Position) -> Option<usize> {
        Some(self.get(uri)?.offset_at(position).await)
    }

    pub async fn position_at(&self, uri: &Url, offset: usize) -> Option<Position> {
        Some(self.get(uri)?.position_at(offset).await)
    }
}

pub mod document;
pub mod engine;
pub mod logging;
pub mod lsp;
pub mod models;

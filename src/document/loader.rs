//! Document loaders: raw bytes in, page-tagged text out
//!
//! Loading is a collaborator boundary; the pipeline only ever sees ordered
//! [`Page`] values. Corrupt input is reported as `DocumentUnreadable`,
//! never as partial garbage text.

use crate::errors::{ChatError, Result};
use crate::types::Page;
use tracing::debug;

/// Turns a document's raw bytes into ordered page text
pub trait DocumentLoader: Send + Sync {
    fn load(&self, bytes: &[u8], name: &str) -> Result<Vec<Page>>;
}

/// PDF loader backed by the `pdf-extract` crate
#[derive(Debug, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, bytes: &[u8], name: &str) -> Result<Vec<Page>> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            ChatError::DocumentUnreadable {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(document = name, pages = pages.len(), "extracted PDF text");

        let pages: Vec<Page> = pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| Page {
                text,
                page_number: i as u32 + 1,
            })
            .collect();

        if pages.iter().all(|p| p.text.trim().is_empty()) {
            return Err(ChatError::DocumentUnreadable {
                name: name.to_string(),
                reason: "no extractable text".to_string(),
            });
        }

        Ok(pages)
    }
}

/// Plain-text loader; form feeds mark page breaks, otherwise one page
#[derive(Debug, Default)]
pub struct PlainTextLoader;

impl DocumentLoader for PlainTextLoader {
    fn load(&self, bytes: &[u8], name: &str) -> Result<Vec<Page>> {
        let text =
            std::str::from_utf8(bytes).map_err(|e| ChatError::DocumentUnreadable {
                name: name.to_string(),
                reason: format!("not valid UTF-8: {}", e),
            })?;

        if text.trim().is_empty() {
            return Err(ChatError::DocumentUnreadable {
                name: name.to_string(),
                reason: "document is empty".to_string(),
            });
        }

        Ok(text
            .split('\u{0C}')
            .enumerate()
            .map(|(i, page_text)| Page {
                text: page_text.to_string(),
                page_number: i as u32 + 1,
            })
            .collect())
    }
}

/// Pick a loader from the file name extension
pub fn loader_for(name: &str) -> Box<dyn DocumentLoader> {
    if name.to_lowercase().ends_with(".pdf") {
        Box::new(PdfLoader)
    } else {
        Box::new(PlainTextLoader)
    }
}

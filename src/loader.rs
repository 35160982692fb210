//! PDF document loading.
//!
//! Reads a PDF file from disk and extracts one text segment per page, in
//! page order. Page numbers are 1-based, matching what a reader sees.

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// One page of extracted text, with its source reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSegment {
    pub text: String,
    pub page: u32,
    pub source: String,
}

/// Load a PDF and return its pages as text segments, in page order.
///
/// Pages whose text cannot be extracted are skipped with a warning; pages
/// that contain no text produce no segment. A missing, unreadable, or
/// structurally invalid file fails with [`Error::Load`].
pub fn load_pdf(path: &Path) -> Result<Vec<PageSegment>> {
    if !path.exists() {
        return Err(Error::load(path, "file not found"));
    }

    let doc = Document::load(path).map_err(|e| Error::load(path, e))?;

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let mut segments = Vec::new();

    // get_pages returns a BTreeMap keyed by 1-based page number, so
    // iteration order is page order.
    for page in doc.get_pages().keys().copied().collect::<Vec<u32>>() {
        let text = match doc.extract_text(&[page]) {
            Ok(t) => t,
            Err(e) => {
                warn!("Skipping page {page} of {source}: {e}");
                continue;
            }
        };

        if text.trim().is_empty() {
            debug!("Page {page} of {source} has no extractable text");
            continue;
        }

        segments.push(PageSegment {
            text,
            page,
            source: source.clone(),
        });
    }

    Ok(segments)
}

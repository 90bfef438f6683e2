//! Writing results to the output directory.
//!
//! Filenames carry a short content hash, so re-running a command never
//! overwrites a previous result and identical output lands on the same name.

use crate::payload::ImagePayload;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Record of a payload written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub bytes: u64,
    /// Parsed from the encoded header; absent if the header is unreadable.
    pub dimensions: Option<(u32, u32)>,
}

/// Short content hash used in filenames.
fn content_tag(payload: &ImagePayload) -> String {
    let digest = Sha256::digest(payload.bytes());
    format!("{digest:x}")[..8].to_string()
}

/// Write `payload` into `dir` as `{stem}-{hash}.{ext}`, creating the
/// directory if needed.
pub fn save_payload(dir: &Path, stem: &str, payload: &ImagePayload) -> Result<SavedImage, StoreError> {
    std::fs::create_dir_all(dir)?;
    let name = format!(
        "{stem}-{}.{}",
        content_tag(payload),
        payload.media_type().extension()
    );
    let path = dir.join(name);
    std::fs::write(&path, payload.bytes())?;
    Ok(SavedImage {
        path,
        bytes: payload.bytes().len() as u64,
        dimensions: payload.dimensions().ok(),
    })
}

//! Per-request scratch directory
//!
//! Each request gets its own temporary directory. The upload is written into
//! it, shell commands run inside it, and dropping the [`Scratch`] removes it
//! with everything in it, whether the request succeeded or not.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::Result;

/// Name used when an upload arrives without a usable file name
const DEFAULT_UPLOAD_NAME: &str = "upload.bin";

/// An uploaded file as received: original name plus bytes
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// An upload materialized on disk
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original file name, as shown to the LLM
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A temporary directory scoped to one request
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("assay-").tempdir()?;
        debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an upload into the scratch directory
    pub fn materialize(&self, upload: &Upload) -> Result<UploadedFile> {
        let path = self.dir.path().join(safe_file_name(&upload.filename));
        std::fs::write(&path, &upload.bytes)?;
        debug!(
            name = %upload.filename,
            path = %path.display(),
            size = upload.bytes.len(),
            "Saved upload"
        );
        Ok(UploadedFile {
            name: upload.filename.clone(),
            path,
            size: upload.bytes.len() as u64,
        })
    }
}

/// Keep only the last path component and drop anything that could escape
/// the scratch directory
fn safe_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        DEFAULT_UPLOAD_NAME.to_string()
    } else {
        cleaned
    }
}

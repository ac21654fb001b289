//! ZIP archive access
//!
//! Member traversal used by the engines, plus the Archive Reader itself:
//! find the CSV inside an uploaded archive and return one column of it.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};
use zip::ZipArchive;

use crate::encoding;
use crate::error::{Error, Result};
use crate::table::Table;

/// Local file header and empty-archive signatures
const ZIP_MAGIC: [&[u8]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// Largest uncompressed size accepted for a single member
pub const MAX_MEMBER_BYTES: usize = 64 * 1024 * 1024;

/// Largest uncompressed size accepted for all members of one archive
pub const MAX_EXPANDED_BYTES: usize = 128 * 1024 * 1024;

/// Caps on decompressed bytes; declared entry sizes are never trusted
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReadLimits {
    pub member: usize,
    pub total: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            member: MAX_MEMBER_BYTES,
            total: MAX_EXPANDED_BYTES,
        }
    }
}

/// A file stored in an archive
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub data: Vec<u8>,
}

/// Check the file signature rather than trusting the extension
pub fn is_zip(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    let mut read = 0;
    while read < magic.len() {
        match file.read(&mut magic[read..])? {
            0 => break,
            n => read += n,
        }
    }
    Ok(read == magic.len() && ZIP_MAGIC.iter().any(|m| **m == magic[..]))
}

fn open(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path)?;
    ZipArchive::new(file).map_err(|e| {
        Error::Parse(format!(
            "{} is not a readable ZIP archive: {}",
            display_name(path),
            e
        ))
    })
}

/// macOS resource forks and Finder metadata are never data files
fn is_metadata(name: &str) -> bool {
    name.starts_with("__MACOSX/")
        || name
            .rsplit('/')
            .next()
            .map(|base| base.starts_with("._") || base == ".DS_Store")
            .unwrap_or(false)
}

/// Names of all file members, in archive order
pub fn list_members(path: &Path) -> Result<Vec<String>> {
    let archive = open(path)?;
    Ok(archive
        .file_names()
        .filter(|name| !name.ends_with('/') && !is_metadata(name))
        .map(str::to_string)
        .collect())
}

/// Read every file member into memory, in archive order
pub fn read_members(path: &Path) -> Result<Vec<Member>> {
    read_members_limited(path, ReadLimits::default())
}

pub(crate) fn read_members_limited(path: &Path, limits: ReadLimits) -> Result<Vec<Member>> {
    let mut archive = open(path)?;
    let mut members = Vec::new();
    let mut expanded = 0usize;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || is_metadata(entry.name()) {
            continue;
        }
        let name = entry.name().to_string();
        let remaining = limits.total - expanded;
        let data = read_entry(&mut entry, &name, limits.member.min(remaining))?;
        expanded += data.len();
        members.push(Member { name, data });
    }

    debug!(archive = %display_name(path), members = members.len(), "Read archive members");
    Ok(members)
}

/// The first CSV member of an archive
pub fn find_csv_member(path: &Path) -> Result<Member> {
    find_csv_member_limited(path, ReadLimits::default())
}

pub(crate) fn find_csv_member_limited(path: &Path, limits: ReadLimits) -> Result<Member> {
    let mut archive = open(path)?;

    let name = archive
        .file_names()
        .filter(|name| !name.ends_with('/') && !is_metadata(name))
        .find(|name| name.to_lowercase().ends_with(".csv"))
        .map(str::to_string)
        .ok_or_else(|| {
            Error::Parse(format!(
                "No CSV file found in archive {}",
                display_name(path)
            ))
        })?;

    let mut entry = archive.by_name(&name)?;
    let data = read_entry(&mut entry, &name, limits.member.min(limits.total))?;

    Ok(Member { name, data })
}

/// Decompress one entry, failing once more than `limit` bytes come out
fn read_entry<R: Read>(entry: &mut R, name: &str, limit: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    entry
        .take(limit as u64 + 1)
        .read_to_end(&mut data)
        .map_err(|e| Error::Parse(format!("Could not read archive member {}: {}", name, e)))?;

    if data.len() > limit {
        return Err(Error::Parse(format!(
            "Archive member {} expands beyond the {} byte limit",
            name, limit
        )));
    }
    Ok(data)
}

/// Extract the CSV from a ZIP archive and return every value of `column`
pub fn read_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let member = find_csv_member(path)?;
    let decoded = encoding::decode(&member.data)
        .map_err(|e| Error::Parse(format!("Could not decode {}: {}", member.name, e)))?;
    let table = Table::parse(&decoded.text, &member.name)?;

    let values: Vec<String> = table
        .column(column)?
        .into_iter()
        .map(str::to_string)
        .collect();

    if values.is_empty() {
        return Err(Error::Parse(format!(
            "{} has a '{}' column but no data rows",
            member.name, column
        )));
    }

    info!(
        member = %member.name,
        column,
        values = values.len(),
        "Read column from archive"
    );
    Ok(values)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

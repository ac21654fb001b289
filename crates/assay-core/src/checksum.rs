//! Canonical formatting and content hashing
//!
//! The canonical form is byte-stable across platforms:
//! - LF line endings (CRLF and lone CR are converted)
//! - leading tabs expanded to two spaces each
//! - trailing whitespace removed from every line
//! - leading blank lines dropped, runs of blank lines collapsed to one
//! - exactly one trailing newline (empty input stays empty)

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::encoding;
use crate::error::Result;

/// Indentation width used when expanding leading tabs
pub const INDENT_WIDTH: usize = 2;

/// Normalize text into its canonical form
pub fn canonicalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;
    for line in unified.split('\n') {
        let line = expand_leading_tabs(line.trim_end());
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        lines.push(line);
    }

    while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }

    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn expand_leading_tabs(line: &str) -> String {
    let indent_end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    let (indent, rest) = line.split_at(indent_end);
    let mut out = String::with_capacity(line.len() + indent.len());
    for c in indent.chars() {
        if c == '\t' {
            out.extend(std::iter::repeat(' ').take(INDENT_WIDTH));
        } else {
            out.push(c);
        }
    }
    out.push_str(rest);
    out
}

/// Lowercase hex SHA-256 of arbitrary bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Canonicalize a file's text and hash the result
pub fn checksum_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let decoded = encoding::decode(&bytes)?;
    let canonical = canonicalize(&decoded.text);
    let digest = sha256_hex(canonical.as_bytes());
    debug!(
        file = %path.display(),
        encoding = %decoded.encoding,
        canonical_bytes = canonical.len(),
        digest = %digest,
        "Computed canonical checksum"
    );
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(canonicalize("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_indentation_and_trailing_whitespace() {
        assert_eq!(
            canonicalize("# Title\n\t- item  \n\t\tnested\t\n"),
            "# Title\n  - item\n    nested\n"
        );
    }

    #[test]
    fn test_blank_lines() {
        assert_eq!(canonicalize("\n\n\na\n\n\n\nb\n\n\n"), "a\n\nb\n");
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("\n \n\t\n"), "");
    }

    #[test]
    fn test_inner_tabs_untouched() {
        assert_eq!(canonicalize("a\tb"), "a\tb\n");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let once = canonicalize("\r\n\tfoo  \r\n\r\n\r\nbar");
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_checksum_is_deterministic_across_line_endings() {
        let dir = tempfile::TempDir::new().unwrap();
        let unix = dir.path().join("unix.md");
        let dos = dir.path().join("dos.md");
        std::fs::write(&unix, "# Doc\n\ntext\n").unwrap();
        std::fs::write(&dos, "# Doc\r\n\r\ntext  \r\n").unwrap();

        let a = checksum_file(&unix).unwrap();
        let b = checksum_file(&dos).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, checksum_file(&unix).unwrap());
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}

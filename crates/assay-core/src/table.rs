//! Header-row CSV tables loaded from plain files or ZIP archives

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::archive;
use crate::encoding;
use crate::error::{Error, Result};

/// A parsed CSV file: header names plus string cells
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Where the table came from (file or archive member name), for messages
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV text with a header row
    ///
    /// Tab-separated input is accepted when the header line has more tabs
    /// than commas.
    pub fn parse(text: &str, source: &str) -> Result<Self> {
        let delimiter = sniff_delimiter(text);
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(Error::Parse(format!("{} has no header row", source)));
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        debug!(source, columns = headers.len(), rows = rows.len(), "Parsed table");
        Ok(Self {
            source: source.to_string(),
            headers,
            rows,
        })
    }

    /// Load a CSV from disk, looking inside it first if it is a ZIP archive
    pub fn load(path: &Path) -> Result<Self> {
        if archive::is_zip(path)? {
            let member = archive::find_csv_member(path)?;
            let decoded = encoding::decode(&member.data).map_err(|e| {
                Error::Parse(format!("Could not decode {}: {}", member.name, e))
            })?;
            return Self::parse(&decoded.text, &member.name);
        }

        let bytes = std::fs::read(path)?;
        let decoded = encoding::decode(&bytes)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::parse(&decoded.text, &source)
    }

    /// Resolve a column by exact name, then case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h == wanted)
            .or_else(|| {
                self.headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(wanted))
            })
    }

    /// All cells of a column in row order; short rows yield empty cells
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name).ok_or_else(|| {
            Error::Parse(format!(
                "Column '{}' not found in {} (available: {})",
                name,
                self.source,
                self.headers.join(", ")
            ))
        })?;

        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
            .collect())
    }
}

pub(crate) fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let tabs = header.matches('\t').count();
    let commas = header.matches(',').count();
    if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_table() {
        let table = Table::parse("id,answer\n1,42\n2, 7 \n", "data.csv").unwrap();
        assert_eq!(table.headers, vec!["id", "answer"]);
        assert_eq!(table.column("answer").unwrap(), vec!["42", "7"]);
    }

    #[test]
    fn test_parse_tab_table() {
        let table = Table::parse("symbol\tvalue\n$\t10\n", "data3.txt").unwrap();
        assert_eq!(table.headers, vec!["symbol", "value"]);
        assert_eq!(table.column("value").unwrap(), vec!["10"]);
    }

    #[test]
    fn test_column_case_insensitive() {
        let table = Table::parse("Region,Revenue\nN,10\n", "sales.csv").unwrap();
        assert_eq!(table.column_index("revenue"), Some(1));
        assert_eq!(table.column_index("REGION"), Some(0));
    }

    #[test]
    fn test_missing_column_lists_available() {
        let table = Table::parse("a,b\n1,2\n", "x.csv").unwrap();
        let err = table.column("answer").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'answer'"));
        assert!(msg.contains("available: a, b"));
    }

    #[test]
    fn test_short_rows_yield_empty_cells() {
        let table = Table::parse("a,b\n1\n3,4\n", "x.csv").unwrap();
        assert_eq!(table.column("b").unwrap(), vec!["", "4"]);
    }

    #[test]
    fn test_load_plain_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(&path, "sales\n5\n6\n").unwrap();

        let table = Table::load(&path).unwrap();
        assert_eq!(table.source, "sales.csv");
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_load_zip_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = crate::archive::tests::write_zip(
            dir.path(),
            "bundle.zip",
            &[("inner/data.csv", b"x,y\n1,2\n".as_slice())],
        );

        let table = Table::load(&path).unwrap();
        assert_eq!(table.source, "inner/data.csv");
        assert_eq!(table.column("y").unwrap(), vec!["2"]);
    }
}

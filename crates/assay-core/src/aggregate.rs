//! Multi-encoding currency aggregation
//!
//! Sums currency-tagged amounts across every member of a ZIP archive, where
//! each member may use a different text encoding. Rows may carry the symbol
//! in its own column (`item,amount,symbol`) or glued to the amount
//! (`item,₹120.50`). A member that cannot be decoded or parsed is skipped and
//! reported; the rest of the archive still counts.

use std::collections::BTreeSet;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::archive;
use crate::encoding::{self, TextEncoding};
use crate::error::Result;
use crate::models::CurrencySymbol;
use crate::table::sniff_delimiter;

/// One amount found in a data row
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedAmount {
    pub amount: f64,
    pub symbol: Option<CurrencySymbol>,
}

/// Per-member outcome
#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub name: String,
    pub encoding: String,
    pub rows: usize,
    pub matched: usize,
}

/// A member left out of the total, and why
#[derive(Debug, Clone, Serialize)]
pub struct SkippedMember {
    pub name: String,
    pub reason: String,
}

/// Result of an aggregation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateReport {
    pub total: f64,
    pub members: Vec<MemberSummary>,
    pub skipped: Vec<SkippedMember>,
}

/// Sum amounts tagged with any of `symbols` across all archive members
///
/// An empty symbol set sums every amount.
pub fn sum_by_symbols(path: &Path, symbols: &BTreeSet<CurrencySymbol>) -> Result<AggregateReport> {
    let members = archive::read_members(path)?;
    let mut report = AggregateReport::default();

    for member in members {
        let decoded = match encoding::decode(&member.data) {
            Ok(d) => d,
            Err(e) => {
                warn!(member = %member.name, error = %e, "Skipping member that failed to decode");
                report.skipped.push(SkippedMember {
                    name: member.name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let amounts = match parse_amounts(&decoded.text) {
            Ok(a) => a,
            Err(e) => {
                warn!(member = %member.name, error = %e, "Skipping member that failed to parse");
                report.skipped.push(SkippedMember {
                    name: member.name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let matched: Vec<f64> = amounts
            .iter()
            .filter(|t| matches_symbols(t, symbols))
            .map(|t| t.amount)
            .collect();

        debug!(
            member = %member.name,
            encoding = %decoded.encoding,
            rows = amounts.len(),
            matched = matched.len(),
            "Aggregated member"
        );

        report.total += matched.iter().sum::<f64>();
        report.members.push(MemberSummary {
            name: member.name,
            encoding: encoding_label(decoded.encoding),
            rows: amounts.len(),
            matched: matched.len(),
        });
    }

    report.total = round_cents_noise(report.total);
    info!(
        total = report.total,
        members = report.members.len(),
        skipped = report.skipped.len(),
        "Multi-encoding aggregation complete"
    );
    Ok(report)
}

fn matches_symbols(tagged: &TaggedAmount, symbols: &BTreeSet<CurrencySymbol>) -> bool {
    if symbols.is_empty() {
        return true;
    }
    tagged
        .symbol
        .map(|s| symbols.contains(&s))
        .unwrap_or(false)
}

/// Extract tagged amounts from delimited text
///
/// Header rows and rows without any numeric field are ignored.
pub fn parse_amounts(text: &str) -> Result<Vec<TaggedAmount>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let mut amounts = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let fields: Vec<&str> = record.iter().collect();
        if let Some(tagged) = parse_row(&fields) {
            amounts.push(tagged);
        }
    }
    Ok(amounts)
}

fn parse_row(fields: &[&str]) -> Option<TaggedAmount> {
    let tagged_field = fields
        .iter()
        .enumerate()
        .find_map(|(i, f)| CurrencySymbol::find_in(f).map(|s| (i, s)));

    match tagged_field {
        Some((idx, symbol)) => {
            // Combined field such as "₹120.50" or "12 €"
            if let Some(amount) = parse_amount(fields[idx]) {
                return Some(TaggedAmount {
                    amount,
                    symbol: Some(symbol),
                });
            }
            let amount = fields
                .iter()
                .enumerate()
                .rev()
                .filter(|(i, _)| *i != idx)
                .find_map(|(_, f)| parse_amount(f))?;
            Some(TaggedAmount {
                amount,
                symbol: Some(symbol),
            })
        }
        None => {
            let amount = fields.iter().rev().find_map(|f| parse_amount(f))?;
            Some(TaggedAmount {
                amount,
                symbol: None,
            })
        }
    }
}

/// Parse a number, ignoring currency symbols, spaces, and thousands separators
pub fn parse_amount(field: &str) -> Option<f64> {
    let cleaned: String = field
        .chars()
        .filter(|c| CurrencySymbol::from_char(*c).is_none())
        .filter(|c| !matches!(c, ',' | '_' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Drop binary floating-point residue such as 60.000000000000007
fn round_cents_noise(value: f64) -> f64 {
    let scaled = (value * 1e9).round() / 1e9;
    if scaled.is_finite() {
        scaled
    } else {
        value
    }
}

fn encoding_label(encoding: TextEncoding) -> String {
    encoding.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::write_zip;
    use crate::encoding::tests::{utf16le, windows1252};
    use tempfile::TempDir;

    fn symbols(list: &[CurrencySymbol]) -> BTreeSet<CurrencySymbol> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("120.50"), Some(120.5));
        assert_eq!(parse_amount("₹1,200"), Some(1200.0));
        assert_eq!(parse_amount(" 12 € "), Some(12.0));
        assert_eq!(parse_amount("-3"), Some(-3.0));
        assert_eq!(parse_amount("amount"), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_row_shapes() {
        assert_eq!(
            parse_row(&["Tea", "20", "₹"]),
            Some(TaggedAmount {
                amount: 20.0,
                symbol: Some(CurrencySymbol::Rupee)
            })
        );
        assert_eq!(
            parse_row(&["Tea", "$4.5"]),
            Some(TaggedAmount {
                amount: 4.5,
                symbol: Some(CurrencySymbol::Dollar)
            })
        );
        assert_eq!(
            parse_row(&["€", "7"]),
            Some(TaggedAmount {
                amount: 7.0,
                symbol: Some(CurrencySymbol::Euro)
            })
        );
        assert_eq!(parse_row(&["item", "amount", "currency"]), None);
        assert_eq!(
            parse_row(&["Misc", "9"]),
            Some(TaggedAmount {
                amount: 9.0,
                symbol: None
            })
        );
    }

    #[test]
    fn test_mixed_encodings_sum() {
        let dir = TempDir::new().unwrap();
        let utf8 = "item,amount,currency\nTea,10,$\nRice,5,€\n".as_bytes().to_vec();
        let cp1252 = windows1252("item,amount,currency\nCafé,2.5,$\nPain,4,£\n");
        let utf16 = utf16le("item\tamount\tcurrency\nChai\t100\t₹\nGum\t1\t$\n", true);
        let zip = write_zip(
            dir.path(),
            "enc.zip",
            &[
                ("data1.csv", utf8.as_slice()),
                ("data2.csv", cp1252.as_slice()),
                ("data3.txt", utf16.as_slice()),
            ],
        );

        let report = sum_by_symbols(&zip, &symbols(&[CurrencySymbol::Dollar])).unwrap();
        assert_eq!(report.total, 13.5);
        assert_eq!(report.members.len(), 3);
        assert!(report.skipped.is_empty());
        assert_eq!(report.members[1].encoding, "windows-1252");
        assert_eq!(report.members[2].encoding, "utf-16le");

        let report = sum_by_symbols(
            &zip,
            &symbols(&[CurrencySymbol::Rupee, CurrencySymbol::Pound]),
        )
        .unwrap();
        assert_eq!(report.total, 104.0);
    }

    #[test]
    fn test_empty_symbol_set_sums_everything() {
        let dir = TempDir::new().unwrap();
        let zip = write_zip(
            dir.path(),
            "all.zip",
            &[("a.csv", b"item,amount\nA,$1\nB,\xc2\xa32\nC,3\n".as_slice())],
        );
        let report = sum_by_symbols(&zip, &BTreeSet::new()).unwrap();
        assert_eq!(report.total, 6.0);
    }

    #[test]
    fn test_absent_symbol_yields_zero() {
        let dir = TempDir::new().unwrap();
        let zip = write_zip(
            dir.path(),
            "z.zip",
            &[("a.csv", b"item,amount,currency\nA,1,$\n".as_slice())],
        );
        let report = sum_by_symbols(&zip, &symbols(&[CurrencySymbol::Yen])).unwrap();
        assert_eq!(report.total, 0.0);
    }

    #[test]
    fn test_undecodable_member_is_skipped() {
        let dir = TempDir::new().unwrap();
        let broken = vec![0xFF, 0xFE, 0x3D, 0xD8, 0x41, 0x00];
        let zip = write_zip(
            dir.path(),
            "partial.zip",
            &[
                ("broken.txt", broken.as_slice()),
                ("good.csv", b"item,amount,currency\nA,8,$\n".as_slice()),
            ],
        );

        let report = sum_by_symbols(&zip, &symbols(&[CurrencySymbol::Dollar])).unwrap();
        assert_eq!(report.total, 8.0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "broken.txt");
    }

    #[test]
    fn test_float_residue_is_rounded() {
        let dir = TempDir::new().unwrap();
        let zip = write_zip(
            dir.path(),
            "f.zip",
            &[("a.csv", b"x,0.1,$\ny,0.2,$\n".as_slice())],
        );
        let report = sum_by_symbols(&zip, &symbols(&[CurrencySymbol::Dollar])).unwrap();
        assert_eq!(report.total, 0.3);
    }
}

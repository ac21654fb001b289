//! CLI command tests

use std::io::Write;

use assay_core::{AIClient, Config, MockBackend, Solver};
use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands;

fn mock_solver() -> Solver {
    Solver::new(
        Config::default(),
        AIClient::Mock(MockBackend::with_answer("from the model")),
    )
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_serve_defaults() {
    let cli = Cli::try_parse_from(["assay", "serve"]).unwrap();
    assert!(!cli.verbose);
    match cli.command {
        Commands::Serve { port, host } => {
            assert_eq!(port, 10000);
            assert_eq!(host, "127.0.0.1");
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_serve_overrides_and_global_verbose() {
    let cli =
        Cli::try_parse_from(["assay", "serve", "--host", "0.0.0.0", "-p", "8000", "-v"]).unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Serve { port, host } => {
            assert_eq!(port, 8000);
            assert_eq!(host, "0.0.0.0");
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_ask_with_file() {
    let cli = Cli::try_parse_from(["assay", "ask", "What is the total?", "--file", "q.zip"])
        .unwrap();
    match cli.command {
        Commands::Ask { question, file } => {
            assert_eq!(question, "What is the total?");
            assert_eq!(file.unwrap().to_str(), Some("q.zip"));
        }
        _ => panic!("expected ask"),
    }
}

#[test]
fn test_ask_requires_question() {
    assert!(Cli::try_parse_from(["assay", "ask"]).is_err());
}

#[test]
fn test_invalid_port_rejected() {
    assert!(Cli::try_parse_from(["assay", "serve", "--port", "99999"]).is_err());
}

// ========== Classify Command Tests ==========

#[test]
fn test_describe_fallback() {
    assert_eq!(
        commands::describe("What is the capital of France?").unwrap(),
        "fallback"
    );
}

#[test]
fn test_describe_shows_engine_and_parameters() {
    let text = commands::describe("What is the average revenue in the csv, calculate statistics")
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["engine"], "column_statistics");
    assert_eq!(json["operation"], "average");
    assert_eq!(json["column"], "revenue");
}

#[test]
fn test_describe_missing_parameter_is_error() {
    assert!(commands::describe("Make an API request to the weather service").is_err());
}

#[test]
fn test_cmd_classify() {
    assert!(commands::cmd_classify("How many Mondays are there in 2024-01-01 to 2024-01-31?").is_ok());
}

// ========== Checksum Command Tests ==========

#[test]
fn test_cmd_checksum() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"# Title\r\n\r\n\r\nbody\r\n").unwrap();
    assert!(commands::cmd_checksum(file.path()).is_ok());
}

#[test]
fn test_cmd_checksum_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = commands::cmd_checksum(&dir.path().join("missing.md"));
    assert!(result.is_err());
}

// ========== Ask Command Tests ==========

#[tokio::test]
async fn test_ask_weekday_count() {
    let solver = mock_solver();
    let line = commands::ask_json(
        &solver,
        "How many Wednesdays are there in the date range 2024-01-01 to 2024-01-31?",
        None,
    )
    .await
    .unwrap();
    assert_eq!(line, r#"{"answer":5}"#);
}

#[tokio::test]
async fn test_ask_key_value_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pairs.txt");
    std::fs::write(&path, "zeta=1\nalpha=two\n").unwrap();

    let solver = mock_solver();
    let line = commands::ask_json(
        &solver,
        "Convert the key=value pairs into a single JSON object",
        Some(&path),
    )
    .await
    .unwrap();
    assert_eq!(line, r#"{"answer":{"zeta":"1","alpha":"two"}}"#);
}

#[tokio::test]
async fn test_ask_fallback_uses_backend() {
    let solver = mock_solver();
    let line = commands::ask_json(&solver, "Who wrote Hamlet?", None)
        .await
        .unwrap();
    assert_eq!(line, r#"{"answer":"from the model"}"#);
}

#[tokio::test]
async fn test_ask_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let solver = mock_solver();
    let result = commands::ask_json(
        &solver,
        "What is the sum of sales in the csv? calculate",
        Some(&dir.path().join("nope.csv")),
    )
    .await;
    assert!(result.is_err());
}

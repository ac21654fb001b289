//! Assay Core Library
//!
//! Answers data-science assignment questions, optionally with an uploaded
//! file:
//! - Intent classification: ordered keyword rules with typed parameters
//! - Archive reader, multi-encoding aggregator, column statistics
//! - Canonical-form checksum, command/API invoker, small transforms
//! - LLM fallback with file metadata as context
//! - Per-request scratch directory with guaranteed cleanup

pub mod aggregate;
pub mod ai;
pub mod archive;
pub mod checksum;
pub mod config;
pub mod context;
pub mod encoding;
pub mod error;
pub mod intent;
pub mod invoke;
pub mod models;
pub mod scratch;
pub mod solver;
pub mod stats;
pub mod table;
pub mod transforms;

/// Test utilities including a mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OpenAICompatibleBackend};
pub use config::{Config, InvokerConfig, LlmConfig};
pub use context::FallbackContext;
pub use error::{Error, ErrorKind, Result};
pub use intent::{classify, Dispatch, IntentRule, RULES};
pub use models::{Answer, AnswerResponse, CurrencySymbol, HttpMethod, Operation, Question};
pub use scratch::{Scratch, Upload, UploadedFile};
pub use solver::Solver;

//! Question solver
//!
//! Ties the pieces together for one request: materialize the upload into a
//! scratch directory, classify the question, run the matching engine or the
//! LLM fallback, and release the scratch directory on every exit path.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::ai::{AIBackend, AIClient};
use crate::aggregate;
use crate::archive;
use crate::checksum;
use crate::config::Config;
use crate::context::{FallbackContext, SYSTEM_PROMPT};
use crate::error::{Error, Result};
use crate::intent::{self, Dispatch};
use crate::invoke;
use crate::models::{Answer, Question};
use crate::scratch::{Scratch, Upload, UploadedFile};
use crate::stats;
use crate::transforms;

/// Answers questions; cheap to clone and safe to share across requests
#[derive(Clone)]
pub struct Solver {
    config: Arc<Config>,
    ai: AIClient,
}

impl Solver {
    pub fn new(config: Config, ai: AIClient) -> Self {
        Self {
            config: Arc::new(config),
            ai,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    /// Answer a question in a fresh scratch directory
    pub async fn answer(&self, question: &str, upload: Option<Upload>) -> Result<Answer> {
        let scratch = Scratch::new()?;
        self.answer_with_scratch(scratch, question, upload).await
    }

    /// Answer a question using `scratch`, which is removed when this returns
    pub async fn answer_with_scratch(
        &self,
        scratch: Scratch,
        question: &str,
        upload: Option<Upload>,
    ) -> Result<Answer> {
        let question = Question::new(question);
        let file = upload.map(|u| scratch.materialize(&u)).transpose()?;

        match intent::classify(&question)? {
            Some(dispatch) => {
                info!(engine = dispatch.engine(), has_file = file.is_some(), "Dispatching to engine");
                self.run(&dispatch, file.as_ref(), scratch.path()).await
            }
            None => {
                info!(
                    backend = self.ai.name(),
                    has_file = file.is_some(),
                    "No rule matched, using LLM fallback"
                );
                self.fallback(&question, file.as_ref()).await
            }
        }
    }

    /// Run one engine against the (optional) uploaded file
    pub async fn run(
        &self,
        dispatch: &Dispatch,
        file: Option<&UploadedFile>,
        workdir: &Path,
    ) -> Result<Answer> {
        let path = match (dispatch.needs_file(), file) {
            (true, None) => {
                return Err(Error::ParameterMissing(format!(
                    "file ({} needs an uploaded file)",
                    dispatch.engine()
                )))
            }
            (_, f) => f.map(|f| f.path.as_path()),
        };

        match dispatch {
            Dispatch::ApiRequest { url, method } => {
                invoke::call_api(url, *method, &self.config.invoker).await
            }
            Dispatch::ShellCommand { command } => {
                let output = invoke::run_shell(command, &self.config.invoker, workdir).await?;
                Ok(Answer::Text(output))
            }
            _ => {
                // File parsing and hashing are blocking work
                let dispatch = dispatch.clone();
                let path = path.map(Path::to_path_buf);
                tokio::task::spawn_blocking(move || compute(&dispatch, path.as_deref())).await?
            }
        }
    }

    /// Ask the LLM, with the question and upload metadata as context
    pub async fn fallback(&self, question: &Question, file: Option<&UploadedFile>) -> Result<Answer> {
        let context = FallbackContext::build(question, file);
        let reply = self.ai.complete(SYSTEM_PROMPT, &context.render()).await?;
        Ok(Answer::Text(reply.trim().to_string()))
    }
}

/// Run a synchronous engine
fn compute(dispatch: &Dispatch, path: Option<&Path>) -> Result<Answer> {
    match dispatch {
        Dispatch::ArchiveColumn { column } => {
            let mut values = archive::read_column(require(path)?, column)?;
            if values.len() == 1 {
                Ok(Answer::Text(values.remove(0)))
            } else {
                Ok(Answer::List(values))
            }
        }
        Dispatch::EncodedTotal { symbols } => {
            let report = aggregate::sum_by_symbols(require(path)?, symbols)?;
            Ok(Answer::Number(report.total))
        }
        Dispatch::ColumnStatistics { operation, column } => {
            let operation = (*operation).ok_or_else(|| {
                Error::ParameterMissing(
                    "operation (mention one of sum, average, median, max, min)".into(),
                )
            })?;
            let column = column.as_deref().ok_or_else(|| {
                Error::ParameterMissing(format!(
                    "column (mention one of {})",
                    intent::STATISTICS_COLUMNS.join(", ")
                ))
            })?;
            let value = stats::compute(require(path)?, operation, column)?;
            Ok(Answer::Number(value))
        }
        Dispatch::FormattedChecksum => {
            Ok(Answer::Text(checksum::checksum_file(require(path)?)?))
        }
        Dispatch::WeekdayCount {
            weekday,
            start,
            end,
        } => Ok(Answer::Number(
            transforms::count_weekdays(*weekday, *start, *end) as f64,
        )),
        Dispatch::JsonSort {
            array,
            primary,
            secondary,
        } => Ok(Answer::Text(transforms::sort_json_array(
            array,
            primary,
            secondary.as_deref(),
        )?)),
        Dispatch::KeyValueJson => Ok(Answer::Json(transforms::key_values_to_json(require(
            path,
        )?)?)),
        Dispatch::ApiRequest { .. } | Dispatch::ShellCommand { .. } => Err(Error::Computation(
            format!("{} is not a synchronous engine", dispatch.engine()),
        )),
    }
}

fn require(path: Option<&Path>) -> Result<&Path> {
    path.ok_or_else(|| Error::ParameterMissing("file".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn solver_with(mock: MockBackend) -> Solver {
        Solver::new(Config::default(), AIClient::Mock(mock))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_file_engine_runs_on_blocking_pool() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("r.csv");
        std::fs::write(&path, "revenue\n10\n20\n30\n").unwrap();
        let file = UploadedFile {
            name: "r.csv".into(),
            path: path.clone(),
            size: 18,
        };
        let dispatch = Dispatch::ColumnStatistics {
            operation: Some(crate::models::Operation::Average),
            column: Some("revenue".into()),
        };

        let solver = solver_with(MockBackend::new());
        let answer = solver.run(&dispatch, Some(&file), dir.path()).await.unwrap();
        assert_eq!(answer, Answer::Number(20.0));
    }

    #[test]
    fn test_compute_refuses_async_engines() {
        let dispatch = Dispatch::ShellCommand {
            command: "ls".into(),
        };
        let err = compute(&dispatch, None).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }

    #[tokio::test]
    async fn test_scratch_removed_after_engine_error() {
        let solver = solver_with(MockBackend::new());
        let scratch = Scratch::new().unwrap();
        let dir = scratch.path().to_path_buf();

        let err = solver
            .answer_with_scratch(
                scratch,
                "Calculate the average profit in this csv",
                Some(Upload::new("r.csv", b"revenue\n1\n".to_vec())),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_scratch_removed_after_success() {
        let solver = solver_with(MockBackend::new());
        let scratch = Scratch::new().unwrap();
        let dir = scratch.path().to_path_buf();

        let answer = solver
            .answer_with_scratch(
                scratch,
                "Calculate the sum of sales in the csv",
                Some(Upload::new("s.csv", b"sales\n1\n2\n".to_vec())),
            )
            .await
            .unwrap();

        assert_eq!(answer, Answer::Number(3.0));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_engine_without_file() {
        let solver = solver_with(MockBackend::new());
        let err = solver
            .answer("Run prettier on it and give the sha256", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParameterMissing(_)));
    }

    #[tokio::test]
    async fn test_statistics_without_column_is_missing_parameter() {
        let solver = solver_with(MockBackend::new());
        let err = solver
            .answer(
                "Calculate the median in this csv",
                Some(Upload::new("x.csv", b"amount\n1\n".to_vec())),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParameterMissing(_)));
        assert!(err.to_string().contains("column"));
    }

    #[tokio::test]
    async fn test_fallback_uses_context() {
        let mock = MockBackend::with_answer("  Paris \n");
        let solver = solver_with(mock.clone());

        let answer = solver
            .answer(
                "What is the capital of France?",
                Some(Upload::new("notes.txt", b"abc".to_vec())),
            )
            .await
            .unwrap();

        assert_eq!(answer, Answer::Text("Paris".into()));
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].0, SYSTEM_PROMPT);
        assert_eq!(
            prompts[0].1,
            "Question: What is the capital of France?\n\nFile provided: notes.txt (3 bytes)\n"
        );
    }

    #[tokio::test]
    async fn test_fallback_failure_is_surfaced() {
        let solver = solver_with(MockBackend::failing("LLM API error 500"));
        let err = solver.answer("Tell me a joke", None).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_weekday_count_needs_no_file() {
        let solver = solver_with(MockBackend::new());
        let answer = solver
            .answer("How many Mondays are there from 2024-01-01 to 2024-01-31?", None)
            .await
            .unwrap();
        assert_eq!(answer, Answer::Number(5.0));
    }

    #[tokio::test]
    async fn test_shell_disabled_by_default() {
        let solver = solver_with(MockBackend::new());
        let err = solver
            .answer("Execute the command 'echo hi'", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Disabled(_)));
    }
}

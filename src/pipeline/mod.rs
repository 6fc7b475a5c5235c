//! The interpretation pipeline: load, compile, validate once, run per input.
//!
//! The pipeline is pure with respect to presentation: it produces an ordered
//! [`InterpretReport`] and leaves rendering policy to the caller. Validation
//! happens exactly once per invocation; a failure suppresses every run and
//! is reported once, not once per input. Run outcomes are independent — one
//! input's error never stops the inputs after it — and appear in input order.

use std::path::Path;

use thiserror::Error;

use crate::graph::env::Environment;
use crate::graph::serial::{SerialDocument, SerialError};
use crate::graph::types::Type;
use crate::plugin::{Plugin, PluginError, RunOutcome};

/// Errors that abort an interpretation before any input is evaluated.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the graph document failed.
    #[error("failed to read graph document: {0}")]
    Io(#[from] std::io::Error),

    /// The graph document is not valid JSON.
    #[error("failed to parse graph document: {0}")]
    Document(#[from] serde_json::Error),

    /// The graph document does not reconstruct into a well-formed model.
    #[error("graph document is not well formed: {0}")]
    Graph(#[from] SerialError),

    /// The plugin failed to compile the model or malfunctioned mid-run.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Convenience result alias for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Outcome of evaluating one input, rendered for presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// The program produced a result value.
    Output(serde_json::Value),
    /// The program produced an error value for this input.
    Failed(serde_json::Value),
}

/// One input paired with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// The input string, as given.
    pub input: String,
    /// What evaluating it produced.
    pub status: RunStatus,
}

/// The ordered result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretReport {
    /// `Some` if validation failed; exactly one message per invocation, and
    /// `runs` is empty.
    pub validation: Option<String>,
    /// Per-input outcomes, in input order.
    pub runs: Vec<RunRecord>,
}

impl InterpretReport {
    fn invalid(message: String) -> Self {
        Self {
            validation: Some(message),
            runs: Vec::new(),
        }
    }
}

/// Interpret a persisted graph document against the given inputs.
///
/// The document is reconstructed into a model and compiled by the plugin;
/// the program is validated once, then each input is evaluated in order in
/// a fresh value scope.
pub async fn interpret(
    plugin: &dyn Plugin,
    graph: &Path,
    inputs: &[String],
) -> PipelineResult<InterpretReport> {
    let raw = tokio::fs::read(graph).await?;
    let document: SerialDocument = serde_json::from_slice(&raw)?;
    let (kind, model) = document.into_model()?;
    tracing::debug!(
        kind = %kind,
        nodes = model.node_count(),
        edges = model.edge_count(),
        "loaded graph document"
    );

    let program = plugin.make_program(model).await?;

    if let Some(message) = program.validate().await {
        tracing::debug!("program failed validation");
        return Ok(InterpretReport::invalid(message));
    }

    let string = Type::primitive("string");
    let mut runs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let mut scope = Environment::new();
        let value = scope.string(&string, input).map_err(PluginError::from)?;
        let status = match program.run(&mut scope, &[value]).await? {
            RunOutcome::Result(id) => RunStatus::Output(scope.render(id).map_err(PluginError::from)?),
            RunOutcome::Error(id) => RunStatus::Failed(scope.render(id).map_err(PluginError::from)?),
        };
        runs.push(RunRecord {
            input: input.clone(),
            status,
        });
    }

    Ok(InterpretReport {
        validation: None,
        runs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::env::ValueId;
    use crate::plugin::{PluginResult, Program};
    use async_trait::async_trait;

    /// Scripted program: fails inputs listed in `failing`, echoes the rest.
    struct EchoProgram {
        validation: Option<String>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl Program for EchoProgram {
        async fn validate(&self) -> Option<String> {
            self.validation.clone()
        }

        async fn run(
            &self,
            scope: &mut Environment,
            inputs: &[ValueId],
        ) -> PluginResult<RunOutcome> {
            let string = Type::primitive("string");
            let text = scope.as_str(inputs[0]).unwrap_or("").to_string();
            let id = scope.string(&string, &text)?;
            if self.failing.contains(&text) {
                Ok(RunOutcome::Error(id))
            } else {
                Ok(RunOutcome::Result(id))
            }
        }
    }

    struct EchoPlugin {
        validation: Option<String>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl Plugin for EchoPlugin {
        fn name(&self) -> &'static str {
            "dfa"
        }

        async fn make_program(
            &self,
            _model: crate::graph::model::Model,
        ) -> PluginResult<Box<dyn Program>> {
            Ok(Box::new(EchoProgram {
                validation: self.validation.clone(),
                failing: self.failing.clone(),
            }))
        }
    }

    fn empty_graph_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let model = crate::graph::model::ModelBuilder::new().finish();
        let doc = crate::graph::serial::to_document(&model, "dfa");
        let path = dir.path().join("graph.json");
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_validation_failure_reported_once_suppresses_runs() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = empty_graph_file(&dir);
        let plugin = EchoPlugin {
            validation: Some("broken machine".to_string()),
            failing: Vec::new(),
        };

        let inputs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let report = interpret(&plugin, &path, &inputs).await.unwrap();

        assert_eq!(report.validation.as_deref(), Some("broken machine"));
        assert!(report.runs.is_empty());
    }

    #[tokio::test]
    async fn test_run_errors_are_independent_and_ordered() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = empty_graph_file(&dir);
        let plugin = EchoPlugin {
            validation: None,
            failing: vec!["b".to_string()],
        };

        let inputs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let report = interpret(&plugin, &path, &inputs).await.unwrap();

        assert_eq!(report.validation, None);
        let statuses: Vec<_> = report
            .runs
            .iter()
            .map(|record| (record.input.as_str(), record.status.clone()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("a", RunStatus::Output(serde_json::json!("a"))),
                ("b", RunStatus::Failed(serde_json::json!("b"))),
                ("c", RunStatus::Output(serde_json::json!("c"))),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_graph_file_is_a_pipeline_error() {
        let plugin = EchoPlugin {
            validation: None,
            failing: Vec::new(),
        };
        let result = interpret(&plugin, Path::new("/nonexistent/graph.json"), &[]).await;
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }
}

//! The plugin contract the pipeline consumes, plus the built-in registry.
//!
//! A plugin reports the dialect it handles and compiles a built model into a
//! runnable [`Program`]. How a program executes internally is the plugin's
//! business; the pipeline only relies on `validate` (once per invocation)
//! and `run` (once per input). The registry resolves plugin names to the
//! built-in reference interpreters shipped with this crate.

/// Built-in reference interpreters for the supported dialects.
pub mod automata;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::graph::env::{Environment, ValueError, ValueId};
use crate::graph::model::Model;

/// Errors raised by plugin resolution and program compilation.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No plugin is registered under the requested name.
    #[error("no plugin registered under '{0}' (available: turing-machine, dfa, nfa)")]
    NotFound(String),

    /// The plugin could not compile the model into a program.
    #[error("plugin failed to compile model: {0}")]
    Compile(String),

    /// The plugin produced an ill-typed value.
    #[error("plugin produced an ill-typed value: {0}")]
    Value(#[from] ValueError),
}

/// Convenience result alias for plugin operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Outcome of running a program against one input: either a result value or
/// an error value, both allocated in the run's value scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run produced a result.
    Result(ValueId),
    /// The run produced an error value; later inputs are unaffected.
    Error(ValueId),
}

/// An automaton interpreter plugin.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The dialect name this plugin identifies as.
    fn name(&self) -> &'static str;

    /// Compile a model into a runnable program.
    async fn make_program(&self, model: Model) -> PluginResult<Box<dyn Program>>;
}

/// A compiled program: validated once, then run once per input.
#[async_trait]
pub trait Program: Send + Sync {
    /// Validate the program. `Some` carries the failure message and means no
    /// input will be run.
    async fn validate(&self) -> Option<String>;

    /// Evaluate the program against the given inputs, allocating the result
    /// or error value in `scope`. An `Err` here is a plugin malfunction, not
    /// a per-input run error.
    async fn run(&self, scope: &mut Environment, inputs: &[ValueId]) -> PluginResult<RunOutcome>;
}

/// Resolve a plugin by name from the built-in registry.
pub fn load(name: &str) -> PluginResult<Arc<dyn Plugin>> {
    match name {
        "turing-machine" => Ok(Arc::new(automata::TuringPlugin)),
        "dfa" => Ok(Arc::new(automata::DfaPlugin)),
        "nfa" => Ok(Arc::new(automata::NfaPlugin)),
        other => Err(PluginError::NotFound(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_builtins() {
        for name in ["turing-machine", "dfa", "nfa"] {
            assert_eq!(load(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_registry_rejects_unknown_names() {
        assert!(matches!(
            load("pushdown"),
            Err(PluginError::NotFound(name)) if name == "pushdown"
        ));
    }
}

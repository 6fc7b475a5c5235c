//! Built-in reference interpreters for the three supported dialects.
//!
//! Each plugin compiles a canonical model into transition tables keyed by
//! node id, collecting validation issues as it goes. Issues are reported
//! through `validate`, never as compile errors: a structurally sound model
//! that happens to describe a broken machine still compiles, and the
//! pipeline decides what to do with the validation failure.
//!
//! Results are boolean accept/reject values; run errors (such as a Turing
//! machine exhausting its step budget) are string error values.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};

use super::{Plugin, PluginResult, Program, RunOutcome};
use crate::graph::env::{Environment, ValueId};
use crate::graph::model::{Model, NodeId};
use crate::graph::types::Type;

/// Step budget for Turing machine runs. A machine still running after this
/// many steps yields a run-error value for that input.
pub const TURING_STEP_LIMIT: usize = 10_000;

fn state_label(model: &Model, node: NodeId) -> String {
    model
        .node_str(node, "label")
        .unwrap_or("<unlabeled>")
        .to_string()
}

/// Start/accept markers collected from a model's nodes.
struct StateFlags {
    starts: Vec<NodeId>,
    accepts: HashSet<NodeId>,
}

fn scan_flags(model: &Model) -> StateFlags {
    let mut starts = Vec::new();
    let mut accepts = HashSet::new();
    for (node, _) in model.nodes() {
        if model.node_bool(node, "isStartState").unwrap_or(false) {
            starts.push(node);
        }
        if model.node_bool(node, "isAcceptState").unwrap_or(false) {
            accepts.insert(node);
        }
    }
    StateFlags { starts, accepts }
}

fn require_single_start(flags: &StateFlags, issues: &mut Vec<String>) -> Option<NodeId> {
    match flags.starts.as_slice() {
        [start] => Some(*start),
        [] => {
            issues.push("no start state is marked".to_string());
            None
        }
        many => {
            issues.push(format!(
                "expected exactly one start state, found {}",
                many.len()
            ));
            None
        }
    }
}

fn validation_message(issues: &[String]) -> Option<String> {
    if issues.is_empty() {
        None
    } else {
        Some(issues.join("; "))
    }
}

/// Pull the input string out of the run's value scope. The error string
/// becomes a run-error value for this input.
fn input_text(scope: &Environment, inputs: &[ValueId]) -> Result<String, String> {
    let Some(first) = inputs.first() else {
        return Err("no input value supplied".to_string());
    };
    scope
        .as_str(*first)
        .map(str::to_string)
        .ok_or_else(|| "input value is not a string".to_string())
}

fn accept_outcome(scope: &mut Environment, accepted: bool) -> PluginResult<RunOutcome> {
    let boolean = Type::primitive("boolean");
    Ok(RunOutcome::Result(scope.boolean(&boolean, accepted)?))
}

fn error_outcome(scope: &mut Environment, message: String) -> PluginResult<RunOutcome> {
    let string = Type::primitive("string");
    Ok(RunOutcome::Error(scope.string(&string, message)?))
}

// ---------------------------------------------------------------------------
// DFA
// ---------------------------------------------------------------------------

/// Reference plugin for deterministic finite automata.
pub struct DfaPlugin;

#[async_trait]
impl Plugin for DfaPlugin {
    fn name(&self) -> &'static str {
        "dfa"
    }

    async fn make_program(&self, model: Model) -> PluginResult<Box<dyn Program>> {
        Ok(Box::new(DfaProgram::compile(&model)))
    }
}

struct DfaProgram {
    start: Option<NodeId>,
    accepts: HashSet<NodeId>,
    delta: HashMap<(NodeId, char), NodeId>,
    issues: Vec<String>,
}

impl DfaProgram {
    fn compile(model: &Model) -> Self {
        let mut issues = Vec::new();
        let flags = scan_flags(model);
        let start = require_single_start(&flags, &mut issues);

        let mut delta = HashMap::new();
        for (edge_id, edge) in model.edges() {
            let symbol = model.edge_str(edge_id, "symbol").unwrap_or("");
            let mut chars = symbol.chars();
            let (Some(symbol), None) = (chars.next(), chars.next()) else {
                issues.push(format!(
                    "transition from '{}' must read exactly one symbol, got '{}'",
                    state_label(model, edge.from),
                    model.edge_str(edge_id, "symbol").unwrap_or("")
                ));
                continue;
            };
            if delta.insert((edge.from, symbol), edge.to).is_some() {
                issues.push(format!(
                    "nondeterministic transition on '{}' from state '{}'",
                    symbol,
                    state_label(model, edge.from)
                ));
            }
        }

        Self {
            start,
            accepts: flags.accepts,
            delta,
            issues,
        }
    }
}

#[async_trait]
impl Program for DfaProgram {
    async fn validate(&self) -> Option<String> {
        validation_message(&self.issues)
    }

    async fn run(&self, scope: &mut Environment, inputs: &[ValueId]) -> PluginResult<RunOutcome> {
        let input = match input_text(scope, inputs) {
            Ok(text) => text,
            Err(message) => return error_outcome(scope, message),
        };

        // validate() already rejected start-less programs; treat a run
        // against one as a plain reject.
        let Some(start) = self.start else {
            return accept_outcome(scope, false);
        };

        let mut state = start;
        for symbol in input.chars() {
            match self.delta.get(&(state, symbol)) {
                Some(next) => state = *next,
                // No transition: the machine falls into the implicit dead
                // state and rejects.
                None => return accept_outcome(scope, false),
            }
        }
        accept_outcome(scope, self.accepts.contains(&state))
    }
}

// ---------------------------------------------------------------------------
// NFA
// ---------------------------------------------------------------------------

/// Reference plugin for nondeterministic finite automata. An empty `symbol`
/// attribute is an epsilon transition.
pub struct NfaPlugin;

#[async_trait]
impl Plugin for NfaPlugin {
    fn name(&self) -> &'static str {
        "nfa"
    }

    async fn make_program(&self, model: Model) -> PluginResult<Box<dyn Program>> {
        Ok(Box::new(NfaProgram::compile(&model)))
    }
}

struct NfaProgram {
    starts: Vec<NodeId>,
    accepts: HashSet<NodeId>,
    delta: HashMap<(NodeId, char), HashSet<NodeId>>,
    epsilon: HashMap<NodeId, HashSet<NodeId>>,
    issues: Vec<String>,
}

impl NfaProgram {
    fn compile(model: &Model) -> Self {
        let mut issues = Vec::new();
        let flags = scan_flags(model);
        if flags.starts.is_empty() {
            issues.push("no start state is marked".to_string());
        }

        let mut delta: HashMap<(NodeId, char), HashSet<NodeId>> = HashMap::new();
        let mut epsilon: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
        for (edge_id, edge) in model.edges() {
            let symbol = model.edge_str(edge_id, "symbol").unwrap_or("");
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (None, _) => {
                    epsilon.entry(edge.from).or_default().insert(edge.to);
                }
                (Some(symbol), None) => {
                    delta.entry((edge.from, symbol)).or_default().insert(edge.to);
                }
                _ => issues.push(format!(
                    "transition from '{}' must read at most one symbol, got '{}'",
                    state_label(model, edge.from),
                    model.edge_str(edge_id, "symbol").unwrap_or("")
                )),
            }
        }

        Self {
            starts: flags.starts,
            accepts: flags.accepts,
            delta,
            epsilon,
            issues,
        }
    }

    fn closure(&self, states: HashSet<NodeId>) -> HashSet<NodeId> {
        let mut seen = states;
        let mut pending: VecDeque<NodeId> = seen.iter().copied().collect();
        while let Some(state) = pending.pop_front() {
            if let Some(reachable) = self.epsilon.get(&state) {
                for next in reachable {
                    if seen.insert(*next) {
                        pending.push_back(*next);
                    }
                }
            }
        }
        seen
    }
}

#[async_trait]
impl Program for NfaProgram {
    async fn validate(&self) -> Option<String> {
        validation_message(&self.issues)
    }

    async fn run(&self, scope: &mut Environment, inputs: &[ValueId]) -> PluginResult<RunOutcome> {
        let input = match input_text(scope, inputs) {
            Ok(text) => text,
            Err(message) => return error_outcome(scope, message),
        };

        let mut current = self.closure(self.starts.iter().copied().collect());
        for symbol in input.chars() {
            let mut next = HashSet::new();
            for state in &current {
                if let Some(targets) = self.delta.get(&(*state, symbol)) {
                    next.extend(targets.iter().copied());
                }
            }
            current = self.closure(next);
            if current.is_empty() {
                return accept_outcome(scope, false);
            }
        }
        let accepted = current.iter().any(|state| self.accepts.contains(state));
        accept_outcome(scope, accepted)
    }
}

// ---------------------------------------------------------------------------
// Turing machine
// ---------------------------------------------------------------------------

/// Reference plugin for single-tape Turing machines. Empty `read`/`write`
/// attributes denote the blank tape symbol. The machine accepts when it
/// halts (no applicable transition) in an accept state.
pub struct TuringPlugin;

#[async_trait]
impl Plugin for TuringPlugin {
    fn name(&self) -> &'static str {
        "turing-machine"
    }

    async fn make_program(&self, model: Model) -> PluginResult<Box<dyn Program>> {
        Ok(Box::new(TuringProgram::compile(&model)))
    }
}

/// A tape symbol: `None` is blank.
type Symbol = Option<char>;

struct TuringRule {
    write: Symbol,
    offset: i64,
    next: NodeId,
}

struct TuringProgram {
    start: Option<NodeId>,
    accepts: HashSet<NodeId>,
    delta: HashMap<(NodeId, Symbol), TuringRule>,
    issues: Vec<String>,
}

impl TuringProgram {
    fn compile(model: &Model) -> Self {
        let mut issues = Vec::new();
        let flags = scan_flags(model);
        let start = require_single_start(&flags, &mut issues);

        let mut delta = HashMap::new();
        for (edge_id, edge) in model.edges() {
            let read = match tape_symbol(model.edge_str(edge_id, "read")) {
                Ok(symbol) => symbol,
                Err(text) => {
                    issues.push(format!(
                        "transition from '{}' reads more than one tape symbol: '{}'",
                        state_label(model, edge.from),
                        text
                    ));
                    continue;
                }
            };
            let write = match tape_symbol(model.edge_str(edge_id, "write")) {
                Ok(symbol) => symbol,
                Err(text) => {
                    issues.push(format!(
                        "transition from '{}' writes more than one tape symbol: '{}'",
                        state_label(model, edge.from),
                        text
                    ));
                    continue;
                }
            };
            let offset = match model.edge_tag(edge_id, "move") {
                Some("Left") => -1,
                _ => 1,
            };

            let rule = TuringRule {
                write,
                offset,
                next: edge.to,
            };
            if delta.insert((edge.from, read), rule).is_some() {
                issues.push(format!(
                    "nondeterministic transition reading '{}' from state '{}'",
                    read.map(String::from).unwrap_or_else(|| "<blank>".to_string()),
                    state_label(model, edge.from)
                ));
            }
        }

        Self {
            start,
            accepts: flags.accepts,
            delta,
            issues,
        }
    }
}

fn tape_symbol(text: Option<&str>) -> Result<Symbol, String> {
    let text = text.unwrap_or("");
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (symbol, None) => Ok(symbol),
        _ => Err(text.to_string()),
    }
}

#[async_trait]
impl Program for TuringProgram {
    async fn validate(&self) -> Option<String> {
        validation_message(&self.issues)
    }

    async fn run(&self, scope: &mut Environment, inputs: &[ValueId]) -> PluginResult<RunOutcome> {
        let input = match input_text(scope, inputs) {
            Ok(text) => text,
            Err(message) => return error_outcome(scope, message),
        };
        let Some(start) = self.start else {
            return accept_outcome(scope, false);
        };

        // Sparse tape: absent cells are blank.
        let mut tape: HashMap<i64, char> = input
            .chars()
            .enumerate()
            .map(|(idx, symbol)| (idx as i64, symbol))
            .collect();
        let mut head: i64 = 0;
        let mut state = start;

        for _ in 0..TURING_STEP_LIMIT {
            let read = tape.get(&head).copied();
            let Some(rule) = self.delta.get(&(state, read)) else {
                // Halted.
                return accept_outcome(scope, self.accepts.contains(&state));
            };
            match rule.write {
                Some(symbol) => {
                    tape.insert(head, symbol);
                }
                None => {
                    tape.remove(&head);
                }
            }
            head += rule.offset;
            state = rule.next;
        }

        error_outcome(
            scope,
            format!("machine did not halt within {} steps", TURING_STEP_LIMIT),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{build_model, AutomatonDoc, Dialect};
    use serde_json::json;

    fn compile(dialect: Dialect, doc: serde_json::Value) -> Model {
        let doc: AutomatonDoc = serde_json::from_value(doc).unwrap();
        build_model(dialect, &doc).unwrap()
    }

    async fn run_once(program: &dyn Program, input: &str) -> (Environment, RunOutcome) {
        let mut scope = Environment::new();
        let string = Type::primitive("string");
        let value = scope.string(&string, input).unwrap();
        let outcome = program.run(&mut scope, &[value]).await.unwrap();
        (scope, outcome)
    }

    async fn accepts(program: &dyn Program, input: &str) -> bool {
        let (scope, outcome) = run_once(program, input).await;
        match outcome {
            RunOutcome::Result(id) => scope.as_bool(id).unwrap(),
            RunOutcome::Error(id) => {
                panic!("unexpected run error: {:?}", scope.render(id))
            }
        }
    }

    /// DFA over {0,1} accepting strings with an even number of ones.
    fn even_ones() -> Model {
        compile(
            Dialect::Dfa,
            json!({
                "states": [
                    {"id": "e", "name": "even", "x": 0, "y": 0, "initial": true, "final": true},
                    {"id": "o", "name": "odd", "x": 100, "y": 0}
                ],
                "transitions": [
                    {"from": "e", "to": "e", "read": "0"},
                    {"from": "e", "to": "o", "read": "1"},
                    {"from": "o", "to": "o", "read": "0"},
                    {"from": "o", "to": "e", "read": "1"}
                ]
            }),
        )
    }

    #[tokio::test]
    async fn test_dfa_accepts_and_rejects() {
        let program = DfaPlugin.make_program(even_ones()).await.unwrap();
        assert_eq!(program.validate().await, None);

        assert!(accepts(&*program, "").await);
        assert!(accepts(&*program, "0110").await);
        assert!(!accepts(&*program, "010").await);
        // Unknown symbol falls into the dead state.
        assert!(!accepts(&*program, "2").await);
    }

    #[tokio::test]
    async fn test_dfa_validation_flags_missing_start() {
        let model = compile(
            Dialect::Dfa,
            json!({
                "states": [{"id": "s", "name": "q0", "x": 0, "y": 0}],
                "transitions": []
            }),
        );
        let program = DfaPlugin.make_program(model).await.unwrap();
        let message = program.validate().await.unwrap();
        assert!(message.contains("no start state"));
    }

    #[tokio::test]
    async fn test_dfa_validation_flags_nondeterminism() {
        let model = compile(
            Dialect::Dfa,
            json!({
                "states": [
                    {"id": "a", "name": "qa", "x": 0, "y": 0, "initial": true},
                    {"id": "b", "name": "qb", "x": 0, "y": 0}
                ],
                "transitions": [
                    {"from": "a", "to": "a", "read": "x"},
                    {"from": "a", "to": "b", "read": "x"}
                ]
            }),
        );
        let program = DfaPlugin.make_program(model).await.unwrap();
        let message = program.validate().await.unwrap();
        assert!(message.contains("nondeterministic"));
    }

    /// NFA accepting strings ending in "ab", with an epsilon shortcut.
    #[tokio::test]
    async fn test_nfa_subset_run() {
        let model = compile(
            Dialect::Nfa,
            json!({
                "states": [
                    {"id": "s", "name": "start", "x": 0, "y": 0, "initial": true},
                    {"id": "m", "name": "mid", "x": 0, "y": 0},
                    {"id": "f", "name": "fin", "x": 0, "y": 0, "final": true}
                ],
                "transitions": [
                    {"from": "s", "to": "s", "read": "a"},
                    {"from": "s", "to": "s", "read": "b"},
                    {"from": "s", "to": "m", "read": "a"},
                    {"from": "m", "to": "f", "read": "b"}
                ]
            }),
        );
        let program = NfaPlugin.make_program(model).await.unwrap();
        assert_eq!(program.validate().await, None);

        assert!(accepts(&*program, "ab").await);
        assert!(accepts(&*program, "bbaab").await);
        assert!(!accepts(&*program, "ba").await);
        assert!(!accepts(&*program, "").await);
    }

    #[tokio::test]
    async fn test_nfa_epsilon_closure() {
        let model = compile(
            Dialect::Nfa,
            json!({
                "states": [
                    {"id": "s", "name": "start", "x": 0, "y": 0, "initial": true},
                    {"id": "f", "name": "fin", "x": 0, "y": 0, "final": true}
                ],
                "transitions": [
                    {"from": "s", "to": "f", "read": ""}
                ]
            }),
        );
        let program = NfaPlugin.make_program(model).await.unwrap();
        assert_eq!(program.validate().await, None);
        // Epsilon reach alone accepts the empty string.
        assert!(accepts(&*program, "").await);
    }

    /// Turing machine that walks right over its input and accepts iff the
    /// input consists solely of zeros.
    fn all_zeros_machine() -> Model {
        compile(
            Dialect::TuringMachine,
            json!({
                "states": [
                    {"id": "w", "name": "walk", "x": 0, "y": 0, "initial": true},
                    {"id": "a", "name": "accept", "x": 0, "y": 0, "final": true}
                ],
                "transitions": [
                    {"from": "w", "to": "w", "read": "0", "write": "0", "move": "R"},
                    {"from": "w", "to": "a", "read": "", "write": "", "move": "R"}
                ]
            }),
        )
    }

    #[tokio::test]
    async fn test_turing_run() {
        let program = TuringPlugin.make_program(all_zeros_machine()).await.unwrap();
        assert_eq!(program.validate().await, None);

        assert!(accepts(&*program, "000").await);
        assert!(accepts(&*program, "").await);
        assert!(!accepts(&*program, "010").await);
    }

    #[tokio::test]
    async fn test_turing_step_limit_is_a_run_error() {
        // Single state spinning right forever over blanks.
        let model = compile(
            Dialect::TuringMachine,
            json!({
                "states": [
                    {"id": "s", "name": "spin", "x": 0, "y": 0, "initial": true}
                ],
                "transitions": [
                    {"from": "s", "to": "s", "read": "", "write": "", "move": "R"}
                ]
            }),
        );
        let program = TuringPlugin.make_program(model).await.unwrap();
        assert_eq!(program.validate().await, None);

        let (scope, outcome) = run_once(&*program, "").await;
        match outcome {
            RunOutcome::Error(id) => {
                let message = scope.as_str(id).unwrap();
                assert!(message.contains("did not halt"));
            }
            RunOutcome::Result(_) => panic!("expected a run error"),
        }
    }
}

use flapjack::convert;
use flapjack::pipeline::{self, RunStatus};
use flapjack::plugin;
use serde_json::json;
use tempfile::TempDir;

async fn convert_to_graph(
    plugin_name: &str,
    doc: serde_json::Value,
    dir: &TempDir,
) -> std::path::PathBuf {
    let source = dir.path().join("source.json");
    std::fs::write(&source, serde_json::to_vec(&doc).unwrap()).unwrap();
    let graph = dir.path().join("graph.json");

    let plugin = plugin::load(plugin_name).unwrap();
    convert::convert_file(&*plugin, &source, &graph)
        .await
        .unwrap();
    graph
}

fn inputs(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// DFA accepting strings of even length over {a}.
fn even_length_dfa() -> serde_json::Value {
    json!({
        "states": [
            {"id": "e", "name": "even", "x": 0, "y": 0, "initial": true, "final": true},
            {"id": "o", "name": "odd", "x": 100, "y": 0}
        ],
        "transitions": [
            {"from": "e", "to": "o", "read": "a"},
            {"from": "o", "to": "e", "read": "a"}
        ]
    })
}

#[tokio::test]
async fn test_interpret_reports_outcomes_in_input_order() {
    let dir = TempDir::new().unwrap();
    let graph = convert_to_graph("dfa", even_length_dfa(), &dir).await;

    let plugin = plugin::load("dfa").unwrap();
    let report = pipeline::interpret(&*plugin, &graph, &inputs(&["", "a", "aa", "aaa"]))
        .await
        .unwrap();

    assert_eq!(report.validation, None);
    let outputs: Vec<_> = report
        .runs
        .iter()
        .map(|record| record.status.clone())
        .collect();
    assert_eq!(
        outputs,
        vec![
            RunStatus::Output(json!(true)),
            RunStatus::Output(json!(false)),
            RunStatus::Output(json!(true)),
            RunStatus::Output(json!(false)),
        ]
    );
}

#[tokio::test]
async fn test_validation_failure_suppresses_all_runs() {
    // Two start states: the DFA plugin rejects this at validation time.
    let dir = TempDir::new().unwrap();
    let graph = convert_to_graph(
        "dfa",
        json!({
            "states": [
                {"id": "a", "name": "qa", "x": 0, "y": 0, "initial": true},
                {"id": "b", "name": "qb", "x": 0, "y": 0, "initial": true}
            ],
            "transitions": []
        }),
        &dir,
    )
    .await;

    let plugin = plugin::load("dfa").unwrap();
    let report = pipeline::interpret(&*plugin, &graph, &inputs(&["x", "y", "z"]))
        .await
        .unwrap();

    let message = report.validation.expect("validation should fail");
    assert!(message.contains("exactly one start state"));
    assert!(report.runs.is_empty());
}

#[tokio::test]
async fn test_run_error_does_not_affect_other_inputs() {
    // Turing machine: a '0' steps straight into the accept state; a '1'
    // sends the head right into an endless blank walk, so that input blows
    // the step budget while its neighbours still evaluate.
    let dir = TempDir::new().unwrap();
    let graph = convert_to_graph(
        "turing-machine",
        json!({
            "states": [
                {"id": "s", "name": "scan", "x": 0, "y": 0, "initial": true},
                {"id": "a", "name": "done", "x": 100, "y": 0, "final": true}
            ],
            "transitions": [
                {"from": "s", "to": "a", "read": "0", "write": "0", "move": "R"},
                {"from": "s", "to": "s", "read": "1", "write": "1", "move": "R"},
                {"from": "s", "to": "s", "read": "", "write": "", "move": "R"}
            ]
        }),
        &dir,
    )
    .await;

    let plugin = plugin::load("turing-machine").unwrap();
    let report = pipeline::interpret(&*plugin, &graph, &inputs(&["0", "1", "0"]))
        .await
        .unwrap();

    assert_eq!(report.validation, None);
    assert_eq!(report.runs.len(), 3);
    assert_eq!(report.runs[0].status, RunStatus::Output(json!(true)));
    match &report.runs[1].status {
        RunStatus::Failed(value) => {
            assert!(value.as_str().unwrap().contains("did not halt"));
        }
        other => panic!("expected a run error, got {:?}", other),
    }
    assert_eq!(report.runs[2].status, RunStatus::Output(json!(true)));
}

#[tokio::test]
async fn test_nfa_end_to_end() {
    // NFA accepting strings containing "01".
    let dir = TempDir::new().unwrap();
    let graph = convert_to_graph(
        "nfa",
        json!({
            "states": [
                {"id": "s", "name": "scan", "x": 0, "y": 0, "initial": true},
                {"id": "m", "name": "saw0", "x": 0, "y": 0},
                {"id": "f", "name": "saw01", "x": 0, "y": 0, "final": true}
            ],
            "transitions": [
                {"from": "s", "to": "s", "read": "0"},
                {"from": "s", "to": "s", "read": "1"},
                {"from": "s", "to": "m", "read": "0"},
                {"from": "m", "to": "f", "read": "1"},
                {"from": "f", "to": "f", "read": "0"},
                {"from": "f", "to": "f", "read": "1"}
            ]
        }),
        &dir,
    )
    .await;

    let plugin = plugin::load("nfa").unwrap();
    let report = pipeline::interpret(&*plugin, &graph, &inputs(&["01", "1101", "10", ""]))
        .await
        .unwrap();

    let outputs: Vec<_> = report
        .runs
        .iter()
        .map(|record| record.status.clone())
        .collect();
    assert_eq!(
        outputs,
        vec![
            RunStatus::Output(json!(true)),
            RunStatus::Output(json!(true)),
            RunStatus::Output(json!(false)),
            RunStatus::Output(json!(false)),
        ]
    );
}

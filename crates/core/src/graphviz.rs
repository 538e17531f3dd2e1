//! Graphviz visualization of a task set.

use inspect_task_model::Task;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Sanitize an implementation ID into a valid Graphviz node identifier:
/// `-`, `/`, `.`, `#` all become `_`.
fn node_id(implementation_id: &str) -> String {
    implementation_id
        .chars()
        .map(|c| if matches!(c, '-' | '/' | '.' | '#') { '_' } else { c })
        .collect()
}

/// Render `tasks` as a Graphviz digraph: a synthetic `start` diamond feeds
/// every dependency-free task; every other task is reached via an edge from
/// each of its dependencies' providing task. Tasks labeled `feature` render
/// as a double circle.
///
/// Byte-stable for a given input ordering: node and edge emission order
/// follow `tasks`' order exactly, with no hash-map iteration in the
/// output path.
#[must_use]
pub fn dump_graphviz(tasks: &[Arc<dyn Task>]) -> String {
    let mut reference_to_node: HashMap<&str, String> = HashMap::new();
    for task in tasks {
        reference_to_node
            .entry(task.id().reference())
            .or_insert_with(|| node_id(&task.id().to_string()));
    }

    let mut out = String::from("digraph TaskGraph {\n");
    out.push_str("    start [shape=diamond];\n");

    for task in tasks {
        let shape = if task.labels().feature { "doublecircle" } else { "circle" };
        let _ = writeln!(out, "    {} [shape={shape}];", node_id(&task.id().to_string()));
    }

    for task in tasks {
        let target = node_id(&task.id().to_string());
        if task.dependencies().is_empty() {
            let _ = writeln!(out, "    start -> {target};");
            continue;
        }
        for dependency in task.dependencies() {
            if let Some(source) = reference_to_node.get(dependency.as_str()) {
                let _ = writeln!(out, "    {source} -> {target};");
            }
        }
    }

    out.push('}');
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use inspect_task_model::{ImplementationId, TaskContext, TaskError, TaskLabels, TaskValue};

    struct StubTask {
        id: ImplementationId,
        deps: Vec<String>,
        labels: TaskLabels,
    }

    #[async_trait]
    impl Task for StubTask {
        fn id(&self) -> &ImplementationId {
            &self.id
        }
        fn dependencies(&self) -> &[String] {
            &self.deps
        }
        fn labels(&self) -> &TaskLabels {
            &self.labels
        }
        async fn run(&self, _ctx: &TaskContext) -> Result<TaskValue, TaskError> {
            Ok(Box::new(()))
        }
    }

    fn stub(reference: &str, deps: &[&str]) -> Arc<dyn Task> {
        Arc::new(StubTask {
            id: ImplementationId::with_default_hash(reference),
            deps: deps.iter().map(|s| (*s).to_string()).collect(),
            labels: TaskLabels::default(),
        })
    }

    #[test]
    fn graphviz_output_is_byte_stable_across_runs() {
        // scenario 4.
        let tasks: Vec<Arc<dyn Task>> = vec![
            stub("qux", &[]),
            stub("quux", &[]),
            stub("bar", &["qux", "quux"]),
            stub("foo", &["bar"]),
        ];

        let first = dump_graphviz(&tasks);
        assert!(first.contains("start -> qux_default;"));
        assert!(first.contains("start -> quux_default;"));
        assert!(first.contains("qux_default -> bar_default;"));
        assert!(first.contains("quux_default -> bar_default;"));
        assert!(first.contains("bar_default -> foo_default;"));

        for _ in 0..100 {
            assert_eq!(dump_graphviz(&tasks), first);
        }
    }

    #[test]
    fn feature_label_renders_double_circle() {
        let mut labels = TaskLabels::default();
        labels.feature = true;
        let task: Arc<dyn Task> = Arc::new(StubTask {
            id: ImplementationId::with_default_hash("foo"),
            deps: vec![],
            labels,
        });

        let dot = dump_graphviz(&[task]);
        assert!(dot.contains("foo_default [shape=doublecircle];"));
    }

    #[test]
    fn node_ids_sanitize_reserved_characters() {
        assert_eq!(node_id("fetch-logs#gcp-us"), "fetch_logs_gcp_us");
    }
}

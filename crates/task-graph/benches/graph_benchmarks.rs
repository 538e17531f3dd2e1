//! Benchmarks for task set sort performance.
//!
//! Run with: cargo bench -p inspect-task-graph

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use inspect_task_graph::{SortOutcome, TaskSet};
use inspect_task_model::{ImplementationId, Task, TaskContext, TaskError, TaskLabels, TaskValue};
use std::hint::black_box;
use std::sync::Arc;

struct BenchTask {
    id: ImplementationId,
    deps: Vec<String>,
    labels: TaskLabels,
}

#[async_trait]
impl Task for BenchTask {
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

fn task(reference: &str, deps: &[&str]) -> Arc<dyn Task> {
    Arc::new(BenchTask {
        id: ImplementationId::with_default_hash(reference),
        deps: deps.iter().map(|s| (*s).to_string()).collect(),
        labels: TaskLabels::default(),
    })
}

/// Many independent tasks fanning out from a single root.
fn generate_wide_set(task_count: usize) -> TaskSet {
    let mut set = TaskSet::new();
    set.add(task("root", &[])).unwrap();
    for i in 0..task_count {
        set.add(task(&format!("task_{i}"), &["root"])).unwrap();
    }
    set
}

/// A linear dependency chain.
fn generate_deep_set(depth: usize) -> TaskSet {
    let mut set = TaskSet::new();
    set.add(task("task_0", &[])).unwrap();
    for i in 1..depth {
        let dep = format!("task_{}", i - 1);
        set.add(task(&format!("task_{i}"), &[dep.as_str()]))
            .unwrap();
    }
    set
}

/// Fan-out then fan-in: `width` tasks per level, `depth` levels.
fn generate_diamond_set(width: usize, depth: usize) -> TaskSet {
    let mut set = TaskSet::new();
    set.add(task("root", &[])).unwrap();

    let mut prev_level: Vec<String> = vec!["root".to_string()];
    for level in 0..depth {
        let mut current_level = Vec::new();
        let deps: Vec<&str> = prev_level.iter().map(String::as_str).collect();
        for w in 0..width {
            let name = format!("level_{level}_task_{w}");
            set.add(task(&name, &deps)).unwrap();
            current_level.push(name);
        }
        prev_level = current_level;
    }

    let deps: Vec<&str> = prev_level.iter().map(String::as_str).collect();
    set.add(task("final", &deps)).unwrap();
    set
}

fn bench_wide_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_sort");
    for size in [50usize, 100, 200, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| black_box(generate_wide_set(size).sort()));
        });
    }
    group.finish();
}

fn bench_deep_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_sort");
    for depth in [10usize, 20, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| black_box(generate_deep_set(depth).sort()));
        });
    }
    group.finish();
}

fn bench_diamond_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("diamond_sort");
    for (width, depth) in [(5, 5), (10, 5), (5, 10), (10, 10)] {
        let label = format!("w{width}_d{depth}");
        group.bench_with_input(
            BenchmarkId::from_parameter(&label),
            &(width, depth),
            |b, &(width, depth)| {
                b.iter(|| black_box(generate_diamond_set(width, depth).sort()));
            },
        );
    }
    group.finish();
}

/// A linear chain with the first task re-added depending on the last,
/// closing it into a cycle.
fn generate_cyclic_set(count: usize) -> TaskSet {
    let mut set = TaskSet::new();
    set.add(task("task_0", &[&format!("task_{}", count - 1)]))
        .unwrap();
    for i in 1..count {
        let dep = format!("task_{}", i - 1);
        set.add(task(&format!("task_{i}"), &[dep.as_str()]))
            .unwrap();
    }
    set
}

fn bench_cycle_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_detection");
    for count in [100usize, 500, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| match generate_cyclic_set(count).sort() {
                SortOutcome::Cyclic(description) => black_box(description.len()),
                other => panic!("expected Cyclic, got {other:?}"),
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_wide_sort,
    bench_deep_sort,
    bench_diamond_sort,
    bench_cycle_detection,
);

criterion_main!(benches);

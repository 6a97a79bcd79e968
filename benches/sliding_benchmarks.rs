//! Benchmarks for the sliding-window pass on synthetic pipelines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slideopt::ir::builder::*;
use slideopt::ir::{Expr, ForKind, Stmt};
use slideopt::pipeline::{stage_map, Stage, StageMap};
use slideopt::transform::sliding_window;

fn lowered_loop(name: &str, min: Expr, extent: Expr, kind: ForKind, body: Stmt) -> Stmt {
    let min_name = format!("{}.loop_min", name);
    let extent_name = format!("{}.loop_extent", name);
    let max_name = format!("{}.loop_max", name);
    let_stmt(
        min_name.clone(),
        min,
        let_stmt(
            extent_name.clone(),
            extent,
            let_stmt(
                max_name,
                v(min_name.clone()) + v(extent_name.clone()) - 1,
                for_loop(name, v(min_name), v(extent_name), kind, body),
            ),
        ),
    )
}

/// One stage sliding over a three-row window of a single producer.
fn stencil_pipeline() -> (Stmt, StageMap) {
    let env = stage_map([
        Stage::new("blur", &["x"]).computed_at("out", "b"),
        Stage::new("out", &["x"]),
    ]);
    let producer = produce(
        "blur",
        lowered_loop(
            "x",
            v("blur.s0.x.min"),
            v("blur.s0.x.max") - v("blur.s0.x.min") + 1,
            ForKind::Serial,
            provide("blur", vec![v("x")], v("x") * 10),
        ),
    );
    let consumer = consume(
        "blur",
        provide(
            "out",
            vec![v("b")],
            call("blur", vec![v("b")]) + call("blur", vec![v("b") + 2]),
        ),
    );
    let tree = realize(
        "blur",
        lowered_loop(
            "b",
            lit(0),
            lit(1000),
            ForKind::Serial,
            let_stmt(
                "blur.s0.x.min",
                v("b"),
                let_stmt(
                    "blur.s0.x.max",
                    v("b") + 2,
                    block(vec![producer, consumer]),
                ),
            ),
        ),
    );
    (tree, env)
}

/// A chain of `depth` stages, each reading a widening window of the one
/// before it. Every stage slides, renaming the loop once per stage.
fn stage_chain(depth: usize) -> (Stmt, StageMap) {
    let names: Vec<String> = (0..depth).map(|i| format!("f{}", i)).collect();
    let mut stages: Vec<Stage> = names
        .iter()
        .map(|n| Stage::new(n.clone(), &["x"]).computed_at("out", "b"))
        .collect();
    stages.push(Stage::new("out", &["x"]));
    let env = stage_map(stages);

    let mut items = Vec::with_capacity(depth + 1);
    items.push(produce(
        names[0].clone(),
        lowered_loop(
            "x0",
            v("f0.s0.x.min"),
            v("f0.s0.x.max") - v("f0.s0.x.min") + 1,
            ForKind::Serial,
            provide(names[0].clone(), vec![v("x0")], v("x0")),
        ),
    ));
    for i in 1..depth {
        let prev = names[i - 1].clone();
        let xi = format!("x{}", i);
        let min_name = format!("f{}.s0.x.min", i);
        let max_name = format!("f{}.s0.x.max", i);
        items.push(produce(
            names[i].clone(),
            consume(
                prev.clone(),
                lowered_loop(
                    &xi,
                    v(min_name.clone()),
                    v(max_name) - v(min_name) + 1,
                    ForKind::Serial,
                    provide(
                        names[i].clone(),
                        vec![v(xi.clone())],
                        call(prev.clone(), vec![v(xi.clone())])
                            + call(prev, vec![v(xi) + 2]),
                    ),
                ),
            ),
        ));
    }
    items.push(consume(
        names[depth - 1].clone(),
        provide("out", vec![v("b")], call(names[depth - 1].clone(), vec![v("b")])),
    ));

    let mut body = block(items);
    for i in (0..depth).rev() {
        let width = 2 * (depth - i) as i64;
        body = let_stmt(
            format!("f{}.s0.x.min", i),
            v("b"),
            let_stmt(format!("f{}.s0.x.max", i), v("b") + width, body),
        );
    }
    let mut tree = lowered_loop("b", lit(0), lit(1000), ForKind::Serial, body);
    for name in names.iter().rev() {
        tree = realize(name.clone(), tree);
    }
    (tree, env)
}

fn bench_single_stage(c: &mut Criterion) {
    let (tree, env) = stencil_pipeline();
    c.bench_function("slide_single_stage", |b| {
        b.iter(|| sliding_window(black_box(&tree), &env).unwrap())
    });
}

fn bench_stage_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("slide_stage_chain");
    for depth in [2usize, 4, 8] {
        let (tree, env) = stage_chain(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| sliding_window(black_box(&tree), &env).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_stage, bench_stage_chain);
criterion_main!(benches);

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use polars::df;
use relalg::{Catalog, ParseContext, eval, parse, parse_query, run, symbolize};

fn large_catalog() -> Catalog {
    let r = df! {
        "A" => (0..10_000).collect::<Vec<i32>>(),
        "B" => (0..10_000).map(|n| n % 7).collect::<Vec<i32>>(),
    }
    .unwrap();
    let s = df! {
        "A" => (5_000..15_000).collect::<Vec<i32>>(),
        "B" => (5_000..15_000).map(|n| n % 7).collect::<Vec<i32>>(),
    }
    .unwrap();
    let t = df! {
        "B" => (0..7).collect::<Vec<i32>>(),
        "C" => (0..7).map(|n| n * 10).collect::<Vec<i32>>(),
    }
    .unwrap();
    Catalog::new()
        .with_table("R", r)
        .with_table("S", s)
        .with_table("T", t)
}

fn long_chain(n: usize) -> String {
    let mut expr = String::from("R");
    for i in 0..n {
        let op = ["∪", "∩", "−", "⋈"][i % 4];
        expr.push_str(&format!(" {op} R{i}"));
    }
    expr
}

fn bench_symbolize(c: &mut Criterion) {
    let query = "project_ {A,C} (select_ {A > 2} (R union S) minus (T thetajoin_ {A = F} U))";
    c.bench_function("symbolize_query", |b| {
        b.iter(|| symbolize(black_box(query)))
    });
}

fn bench_parse(c: &mut Criterion) {
    let chain = long_chain(200);
    c.bench_function("parse_long_chain", |b| {
        b.iter(|| parse(black_box(&chain)).unwrap())
    });

    let nested = format!("{}R{}", "(".repeat(60), ")".repeat(60));
    c.bench_function("parse_deep_nesting", |b| {
        b.iter(|| parse(black_box(&nested)).unwrap())
    });
}

fn bench_eval(c: &mut Criterion) {
    let catalog = large_catalog();
    let ctx = ParseContext::new().with_relations(&catalog);
    let node = parse_query("(R union S) join_ T", &ctx).unwrap();

    c.bench_function("eval_union_join", |b| {
        b.iter(|| eval(black_box(&node), black_box(&catalog)).unwrap())
    });

    c.bench_function("run_select_query", |b| {
        b.iter(|| run(black_box("select_ {A > 1000 and B = 3} R"), black_box(&catalog)).unwrap())
    });
}

criterion_group!(benches, bench_symbolize, bench_parse, bench_eval);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};

macro_rules! gen_bench {
    ($name:ident, $samples:expr, $desc:literal, $re:literal, $data:expr) => {
        fn $name(c: &mut Criterion) {
            let mut group = c.benchmark_group($desc);

            group.sample_size($samples);

            group.bench_function("build", |b| {
                b.iter(|| {
                    let _ = retrack::Machine::new($re).unwrap();
                })
            });

            group.bench_function("find_iter", |b| {
                let machine = retrack::Machine::new($re).unwrap();
                let data = $data;

                b.iter(|| {
                    let _ = machine.find_iter(&data).count();
                });
            });
        }
    };
}

gen_bench!(
    bench_literal,
    50,
    "Literal",
    r#"needle"#,
    "hay".repeat(10000) + "needle"
);

gen_bench!(
    bench_alternation,
    50,
    "Alternation",
    r#"foo|bar|baz|qux"#,
    "xxxfooyyybarzzzqux".repeat(1000)
);

gen_bench!(
    bench_nested_loops,
    50,
    "Nested loops without match",
    r#"(a*)*b"#,
    "a".repeat(10000)
);

gen_bench!(
    bench_bounded_repetition,
    50,
    "Bounded repetition",
    r#"\d{3}-\d{3}-\d{4}"#,
    "call 555-123-4567 or 555-987-6543 ".repeat(500)
);

criterion_group!(
    benches,
    bench_literal,
    bench_alternation,
    bench_nested_loops,
    bench_bounded_repetition,
);

criterion_main!(benches);

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use luma::interpreter::Interpreter;
use luma::{lexer, parser, semantic};

const WORKLOADS: [(&str, &str); 2] = [
    ("countdown", "tests/programs/bench_countdown.luma"),
    ("branches", "tests/programs/bench_branches.luma"),
];

fn load_source(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

fn bench_pipeline(c: &mut Criterion) {
    for (label, path) in WORKLOADS {
        let source = load_source(path);
        let tokens = lexer::tokenize(&source);
        let program = parser::parse_tokens(tokens.clone()).expect("parse");

        c.bench_function(&format!("pipeline_tokenize_{label}"), |b| {
            b.iter(|| {
                let out = lexer::tokenize(black_box(&source));
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_parse_{label}"), |b| {
            b.iter(|| {
                let out = parser::parse_tokens(black_box(tokens.clone())).expect("parse");
                black_box(out);
            })
        });

        c.bench_function(&format!("pipeline_analyze_{label}"), |b| {
            b.iter(|| {
                semantic::analyze(black_box(&program)).expect("analyze");
            })
        });

        c.bench_function(&format!("pipeline_run_{label}"), |b| {
            b.iter(|| {
                let run = Interpreter::new().run(black_box(&program.statements));
                black_box(run);
            })
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);

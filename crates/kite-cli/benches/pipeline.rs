use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kite_vm::Vm;

fn source(terms: usize) -> String {
    (1..=terms).map(|i| format!("({i} * 2 - 1) / 3")).collect::<Vec<_>>().join(" + ")
}

fn bench_pipeline(c: &mut Criterion) {
    let src = source(200);

    c.bench_function("lex", |b| b.iter(|| kite_lexer::tokenize(black_box(&src)).unwrap()));
    c.bench_function("parse", |b| b.iter(|| kite_parser::parse(black_box(&src)).unwrap()));

    let program = kite_parser::parse(&src).unwrap();
    c.bench_function("compile", |b| b.iter(|| kite_compiler::compile(black_box(&program)).unwrap()));

    let chunk = kite_compiler::compile(&program).unwrap();
    c.bench_function("execute", |b| {
        let mut vm = Vm::with_output(std::io::sink());
        b.iter(|| vm.execute(black_box(&chunk)).unwrap());
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);

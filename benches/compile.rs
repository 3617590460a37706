// Benchmarks for template compilation.

use criterion::{criterion_group, criterion_main, Criterion};
use stachec::compile;

fn bench_static_markup(c: &mut Criterion) {
    let src = "<h1>Hello</h1><p>This is a <strong>simple</strong> document.</p>";
    c.bench_function("static_markup", |b| {
        b.iter(|| compile(src, None).unwrap());
    });
}

fn bench_interpolation_heavy(c: &mut Criterion) {
    let src = "<ul>{{#each items}}<li>{{name}} — {{price}}</li>{{/each}}</ul>";
    c.bench_function("interpolation_heavy", |b| {
        b.iter(|| compile(src, None).unwrap());
    });
}

criterion_group!(benches, bench_static_markup, bench_interpolation_heavy);
criterion_main!(benches);

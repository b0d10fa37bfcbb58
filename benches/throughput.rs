//! Throughput benchmark: render scales ~linearly with input size on
//! well-formed Markdown (§8 fuzz properties).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use marrow_core::{render, Buffer, Extension, Html, RenderOptions};

fn sample_document(paragraphs: usize) -> String {
    let mut doc = String::new();
    for i in 0..paragraphs {
        doc.push_str(&format!(
            "## Section {i}\n\nSome **bold** and *emphasised* text with a [link](http://example.com/{i}).\n\n"
        ));
    }
    doc
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let extensions = Extension::TABLES | Extension::FENCED_CODE | Extension::AUTOLINK;

    for paragraphs in [64usize, 256, 1024] {
        let doc = sample_document(paragraphs);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &doc, |b, doc| {
            b.iter(|| {
                let mut out = Buffer::new(doc.len());
                let mut html = Html::new(RenderOptions::empty());
                render(&mut out, doc.as_bytes(), &mut html, extensions, marrow_core::DEFAULT_MAX_NESTING).unwrap();
                out
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);

//! Layout micro-benchmarks
//!
//! Measures column planning, text splitting and a full composition for
//! explanations of growing length.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};
use marginalia::layout::{
    CapacityEstimator, ColumnPlanner, ColumnRequest, FlowStyle, LayoutTuning, Size, TextSplitter,
};
use marginalia::{ComposeOptions, ExplanationMap, RenderMode, compose_pdf};
use std::hint::black_box;

const LENGTHS: [usize; 3] = [500, 5_000, 50_000];

fn words(chars: usize) -> String {
    "lorem ipsum dolor sit amet ".chars().cycle().take(chars).collect()
}

fn letter_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::String(b"Slide".to_vec(), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("Failed to encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        dictionary! { "Type" => "Pages", "Kids" => vec![page_id.into()], "Count" => 1 }.into(),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save source PDF");
    bytes
}

fn benchmark_column_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_planning");
    let tuning = LayoutTuning::default();
    let planner = ColumnPlanner::new(&tuning);
    let style = FlowStyle::new(12.0, 1.4, RenderMode::Text);

    for text_len in LENGTHS {
        let request = ColumnRequest {
            page: Size::new(612.0, 792.0),
            style,
            text_len,
            column_padding: 10.0,
            top_offset: 0.0,
        };
        group.bench_with_input(BenchmarkId::new("chars", text_len), &request, |b, request| {
            b.iter(|| planner.plan(black_box(request)));
        });
    }
    group.finish();
}

fn benchmark_text_splitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_splitting");
    let tuning = LayoutTuning::default();
    let planner = ColumnPlanner::new(&tuning);
    let splitter = TextSplitter::new(&tuning);
    let estimator = CapacityEstimator::new(&tuning);

    for mode in [RenderMode::Text, RenderMode::Markdown] {
        let style = FlowStyle::new(12.0, 1.4, mode);
        for text_len in LENGTHS {
            let text = words(text_len);
            let plan = planner.plan(&ColumnRequest {
                page: Size::new(612.0, 792.0),
                style,
                text_len,
                column_padding: 10.0,
                top_offset: 0.0,
            });
            let id = BenchmarkId::new(mode.as_str(), text_len);
            group.bench_with_input(id, &text, |b, text| {
                b.iter(|| {
                    let fragments = splitter.split(black_box(text), &plan.rects, &style);
                    black_box(estimator.estimate_rect(&plan.rects[0], &style));
                    fragments
                });
            });
        }
    }
    group.finish();
}

fn benchmark_composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("composition");
    group.sample_size(20);
    let source = letter_pdf();

    for text_len in LENGTHS {
        let explanations = ExplanationMap::from([(0, words(text_len))]);
        group.bench_with_input(BenchmarkId::new("chars", text_len), &explanations, |b, explanations| {
            b.iter(|| {
                compose_pdf(black_box(&source), explanations, ComposeOptions::default())
                    .expect("Failed to compose PDF")
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_column_planning,
    benchmark_text_splitting,
    benchmark_composition
);
criterion_main!(benches);

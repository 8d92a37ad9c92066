use criterion::{Criterion, criterion_group, criterion_main};
use pagequiz::extract::snapshot_from_html;
use pagequiz::llm::quiz::parse_quiz_reply;
use std::hint::black_box;

fn quiz_reply(questions: usize) -> String {
    let items: Vec<String> = (0..questions)
        .map(|idx| {
            format!(
                concat!(
                    r#"{{"question": "Question {idx}?", "options": ["a", "b", "c", "d"], "#,
                    r#""correct": {}, "explanation": "Because {idx}."}}"#,
                ),
                idx % 4
            )
        })
        .collect();
    format!("```json\n[{}]\n```", items.join(","))
}

fn bench_parse_quiz_reply(c: &mut Criterion) {
    let fenced = quiz_reply(20);
    let prose = "Sorry, here is some text instead of JSON. ".repeat(50);

    c.bench_function("parse_quiz_reply_fenced", |b| {
        b.iter(|| black_box(parse_quiz_reply(black_box(&fenced))))
    });
    c.bench_function("parse_quiz_reply_fallback", |b| {
        b.iter(|| black_box(parse_quiz_reply(black_box(&prose))))
    });
}

fn bench_snapshot_from_html(c: &mut Criterion) {
    let section = concat!(
        "<div><h2>Heading</h2><p>Some <em>inline</em> text &amp; more.</p>",
        "<script>ignored()</script></div>",
    );
    let html = format!(
        "<html><head><title>Bench</title></head><body>{}</body></html>",
        section.repeat(200)
    );

    c.bench_function("snapshot_from_html", |b| {
        b.iter(|| black_box(snapshot_from_html(black_box(&html), "https://example.com")))
    });
}

criterion_group!(benches, bench_parse_quiz_reply, bench_snapshot_from_html);
criterion_main!(benches);

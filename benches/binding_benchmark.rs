use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use webctx::{
    bind_form, controller::escape_unicode, cookie::encode_cookie_at, form_schema, CookieOptions,
};

#[derive(Default)]
struct Signup {
    name: String,
    age: i64,
    score: f64,
    tags: Vec<String>,
    ids: Vec<i64>,
}

form_schema!(Signup {
    "Name" => name: string,
    "Age" => age: integer,
    "Score" => score: float,
    "Tags" => tags: strings,
    "Ids" => ids: integers,
});

fn form(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
        .collect()
}

fn bind_form_benchmark(c: &mut Criterion) {
    let body = form(&[
        ("Name", &["Ann"]),
        ("Age", &["42"]),
        ("Score", &["9.5"]),
        ("Tags", &["a", "b", "c"]),
        ("Ids", &["1", "2", "3", "4"]),
        ("Ignored", &["x"]),
    ]);

    c.bench_function("bind_form", |b| {
        b.iter(|| {
            let mut target = Signup::default();
            bind_form(black_box(&body), &mut target).unwrap();
            black_box((target.name, target.age, target.score, target.tags, target.ids));
        });
    });
}

fn bind_collection_size_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind_collection_size");

    for count in [1usize, 16, 256].iter() {
        let values: Vec<String> = (0..*count).map(|i| i.to_string()).collect();
        let mut body = HashMap::new();
        body.insert("Ids".to_string(), values);

        group.bench_with_input(BenchmarkId::from_parameter(count), &body, |b, body| {
            b.iter(|| {
                let mut target = Signup::default();
                bind_form(black_box(body), &mut target).unwrap();
            });
        });
    }

    group.finish();
}

fn bind_error_benchmark(c: &mut Criterion) {
    let body = form(&[("Ids", &["1", "2", "oops", "4"])]);

    c.bench_function("bind_form_error", |b| {
        b.iter(|| {
            let mut target = Signup::default();
            let _ = bind_form(black_box(&body), &mut target).unwrap_err();
        });
    });
}

fn cookie_encode_benchmark(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap();
    let mut group = c.benchmark_group("cookie_encode");

    let options = [
        ("minimal", CookieOptions::new()),
        (
            "full",
            CookieOptions::new()
                .max_age(3600)
                .path("/admin")
                .domain("example.com")
                .http_only(true)
                .secure(true),
        ),
    ];

    for (name, opts) in options.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), opts, |b, opts| {
            b.iter(|| encode_cookie_at(black_box("sid"), black_box("a;b\nc"), opts, now));
        });
    }

    group.finish();
}

fn json_escape_benchmark(c: &mut Criterion) {
    let payload = serde_json::to_string(&json!({
        "name": "张三",
        "city": "北京",
        "emoji": "😀",
        "plain": "hello world",
    }))
    .unwrap();

    c.bench_function("json_escape_unicode", |b| {
        b.iter(|| escape_unicode(black_box(&payload)));
    });
}

criterion_group!(
    benches,
    bind_form_benchmark,
    bind_collection_size_benchmark,
    bind_error_benchmark,
    cookie_encode_benchmark,
    json_escape_benchmark
);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use webctx::{body::parse_query, request::Request, RequestContext};

fn simple_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET / HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Test\r\n\r\n";

    c.bench_function("simple_request_parse", |b| {
        b.iter(|| {
            let buffer = black_box(request.to_vec());
            let _ = Request::try_from(&buffer, 0).unwrap();
        });
    });
}

fn complex_request_parse_benchmark(c: &mut Criterion) {
    let request = b"GET /path/to/resource?id=123&name=test HTTP/1.1\r\n\
                    Host: localhost:7878\r\n\
                    User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64)\r\n\
                    Accept: text/html,application/xhtml+xml\r\n\
                    Accept-Language: en-US,en;q=0.9\r\n\
                    Cookie: sid=abc123; theme=dark; lang=en\r\n\
                    Connection: keep-alive\r\n\
                    \r\n";

    c.bench_function("complex_request_parse", |b| {
        b.iter(|| {
            let buffer = black_box(request.to_vec());
            let _ = Request::try_from(&buffer, 0).unwrap();
        });
    });
}

fn query_parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_parse");

    let queries = [
        ("short", "q=rust"),
        ("repeated", "tag=a&tag=b&tag=c&tag=d&tag=e"),
        ("encoded", "name=John+Doe&city=New%20York&greeting=%E4%BD%A0%E5%A5%BD"),
    ];

    for (name, query) in queries.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), query, |b, query| {
            b.iter(|| parse_query(black_box(query)));
        });
    }

    group.finish();
}

fn context_build_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("context_build");
    let upload_dir = std::env::temp_dir();

    let form_body = "Name=Ann&Age=42&Score=9.5&Tags=a&Tags=b&Tags=c";
    let form = format!(
        "POST /signup HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
        form_body.len(),
        form_body
    );
    let json_body = r#"{"Name":"Ann","Age":42,"Score":9.5,"Tags":["a","b","c"]}"#;
    let json = format!(
        "POST /signup HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        json_body.len(),
        json_body
    );
    let multipart_body = "--b0\r\n\
        Content-Disposition: form-data; name=\"Name\"\r\n\r\n\
        Ann\r\n\
        --b0\r\n\
        Content-Disposition: form-data; name=\"Age\"\r\n\r\n\
        42\r\n\
        --b0--\r\n";
    let multipart = format!(
        "POST /signup HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=b0\r\nContent-Length: {}\r\n\r\n{}",
        multipart_body.len(),
        multipart_body
    );

    for (name, raw) in [("form", form), ("json", json), ("multipart", multipart)].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), raw, |b, raw| {
            b.iter(|| {
                let request = Request::try_from(black_box(raw.as_bytes()), 0).unwrap();
                let _ = RequestContext::from_request(request, 0, &upload_dir).unwrap();
            });
        });
    }

    group.finish();
}

fn request_parse_batch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse_batch");

    for count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let request = b"GET /search?q=rust HTTP/1.1\r\nHost: localhost\r\nUser-Agent: Test\r\n\r\n";

            b.iter(|| {
                for _ in 0..count {
                    let buffer = black_box(request.to_vec());
                    let _ = Request::try_from(&buffer, 0).unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    simple_request_parse_benchmark,
    complex_request_parse_benchmark,
    query_parse_benchmark,
    context_build_benchmark,
    request_parse_batch_benchmark
);
criterion_main!(benches);

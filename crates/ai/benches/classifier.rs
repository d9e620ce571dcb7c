use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use ticket_audit_ai::classify;

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let cases = [
        ("status_only", Some(401), ""),
        ("recoverable_short", Some(500), "internal server error"),
        ("rate_limit_message", None, "RESOURCE_EXHAUSTED: Quota exceeded for quota metric"),
        (
            "recoverable_long",
            None,
            "upstream connect error or disconnect/reset before headers. reset reason: connection termination while reading the response body from the analysis backend",
        ),
    ];

    for (name, status, message) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(status, message), |b, (s, m)| {
            b.iter(|| classify(black_box(*s), black_box(m)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
